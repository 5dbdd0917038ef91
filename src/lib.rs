pub mod codec;
pub mod config;
pub mod directive;
pub mod errors;
pub mod hosting;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod queue;
pub mod settings;
pub mod worktree;
