//! LLM collaborator.
//!
//! The orchestrator only needs one call: prompt in, completion text out.
//! Parsing the completion is the codec's job.

pub mod openai;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::LlmError;

pub use openai::OpenAiClient;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one single-turn completion. An empty `model` means the client's
    /// default model.
    async fn evaluate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Kind of completion, used as the debug dump subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    ChangeResponse,
    DiffCommentResponse,
}

impl CompletionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionKind::ChangeResponse => "codechangeresponse",
            CompletionKind::DiffCommentResponse => "diffcommentresponse",
        }
    }
}

/// Writes raw completions to `{dir}/{kind}/{id}-{unix}.txt` when a debug
/// directory is configured. Failures are logged and swallowed.
#[derive(Debug, Clone, Default)]
pub struct DebugDump {
    dir: Option<PathBuf>,
}

impl DebugDump {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn record(&self, kind: CompletionKind, id: u64, completion: &str) -> Option<PathBuf> {
        let dir = self.dir.as_deref()?;
        match write_dump(dir, kind, id, completion) {
            Ok(path) => {
                info!(path = %path.display(), "completion written to debug file");
                Some(path)
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to write completion debug file");
                None
            }
        }
    }
}

fn write_dump(
    dir: &Path,
    kind: CompletionKind,
    id: u64,
    completion: &str,
) -> std::io::Result<PathBuf> {
    let subdir = dir.join(kind.as_str());
    std::fs::create_dir_all(&subdir)?;
    let path = subdir.join(format!("{}-{}.txt", id, chrono::Utc::now().timestamp()));
    std::fs::write(&path, completion)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_debug_dump_writes_under_kind_dir() {
        let dir = tempdir().unwrap();
        let dump = DebugDump::new(Some(dir.path().to_path_buf()));

        let path = dump
            .record(CompletionKind::ChangeResponse, 42, "name: a contents: b")
            .unwrap();

        assert!(path.starts_with(dir.path().join("codechangeresponse")));
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("42-"));
        assert!(file_name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name: a contents: b");
    }

    #[test]
    fn test_debug_dump_disabled_is_noop() {
        assert!(
            DebugDump::disabled()
                .record(CompletionKind::DiffCommentResponse, 1, "x")
                .is_none()
        );
    }

    #[test]
    fn test_debug_dump_unwritable_dir_is_swallowed() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let dump = DebugDump::new(Some(blocker));
        assert!(dump.record(CompletionKind::ChangeResponse, 1, "x").is_none());
    }
}
