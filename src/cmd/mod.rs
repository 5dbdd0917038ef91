//! CLI command implementations.
//!
//! | Module   | Commands handled                |
//! |----------|---------------------------------|
//! | `run`    | `Run`                           |
//! | `list`   | `ListIssues`, `ListComments`    |
//! | `local`  | `LocalIssue`                    |
//! | `config` | `Config`                        |

pub mod config;
pub mod list;
pub mod local;
pub mod run;

pub use config::cmd_config;
pub use list::{cmd_list_comments, cmd_list_issues};
pub use local::cmd_local_issue;
pub use run::cmd_run;

use std::sync::Arc;

use anyhow::{Context, Result};

use issuesmith::config::Config;
use issuesmith::hosting::{Author, CommentFilter, GithubClient, IssueFilter};
use issuesmith::llm::{DebugDump, LlmClient, OpenAiClient};
use issuesmith::orchestrator::{RepositoryOrchestrator, RunnerOptions, TaskRunner};
use issuesmith::queue::TaskQueue;
use issuesmith::settings::RepositorySection;
use issuesmith::worktree::{Credentials, RepositorySpec, WorktreeController};

fn bot_author(config: &Config) -> Author {
    Author {
        handle: config.toml.bot.handle.clone(),
        email: config.toml.bot.email.clone(),
    }
}

fn issue_filter(repo: &RepositorySection) -> IssueFilter {
    IssueFilter {
        labels: repo.required_labels.clone(),
        authors: repo.authors.clone(),
    }
}

fn comment_filter(repo: &RepositorySection) -> CommentFilter {
    CommentFilter {
        authors: repo.authors.clone(),
    }
}

fn github_client(config: &Config, repo: &RepositorySection, token: &str) -> GithubClient {
    GithubClient::new(
        repo.api_base.clone(),
        token,
        repo.owner.clone(),
        repo.name.clone(),
        config.toml.bot.handle.clone(),
    )
}

fn llm_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    let key = config.require_openai_api_key()?;
    Ok(Arc::new(OpenAiClient::with_base_url(
        key.to_string(),
        config.model.clone(),
        config.toml.llm.base_url.clone(),
    )))
}

fn open_worktree(config: &Config, repo: &RepositorySection) -> Result<WorktreeController> {
    let spec = RepositorySpec {
        clone_url: repo.clone_url(),
        local_path: repo.local_path(&config.toml.service.workdir),
    };
    let credentials = config.github_token().map(|token| Credentials {
        username: config.toml.bot.handle.clone(),
        token: token.to_string(),
    });
    WorktreeController::open(&spec, bot_author(config), credentials)
        .with_context(|| format!("Failed to clone {}", repo.slug()))
}

fn runner_options(config: &Config, repo: &RepositorySection) -> RunnerOptions {
    RunnerOptions {
        model: config.model.clone(),
        required_labels: repo.required_labels.clone(),
        debug: DebugDump::new(config.toml.llm.debug_dir.clone()),
    }
}

/// Wire up everything one repository needs. Clones the repository.
fn build_orchestrator(
    config: &Config,
    repo: &RepositorySection,
    llm: Arc<dyn LlmClient>,
) -> Result<RepositoryOrchestrator> {
    let token = config.require_github_token()?;
    let hosting = Arc::new(github_client(config, repo, token));
    let worktree = open_worktree(config, repo)?;
    let runner = TaskRunner::new(
        hosting.clone(),
        llm,
        worktree,
        runner_options(config, repo),
    );

    Ok(RepositoryOrchestrator::new(
        repo.slug(),
        hosting,
        issue_filter(repo),
        comment_filter(repo),
        TaskQueue::new(config.toml.service.queue_capacity),
        runner,
    ))
}
