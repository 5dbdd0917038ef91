//! Typed error hierarchy for issuesmith.
//!
//! One enum per collaborator plus the task-level wrapper:
//! - `WorktreeError`: local clone / commit session failures
//! - `HostingError`: hosting-server (GitHub) API failures
//! - `LlmError`: model API failures
//! - `TaskError`: anything that aborts one issue or comment task

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the worktree controller.
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("A commit is already in progress")]
    AlreadyInProgress,

    #[error("No commit in progress; start_commit must be called first")]
    NotInProgress,

    #[error("Path '{path}' points outside the repository")]
    PathOutsideRepository { path: String },

    #[error("Branch '{branch}' not found on remote")]
    BranchNotFound { branch: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// Errors from the hosting-server client.
#[derive(Debug, Error)]
pub enum HostingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hosting API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from hosting API: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the LLM client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

/// Errors that abort a single issue or comment task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Comment {comment_id} has no branch; cannot apply changes")]
    MissingBranch { comment_id: u64 },

    #[error(transparent)]
    Worktree(#[from] WorktreeError),

    #[error(transparent)]
    Hosting(#[from] HostingError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worktree_error_io_carries_path() {
        let path = PathBuf::from("/tmp/repo/a.txt");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WorktreeError::Io {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            WorktreeError::Io { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Io variant"),
        }
        assert!(err.to_string().contains("/tmp/repo/a.txt"));
    }

    #[test]
    fn test_task_error_converts_from_worktree_error() {
        let task_err: TaskError = WorktreeError::AlreadyInProgress.into();
        assert!(matches!(
            task_err,
            TaskError::Worktree(WorktreeError::AlreadyInProgress)
        ));
        // transparent: message is the inner one
        assert_eq!(task_err.to_string(), "A commit is already in progress");
    }

    #[test]
    fn test_task_error_missing_branch_mentions_comment() {
        let err = TaskError::MissingBranch { comment_id: 99 };
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_api_errors_carry_status() {
        let err = HostingError::Api {
            status: 422,
            message: "Validation Failed".into(),
        };
        assert!(err.to_string().contains("422"));
        let err = LlmError::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&WorktreeError::NotInProgress);
        assert_std_error(&HostingError::InvalidResponse("x".into()));
        assert_std_error(&LlmError::RateLimited { retry_after: None });
        assert_std_error(&TaskError::MissingBranch { comment_id: 1 });
    }
}
