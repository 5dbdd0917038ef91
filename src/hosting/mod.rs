//! Hosting-server collaborator: issues, review comments, pull requests.
//!
//! The orchestrator only talks to [`HostingClient`]; [`github::GithubClient`]
//! is the REST implementation.

pub mod github;

use std::fmt;

use async_trait::async_trait;

use crate::errors::HostingError;

pub use github::GithubClient;

/// A user on the hosting server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub handle: String,
    pub email: String,
}

/// An open issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub subject: String,
    pub body: String,
    pub url: String,
    pub author: Author,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Issue #: {}", self.number)?;
        writeln!(f, "Author: {}", self.author.handle)?;
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "Body:\n{}", self.body)?;
        writeln!(f, "URL: {}", self.url)
    }
}

/// A review comment anchored to a file in a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    /// Pull request number the comment was left on.
    pub change_request_id: u64,
    pub author: Author,
    pub body: String,
    pub file_path: String,
    pub diff_hunk: String,
    pub position: Option<u64>,
    pub url: String,
    /// Head branch of the pull request. Empty when unknown.
    pub branch: String,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comment ID: {}", self.id)?;
        writeln!(f, "Pull request: #{}", self.change_request_id)?;
        writeln!(f, "Author: {}", self.author.handle)?;
        writeln!(f, "Body: {}", self.body)?;
        writeln!(f, "File: {}", self.file_path)?;
        writeln!(f, "Branch: {}", self.branch)?;
        writeln!(f, "DiffHunk:\n{}", self.diff_hunk)?;
        writeln!(f, "URL: {}", self.url)
    }
}

/// Issue listing filter.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// The issue must carry every one of these labels.
    pub labels: Vec<String>,
    /// The issue must be opened by one of these handles.
    pub authors: Vec<String>,
}

/// Review comment listing filter.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// The comment must be written by one of these handles.
    pub authors: Vec<String>,
}

/// A pull request opened by [`HostingClient::open_change_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequestRef {
    pub id: u64,
    pub url: String,
}

#[async_trait]
pub trait HostingClient: Send + Sync {
    async fn list_open_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, HostingError>;

    /// Review comments on open pull requests that the bot has not replied to yet.
    async fn list_open_comments(
        &self,
        filter: &CommentFilter,
    ) -> Result<Vec<Comment>, HostingError>;

    async fn comment_on_issue(&self, number: u64, text: &str) -> Result<(), HostingError>;

    /// Removing a label the issue does not carry is not an error.
    async fn remove_label(&self, number: u64, label: &str) -> Result<(), HostingError>;

    async fn open_change_request(
        &self,
        from_branch: &str,
        to_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeRequestRef, HostingError>;

    async fn reply_to_comment(
        &self,
        change_request_id: u64,
        comment_id: u64,
        text: &str,
    ) -> Result<(), HostingError>;
}

/// Whether `handle` is in the allow-list. Comparison ignores case, as
/// hosting-server handles do.
pub fn author_allowed(allowed: &[String], handle: &str) -> bool {
    allowed.iter().any(|a| a.eq_ignore_ascii_case(handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_allowed_ignores_case() {
        let allowed = vec!["Octocat".to_string(), "hubot".to_string()];
        assert!(author_allowed(&allowed, "octocat"));
        assert!(author_allowed(&allowed, "HUBOT"));
        assert!(!author_allowed(&allowed, "mallory"));
    }

    #[test]
    fn test_author_allowed_empty_list_allows_nobody() {
        assert!(!author_allowed(&[], "anyone"));
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue {
            number: 3,
            subject: "Fix it".into(),
            body: "please".into(),
            url: "https://github.com/o/r/issues/3".into(),
            author: Author {
                handle: "octocat".into(),
                email: String::new(),
            },
        };
        let out = issue.to_string();
        assert!(out.contains("Issue #: 3"));
        assert!(out.contains("Author: octocat"));
        assert!(out.contains("Subject: Fix it"));
    }
}
