//! Poll-then-drain cycle for one repository.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::handler::TaskRunner;
use crate::hosting::{CommentFilter, HostingClient, IssueFilter};
use crate::queue::{DrainSummary, PushOutcome, TaskQueue};

/// What one [`RepositoryOrchestrator::poll_once`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub queued: usize,
    /// Entities skipped because the queue was full. They are picked up again
    /// by a later poll.
    pub deferred: usize,
    pub handled: DrainSummary,
}

pub struct RepositoryOrchestrator {
    name: String,
    hosting: Arc<dyn HostingClient>,
    issue_filter: IssueFilter,
    comment_filter: CommentFilter,
    queue: TaskQueue,
    runner: TaskRunner,
}

impl RepositoryOrchestrator {
    pub fn new(
        name: impl Into<String>,
        hosting: Arc<dyn HostingClient>,
        issue_filter: IssueFilter,
        comment_filter: CommentFilter,
        queue: TaskQueue,
        runner: TaskRunner,
    ) -> Self {
        Self {
            name: name.into(),
            hosting,
            issue_filter,
            comment_filter,
            queue,
            runner,
        }
    }

    /// `owner/name`, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// List open issues and comments, queue them, then handle everything
    /// queued. Issues the runner already claimed are skipped. A listing
    /// failure is logged and the cycle carries on with whatever was listed.
    pub async fn poll_once(&mut self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        match self.hosting.list_open_issues(&self.issue_filter).await {
            Ok(issues) => {
                debug!(repo = %self.name, count = issues.len(), "listed issues");
                for issue in issues {
                    if self.runner.has_claimed(issue.number) {
                        debug!(repo = %self.name, issue = issue.number, "issue already claimed");
                        continue;
                    }
                    tally(self.queue.push_issue(issue), &mut summary);
                }
            }
            Err(e) => warn!(repo = %self.name, error = %e, "failed to list issues"),
        }

        match self.hosting.list_open_comments(&self.comment_filter).await {
            Ok(comments) => {
                debug!(repo = %self.name, count = comments.len(), "listed comments");
                for comment in comments {
                    tally(self.queue.push_comment(comment), &mut summary);
                }
            }
            Err(e) => warn!(repo = %self.name, error = %e, "failed to list comments"),
        }

        summary.handled = self.queue.drain_all(&mut self.runner).await;

        if summary.handled.total() > 0 || summary.deferred > 0 {
            info!(
                repo = %self.name,
                issues = summary.handled.issues,
                comments = summary.handled.comments,
                deferred = summary.deferred,
                "poll cycle complete"
            );
        }
        summary
    }
}

fn tally(outcome: PushOutcome, summary: &mut CycleSummary) {
    match outcome {
        PushOutcome::Queued => summary.queued += 1,
        PushOutcome::Full => summary.deferred += 1,
        PushOutcome::AlreadyQueued => {}
    }
}
