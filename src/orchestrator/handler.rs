//! Per-task work: one issue or one review comment, start to finish.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::codec::{
    ChangeRequest, ChangeResponse, DiffCommentReply, DiffCommentRequest, build_diff_comment_prompt,
    build_prompt, parse_change_response, parse_diff_comment_response,
};
use crate::errors::TaskError;
use crate::hosting::{ChangeRequestRef, Comment, HostingClient, Issue};
use crate::llm::{CompletionKind, DebugDump, LlmClient};
use crate::queue::TaskHandler;
use crate::worktree::{WorktreeController, WorktreeState};

/// Prefix of every branch the bot pushes for an issue.
pub const BRANCH_PREFIX: &str = "issuesmith";
const DEFAULT_TITLE: &str = "update files";

/// Settings a [`TaskRunner`] needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Model passed to the LLM; empty means the client's default.
    pub model: String,
    /// Labels removed from an issue when the bot picks it up.
    pub required_labels: Vec<String>,
    pub debug: DebugDump,
}

/// What [`TaskRunner::apply_issue`] produced locally.
#[derive(Debug, Clone)]
pub struct AppliedChange {
    pub request: ChangeRequest,
    pub response: ChangeResponse,
    /// `None` when the response changed no files; the session is then
    /// closed without a commit.
    pub commit_id: Option<String>,
}

/// Handles tasks for one repository. Owns that repository's worktree.
pub struct TaskRunner {
    hosting: Arc<dyn HostingClient>,
    llm: Arc<dyn LlmClient>,
    worktree: WorktreeController,
    options: RunnerOptions,
    /// Issues this process has already taken on. Survives label-less
    /// repositories, where nothing on the server marks an issue as claimed.
    claimed_issues: HashSet<u64>,
}

impl TaskRunner {
    pub fn new(
        hosting: Arc<dyn HostingClient>,
        llm: Arc<dyn LlmClient>,
        worktree: WorktreeController,
        options: RunnerOptions,
    ) -> Self {
        Self {
            hosting,
            llm,
            worktree,
            options,
            claimed_issues: HashSet::new(),
        }
    }

    pub fn has_claimed(&self, issue_number: u64) -> bool {
        self.claimed_issues.contains(&issue_number)
    }

    pub fn worktree(&self) -> &WorktreeController {
        &self.worktree
    }

    /// Turn `issue` into a local commit: open a session, ask the LLM, write
    /// its files and commit. Nothing is pushed.
    pub async fn apply_issue(&mut self, issue: &Issue) -> Result<AppliedChange, TaskError> {
        let request = self.worktree.parse_directive_and_begin_session(issue)?;

        let prompt = build_prompt(&request);
        let completion = self.llm.evaluate(&self.options.model, &prompt).await?;
        self.options
            .debug
            .record(CompletionKind::ChangeResponse, issue.number, &completion);

        let response = parse_change_response(&completion);
        if !response.malformed_segments.is_empty() {
            warn!(
                issue = issue.number,
                count = response.malformed_segments.len(),
                "ignored malformed file segments in LLM response"
            );
        }

        if response.files.is_empty() {
            self.worktree.abort_commit()?;
            info!(issue = issue.number, "LLM response changed no files");
            return Ok(AppliedChange {
                request,
                response,
                commit_id: None,
            });
        }

        for file in &response.files {
            self.worktree.write_or_replace_file(file)?;
        }
        let message = commit_message(&issue.subject, &response.notes, issue.number);
        let commit_id = self.worktree.finish_commit(&message)?;

        info!(
            issue = issue.number,
            files = response.files.len(),
            commit = %commit_id,
            "committed LLM changes"
        );

        Ok(AppliedChange {
            request,
            response,
            commit_id: Some(commit_id),
        })
    }

    /// Full issue flow: claim, commit, push and open a pull request. When
    /// the LLM changes no files, its notes are posted on the issue instead
    /// and `None` is returned.
    pub async fn process_issue(
        &mut self,
        issue: &Issue,
    ) -> Result<Option<ChangeRequestRef>, TaskError> {
        for label in &self.options.required_labels {
            self.hosting.remove_label(issue.number, label).await?;
        }
        self.claimed_issues.insert(issue.number);

        let applied = self.apply_issue(issue).await?;
        if applied.commit_id.is_none() {
            let text = no_changes_comment(&applied.response.notes);
            self.hosting.comment_on_issue(issue.number, &text).await?;
            return Ok(None);
        }

        let branch = branch_name(issue.number);
        self.worktree.push_branch(&branch)?;

        let change_request = self
            .hosting
            .open_change_request(
                &branch,
                &applied.request.base_branch,
                change_request_title(&issue.subject),
                &change_request_body(&applied.response.notes, issue.number),
            )
            .await?;
        info!(
            issue = issue.number,
            branch = %branch,
            url = %change_request.url,
            "opened pull request"
        );

        let note = format!("Opened pull request: {}", change_request.url);
        if let Err(e) = self.hosting.comment_on_issue(issue.number, &note).await {
            warn!(issue = issue.number, error = %e, "failed to link pull request on issue");
        }

        Ok(Some(change_request))
    }

    /// Full review comment flow: ask the LLM, commit a code change if it
    /// made one, and reply in the thread.
    pub async fn process_comment(&mut self, comment: &Comment) -> Result<(), TaskError> {
        if comment.branch.is_empty() {
            return Err(TaskError::MissingBranch {
                comment_id: comment.id,
            });
        }

        let file = self
            .worktree
            .get_file_on_branch(&comment.branch, &comment.file_path)?;
        let request = DiffCommentRequest {
            file,
            comment_body: comment.body.clone(),
            diff_hunk: comment.diff_hunk.clone(),
            change_request_id: comment.change_request_id,
        };

        let prompt = build_diff_comment_prompt(&request);
        let completion = self.llm.evaluate(&self.options.model, &prompt).await?;
        self.options.debug.record(
            CompletionKind::DiffCommentResponse,
            comment.change_request_id,
            &completion,
        );

        let response = parse_diff_comment_response(&completion);
        if !response.malformed_segments.is_empty() {
            warn!(
                comment = comment.id,
                count = response.malformed_segments.len(),
                "ignored malformed file segments in LLM response"
            );
        }

        let reply = match &response.reply {
            DiffCommentReply::Answer { text } => text.clone(),
            DiffCommentReply::CodeChange { file, text } => {
                self.worktree.start_commit()?;
                self.worktree.checkout_remote_branch(&comment.branch)?;
                self.worktree.write_or_replace_file(file)?;
                self.worktree
                    .finish_commit(&format!("address review comment\n\n{}", comment.url))?;
                self.worktree.push_branch(&comment.branch)?;
                info!(
                    comment = comment.id,
                    branch = %comment.branch,
                    path = %file.path,
                    "pushed review fix"
                );
                if text.is_empty() {
                    format!("Updated `{}`.", file.path)
                } else {
                    text.clone()
                }
            }
        };

        self.hosting
            .reply_to_comment(comment.change_request_id, comment.id, &reply)
            .await?;
        Ok(())
    }

    /// Close any session a failed task left open.
    fn recover_worktree(&mut self) {
        if self.worktree.state() == WorktreeState::Idle {
            return;
        }
        if let Err(e) = self.worktree.abort_commit() {
            error!(error = %e, "failed to reset worktree after task failure");
        }
    }
}

#[async_trait]
impl TaskHandler for TaskRunner {
    async fn handle_issue(&mut self, issue: Issue) {
        info!(issue = issue.number, subject = %issue.subject, "processing issue");
        let Err(e) = self.process_issue(&issue).await else {
            return;
        };

        error!(issue = issue.number, error = %e, "failed to process issue");
        self.recover_worktree();

        let text = format!("issuesmith failed to process this issue: {}", e);
        if let Err(e) = self.hosting.comment_on_issue(issue.number, &text).await {
            error!(issue = issue.number, error = %e, "failed to report issue failure");
        }
    }

    async fn handle_comment(&mut self, comment: Comment) {
        info!(
            comment = comment.id,
            pr = comment.change_request_id,
            "processing review comment"
        );
        let Err(e) = self.process_comment(&comment).await else {
            return;
        };

        error!(comment = comment.id, error = %e, "failed to process comment");
        self.recover_worktree();

        let text = format!("issuesmith failed to process this comment: {}", e);
        if let Err(e) = self
            .hosting
            .reply_to_comment(comment.change_request_id, comment.id, &text)
            .await
        {
            error!(comment = comment.id, error = %e, "failed to report comment failure");
        }
    }
}

/// `issuesmith/issue-{n}-{8 hex}`. The random suffix keeps reruns of the
/// same issue from colliding.
pub fn branch_name(issue_number: u64) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}/issue-{}-{}", BRANCH_PREFIX, issue_number, &id[..8])
}

pub fn commit_message(subject: &str, notes: &str, issue_number: u64) -> String {
    format!("{}\n\n{}\n\nResolves #{}", subject, notes, issue_number)
}

pub fn change_request_title(subject: &str) -> &str {
    let subject = subject.trim();
    if subject.is_empty() {
        DEFAULT_TITLE
    } else {
        subject
    }
}

pub fn change_request_body(notes: &str, issue_number: u64) -> String {
    format!("{}\n\nResolves #{}", notes, issue_number)
}

fn no_changes_comment(notes: &str) -> String {
    let notes = notes.trim();
    if notes.is_empty() {
        "issuesmith made no file changes for this issue.".to_string()
    } else {
        format!("issuesmith made no file changes for this issue.\n\n{}", notes)
    }
}
