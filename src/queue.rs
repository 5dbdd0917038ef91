//! Deduplicating FIFO of pending work for one repository.
//!
//! An issue is locked by its number and a review comment by its pull request
//! number from the moment it is queued until its handler returns. Pushing a
//! locked entity is a no-op, so a poll that rediscovers in-flight work does
//! not queue it twice.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::hosting::{Comment, Issue};

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Issue(Issue),
    Comment(Comment),
}

/// Result of offering a task to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The issue or pull request is already queued or being handled.
    AlreadyQueued,
    /// The queue is at capacity; the entity is left for the next poll.
    Full,
}

/// Counts of tasks handled by one [`TaskQueue::drain_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub issues: usize,
    pub comments: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.issues + self.comments
    }
}

/// The two callbacks invoked while draining.
#[async_trait]
pub trait TaskHandler: Send {
    async fn handle_issue(&mut self, issue: Issue);
    async fn handle_comment(&mut self, comment: Comment);
}

#[derive(Debug, Default)]
struct Inner {
    tasks: VecDeque<Task>,
    locked_issues: HashSet<u64>,
    locked_prs: HashSet<u64>,
}

#[derive(Debug)]
pub struct TaskQueue {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TaskQueue {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "creating task queue");
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    // A panic while holding the lock leaves the sets consistent, so poisoning
    // is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_issue(&self, issue: Issue) -> PushOutcome {
        let mut inner = self.lock();
        if inner.locked_issues.contains(&issue.number) {
            debug!(issue = issue.number, "issue already queued");
            return PushOutcome::AlreadyQueued;
        }
        if inner.tasks.len() >= self.capacity {
            warn!(issue = issue.number, capacity = self.capacity, "task queue full; deferring issue");
            return PushOutcome::Full;
        }
        inner.locked_issues.insert(issue.number);
        inner.tasks.push_back(Task::Issue(issue));
        PushOutcome::Queued
    }

    pub fn push_comment(&self, comment: Comment) -> PushOutcome {
        let mut inner = self.lock();
        let pr = comment.change_request_id;
        if inner.locked_prs.contains(&pr) {
            debug!(pr, comment = comment.id, "pull request already queued");
            return PushOutcome::AlreadyQueued;
        }
        if inner.tasks.len() >= self.capacity {
            warn!(pr, capacity = self.capacity, "task queue full; deferring comment");
            return PushOutcome::Full;
        }
        inner.locked_prs.insert(pr);
        inner.tasks.push_back(Task::Comment(comment));
        PushOutcome::Queued
    }

    /// Take the oldest task. Its lock is held until [`release`](Self::release).
    pub fn pop(&self) -> Option<Task> {
        self.lock().tasks.pop_front()
    }

    pub fn release(&self, task: &Task) {
        let mut inner = self.lock();
        match task {
            Task::Issue(issue) => {
                inner.locked_issues.remove(&issue.number);
            }
            Task::Comment(comment) => {
                inner.locked_prs.remove(&comment.change_request_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_locked_issue(&self, number: u64) -> bool {
        self.lock().locked_issues.contains(&number)
    }

    pub fn is_locked_pr(&self, number: u64) -> bool {
        self.lock().locked_prs.contains(&number)
    }

    /// Hand every queued task to `handler`, oldest first, releasing each lock
    /// once its handler returns. Tasks pushed while draining are handled in
    /// the same pass.
    pub async fn drain_all<H>(&self, handler: &mut H) -> DrainSummary
    where
        H: TaskHandler + ?Sized,
    {
        let mut summary = DrainSummary::default();

        while let Some(task) = self.pop() {
            match &task {
                Task::Issue(issue) => {
                    handler.handle_issue(issue.clone()).await;
                    info!(issue = issue.number, "finished processing issue");
                    summary.issues += 1;
                }
                Task::Comment(comment) => {
                    handler.handle_comment(comment.clone()).await;
                    info!(
                        pr = comment.change_request_id,
                        comment = comment.id,
                        "finished processing comment"
                    );
                    summary.comments += 1;
                }
            }
            self.release(&task);
        }

        summary
    }
}
