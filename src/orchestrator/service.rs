//! Timer loop over every configured repository.

use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use super::repository::{CycleSummary, RepositoryOrchestrator};

pub struct ServiceLoop {
    repositories: Vec<RepositoryOrchestrator>,
    interval: Duration,
}

impl ServiceLoop {
    pub fn new(repositories: Vec<RepositoryOrchestrator>, interval: Duration) -> Self {
        Self {
            repositories,
            interval,
        }
    }

    pub fn repositories(&self) -> &[RepositoryOrchestrator] {
        &self.repositories
    }

    /// One poll-then-drain cycle per repository, in order.
    pub async fn run_once(&mut self) -> Vec<CycleSummary> {
        let mut summaries = Vec::with_capacity(self.repositories.len());
        for repo in &mut self.repositories {
            summaries.push(repo.poll_once().await);
        }
        summaries
    }

    /// Cycle until `shutdown` turns true. A cycle in progress always runs to
    /// completion; the flag is checked between repositories and wakes the
    /// sleep between cycles.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            repositories = self.repositories.len(),
            interval_secs = self.interval.as_secs(),
            "service loop started"
        );

        'outer: loop {
            if *shutdown.borrow() {
                break;
            }
            for repo in &mut self.repositories {
                if *shutdown.borrow() {
                    break 'outer;
                }
                repo.poll_once().await;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    // Sender dropped: nobody can ask us to stop, keep polling on the timer.
                    if changed.is_err() {
                        tokio::time::sleep(self.interval).await;
                    }
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("service loop stopped");
    }
}

/// A shutdown flag that flips on Ctrl-C.
pub fn ctrl_c_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; finishing current cycle");
            let _ = tx.send(true);
        }
    });
    rx
}
