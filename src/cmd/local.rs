//! `issuesmith local-issue`: run the issue flow against a locally written
//! issue. Nothing is posted to the hosting server.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use issuesmith::config::Config;
use issuesmith::hosting::Issue;
use issuesmith::orchestrator::TaskRunner;
use issuesmith::orchestrator::handler::branch_name;
use issuesmith::settings::{RepositorySection, parse_repo_slug};

use super::{bot_author, github_client, llm_client, open_worktree, runner_options};

pub async fn cmd_local_issue(
    config: &Config,
    repo: &str,
    subject: &str,
    body_file: &Path,
    number: u64,
    push: bool,
) -> Result<()> {
    let repo = match config.toml.repository(repo) {
        Some(section) => section.clone(),
        None => {
            let (owner, name) = parse_repo_slug(repo)
                .with_context(|| format!("Invalid repository '{}': expected owner/name", repo))?;
            RepositorySection::new(owner, name)
        }
    };
    let body = std::fs::read_to_string(body_file)
        .with_context(|| format!("Failed to read issue body: {}", body_file.display()))?;

    let issue = Issue {
        number,
        subject: subject.to_string(),
        body,
        url: String::new(),
        author: bot_author(config),
    };

    // Only used for pushes; listing and commenting never happen here.
    let hosting = Arc::new(github_client(
        config,
        &repo,
        config.github_token().unwrap_or_default(),
    ));
    let llm = llm_client(config)?;
    let worktree = open_worktree(config, &repo)?;
    let mut runner = TaskRunner::new(hosting, llm, worktree, runner_options(config, &repo));

    let applied = runner
        .apply_issue(&issue)
        .await
        .context("Failed to process local issue")?;

    println!();
    println!("{}", applied.response);
    if !applied.response.malformed_segments.is_empty() {
        println!(
            "Ignored {} malformed segment(s) in the LLM response.",
            applied.response.malformed_segments.len()
        );
    }
    let Some(commit_id) = &applied.commit_id else {
        println!("No files changed; nothing committed.");
        println!();
        return Ok(());
    };
    println!(
        "Committed {} in {}",
        commit_id,
        runner.worktree().local_path().display()
    );

    if push {
        let branch = branch_name(number);
        runner
            .worktree()
            .push_branch(&branch)
            .with_context(|| format!("Failed to push {}", branch))?;
        println!("Pushed branch {}", branch);
    }
    println!();

    Ok(())
}
