//! `issuesmith list-issues` and `issuesmith list-comments`

use anyhow::{Context, Result};

use issuesmith::config::Config;
use issuesmith::hosting::HostingClient;

use super::{comment_filter, github_client, issue_filter};

pub async fn cmd_list_issues(config: &Config) -> Result<()> {
    let token = config.require_github_token()?;

    for repo in &config.toml.repositories {
        let client = github_client(config, repo, token);
        let issues = client
            .list_open_issues(&issue_filter(repo))
            .await
            .with_context(|| format!("Failed to list issues for {}", repo.slug()))?;

        println!();
        println!("{} ({} issue(s))", repo.slug(), issues.len());
        println!("{}", "=".repeat(repo.slug().len()));
        for issue in &issues {
            println!();
            print!("{}", issue);
        }
    }
    println!();

    Ok(())
}

pub async fn cmd_list_comments(config: &Config) -> Result<()> {
    let token = config.require_github_token()?;

    for repo in &config.toml.repositories {
        let client = github_client(config, repo, token);
        let comments = client
            .list_open_comments(&comment_filter(repo))
            .await
            .with_context(|| format!("Failed to list comments for {}", repo.slug()))?;

        println!();
        println!("{} ({} comment(s))", repo.slug(), comments.len());
        println!("{}", "=".repeat(repo.slug().len()));
        for comment in &comments {
            println!();
            print!("{}", comment);
        }
    }
    println!();

    Ok(())
}
