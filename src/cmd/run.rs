//! `issuesmith run`

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use issuesmith::config::Config;
use issuesmith::orchestrator::ServiceLoop;
use issuesmith::orchestrator::service::ctrl_c_shutdown;

use super::{build_orchestrator, llm_client};

pub async fn cmd_run(config: &Config, once: bool) -> Result<()> {
    if config.toml.repositories.is_empty() {
        bail!(
            "No repositories configured in {}. Run 'issuesmith config init' and add a [[repositories]] entry.",
            config.path.display()
        );
    }
    for warning in config.validate() {
        warn!("{}", warning);
    }

    let llm = llm_client(config)?;
    let mut orchestrators = Vec::with_capacity(config.toml.repositories.len());
    for repo in &config.toml.repositories {
        let orchestrator = build_orchestrator(config, repo, llm.clone())
            .with_context(|| format!("Failed to set up {}", repo.slug()))?;
        info!(repo = %repo.slug(), "repository ready");
        orchestrators.push(orchestrator);
    }

    let mut service = ServiceLoop::new(orchestrators, config.poll_interval);

    if once {
        let summaries = service.run_once().await;
        for (repo, summary) in service.repositories().iter().zip(summaries) {
            println!(
                "{}: {} issue(s), {} comment(s) handled, {} deferred",
                repo.name(),
                summary.handled.issues,
                summary.handled.comments,
                summary.deferred
            );
        }
    } else {
        service.run(ctrl_c_shutdown()).await;
    }

    Ok(())
}
