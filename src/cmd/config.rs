//! Configuration view and validation commands: `issuesmith config`.

use std::path::PathBuf;

use anyhow::Result;

use issuesmith::config::{CliOverrides, Config};
use issuesmith::settings::{IssuesmithToml, default_config_path};

use super::super::ConfigCommands;

pub fn cmd_config(
    path: Option<PathBuf>,
    overrides: CliOverrides,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config_path = path.unwrap_or_else(default_config_path);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("issuesmith Configuration");
            println!("========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No issuesmith.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let config = Config::load(Some(config_path.clone()), overrides)?;
            let toml = &config.toml;

            println!("[bot]");
            println!("  handle = \"{}\"", toml.bot.handle);
            println!("  email = \"{}\"", toml.bot.email);
            println!();

            println!("[llm]");
            println!("  base_url = \"{}\"", toml.llm.base_url);
            println!("  model = \"{}\"", toml.llm.model);
            if let Some(dir) = &toml.llm.debug_dir {
                println!("  debug_dir = \"{}\"", dir.display());
            }
            println!();

            println!("[service]");
            println!("  poll_interval_secs = {}", toml.service.poll_interval_secs);
            println!("  queue_capacity = {}", toml.service.queue_capacity);
            println!("  workdir = \"{}\"", toml.service.workdir.display());
            println!();

            for repo in &toml.repositories {
                println!("[[repositories]] {}", repo.slug());
                println!("  clone_url = \"{}\"", repo.clone_url());
                println!(
                    "  local_path = \"{}\"",
                    repo.local_path(&toml.service.workdir).display()
                );
                println!("  api_base = \"{}\"", repo.api_base);
                println!("  authors = {:?}", repo.authors);
                println!("  required_labels = {:?}", repo.required_labels);
                println!();
            }

            println!("Effective values (with env/CLI overrides):");
            println!("  model = \"{}\"", config.model);
            println!("  poll_interval = {}s", config.poll_interval.as_secs());
            println!(
                "  GITHUB_TOKEN = {}",
                if config.github_token().is_some() { "set" } else { "not set" }
            );
            println!(
                "  OPENAI_API_KEY = {}",
                if config.require_openai_api_key().is_ok() { "set" } else { "not set" }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = Config::load(Some(config_path), overrides)?;
            let warnings = config.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("issuesmith.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            IssuesmithToml::default().save(&config_path)?;

            println!("Created issuesmith.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [bot] handle, email");
            println!("  - [llm] base_url, model, debug_dir");
            println!("  - [service] poll_interval_secs, queue_capacity, workdir");
            println!("  - [[repositories]] owner, name, authors, required_labels");
            println!();
            println!("Secrets are read from GITHUB_TOKEN and OPENAI_API_KEY.");
            println!();
        }
    }

    Ok(())
}
