use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use issuesmith::config::{CliOverrides, Config};
use issuesmith::logging::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "issuesmith")]
#[command(version, about = "LLM collaborator that turns issues into pull requests")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to issuesmith.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// LLM model. Overrides ISSUESMITH_MODEL and the config file.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Seconds between polls. Overrides ISSUESMITH_POLL_INTERVAL and the config file.
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every configured repository and act on new issues and comments
    Run {
        /// Do a single pass and exit
        #[arg(long)]
        once: bool,
    },
    /// Show the issues the next poll would pick up
    ListIssues,
    /// Show the review comments the next poll would pick up
    ListComments,
    /// Process an issue defined in a local file instead of on the server
    LocalIssue {
        /// Repository as owner/name
        #[arg(long)]
        repo: String,
        #[arg(long)]
        subject: String,
        /// File holding the issue body (directive trailer allowed)
        #[arg(long)]
        body_file: PathBuf,
        /// Issue number used in the commit message and branch name
        #[arg(long, default_value_t = 0)]
        number: u64,
        /// Push the result to a new branch
        #[arg(long)]
        push: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default issuesmith.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_format, cli.log_dir.as_deref(), cli.verbose)?;

    let overrides = CliOverrides {
        model: cli.model.clone(),
        poll_interval_secs: cli.poll_interval,
        verbose: cli.verbose,
    };

    match &cli.command {
        Commands::Config { command } => {
            cmd::cmd_config(cli.config.clone(), overrides, command.clone())?;
        }
        Commands::Run { once } => {
            let config = Config::load(cli.config.clone(), overrides)?;
            cmd::cmd_run(&config, *once).await?;
        }
        Commands::ListIssues => {
            let config = Config::load(cli.config.clone(), overrides)?;
            cmd::cmd_list_issues(&config).await?;
        }
        Commands::ListComments => {
            let config = Config::load(cli.config.clone(), overrides)?;
            cmd::cmd_list_comments(&config).await?;
        }
        Commands::LocalIssue {
            repo,
            subject,
            body_file,
            number,
            push,
        } => {
            let config = Config::load(cli.config.clone(), overrides)?;
            cmd::cmd_local_issue(&config, repo, subject, body_file, *number, *push).await?;
        }
    }

    Ok(())
}
