use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::hosting::github::is_valid_github_token;
use crate::settings::{IssuesmithToml, default_config_path};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "ISSUESMITH_MODEL";
pub const POLL_INTERVAL_ENV: &str = "ISSUESMITH_POLL_INTERVAL";

/// Values given on the command line. They win over env and file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub verbose: bool,
}

/// Runtime configuration.
///
/// Layers `issuesmith.toml` (file), environment and CLI flags, in that order
/// of increasing precedence. Secrets only come from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub toml: IssuesmithToml,
    pub model: String,
    pub poll_interval: Duration,
    pub verbose: bool,
    github_token: Option<String>,
    openai_api_key: Option<String>,
}

impl Config {
    /// Load from `path` (or the default location) and the process
    /// environment. A missing file yields the defaults.
    pub fn load(path: Option<PathBuf>, overrides: CliOverrides) -> Result<Self> {
        let path = path.unwrap_or_else(default_config_path);
        let toml = IssuesmithToml::load_or_default(&path)?;
        Self::resolve(path, toml, overrides, |key| std::env::var(key).ok())
    }

    /// Apply env (through `lookup`) and CLI layers on top of a parsed file.
    pub fn resolve(
        path: PathBuf,
        toml: IssuesmithToml,
        overrides: CliOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = overrides
            .model
            .or_else(|| lookup(MODEL_ENV))
            .unwrap_or_else(|| toml.llm.model.clone());

        let env_interval = match lookup(POLL_INTERVAL_ENV) {
            Some(raw) => Some(raw.trim().parse::<u64>().with_context(|| {
                format!("{} must be a number of seconds, got '{}'", POLL_INTERVAL_ENV, raw)
            })?),
            None => None,
        };
        let poll_interval_secs = overrides
            .poll_interval_secs
            .or(env_interval)
            .unwrap_or(toml.service.poll_interval_secs);

        Ok(Self {
            path,
            model,
            poll_interval: Duration::from_secs(poll_interval_secs),
            verbose: overrides.verbose,
            github_token: lookup(GITHUB_TOKEN_ENV),
            openai_api_key: lookup(OPENAI_API_KEY_ENV),
            toml,
        })
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    pub fn require_github_token(&self) -> Result<&str> {
        self.github_token()
            .with_context(|| format!("{} is not set", GITHUB_TOKEN_ENV))
    }

    pub fn require_openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .with_context(|| format!("{} is not set", OPENAI_API_KEY_ENV))
    }

    /// File warnings plus credential checks.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();

        match self.github_token() {
            None => warnings.push(format!("{} is not set", GITHUB_TOKEN_ENV)),
            Some(token) if !is_valid_github_token(token) => warnings.push(format!(
                "{} does not look like a GitHub token",
                GITHUB_TOKEN_ENV
            )),
            Some(_) => {}
        }
        if self.openai_api_key.is_none() {
            warnings.push(format!("{} is not set", OPENAI_API_KEY_ENV));
        }

        warnings
    }
}
