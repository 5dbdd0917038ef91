//! The `issuesmith.toml` file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [bot]
//! handle = "smith-bot"
//! email = "smith-bot@example.com"
//!
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! debug_dir = "/tmp/issuesmith-debug"
//!
//! [service]
//! poll_interval_secs = 30
//! queue_capacity = 100
//! workdir = "/tmp/issuesmith"
//!
//! [[repositories]]
//! owner = "octo-org"
//! name = "widgets"
//! authors = ["octocat"]
//! required_labels = ["issuesmith"]
//! ```
//!
//! Secrets (`GITHUB_TOKEN`, `OPENAI_API_KEY`) never live in this file; see
//! [`crate::config`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hosting::github::DEFAULT_API_BASE;
use crate::llm::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::queue::DEFAULT_CAPACITY;

pub const CONFIG_FILE_NAME: &str = "issuesmith.toml";

/// Identity the bot commits and comments as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSection {
    #[serde(default = "default_handle")]
    pub handle: String,
    #[serde(default = "default_email")]
    pub email: String,
}

fn default_handle() -> String {
    "issuesmith".to_string()
}

fn default_email() -> String {
    "issuesmith@localhost".to_string()
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            handle: default_handle(),
            email: default_email(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// OpenAI-compatible API root
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Raw completions are dumped here when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            debug_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum tasks queued per repository
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Parent directory of the local clones
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_queue_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_workdir() -> PathBuf {
    PathBuf::from("/tmp/issuesmith")
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            queue_capacity: default_queue_capacity(),
            workdir: default_workdir(),
        }
    }
}

/// One watched repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySection {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Overrides the `https://{host}/{owner}/{name}.git` clone URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
    /// Overrides `{workdir}/{owner}/{name}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Handles whose issues and comments are acted on
    #[serde(default)]
    pub authors: Vec<String>,
    /// Labels an issue must carry; removed when the bot claims it
    #[serde(default)]
    pub required_labels: Vec<String>,
}

fn default_host() -> String {
    "github.com".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl RepositorySection {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            host: default_host(),
            api_base: default_api_base(),
            clone_url: None,
            local_path: None,
            authors: Vec::new(),
            required_labels: Vec::new(),
        }
    }

    /// `owner/name`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn clone_url(&self) -> String {
        self.clone_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/{}/{}.git", self.host, self.owner, self.name))
    }

    pub fn local_path(&self, workdir: &Path) -> PathBuf {
        self.local_path
            .clone()
            .unwrap_or_else(|| workdir.join(&self.owner).join(&self.name))
    }
}

/// The complete issuesmith.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuesmithToml {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub repositories: Vec<RepositorySection>,
}

impl IssuesmithToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse issuesmith.toml")
    }

    /// Returns default configuration if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content =
            toml::to_string_pretty(self).context("Failed to serialize issuesmith.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Look a repository up by `owner/name`, ignoring case.
    pub fn repository(&self, slug: &str) -> Option<&RepositorySection> {
        self.repositories
            .iter()
            .find(|r| r.slug().eq_ignore_ascii_case(slug))
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.repositories.is_empty() {
            warnings.push("No [[repositories]] configured; nothing will be polled".to_string());
        }
        if self.service.poll_interval_secs == 0 {
            warnings.push("service.poll_interval_secs is 0; the loop will spin".to_string());
        }
        if self.service.queue_capacity == 0 {
            warnings.push("service.queue_capacity is 0; no task can ever be queued".to_string());
        }
        if self.llm.model.trim().is_empty() {
            warnings.push("llm.model is empty".to_string());
        }

        for repo in &self.repositories {
            if !is_valid_slug_part(&repo.owner) || !is_valid_slug_part(&repo.name) {
                warnings.push(format!("Invalid repository '{}'", repo.slug()));
            }
            if repo.required_labels.is_empty() {
                warnings.push(format!(
                    "Repository '{}' has no required_labels; issues are only marked as handled until restart",
                    repo.slug()
                ));
            }
            if repo.authors.is_empty() {
                warnings.push(format!(
                    "Repository '{}' has no authors; no issue or comment will be picked up",
                    repo.slug()
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for repo in &self.repositories {
            if !seen.insert(repo.slug().to_lowercase()) {
                warnings.push(format!("Repository '{}' is listed twice", repo.slug()));
            }
        }

        warnings
    }
}

/// `$XDG_CONFIG_HOME/issuesmith/issuesmith.toml`, or `./issuesmith.toml`
/// when there is no config directory.
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("issuesmith").join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Split `owner/name`.
pub fn parse_repo_slug(slug: &str) -> Option<(&str, &str)> {
    let (owner, name) = slug.trim().split_once('/')?;
    let name = name.trim_end_matches(".git");
    if is_valid_slug_part(owner) && is_valid_slug_part(name) {
        Some((owner, name))
    } else {
        None
    }
}

fn is_valid_slug_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
