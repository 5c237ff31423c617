use std::path::PathBuf;
use std::sync::Arc;

use checklist_store_core::{DocumentStore, InMemoryStore};
use checklist_store_github::{
    GithubConfig, GithubContentsStore, DEFAULT_API_BASE_URL, DEFAULT_DOCUMENT_PATH,
};
use checklist_store_local::LocalFileStore;
use clap::Parser;
use tracing::{info, warn};

use crate::commands::Command;

/// Configuration for the checklist-sync client.
#[derive(Parser, Debug, Clone)]
#[command(name = "checklist-sync")]
#[command(about = "Checklist compliance store client: checklists, submissions, reports")]
pub struct Config {
    /// Where the document is kept
    #[arg(long, value_enum, default_value = "github", env = "CHECKLIST_BACKEND")]
    pub backend: Backend,

    /// Repository owner
    #[arg(long, env = "GITHUB_OWNER")]
    pub github_owner: Option<String>,

    /// Repository name
    #[arg(long, env = "GITHUB_REPO")]
    pub github_repo: Option<String>,

    /// Token with contents read/write permission
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Document path inside the repository
    #[arg(long, default_value = DEFAULT_DOCUMENT_PATH, env = "CHECKLIST_DOCUMENT_PATH")]
    pub document_path: String,

    /// API root URL
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "GITHUB_API_URL")]
    pub github_api_url: String,

    /// Document file for the local backend
    #[arg(long, env = "CHECKLIST_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// How many times an edit is replayed after conflicting writes
    #[arg(long, default_value = "3", env = "CHECKLIST_WRITE_ATTEMPTS")]
    pub write_attempts: usize,

    /// Identity recorded as submitter (defaults to a fresh UUID)
    #[arg(long, env = "CHECKLIST_USER_ID")]
    pub user_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Repository settings, if all of owner, repo and token are present.
    pub fn github_config(&self) -> Option<GithubConfig> {
        match (&self.github_owner, &self.github_repo, &self.github_token) {
            (Some(owner), Some(repo), Some(token)) => Some(
                GithubConfig::new(owner, repo, token, &self.document_path)
                    .with_api_base_url(&self.github_api_url),
            ),
            _ => None,
        }
    }

    /// Get the effective local document file.
    pub fn effective_data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(LocalFileStore::default_path)
    }

    /// Build the configured store.
    ///
    /// A `github` backend without credentials falls back to an in-memory
    /// store whose contents are lost on exit.
    pub fn build_store(&self) -> Arc<dyn DocumentStore> {
        match self.backend {
            Backend::Github => match self.github_config() {
                Some(github) => {
                    let store = GithubContentsStore::new(github);
                    let github = store.config();
                    info!(
                        "  Repository: {}/{} ({})",
                        github.owner, github.repo, github.path
                    );
                    Arc::new(store)
                }
                None => {
                    warn!(
                        "Repository configuration not provided. Using in-memory data; \
                         all changes will be lost on exit."
                    );
                    Arc::new(InMemoryStore::new())
                }
            },
            Backend::Local => {
                let path = self.effective_data_file();
                info!("  Data file: {}", path.display());
                Arc::new(LocalFileStore::new(path))
            }
            Backend::Memory => Arc::new(InMemoryStore::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Github,
    Local,
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Github => write!(f, "github"),
            Backend::Local => write!(f, "local"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}
