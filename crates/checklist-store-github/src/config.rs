/// Default API root for the hosted service.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default location of the document inside the repository.
pub const DEFAULT_DOCUMENT_PATH: &str = "data/db.json";

/// Where the document lives and how to authenticate.
#[derive(Clone)]
pub struct GithubConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Bearer credential with contents read/write permission
    pub token: String,
    /// File path inside the repository, e.g. `data/db.json`
    pub path: String,
    /// API root; overridden in tests and for self-hosted instances
    pub api_base_url: String,
}

impl GithubConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            path: path.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Full URL of the contents endpoint for the document.
    ///
    /// Each path segment is percent-encoded; separators are kept.
    pub fn contents_url(&self) -> String {
        let path = self
            .path
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            path
        )
    }
}

// The credential must never end up in logs.
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("path", &self.path)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}
