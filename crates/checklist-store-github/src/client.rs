use async_trait::async_trait;
use checklist_store_core::{
    decode_content, encode_content, parse_document, serialize_document, Document, DocumentStore,
    Snapshot, StoreError, VersionToken,
};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GithubConfig;

const ACCEPT: &str = "application/vnd.github+json";
/// Media type returning the file bytes; needed once a file exceeds the
/// inline content limit (1 MB), where the JSON body carries no content.
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("checklist-sync/", env!("CARGO_PKG_VERSION"));

/// Body of a successful contents GET.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Body of a contents PUT.
#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Document store backed by a single file in a hosted repository.
///
/// Every successful write is a commit whose message is the change
/// description. The file's blob SHA is the version token; the API refuses
/// a write whose `sha` is not the file's current one.
pub struct GithubContentsStore {
    http_client: HttpClient,
    config: GithubConfig,
    url: String,
}

impl GithubContentsStore {
    /// Create a new contents store.
    pub fn new(config: GithubConfig) -> Self {
        let url = config.contents_url();
        Self {
            http_client: HttpClient::new(),
            config,
            url,
        }
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder, accept: &str) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    /// Fetch the file bytes directly, for files too large to inline.
    async fn load_raw(&self) -> Result<String, StoreError> {
        debug!("Document {} is not inlined, fetching raw content", self.config.path);
        let response = self
            .authorized(self.http_client.get(&self.url), ACCEPT_RAW)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(format!("Raw contents GET request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Fetch(format!(
                "Raw contents GET failed with status {}: {}",
                status,
                Self::error_message(&text)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Fetch(format!("Raw contents body failed: {}", e)))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::Decode(format!("{} is not valid UTF-8: {}", self.config.path, e)))
    }

    /// Best-effort extraction of the API's error message.
    fn error_message(text: &str) -> String {
        match serde_json::from_str::<ApiError>(text) {
            Ok(err) if !err.message.is_empty() => err.message,
            _ => text.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for GithubContentsStore {
    fn backend_name(&self) -> &'static str {
        "github"
    }

    #[instrument(skip(self), level = "debug", fields(path = %self.config.path))]
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let response = self
            .authorized(self.http_client.get(&self.url), ACCEPT)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(format!("Contents GET request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Document {} not found in {}/{}", self.config.path, self.config.owner, self.config.repo);
            return Ok(None);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Fetch(format!(
                "Contents GET failed with status {}: {}",
                status,
                Self::error_message(&text)
            )));
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("Invalid contents response: {}", e)))?;

        let text = match body.encoding.as_deref() {
            None | Some("base64") => decode_content(&body.content)?,
            // Too large to inline. The raw read happens after the metadata
            // read, so its bytes are never older than `sha`; a newer file
            // makes the next save conflict.
            Some("none") => self.load_raw().await?,
            Some(other) => {
                return Err(StoreError::Decode(format!(
                    "Unsupported content encoding {:?} for {}",
                    other, self.config.path
                )))
            }
        };
        let document = parse_document(&text)?;

        debug!("Contents GET {} ({} bytes) at {}", self.config.path, text.len(), body.sha);
        Ok(Some(Snapshot {
            document,
            version: VersionToken::new(body.sha),
        }))
    }

    #[instrument(skip(self, document), level = "debug", fields(path = %self.config.path))]
    async fn save(
        &self,
        document: &Document,
        expected: Option<&VersionToken>,
        description: &str,
    ) -> Result<(), StoreError> {
        let text = serialize_document(document)?;
        let body = PutContentsRequest {
            message: description,
            content: encode_content(&text),
            sha: expected.map(VersionToken::as_str),
        };

        let response = self
            .authorized(self.http_client.put(&self.url), ACCEPT)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Write(format!("Contents PUT request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            debug!("Contents PUT {} ({} bytes): {}", self.config.path, text.len(), description);
            return Ok(());
        }

        let message = Self::error_message(&response.text().await.unwrap_or_default());

        // 409: sha does not match. 422 naming "sha": the file exists but no
        // sha was sent, i.e. someone else created it first.
        let conflict = status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("sha"));
        if conflict {
            warn!("Contents PUT rejected as stale ({}): {}", status, message);
            return Err(StoreError::Conflict(format!(
                "{} was changed by another writer: {}",
                self.config.path, message
            )));
        }

        Err(StoreError::Write(format!(
            "Contents PUT failed with status {}: {}",
            status, message
        )))
    }
}
