//! Model hub client
//!
//! A small client for the Hugging Face Hub REST API, enough to fetch a full
//! repository snapshot file by file.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{ClientError, Result};

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
const DEFAULT_REVISION: &str = "main";

/// Model hub operations needed to take a snapshot of a repository
#[async_trait]
pub trait ModelHub: Send + Sync {
    /// Lists the files of a model repository, as paths relative to its root
    async fn list_files(&self, repo_id: &str) -> Result<Vec<String>>;

    /// Downloads one repository file to `dest`
    ///
    /// # Returns
    /// Number of bytes written
    async fn download_file(&self, repo_id: &str, filename: &str, dest: &Path) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
struct Sibling {
    rfilename: String,
}

/// HTTP implementation of [`ModelHub`]
#[derive(Debug, Clone)]
pub struct HubClient {
    /// Base URL of the hub (e.g., "https://huggingface.co")
    endpoint: String,
    /// Branch, tag or commit to read from
    revision: String,
    /// Access token for gated or private repositories
    token: Option<String>,
    client: Client,
}

impl HubClient {
    /// Creates a client for the public hub, reading the `main` revision
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            revision: DEFAULT_REVISION.to_string(),
            token: None,
            client: Client::new(),
        }
    }

    /// Creates a client from `HF_ENDPOINT` and `HF_TOKEN`
    ///
    /// `HUGGING_FACE_HUB_TOKEN` is accepted as a fallback for the token.
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let token = std::env::var("HF_TOKEN")
            .or_else(|_| std::env::var("HUGGING_FACE_HUB_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());

        let client = Self::with_endpoint(endpoint);
        match token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn repo_info_url(&self, repo_id: &str) -> String {
        format!(
            "{}/api/models/{}/revision/{}",
            self.endpoint, repo_id, self.revision
        )
    }

    fn resolve_url(&self, repo_id: &str, filename: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, repo_id, self.revision, filename
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Checks the status code and turns failures into client errors
    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 404 {
            return Err(ClientError::NotFound(what.to_string()));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::api_error(status.as_u16(), error_text))
    }
}

impl Default for HubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelHub for HubClient {
    async fn list_files(&self, repo_id: &str) -> Result<Vec<String>> {
        let url = self.repo_info_url(repo_id);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response, repo_id).await?;

        let info: RepoInfo = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse repo info: {}", e)))?;

        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    async fn download_file(&self, repo_id: &str, filename: &str, dest: &Path) -> Result<u64> {
        let url = self.resolve_url(repo_id, filename);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let mut response = Self::ensure_success(response, filename).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(dest);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, dest).await?;
        debug!("Downloaded {} ({} bytes)", filename, written);

        Ok(written)
    }
}

/// Download target used until the file is complete
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".incomplete");
    dest.with_file_name(name)
}
