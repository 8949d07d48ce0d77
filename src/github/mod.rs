//! GitHub REST access used by the repository inspector.
//!
//! [`RepositoryHost`] is the seam the inspector depends on; [`GitHubClient`]
//! is the production implementation over `reqwest`.

use crate::error::{ServiceError, Result};
use crate::reference::RepositoryReference;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Default GitHub REST API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Repository metadata; only the default branch is needed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Branch the tree listing is taken from
    pub default_branch: String,
}

/// One entry of a recursive git tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root
    pub path: String,
    /// `blob`, `tree` or `commit`
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

/// Response of the contents endpoint for a single path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 content, present for files
    #[serde(default)]
    pub content: Option<String>,
    /// Content encoding reported by GitHub
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Read access to a repository hosting service
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetches repository metadata
    async fn get_repository(&self, reference: &RepositoryReference) -> Result<RepositoryMetadata>;

    /// Fetches the full recursive tree of `branch`, in upstream order
    async fn get_tree(&self, reference: &RepositoryReference, branch: &str) -> Result<Vec<TreeEntry>>;

    /// Fetches a single path through the contents endpoint
    async fn get_file_content(&self, reference: &RepositoryReference, path: &str) -> Result<FileContent>;
}

/// GitHub REST client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    /// Creates a client against `api_base`, optionally authenticated with `token`
    pub fn new(api_base: impl Into<String>, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("readmeservice"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(GITHUB_API_VERSION));

        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| ServiceError::Config(format!("Invalid GitHub token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let api_base = api_base.into();
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| ServiceError::Config(format!("Invalid GitHub API base {}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ServiceError::Config(format!("Invalid GitHub API base: {}", api_base)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, api_base })
    }

    /// Appends `segments` to the API base, percent-encoding each one
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_endpoint<'a>(&self, reference: &'a RepositoryReference, rest: &[&'a str]) -> Url {
        let segments = ["repos", reference.owner.as_str(), reference.name.as_str()];
        self.endpoint(segments.into_iter().chain(rest.iter().copied()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, reference: &RepositoryReference) -> Result<T> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("GitHub request to {} failed: {}", url, e);
            ServiceError::Upstream { status: None, message: e.to_string() }
        })?;

        let response = check_status(response, reference).await?;

        response.json::<T>().await.map_err(|e| ServiceError::Upstream {
            status: None,
            message: format!("Unexpected response format: {}", e),
        })
    }
}

async fn check_status(response: Response, reference: &RepositoryReference) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound(reference.to_string()));
    }

    let message = match response.json::<ApiMessage>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };
    error!("GitHub API returned {} for {}: {}", status, reference, message);
    Err(ServiceError::upstream(status.as_u16(), message))
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn get_repository(&self, reference: &RepositoryReference) -> Result<RepositoryMetadata> {
        let url = self.repo_endpoint(reference, &[]);
        self.get_json(url, reference).await
    }

    async fn get_tree(&self, reference: &RepositoryReference, branch: &str) -> Result<Vec<TreeEntry>> {
        let mut url = self.repo_endpoint(reference, &["git", "trees", branch]);
        url.query_pairs_mut().append_pair("recursive", "1");
        let response: TreeResponse = self.get_json(url, reference).await?;
        Ok(response.tree)
    }

    async fn get_file_content(&self, reference: &RepositoryReference, path: &str) -> Result<FileContent> {
        let mut rest = vec!["contents"];
        rest.extend(path.split('/'));
        let url = self.repo_endpoint(reference, &rest);
        self.get_json(url, reference).await
    }
}
