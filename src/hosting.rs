//! Hosting-service client: create repositories and write files.
//!
//! Only two endpoints of the GitHub REST API are used:
//!
//! | Operation | Endpoint | Success |
//! |-----------|----------|---------|
//! | create repository | `POST /user/repos` | 201 |
//! | look up file | `GET /repos/{owner}/{repo}/contents/{path}` | 200, or 404 when absent |
//! | write file | `PUT /repos/{owner}/{repo}/contents/{path}` | 200 or 201 |
//!
//! Repositories are created with `auto_init`, so `README.md` already exists
//! when the first commit arrives. Replacing a file requires its current blob
//! SHA; unless the caller supplies one, `commit_file` fetches it first.
//!
//! Any other status becomes [`StudyError::RemoteApi`] carrying the status and
//! the raw response body, so the caller sees exactly what GitHub said (a
//! duplicate repository name comes back as 422 with an explanation).
//!
//! The token is checked per call rather than at construction: a server
//! without `GITHUB_TOKEN` still starts and only publishing fails.

use crate::config::{ServerConfig, VERSION};
use crate::error::StudyError;
use crate::model::{CommitRequest, CommitResult, RepositoryDescriptor};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

/// "Create repository" and "write file at path with message".
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Create a new repository owned by the authenticated user.
    ///
    /// Not idempotent: calling twice with the same name issues two requests.
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<RepositoryDescriptor, StudyError>;

    /// Write one file in a single commit.
    async fn commit_file(
        &self,
        owner: &str,
        repo: &str,
        request: &CommitRequest,
    ) -> Result<CommitResult, StudyError>;

    /// Whether a credential is available for the calls above.
    fn is_configured(&self) -> bool;
}

/// [`RepositoryHost`] backed by the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Build a client with the configured base URL, token and timeout.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StudyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.hosting_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.github_api_base.clone(),
            token: config.github_token.clone(),
        })
    }

    fn token(&self) -> Result<&str, StudyError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(StudyError::MissingCredential("GITHUB_TOKEN"))
    }

    fn request(&self, method: reqwest::Method, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, format!("study-forge/{VERSION}"))
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}/contents/{}", self.api_base, owner, repo, path)
    }

    /// Blob SHA of `path`, or `None` when the file does not exist yet.
    async fn existing_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
    ) -> Result<Option<String>, StudyError> {
        let url = self.contents_url(owner, repo, path);
        debug!("GET {}", url);
        let resp = self
            .request(reqwest::Method::GET, &url, token)
            .send()
            .await
            .inspect_err(|e| error!("Error looking up {}: {}", path, e))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, &[200]).await.inspect_err(|e| {
            error!("Error looking up {}: {}", path, e);
        })?;

        let existing: ContentInfo = resp.json().await?;
        Ok(existing.sha)
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<RepositoryDescriptor, StudyError> {
        let token = self.token()?;
        let url = format!("{}/user/repos", self.api_base);
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "private": private,
            "auto_init": true,
        });

        debug!("POST {} (name={})", url, name);
        let resp = self
            .request(reqwest::Method::POST, &url, token)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| error!("Error creating repository {}: {}", name, e))?;
        let resp = check_status(resp, &[201]).await.inspect_err(|e| {
            error!("Error creating repository {}: {}", name, e);
        })?;

        let repo: RepoResponse = resp.json().await?;
        info!("Repository created: {}", repo.html_url);
        Ok(repo.into_descriptor())
    }

    async fn commit_file(
        &self,
        owner: &str,
        repo: &str,
        request: &CommitRequest,
    ) -> Result<CommitResult, StudyError> {
        let token = self.token()?;
        let sha = match &request.sha {
            Some(sha) => Some(sha.clone()),
            None => self.existing_sha(owner, repo, &request.path, token).await?,
        };

        let url = self.contents_url(owner, repo, &request.path);
        let mut body = serde_json::json!({
            "message": request.message,
            "content": STANDARD.encode(request.content.as_bytes()),
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        debug!("PUT {} ({} bytes)", url, request.content.len());
        let resp = self
            .request(reqwest::Method::PUT, &url, token)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| error!("Error uploading {}: {}", request.path, e))?;
        let resp = check_status(resp, &[200, 201]).await.inspect_err(|e| {
            error!("Error uploading {}: {}", request.path, e);
        })?;

        let written: ContentsResponse = resp.json().await?;
        info!("File {} committed to {}/{}", request.path, owner, repo);
        Ok(written.into_result(&request.path))
    }

    fn is_configured(&self) -> bool {
        self.token().is_ok()
    }
}

/// Pass the response through when its status is one of `accepted`.
///
/// Anything else becomes [`StudyError::RemoteApi`] with the response body.
pub async fn check_status(
    resp: reqwest::Response,
    accepted: &[u16],
) -> Result<reqwest::Response, StudyError> {
    let status = resp.status().as_u16();
    if accepted.contains(&status) {
        return Ok(resp);
    }
    Err(StudyError::RemoteApi {
        status,
        body: resp.text().await.unwrap_or_default(),
    })
}

// ── Response shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    owner: Owner,
    #[serde(default)]
    private: bool,
    description: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    html_url: String,
    clone_url: String,
}

impl RepoResponse {
    fn into_descriptor(self) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: self.name,
            full_name: self.full_name,
            owner: self.owner.login,
            private: self.private,
            description: self.description,
            created_at: self.created_at.unwrap_or_default(),
            repo_url: self.html_url,
            clone_url: self.clone_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ContentInfo {
    sha: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CommitInfo {
    sha: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<ContentInfo>,
    #[serde(default)]
    commit: Option<CommitInfo>,
}

impl ContentsResponse {
    fn into_result(self, path: &str) -> CommitResult {
        let content = self.content.unwrap_or_default();
        CommitResult {
            path: path.to_string(),
            content_sha: content.sha,
            commit_sha: self.commit.and_then(|c| c.sha),
            html_url: content.html_url,
        }
    }
}
