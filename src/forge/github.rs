//! forge::github
//!
//! GitHub-compatible forge implementation using the REST API.
//!
//! # Endpoints
//!
//! - Existence probe: `HEAD {api}/repos/{owner}/{repo}`; 200 and 301 mean
//!   the repository is there
//! - Fork creation: `POST {api}/repos/{owner}/{repo}/forks` with body
//!   `{"owner": <account>}`; 202 means accepted
//!
//! Both requests use basic auth with the configured account. Redirects are
//! not followed, so a 301 is seen as a 301 and not as whatever it points to.
//!
//! # Example
//!
//! ```ignore
//! use reposync::core::config::HostCredentials;
//! use reposync::forge::{github::GitHubForge, Forge};
//!
//! let forge = GitHubForge::new(HostCredentials {
//!     user: "mirror-bot".into(),
//!     password: token,
//!     api_base_url: "https://api.github.com".into(),
//! })?;
//!
//! if !forge.repo_exists("mirror-bot", "log").await? {
//!     forge.create_fork("rust-lang", "log").await?;
//! }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::traits::{Forge, ForgeError};
use crate::core::config::HostCredentials;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));

/// GitHub-compatible forge bound to one account.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Account credentials and API base URL
    credentials: HostCredentials,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("account", &self.credentials.user)
            .field("api_base", &self.credentials.api_base_url)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for the given account.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(credentials: HostCredentials) -> Result<Self, ForgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ForgeError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// API base URL this forge talks to.
    pub fn api_base(&self) -> &str {
        &self.credentials.api_base_url
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}", self.credentials.api_base_url, owner, repo)
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn account(&self) -> &str {
        &self.credentials.user
    }

    async fn repo_exists(&self, owner: &str, repo: &str) -> Result<bool, ForgeError> {
        let url = self.repo_url(owner, repo);

        let response = self
            .client
            .head(&url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), "probed repository");

        Ok(matches!(
            status,
            StatusCode::OK | StatusCode::MOVED_PERMANENTLY
        ))
    }

    async fn create_fork(&self, owner: &str, repo: &str) -> Result<(), ForgeError> {
        let url = format!("{}/forks", self.repo_url(owner, repo));
        let body = CreateForkBody {
            owner: &self.credentials.user,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), "requested fork");

        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ForgeError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

/// Request body for creating a fork.
#[derive(Serialize)]
struct CreateForkBody<'a> {
    owner: &'a str,
}
