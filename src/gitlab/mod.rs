//! GitLab REST API client.
//!
//! Thin wrapper over the v4 endpoints the tools need. Every method is one
//! request; pagination, conflict handling, and pacing live with callers.

pub mod creator;
pub mod lister;

use crate::error::{check_status, ForgeError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

/// Page size for list calls.
pub const PER_PAGE: u32 = 100;

/// Authenticated caller identity.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// Group as returned by create and search calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: u64,
    pub path: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// Project as returned by the create call.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
}

/// Project entry from the membership listing. Fields the platform may omit
/// are optional; the lister skips incomplete entries.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectListing {
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub path_with_namespace: Option<String>,
}

pub struct GitLabClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitLabClient {
    /// Build a client for the instance at `base_url`, authenticating every
    /// request with the personal access token.
    pub fn new(base_url: &str, token: &str) -> Result<Self, ForgeError> {
        let mut token_value = HeaderValue::from_str(token).map_err(|_| {
            ForgeError::Config("access token contains invalid header characters".to_string())
        })?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("PRIVATE-TOKEN", token_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_url: format!("{}/api/v4", base_url.trim_end_matches('/')),
        })
    }

    /// Fetch the identity the token authenticates as.
    pub async fn current_user(&self) -> Result<User, ForgeError> {
        let response = self
            .http
            .get(format!("{}/user", self.api_url))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Create a group; `parent_id` makes it a subgroup.
    pub async fn create_group(
        &self,
        name: &str,
        path: &str,
        parent_id: Option<u64>,
    ) -> Result<Group, ForgeError> {
        let mut body = json!({ "name": name, "path": path, "visibility": "private" });
        if let Some(parent) = parent_id {
            body["parent_id"] = json!(parent);
        }
        let response = self
            .http
            .post(format!("{}/groups", self.api_url))
            .json(&body)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Search groups by name. The platform matches loosely; callers filter
    /// down to exact path and parent.
    pub async fn search_groups(&self, search: &str) -> Result<Vec<Group>, ForgeError> {
        let response = self
            .http
            .get(format!("{}/groups", self.api_url))
            .query(&[("search", search)])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Create a project; `namespace_id` places it inside a group.
    pub async fn create_project(
        &self,
        name: &str,
        path: &str,
        namespace_id: Option<u64>,
    ) -> Result<Project, ForgeError> {
        let mut body = json!({ "name": name, "path": path, "visibility": "private" });
        if let Some(namespace) = namespace_id {
            body["namespace_id"] = json!(namespace);
        }
        let response = self
            .http
            .post(format!("{}/projects", self.api_url))
            .json(&body)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// One page of the caller's project memberships.
    pub async fn list_projects(&self, page: u32) -> Result<Vec<ProjectListing>, ForgeError> {
        let page = page.to_string();
        let per_page = PER_PAGE.to_string();
        let response = self
            .http
            .get(format!("{}/projects", self.api_url))
            .query(&[
                ("membership", "true"),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}
