//! GitHub REST API client.
//!
//! Repository access checks, Actions public-key retrieval, secret upserts,
//! and the sealed-box encryption step that guards values in transit.

pub mod secrets;

use crate::error::{check_status, ForgeError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde_json::json;

const API_ROOT: &str = "https://api.github.com";

/// Repository public key used to seal secret values, with the identifier
/// the platform expects back on every upload.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoPublicKey {
    pub key_id: String,
    pub key: String,
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self, ForgeError> {
        Self::with_api_url(API_ROOT, token)
    }

    /// Client pointed at a custom API root (tests use a local mock server).
    pub fn with_api_url(api_url: &str, token: &str) -> Result<Self, ForgeError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
            ForgeError::Config("access token contains invalid header characters".to_string())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        // GitHub rejects requests without a user agent.
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("forgectl/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// True when the token can see the repository (HTTP 200 exactly).
    pub async fn verify_repo_access(&self, owner: &str, repo: &str) -> bool {
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        match self.http.get(url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }

    /// Fetch the repository's current Actions public key.
    pub async fn get_public_key(&self, owner: &str, repo: &str) -> Result<RepoPublicKey, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/actions/secrets/public-key",
            self.api_url, owner, repo
        );
        let response = self.http.get(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Create or replace a repository secret. Returns the HTTP status so
    /// the caller can distinguish created (201) from replaced (204) and
    /// treat anything else as a per-secret failure.
    pub async fn put_secret(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<u16, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/actions/secrets/{}",
            self.api_url, owner, repo, name
        );
        let body = json!({ "encrypted_value": encrypted_value, "key_id": key_id });
        let response = self.http.put(url).json(&body).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Seal `value` against a base64-encoded X25519 public key and encode the
/// result for transport.
///
/// Sealed-box encryption is anonymous: only the repository can open the
/// result, and this process keeps no key material of its own.
pub fn seal_secret(public_key_b64: &str, value: &str) -> Result<String, ForgeError> {
    let key_bytes = BASE64
        .decode(public_key_b64)
        .map_err(|e| ForgeError::Crypto(format!("public key is not valid base64: {}", e)))?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| ForgeError::Crypto("public key must be 32 bytes".to_string()))?;
    let public_key = crypto_box::PublicKey::from(key_bytes);

    let sealed = public_key
        .seal(&mut crypto_box::aead::OsRng, value.as_bytes())
        .map_err(|e| ForgeError::Crypto(format!("sealing failed: {}", e)))?;

    Ok(BASE64.encode(sealed))
}
