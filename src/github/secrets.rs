//! CI secret provisioning.
//!
//! Resolves the target repository from a URL, seals each operator-supplied
//! value against the repository key, and upserts the named secrets.

use crate::error::ForgeError;
use crate::github::{seal_secret, GitHubClient, RepoPublicKey};
use crate::prompt::SecretSource;
use owo_colors::OwoColorize;
use tracing::debug;

/// A named secret value, held in memory only until it is sealed.
#[derive(Debug, Clone)]
pub struct SecretEntry {
    pub name: String,
    pub value: String,
}

/// Upload tally for a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub succeeded: usize,
    pub requested: usize,
}

impl ProvisionOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.requested
    }
}

/// Extract (owner, repo) from an SSH-style `host:owner/repo[.git]` or
/// HTTPS-style `https://host/owner/repo[.git]` URL. The first matching
/// shape wins; anything else is unresolvable.
pub fn resolve_repo_url(url: &str) -> Option<(String, String)> {
    if let Some(rest) = url.strip_prefix("https://") {
        let (_host, path) = rest.split_once('/')?;
        return split_owner_repo(path);
    }
    if let Some((_host, path)) = url.split_once(':') {
        return split_owner_repo(path);
    }
    None
}

fn split_owner_repo(path: &str) -> Option<(String, String)> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Prompt for the four deploy secrets, private key hidden.
///
/// Any empty value after prompting is a fatal input error naming every
/// offender.
pub fn collect_secret_values(
    source: &mut dyn SecretSource,
) -> Result<Vec<SecretEntry>, ForgeError> {
    println!("\nPlease provide the values for the secrets:\n");
    let entries = vec![
        SecretEntry {
            name: "PRIVATE_KEY".to_string(),
            value: source.read_hidden("PRIVATE_KEY (SSH private key)")?,
        },
        SecretEntry {
            name: "SERVER_ADDRESS".to_string(),
            value: source.read_visible("SERVER_ADDRESS (server IP/hostname)")?,
        },
        SecretEntry {
            name: "SERVER_USERNAME".to_string(),
            value: source.read_visible("SERVER_USERNAME (SSH username)")?,
        },
        SecretEntry {
            name: "SERVER_PATH".to_string(),
            value: source.read_visible("SERVER_PATH (deployment path)")?,
        },
    ];

    let empty: Vec<&str> = entries
        .iter()
        .filter(|e| e.value.trim().is_empty())
        .map(|e| e.name.as_str())
        .collect();
    if !empty.is_empty() {
        return Err(ForgeError::Input(format!(
            "the following secrets cannot be empty: {}",
            empty.join(", ")
        )));
    }

    Ok(entries)
}

/// Seal and upload every entry. A failed upload is reported and the run
/// continues with the remaining secrets; the outcome carries the tally.
pub async fn provision_secrets(
    api: &GitHubClient,
    owner: &str,
    repo: &str,
    key: &RepoPublicKey,
    entries: &[SecretEntry],
) -> ProvisionOutcome {
    let mut succeeded = 0;
    for entry in entries {
        match upload_secret(api, owner, repo, key, entry).await {
            Ok(()) => {
                println!("{} Created secret: {}", "✓".green(), entry.name);
                succeeded += 1;
            }
            Err(err) => {
                println!(
                    "{} Failed to create secret {}: {}",
                    "✗".red(),
                    entry.name,
                    err
                );
            }
        }
    }
    ProvisionOutcome {
        succeeded,
        requested: entries.len(),
    }
}

async fn upload_secret(
    api: &GitHubClient,
    owner: &str,
    repo: &str,
    key: &RepoPublicKey,
    entry: &SecretEntry,
) -> Result<(), ForgeError> {
    let sealed = seal_secret(&key.key, &entry.value)?;
    let status = api
        .put_secret(owner, repo, &entry.name, &sealed, &key.key_id)
        .await?;
    debug!("secret {} upsert returned HTTP {}", entry.name, status);
    match status {
        201 | 204 => Ok(()),
        other => {
            let body = "secret upsert rejected".to_string();
            if other >= 500 {
                Err(ForgeError::Server { status: other, body })
            } else {
                Err(ForgeError::Client { status: other, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::ScriptedSource;

    #[test]
    fn ssh_and_https_urls_resolve_to_the_same_repo() {
        assert_eq!(
            resolve_repo_url("git@github.com:acme/widget.git"),
            Some(("acme".to_string(), "widget".to_string()))
        );
        assert_eq!(
            resolve_repo_url("https://github.com/acme/widget"),
            Some(("acme".to_string(), "widget".to_string()))
        );
    }

    #[test]
    fn git_suffix_and_trailing_slash_are_stripped() {
        assert_eq!(
            resolve_repo_url("https://github.com/acme/widget.git"),
            Some(("acme".to_string(), "widget".to_string()))
        );
        assert_eq!(
            resolve_repo_url("https://github.com/acme/widget/"),
            Some(("acme".to_string(), "widget".to_string()))
        );
    }

    #[test]
    fn unresolvable_urls_are_rejected() {
        assert_eq!(resolve_repo_url("https://github.com/acme"), None);
        assert_eq!(resolve_repo_url("not a url"), None);
        assert_eq!(resolve_repo_url("http://github.com/acme/widget"), None);
        assert_eq!(resolve_repo_url(""), None);
    }

    #[test]
    fn collected_secrets_keep_prompt_order() {
        let mut source = ScriptedSource::new(["key-material", "10.0.0.5", "deploy", "/srv/app"]);
        let entries = collect_secret_values(&mut source).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["PRIVATE_KEY", "SERVER_ADDRESS", "SERVER_USERNAME", "SERVER_PATH"]
        );
        assert_eq!(entries[1].value, "10.0.0.5");
    }

    #[test]
    fn empty_values_are_a_fatal_input_error_naming_all_offenders() {
        let mut source = ScriptedSource::new(["key-material", "", "deploy", "   "]);
        let err = collect_secret_values(&mut source).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SERVER_ADDRESS"));
        assert!(message.contains("SERVER_PATH"));
        assert!(!message.contains("SERVER_USERNAME"));
    }
}
