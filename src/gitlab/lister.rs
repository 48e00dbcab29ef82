//! Accessible-project listing.
//!
//! Pages through the caller's project memberships and writes one
//! `<clone address> <namespace path>` line per project.

use crate::error::ForgeError;
use crate::gitlab::GitLabClient;
use std::path::Path;
use tracing::{debug, error};

/// (clone address, namespace path) for one remote project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub clone_address: String,
    pub namespace_path: String,
}

/// Collect every project the caller can see.
///
/// Pagination stops at the first empty page. A failed page ends the walk
/// but keeps what was collected so far. Listings taken while the remote
/// side mutates may repeat or miss entries; no deduplication is attempted.
pub async fn list_accessible_projects(api: &GitLabClient) -> Vec<RepositoryRecord> {
    let mut records = Vec::new();
    let mut page = 1u32;

    loop {
        let listings = match api.list_projects(page).await {
            Ok(listings) => listings,
            Err(err) => {
                error!("error fetching repositories on page {}: {}", page, err);
                break;
            }
        };
        if listings.is_empty() {
            break;
        }

        for listing in listings {
            if let (Some(clone_address), Some(namespace_path)) =
                (listing.ssh_url_to_repo, listing.path_with_namespace)
            {
                if !clone_address.is_empty() && !namespace_path.is_empty() {
                    records.push(RepositoryRecord {
                        clone_address,
                        namespace_path,
                    });
                }
            }
        }

        debug!("collected {} record(s) through page {}", records.len(), page);
        page += 1;
    }

    records
}

/// Write records as `<clone address> <namespace path>` lines.
pub fn write_records(records: &[RepositoryRecord], path: &Path) -> Result<(), ForgeError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.clone_address);
        out.push(' ');
        out.push_str(&record.namespace_path);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}
