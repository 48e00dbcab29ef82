//! Structure creation from a parsed outline.
//!
//! Walks the tree top-down: groups for internal nodes, projects for
//! leaves. A parent group's id is always resolved before any child call is
//! issued, since children are created by namespace id.

use crate::error::ForgeError;
use crate::gitlab::GitLabClient;
use crate::outline::OutlineNode;
use futures::future::BoxFuture;
use owo_colors::OwoColorize;
use std::time::Duration;
use tracing::debug;

/// Fixed pause applied after every successful create call (rate limiting).
const CREATION_DELAY: Duration = Duration::from_millis(500);

/// Counters reported at the end of a run. In dry-run mode the created
/// counters count planned actions instead.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub groups_created: usize,
    pub projects_created: usize,
    /// Entities that already existed: reused groups and acknowledged
    /// duplicate projects.
    pub existing: usize,
    pub failed: usize,
}

impl RunStats {
    fn merge(&mut self, other: RunStats) {
        self.groups_created += other.groups_created;
        self.projects_created += other.projects_created;
        self.existing += other.existing;
        self.failed += other.failed;
    }

    /// One-line run summary with counts.
    pub fn summary(&self, dry_run: bool) -> String {
        if dry_run {
            format!(
                "Planned {} group(s) and {} project(s); no changes were made",
                self.groups_created, self.projects_created
            )
        } else {
            format!(
                "Created {} group(s) and {} project(s); {} already existed, {} failed",
                self.groups_created, self.projects_created, self.existing, self.failed
            )
        }
    }
}

/// Creates the remote structure for an outline, one entity at a time.
pub struct StructureCreator {
    /// Absent in dry-run mode, which never touches the network.
    api: Option<GitLabClient>,
    parent_group_id: Option<u64>,
    creation_delay: Duration,
}

impl StructureCreator {
    pub fn new(api: GitLabClient, parent_group_id: Option<u64>) -> Self {
        Self {
            api: Some(api),
            parent_group_id,
            creation_delay: CREATION_DELAY,
        }
    }

    /// Preview mode: planned actions are printed and nothing is created.
    pub fn dry_run(parent_group_id: Option<u64>) -> Self {
        Self {
            api: None,
            parent_group_id,
            creation_delay: Duration::ZERO,
        }
    }

    /// Override the post-creation pause (tests run with zero delay).
    pub fn with_creation_delay(mut self, delay: Duration) -> Self {
        self.creation_delay = delay;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.api.is_none()
    }

    /// Verify the token before any mutation. Failure here is fatal to the
    /// whole run. Dry-run mode has no client and nothing to verify.
    pub async fn authenticate(&self) -> Result<(), ForgeError> {
        let Some(api) = &self.api else {
            println!(
                "{} Running in DRY RUN mode - no changes will be made",
                "✓".green()
            );
            return Ok(());
        };
        let user = api.current_user().await?;
        println!("{} Authenticated to GitLab as: {}", "✓".green(), user.username);
        Ok(())
    }

    /// Walk the whole outline under the configured parent group.
    pub async fn run(&self, nodes: &[OutlineNode]) -> RunStats {
        self.create_structure(nodes, self.parent_group_id, "").await
    }

    /// Walk `nodes` in source order, creating groups and projects under
    /// `parent_id`. Recursion only descends into a group once its id is
    /// resolved; dry-run descends with a placeholder (absent) id since no
    /// real one can exist.
    pub fn create_structure<'a>(
        &'a self,
        nodes: &'a [OutlineNode],
        parent_id: Option<u64>,
        path_prefix: &'a str,
    ) -> BoxFuture<'a, RunStats> {
        Box::pin(async move {
            let mut stats = RunStats::default();
            for node in nodes {
                let full_path = if path_prefix.is_empty() {
                    node.name.clone()
                } else {
                    format!("{}/{}", path_prefix, node.name)
                };

                if node.is_leaf() {
                    self.create_project(&node.name, parent_id, &full_path, &mut stats)
                        .await;
                } else {
                    let group_id = self
                        .create_group(&node.name, parent_id, &full_path, &mut stats)
                        .await;
                    if self.is_dry_run() || group_id.is_some() {
                        let child_stats = self
                            .create_structure(&node.children, group_id, &full_path)
                            .await;
                        stats.merge(child_stats);
                    }
                }
            }
            stats
        })
    }

    async fn create_group(
        &self,
        name: &str,
        parent_id: Option<u64>,
        full_path: &str,
        stats: &mut RunStats,
    ) -> Option<u64> {
        let path = slugify(name);

        let Some(api) = &self.api else {
            let parent = parent_id
                .map(|id| format!(" (parent: {})", id))
                .unwrap_or_default();
            println!("[DRY RUN] Would create GROUP: {}{}", full_path, parent);
            stats.groups_created += 1;
            return None;
        };

        match api.create_group(name, &path, parent_id).await {
            Ok(group) => {
                println!(
                    "{} Created group: {} (ID: {})",
                    "✓".green(),
                    full_path,
                    group.id
                );
                stats.groups_created += 1;
                tokio::time::sleep(self.creation_delay).await;
                Some(group.id)
            }
            Err(err) if err.is_taken_conflict() => {
                println!("{} Group already exists: {}", "⚠".yellow(), full_path);
                match api.search_groups(name).await {
                    Ok(groups) => {
                        let existing = groups
                            .into_iter()
                            .find(|g| g.path == path && g.parent_id == parent_id);
                        match existing {
                            Some(group) => {
                                println!("  → Using existing group ID: {}", group.id);
                                stats.existing += 1;
                                Some(group.id)
                            }
                            None => {
                                println!(
                                    "  → Could not find existing group: no match for path '{}'",
                                    path
                                );
                                stats.failed += 1;
                                None
                            }
                        }
                    }
                    Err(search_err) => {
                        println!("  → Could not find existing group: {}", search_err);
                        stats.failed += 1;
                        None
                    }
                }
            }
            Err(err) => {
                println!("{} Error creating group {}: {}", "✗".red(), full_path, err);
                stats.failed += 1;
                None
            }
        }
    }

    async fn create_project(
        &self,
        name: &str,
        namespace_id: Option<u64>,
        full_path: &str,
        stats: &mut RunStats,
    ) {
        let path = slugify(name);

        let Some(api) = &self.api else {
            let namespace = namespace_id
                .map(|id| format!(" (namespace: {})", id))
                .unwrap_or_default();
            println!("[DRY RUN] Would create PROJECT: {}{}", full_path, namespace);
            stats.projects_created += 1;
            return;
        };

        match api.create_project(name, &path, namespace_id).await {
            Ok(project) => {
                println!(
                    "{} Created project: {} (ID: {})",
                    "✓".green(),
                    full_path,
                    project.id
                );
                stats.projects_created += 1;
                tokio::time::sleep(self.creation_delay).await;
            }
            Err(err) if err.is_taken_conflict() => {
                // No lookup here: a leaf's id is never needed afterwards.
                println!("{} Project already exists: {}", "⚠".yellow(), full_path);
                stats.existing += 1;
            }
            Err(err) => {
                println!(
                    "{} Error creating project {}: {}",
                    "✗".red(),
                    full_path,
                    err
                );
                stats.failed += 1;
            }
        }
        debug!("processed project node {}", full_path);
    }
}

/// Normalize a display name into a URL-safe slug: lowercase, spaces and
/// underscores become hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace([' ', '_'], "-")
}
