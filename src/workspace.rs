use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::inbox::Inbox;
use crate::models::{CommunityPost, DirectoryItem, Project};
use crate::network::Network;
use crate::seed;

/// Everything a member mutates from the user dashboard. Lives in memory only.
#[derive(Debug)]
pub struct Workspace {
    pub network: Network,
    pub inbox: Inbox,
    pub projects: Vec<Project>,
    pub directory: Vec<DirectoryItem>,
    pub feed: Vec<CommunityPost>,
    pub sidebar_collapsed: bool,
}

impl Workspace {
    pub fn seeded() -> Self {
        let now = Utc::now();
        Self {
            network: seed::network(now),
            inbox: seed::inbox(now),
            projects: seed::projects(now),
            directory: seed::directory(now),
            feed: seed::feed(now),
            sidebar_collapsed: false,
        }
    }
}

pub type SharedWorkspace = Arc<RwLock<Workspace>>;

struct Entry {
    workspace: SharedWorkspace,
    last_seen: Instant,
}

/// Per-member workspaces keyed by session subject, seeded on first use and
/// dropped again by [`WorkspaceRegistry::evict_idle`].
#[derive(Clone, Default)]
pub struct WorkspaceRegistry {
    inner: Arc<DashMap<String, Entry>>,
}

impl WorkspaceRegistry {
    pub fn get(&self, user_id: &str) -> SharedWorkspace {
        if let Some(mut entry) = self.inner.get_mut(user_id) {
            entry.last_seen = Instant::now();
            return entry.workspace.clone();
        }
        self.inner
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user = user_id, "seeding workspace");
                Entry { workspace: Arc::new(RwLock::new(Workspace::seeded())), last_seen: Instant::now() }
            })
            .workspace
            .clone()
    }

    /// Whether `user_id` has a live workspace. Never seeds one.
    pub fn contains(&self, user_id: &str) -> bool {
        self.inner.contains_key(user_id)
    }

    /// Drops workspaces untouched for `idle` that nobody holds (open inbox
    /// streams keep theirs). Returns how many were dropped.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let mut evicted = 0;
        self.inner.retain(|user, entry| {
            let keep = entry.last_seen.elapsed() < idle || Arc::strong_count(&entry.workspace) > 1;
            if !keep {
                tracing::debug!(user = %user, "evicting idle workspace");
                evicted += 1;
            }
            keep
        });
        metrics::gauge!("filmcollab_workspaces", self.inner.len() as f64);
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn workspaces_are_per_user() {
        let reg = WorkspaceRegistry::default();
        let a = reg.get("alice");
        a.write().await.sidebar_collapsed = true;
        assert!(reg.get("alice").read().await.sidebar_collapsed);
        assert!(!reg.get("bob").read().await.sidebar_collapsed);
        assert_eq!(reg.len(), 2);
    }

    #[tokio::test]
    async fn idle_workspaces_are_evicted_unless_held() {
        let reg = WorkspaceRegistry::default();
        reg.get("alice").write().await.sidebar_collapsed = true;
        let held = reg.get("bob");

        assert_eq!(reg.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(reg.evict_idle(Duration::ZERO), 1);
        assert!(!reg.contains("alice"));
        assert!(reg.contains("bob"));

        // a returning member starts from a fresh seed
        assert!(!reg.get("alice").read().await.sidebar_collapsed);
        drop(held);
        assert_eq!(reg.evict_idle(Duration::ZERO), 2);
        assert!(reg.is_empty());
    }
}
