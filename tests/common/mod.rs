#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use filmcollab::auth::Role;
use filmcollab::models::{Job, NewJob, Profile};
use filmcollab::repo::inmem::InMemRepo;
use filmcollab::repo::{BackendProbe, BackendStatus, JobRepo, ProfileRepo, Repo, RepoError, RepoResult};
use filmcollab::{AppConfig, AppState};

pub const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

pub fn test_config() -> AppConfig {
    AppConfig::new(SECRET)
}

/// State over a fresh in-memory repo snapshotting into `dir`.
pub fn state_in(dir: &tempfile::TempDir, config: AppConfig) -> AppState {
    AppState::new(Arc::new(InMemRepo::new(dir.path())), config)
}

pub fn state_with(repo: impl Repo + 'static, config: AppConfig) -> AppState {
    AppState::new(Arc::new(repo), config)
}

pub fn bearer(state: &AppState, user: &str, name: &str, role: Role) -> (&'static str, String) {
    let token = state.sessions.issue(user, name, role).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

pub fn user(state: &AppState) -> (&'static str, String) {
    bearer(state, "u-sarah", "Sarah Johnson", Role::User)
}

pub fn admin(state: &AppState) -> (&'static str, String) {
    bearer(state, "u-ava", "Ava Chen", Role::Admin)
}

/// Repository whose job table is gone: job calls fail, profile reads find
/// nothing and profile writes fail.
pub struct FailingRepo;

#[async_trait]
impl JobRepo for FailingRepo {
    async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
        Err(RepoError::Backend("connection refused".into()))
    }
    async fn create_job(&self, _new: NewJob, _owner: &str) -> RepoResult<Job> {
        Err(RepoError::Backend("relation \"jobs\" does not exist".into()))
    }
}

#[async_trait]
impl ProfileRepo for FailingRepo {
    async fn get_profile(&self, _user_id: &str) -> RepoResult<Option<Profile>> {
        Ok(None)
    }
    async fn upsert_profile(&self, _profile: Profile) -> RepoResult<Profile> {
        Err(RepoError::Backend("connection refused".into()))
    }
}

#[async_trait]
impl BackendProbe for FailingRepo {
    async fn probe(&self) -> BackendStatus {
        BackendStatus::TableMissing("relation \"jobs\" does not exist".into())
    }
}

/// Profile store that answers after `delay`.
pub struct SlowProfiles {
    pub inner: InMemRepo,
    pub delay: Duration,
}

#[async_trait]
impl JobRepo for SlowProfiles {
    async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
        self.inner.list_jobs().await
    }
    async fn create_job(&self, new: NewJob, owner: &str) -> RepoResult<Job> {
        self.inner.create_job(new, owner).await
    }
}

#[async_trait]
impl ProfileRepo for SlowProfiles {
    async fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_profile(user_id).await
    }
    async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile> {
        self.inner.upsert_profile(profile).await
    }
}

#[async_trait]
impl BackendProbe for SlowProfiles {
    async fn probe(&self) -> BackendStatus {
        self.inner.probe().await
    }
}
