use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("backend error: {0}")] Backend(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait JobRepo: Send + Sync {
    /// All jobs, newest first.
    async fn list_jobs(&self) -> RepoResult<Vec<Job>>;
    async fn create_job(&self, new: NewJob, owner: &str) -> RepoResult<Job>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>>;
    async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile>;
}

/// Outcome of the backend diagnostic probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "snake_case")]
pub enum BackendStatus {
    Ok,
    TableMissing(String),
    AccessDenied(String),
    PolicyConflict(String),
    Unreachable(String),
}

#[async_trait]
pub trait BackendProbe: Send + Sync {
    async fn probe(&self) -> BackendStatus;
}

pub trait Repo: JobRepo + ProfileRepo + BackendProbe {}

impl<T> Repo for T where T: JobRepo + ProfileRepo + BackendProbe {}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::Deserialize;
    use std::path::{Path, PathBuf};

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        jobs: Vec<Job>,
        profiles: HashMap<String, Profile>,
        next_id: Id,
    }

    /// Single-process store with a JSON snapshot written after every write.
    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        pub fn new(data_dir: impl AsRef<Path>) -> Self {
            let snapshot_path = data_dir.as_ref().join("state.json");
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!("failed to parse snapshot '{}': {e}; starting empty", path.display());
                        State::default()
                    }
                },
                Err(e) => {
                    log::info!("no snapshot at '{}': {e}; starting empty", path.display());
                    State::default()
                }
            }
        }

        /// Writes `state` to the snapshot file. Callers hold the write lock and
        /// undo their change when this fails, so memory never runs ahead of disk.
        fn persist(&self, state: &State) -> RepoResult<()> {
            let bytes = serde_json::to_vec_pretty(state).map_err(|e| RepoError::Backend(e.to_string()))?;
            let path = self.snapshot_path.as_ref();
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| RepoError::Backend(e.to_string()))?;
            }
            std::fs::write(path, bytes).map_err(|e| {
                log::error!("failed to write snapshot '{}': {e}", path.display());
                RepoError::Backend(e.to_string())
            })
        }

        fn read(&self) -> RepoResult<std::sync::RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Backend("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<std::sync::RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Backend("state lock poisoned".into()))
        }
    }

    #[async_trait]
    impl JobRepo for InMemRepo {
        async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
            let s = self.read()?;
            let mut v = s.jobs.clone();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(v)
        }

        async fn create_job(&self, new: NewJob, owner: &str) -> RepoResult<Job> {
            let mut s = self.write()?;
            let job = Job {
                id: s.next_id + 1,
                title: new.title.trim().to_string(),
                company: new.company.trim().to_string(),
                location: new.location.trim().to_string(),
                job_type: new.job_type.trim().to_string(),
                experience_level: new.experience_level.trim().to_string(),
                industry: new.industry.trim().to_string(),
                salary_range: trimmed(new.salary_range),
                skills: trimmed(new.skills),
                description: new.description.trim().to_string(),
                benefits: trimmed(new.benefits),
                created_at: Utc::now(),
                user_id: owner.to_string(),
            };
            s.jobs.push(job.clone());
            s.next_id = job.id;
            if let Err(e) = self.persist(&s) {
                s.jobs.pop();
                s.next_id -= 1;
                return Err(e);
            }
            Ok(job)
        }
    }

    #[async_trait]
    impl ProfileRepo for InMemRepo {
        async fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>> {
            Ok(self.read()?.profiles.get(user_id).cloned())
        }

        async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile> {
            let mut s = self.write()?;
            let previous = s.profiles.insert(profile.user_id.clone(), profile.clone());
            if let Err(e) = self.persist(&s) {
                match previous {
                    Some(p) => s.profiles.insert(p.user_id.clone(), p),
                    None => s.profiles.remove(&profile.user_id),
                };
                return Err(e);
            }
            Ok(profile)
        }
    }

    #[async_trait]
    impl BackendProbe for InMemRepo {
        async fn probe(&self) -> BackendStatus {
            match self.read() {
                Ok(_) => BackendStatus::Ok,
                Err(e) => BackendStatus::Unreachable(e.to_string()),
            }
        }
    }
}

#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    const JOB_COLUMNS: &str = "id, title, company, location, job_type, experience_level, industry, \
        salary_range, skills, description, benefits, created_at, user_id";

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        pub fn pool(&self) -> &Pool<Postgres> { &self.pool }
    }

    fn backend(e: sqlx::Error) -> RepoError {
        tracing::error!("postgres error: {e}");
        RepoError::Backend(e.to_string())
    }

    /// Maps a failed probe query onto the misconfiguration it indicates.
    fn classify(e: &sqlx::Error) -> BackendStatus {
        match e {
            sqlx::Error::Database(db) => {
                let msg = db.message().to_string();
                match db.code().as_deref() {
                    Some("42P01") => BackendStatus::TableMissing(msg),
                    Some("42501") => BackendStatus::AccessDenied(msg),
                    Some("42P17") => BackendStatus::PolicyConflict(msg),
                    _ => BackendStatus::Unreachable(msg),
                }
            }
            other => BackendStatus::Unreachable(other.to_string()),
        }
    }

    #[async_trait]
    impl JobRepo for PgRepo {
        async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
            sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool).await.map_err(backend)
        }

        async fn create_job(&self, new: NewJob, owner: &str) -> RepoResult<Job> {
            sqlx::query_as::<_, Job>(&format!(
                "INSERT INTO jobs (title, company, location, job_type, experience_level, industry, \
                 salary_range, skills, description, benefits, user_id) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING {JOB_COLUMNS}"
            ))
            .bind(new.title.trim())
            .bind(new.company.trim())
            .bind(new.location.trim())
            .bind(new.job_type.trim())
            .bind(new.experience_level.trim())
            .bind(new.industry.trim())
            .bind(trimmed(new.salary_range))
            .bind(trimmed(new.skills))
            .bind(new.description.trim())
            .bind(trimmed(new.benefits))
            .bind(owner)
            .fetch_one(&self.pool).await.map_err(backend)
        }
    }

    #[async_trait]
    impl ProfileRepo for PgRepo {
        async fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>> {
            let row = sqlx::query_as::<_, (String, String, String)>(
                "SELECT user_id, role, full_name FROM profiles WHERE user_id = $1"
            )
            .bind(user_id)
            .fetch_optional(&self.pool).await.map_err(backend)?;
            row.map(|(user_id, role, full_name)| -> RepoResult<Profile> {
                let role = role.parse::<crate::auth::Role>().map_err(RepoError::Backend)?;
                Ok(Profile { user_id, role, full_name })
            })
            .transpose()
        }

        async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile> {
            sqlx::query(
                "INSERT INTO profiles (user_id, role, full_name) VALUES ($1,$2,$3) \
                 ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role, full_name = EXCLUDED.full_name"
            )
            .bind(&profile.user_id)
            .bind(profile.role.as_str())
            .bind(&profile.full_name)
            .execute(&self.pool).await.map_err(backend)?;
            Ok(profile)
        }
    }

    #[async_trait]
    impl BackendProbe for PgRepo {
        async fn probe(&self) -> BackendStatus {
            for table in ["profiles", "jobs"] {
                let q = format!("SELECT 1 FROM {table} LIMIT 1");
                if let Err(e) = sqlx::query(&q).fetch_optional(&self.pool).await {
                    return classify(&e);
                }
            }
            BackendStatus::Ok
        }
    }
}

#[cfg(all(test, feature = "inmem-store"))]
mod tests {
    use super::inmem::InMemRepo;
    use super::*;
    use crate::auth::Role;

    fn new_job(title: &str) -> NewJob {
        NewJob {
            title: title.into(),
            company: " Northlight Pictures ".into(),
            location: "Atlanta".into(),
            job_type: "Full-time".into(),
            experience_level: "Senior".into(),
            industry: "Film".into(),
            description: "Cut the feature".into(),
            skills: Some("Avid, Premiere".into()),
            benefits: Some("   ".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn jobs_come_back_newest_first_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = InMemRepo::new(dir.path());
        repo.create_job(new_job("Editor"), "u1").await.unwrap();
        let second = repo.create_job(new_job("Colorist"), "u2").await.unwrap();
        assert_eq!(second.company, "Northlight Pictures");
        assert_eq!(second.benefits, None);

        let jobs = repo.list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, second.id);
        assert_eq!(jobs[0].skill_list(), vec!["Avid", "Premiere"]);
    }

    #[tokio::test]
    async fn snapshot_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = InMemRepo::new(dir.path());
        repo.create_job(new_job("Gaffer"), "u1").await.unwrap();
        repo.upsert_profile(Profile { user_id: "u1".into(), role: Role::Admin, full_name: "Ada".into() })
            .await
            .unwrap();

        let reloaded = InMemRepo::new(dir.path());
        assert_eq!(reloaded.list_jobs().await.unwrap().len(), 1);
        let p = reloaded.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(p.role, Role::Admin);
        assert_eq!(reloaded.probe().await, BackendStatus::Ok);
    }
}
