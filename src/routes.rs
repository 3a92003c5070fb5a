use std::sync::Arc;

use actix_web::{web, HttpRequest};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::auth::{Role, Session, SessionManager};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::listing::{Choice, DateRange, SortOrder};
use crate::moderation::ModerationDesk;
use crate::policy::{authorize, Area};
use crate::rate_limit::{InMemoryRateLimiter, RateLimiterFacade};
use crate::repo::Repo;
use crate::seed;
use crate::workspace::WorkspaceRegistry;

pub mod admin;
pub mod auth;
pub mod jobs;
pub mod workspace;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config());
    cfg.service(
        web::scope("/api")
            .configure(jobs::config)
            .configure(auth::config)
            .configure(workspace::config)
            .configure(admin::config),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub sessions: SessionManager,
    pub workspaces: WorkspaceRegistry,
    pub desk: Arc<RwLock<ModerationDesk>>,
    pub rate_limiter: RateLimiterFacade,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, config: AppConfig) -> Self {
        let sessions = SessionManager::new(&config.jwt_secret, config.session_ttl_hours);
        let rate_limiter = RateLimiterFacade::new(
            InMemoryRateLimiter::new(config.rate_limit_enabled),
            config.rate_limits.clone(),
        );
        Self {
            repo,
            sessions,
            workspaces: WorkspaceRegistry::default(),
            desk: Arc::new(RwLock::new(seed::moderation_desk(Utc::now()))),
            rate_limiter,
            config: Arc::new(config),
        }
    }
}

/// Role the session's user holds right now. A stored profile wins over the
/// token's claim, so role changes reach sessions issued before them.
pub(crate) async fn current_role(data: &AppState, session: &Session) -> Result<Role, ApiError> {
    let stored = tokio::time::timeout(data.config.auth_timeout, data.repo.get_profile(session.user_id()))
        .await
        .map_err(|_| {
            tracing::warn!(user = session.user_id(), "role lookup timed out");
            ApiError::Timeout
        })??;
    Ok(stored.map_or(session.role(), |p| p.role))
}

/// [`authorize`] against the current role.
pub(crate) async fn require(data: &AppState, session: &Session, area: Area) -> Result<Role, ApiError> {
    let role = current_role(data, session).await?;
    authorize(session, role, area)?;
    Ok(role)
}

// Extractor failures use the same `{error, details}` body as handlers.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::BadRequest(err.to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::BadRequest(err.to_string()).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::BadRequest(err.to_string()).into()
    })
}

/// Query string shared by every list endpoint. Each endpoint reads the
/// filters that make sense for it and ignores the rest.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort: Option<SortOrder>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub range: Option<DateRange>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self, default: usize) -> usize {
        self.page_size.unwrap_or(default)
    }

    pub fn sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }
}

pub fn choice(v: &Option<String>) -> Choice {
    Choice::from(v.as_deref())
}
