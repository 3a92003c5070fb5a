use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::{current_role, AppState};
use crate::auth::{removal_cookie, Claims, Role, Session};
use crate::error::ApiError;
use crate::models::Profile;
use crate::policy::{self, Area, Decision, Portal};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/sign-in").route(web::post().to(sign_in)))
        .service(web::resource("/auth/refresh").route(web::post().to(refresh)))
        .service(web::resource("/auth/sign-out").route(web::post().to(sign_out)))
        .service(web::resource("/auth/me").route(web::get().to(me)))
        .service(web::resource("/access").route(web::get().to(access)));
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub portal: Portal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub user_id: String,
    pub full_name: String,
    pub role: Role,
    pub redirect: String,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub home: String,
}

/// Profile for the presented identity, provisioned on first sign-in.
async fn resolve_profile(data: &AppState, claims: &Claims) -> Result<Profile, ApiError> {
    if let Some(profile) = data.repo.get_profile(&claims.sub).await? {
        return Ok(profile);
    }
    let role = if data.config.bootstrap_admins.contains(&claims.sub) { Role::Admin } else { Role::User };
    let full_name = if claims.name.trim().is_empty() { claims.sub.clone() } else { claims.name.clone() };
    info!(user = %claims.sub, role = role.as_str(), "provisioning profile");
    Ok(data.repo.upsert_profile(Profile { user_id: claims.sub.clone(), role, full_name }).await?)
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Session established", body = SignInResponse),
        (status = 401, description = "No valid identity token", body = crate::error::ApiErrorBody),
        (status = 403, description = "Account role does not match the portal", body = crate::error::ApiErrorBody),
        (status = 504, description = "Profile lookup timed out", body = crate::error::ApiErrorBody)
    )
)]
pub async fn sign_in(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<SignInRequest>,
) -> Result<HttpResponse, ApiError> {
    let portal = payload.into_inner().portal;
    let profile = tokio::time::timeout(data.config.auth_timeout, resolve_profile(&data, &session.0))
        .await
        .map_err(|_| {
            warn!(user = session.user_id(), "profile lookup timed out");
            ApiError::Timeout
        })?
        .map_err(|e| {
            error!("profile lookup failed: {e}");
            e
        })?;

    if !portal.admits(profile.role) {
        warn!(user = session.user_id(), role = profile.role.as_str(), ?portal, "portal mismatch, signing out");
        data.sessions.invalidate(&session.0);
        let err = ApiError::Forbidden(format!("{} accounts must use the {} portal", profile.role.as_str(), other_portal(portal)));
        let mut resp = err.error_response();
        resp.add_cookie(&removal_cookie()).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(resp);
    }

    let token = data
        .sessions
        .issue(&profile.user_id, &profile.full_name, profile.role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    metrics::increment_counter!("filmcollab_sessions_total", "event" => "sign_in");
    info!(user = %profile.user_id, role = profile.role.as_str(), "signed in");
    Ok(HttpResponse::Ok()
        .cookie(data.sessions.cookie(token.clone(), data.config.secure_cookies))
        .json(SignInResponse {
            redirect: policy::home_for(profile.role).to_string(),
            user_id: profile.user_id,
            full_name: profile.full_name,
            role: profile.role,
            token,
        }))
}

fn other_portal(portal: Portal) -> &'static str {
    match portal {
        Portal::User => "admin",
        Portal::Admin => "user",
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Rotated session", body = TokenResponse),
        (status = 401, description = "No valid session", body = crate::error::ApiErrorBody)
    )
)]
pub async fn refresh(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let role = current_role(&data, &session).await?;
    if role != session.role() {
        info!(user = session.user_id(), from = session.role().as_str(), to = role.as_str(), "role changed since issue");
    }
    let token = data.sessions.refresh(&session.0, role).map_err(|e| ApiError::Internal(e.to_string()))?;
    metrics::increment_counter!("filmcollab_sessions_total", "event" => "refresh");
    Ok(HttpResponse::Ok()
        .cookie(data.sessions.cookie(token.clone(), data.config.secure_cookies))
        .json(TokenResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 204, description = "Session invalidated"),
        (status = 401, description = "No valid session", body = crate::error::ApiErrorBody)
    )
)]
pub async fn sign_out(session: Session, data: web::Data<AppState>) -> HttpResponse {
    data.sessions.invalidate(&session.0);
    info!(user = session.user_id(), "signed out");
    HttpResponse::NoContent().cookie(removal_cookie()).finish()
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "No valid session", body = crate::error::ApiErrorBody)
    )
)]
pub async fn me(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let role = current_role(&data, &session).await?;
    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: session.user_id().to_string(),
        name: session.display_name().to_string(),
        role,
        home: policy::home_for(role).to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub path: String,
    pub area: Area,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/access",
    params(("path" = String, Query, description = "Client route to check")),
    responses((status = 200, description = "Allow, or where to redirect"))
)]
pub async fn access(
    session: Option<Session>,
    data: web::Data<AppState>,
    query: web::Query<AccessQuery>,
) -> Result<HttpResponse, ApiError> {
    let path = query.into_inner().path;
    let area = policy::area_for(&path);
    let role = match &session {
        Some(s) => Some(current_role(&data, s).await?),
        None => None,
    };
    let redirect = match policy::decide(role, area) {
        Decision::Allow => None,
        Decision::Redirect(location) => Some(location),
    };
    Ok(HttpResponse::Ok().json(AccessResponse { path, area, allowed: redirect.is_none(), redirect }))
}
