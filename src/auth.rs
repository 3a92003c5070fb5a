use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "fc_session";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no session presented")]
    Missing,
    #[error("invalid session token")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("session has been signed out")]
    Revoked,
}

/// Process-wide session context: issues, validates, rotates and invalidates
/// HS256 session tokens. Invalidated token ids are kept until they would have
/// expired anyway.
#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
    revoked: Arc<DashMap<String, usize>>,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::hours(ttl_hours.max(1)),
            revoked: Arc::new(DashMap::new()),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Start a session for `user_id`.
    pub fn issue(&self, user_id: &str, name: &str, role: Role) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if self.revoked.contains_key(&data.claims.jti) {
            return Err(SessionError::Revoked);
        }
        Ok(data.claims)
    }

    /// Sign-out: the token stops validating immediately.
    pub fn invalidate(&self, claims: &Claims) {
        self.purge_expired();
        self.revoked.insert(claims.jti.clone(), claims.exp);
        metrics::increment_counter!("filmcollab_sessions_total", "event" => "invalidate");
    }

    /// Token rotation: the presented session is invalidated and a fresh one
    /// for the same subject is issued carrying `role`.
    pub fn refresh(&self, claims: &Claims, role: Role) -> Result<String, SessionError> {
        let token = self.issue(&claims.sub, &claims.name, role)?;
        self.invalidate(claims);
        Ok(token)
    }

    fn purge_expired(&self) {
        let now = Utc::now().timestamp() as usize;
        self.revoked.retain(|_, exp| *exp > now);
    }

    pub fn cookie(&self, token: String, secure: bool) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(self.ttl.num_seconds()))
            .finish()
    }
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut c = Cookie::named(SESSION_COOKIE);
    c.set_path("/");
    c.make_removal();
    c
}

/// Extractor yielding the validated session claims. The session cookie wins
/// over an `Authorization: Bearer` header.
pub struct Session(pub Claims);

impl Session {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Name shown on records the member creates.
    pub fn display_name(&self) -> &str {
        if self.0.name.trim().is_empty() {
            &self.0.sub
        } else {
            &self.0.name
        }
    }
}

impl FromRequest for Session {
    type Error = ApiError;
    type Future = Ready<Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(ApiError::Internal("application state not configured".into())));
        };
        let token = req
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .or_else(|| {
                BearerAuth::from_request(req, pl)
                    .into_inner()
                    .ok()
                    .map(|b| b.token().to_string())
            });
        let Some(token) = token else {
            return ready(Err(ApiError::Unauthorized(SessionError::Missing.to_string())));
        };
        match state.sessions.verify(&token) {
            Ok(claims) => ready(Ok(Session(claims))),
            Err(e) => {
                tracing::warn!("rejected session: {e}");
                ready(Err(ApiError::Unauthorized(e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

    #[test]
    fn issue_then_verify() {
        let sm = SessionManager::new(SECRET, 1);
        let token = sm.issue("u1", "Sarah Johnson", Role::User).unwrap();
        let claims = sm.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn invalidated_session_is_rejected() {
        let sm = SessionManager::new(SECRET, 1);
        let token = sm.issue("u1", "", Role::User).unwrap();
        let claims = sm.verify(&token).unwrap();
        sm.invalidate(&claims);
        assert!(matches!(sm.verify(&token), Err(SessionError::Revoked)));
    }

    #[test]
    fn refresh_rotates_token() {
        let sm = SessionManager::new(SECRET, 1);
        let old = sm.issue("u1", "", Role::Admin).unwrap();
        let claims = sm.verify(&old).unwrap();
        let new = sm.refresh(&claims, Role::Admin).unwrap();
        assert!(sm.verify(&old).is_err());
        assert_eq!(sm.verify(&new).unwrap().role, Role::Admin);
    }

    #[test]
    fn refresh_carries_the_given_role() {
        let sm = SessionManager::new(SECRET, 1);
        let old = sm.issue("u1", "Dana", Role::Admin).unwrap();
        let claims = sm.verify(&old).unwrap();
        let new = sm.verify(&sm.refresh(&claims, Role::User).unwrap()).unwrap();
        assert_eq!(new.role, Role::User);
        assert_eq!(new.sub, "u1");
        assert_eq!(new.name, "Dana");
    }

    #[test]
    fn foreign_secret_is_invalid() {
        let ours = SessionManager::new(SECRET, 1);
        let theirs = SessionManager::new("another-secret-that-is-32-bytes-long", 1);
        let token = theirs.issue("u1", "", Role::User).unwrap();
        assert!(matches!(ours.verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("moderator".parse::<Role>().is_err());
    }
}
