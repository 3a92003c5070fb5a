//! Which role may view which route.
//!
//! Client routes and API scopes both resolve to an [`Area`] by longest-prefix
//! match; [`decide`] is the single place where role and area are compared.
//! The client router asks through `GET /api/access`, API handlers through
//! [`authorize`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Role, Session};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Public,
    /// Sign-in / sign-up pages; only meaningful without a session.
    Auth,
    UserDashboard,
    AdminDashboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "location", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Redirect(String),
}

static ROUTES: Lazy<Vec<(&'static str, Area)>> = Lazy::new(|| {
    vec![
        ("/", Area::Public),
        ("/jobs", Area::Public),
        ("/sign-in", Area::Auth),
        ("/sign-up", Area::Auth),
        ("/admin/sign-in", Area::Auth),
        ("/dashboard", Area::UserDashboard),
        ("/admin", Area::AdminDashboard),
        ("/api/jobs", Area::Public),
        ("/api/auth", Area::Public),
        ("/api/access", Area::Public),
        ("/api/projects", Area::UserDashboard),
        ("/api/directory", Area::UserDashboard),
        ("/api/network", Area::UserDashboard),
        ("/api/inbox", Area::UserDashboard),
        ("/api/feed", Area::UserDashboard),
        ("/api/preferences", Area::UserDashboard),
        ("/api/admin", Area::AdminDashboard),
    ]
});

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Area of `path`; the longest matching prefix wins.
pub fn area_for(path: &str) -> Area {
    let path = path.split(['?', '#']).next().unwrap_or("/");
    ROUTES
        .iter()
        .filter(|(prefix, _)| matches_prefix(path, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, area)| *area)
        .unwrap_or(Area::Public)
}

pub fn home_for(role: Role) -> &'static str {
    match role {
        Role::User => "/dashboard",
        Role::Admin => "/admin",
    }
}

pub fn decide(role: Option<Role>, area: Area) -> Decision {
    match (area, role) {
        (Area::Public, _) => Decision::Allow,
        (Area::Auth, None) => Decision::Allow,
        (Area::Auth, Some(r)) => Decision::Redirect(home_for(r).into()),
        (Area::UserDashboard, Some(Role::User)) | (Area::AdminDashboard, Some(Role::Admin)) => Decision::Allow,
        (Area::UserDashboard, None) => Decision::Redirect("/sign-in".into()),
        (Area::AdminDashboard, None) => Decision::Redirect("/admin/sign-in".into()),
        (_, Some(r)) => Decision::Redirect(home_for(r).into()),
    }
}

/// Sign-in entry point the client used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    User,
    Admin,
}

impl Portal {
    pub fn admits(&self, role: Role) -> bool {
        matches!((self, role), (Portal::User, Role::User) | (Portal::Admin, Role::Admin))
    }
}

/// API-side guard: a session whose current `role` is redirected away from
/// `area` is refused with 403. Callers pass the role stored for the user,
/// not the one baked into the token.
pub fn authorize(session: &Session, role: Role, area: Area) -> Result<(), ApiError> {
    match decide(Some(role), area) {
        Decision::Allow => Ok(()),
        Decision::Redirect(_) => {
            tracing::warn!(user = session.user_id(), role = role.as_str(), ?area, "role crossing refused");
            Err(ApiError::Forbidden(format!("{} accounts cannot access this area", role.as_str())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(area_for("/admin/sign-in"), Area::Auth);
        assert_eq!(area_for("/admin/users"), Area::AdminDashboard);
        assert_eq!(area_for("/dashboard/inbox?c=1"), Area::UserDashboard);
        assert_eq!(area_for("/administrator"), Area::Public);
        assert_eq!(area_for("/api/admin/stats"), Area::AdminDashboard);
    }

    #[test]
    fn role_crossing_redirects_home() {
        assert_eq!(decide(Some(Role::Admin), Area::UserDashboard), Decision::Redirect("/admin".into()));
        assert_eq!(decide(Some(Role::User), Area::AdminDashboard), Decision::Redirect("/dashboard".into()));
        assert_eq!(decide(Some(Role::User), Area::UserDashboard), Decision::Allow);
    }

    #[test]
    fn anonymous_visitors() {
        assert_eq!(decide(None, Area::UserDashboard), Decision::Redirect("/sign-in".into()));
        assert_eq!(decide(None, Area::AdminDashboard), Decision::Redirect("/admin/sign-in".into()));
        assert_eq!(decide(None, Area::Auth), Decision::Allow);
        assert_eq!(decide(None, Area::Public), Decision::Allow);
    }

    #[test]
    fn signed_in_users_skip_auth_pages() {
        assert_eq!(decide(Some(Role::User), Area::Auth), Decision::Redirect("/dashboard".into()));
    }

    #[test]
    fn portals() {
        assert!(Portal::Admin.admits(Role::Admin));
        assert!(!Portal::User.admits(Role::Admin));
    }
}
