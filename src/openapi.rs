use crate::auth::Role;
use crate::error::ApiErrorBody;
use crate::models::{Job, NewJob, Profile, UpdateProfile};
use crate::moderation::DeskStats;
use crate::policy::{Area, Portal};
use crate::routes::auth::{MeResponse, SignInRequest, SignInResponse, TokenResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::jobs::list_jobs,
        crate::routes::jobs::create_job,
        crate::routes::jobs::browse_jobs,
        crate::routes::auth::sign_in,
        crate::routes::auth::refresh,
        crate::routes::auth::sign_out,
        crate::routes::auth::me,
        crate::routes::auth::access,
        crate::routes::admin::stats,
        crate::routes::admin::backend_status,
        crate::routes::admin::update_profile,
    ),
    components(schemas(
        Job, NewJob, Profile, UpdateProfile, Role, Area, Portal, DeskStats, ApiErrorBody,
        SignInRequest, SignInResponse, TokenResponse, MeResponse
    )),
    tags(
        (name = "jobs", description = "Job board"),
        (name = "auth", description = "Sessions and access policy"),
        (name = "admin", description = "Moderation and diagnostics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_job_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/jobs"));
        assert!(doc.paths.paths.contains_key("/api/auth/sign-in"));
    }
}
