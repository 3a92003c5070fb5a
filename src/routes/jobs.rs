use actix_web::{web, HttpResponse};
use tracing::{error, info, warn};

use super::{choice, AppState, ListQuery};
use crate::auth::Session;
use crate::error::ApiError;
use crate::listing::{Listing, PageView};
use crate::models::{Job, NewJob};

const PAGE_SIZE: usize = 10;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/jobs")
            .route(web::get().to(list_jobs))
            .route(web::post().to(create_job)),
    )
    .service(web::resource("/jobs/browse").route(web::get().to(browse_jobs)));
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "All jobs, newest first", body = [Job]),
        (status = 500, description = "Backend failure", body = crate::error::ApiErrorBody)
    )
)]
pub async fn list_jobs(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let jobs = data.repo.list_jobs().await.map_err(|e| {
        error!("listing jobs failed: {e}");
        ApiError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(jobs))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = NewJob,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Missing required fields", body = crate::error::ApiErrorBody),
        (status = 401, description = "No valid session", body = crate::error::ApiErrorBody),
        (status = 429, description = "Too many postings"),
        (status = 500, description = "Backend failure", body = crate::error::ApiErrorBody)
    )
)]
pub async fn create_job(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<NewJob>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner();
    let missing = new.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }
    if !data.rate_limiter.allow_job(session.user_id()) {
        warn!(user = session.user_id(), "job posting rate limited");
        return Err(ApiError::TooManyRequests);
    }
    let job = data.repo.create_job(new, session.user_id()).await.map_err(|e| {
        error!("creating job failed: {e}");
        ApiError::from(e)
    })?;
    metrics::increment_counter!("filmcollab_jobs_created_total");
    info!(job_id = job.id, user = session.user_id(), "job posted");
    Ok(HttpResponse::Created().json(job))
}

#[utoipa::path(
    get,
    path = "/api/jobs/browse",
    params(
        ("q" = Option<String>, Query, description = "Matches title, company and skills"),
        ("job_type" = Option<String>, Query, description = "Exact job type, or \"all\""),
        ("experience_level" = Option<String>, Query, description = "Exact experience level, or \"all\""),
        ("industry" = Option<String>, Query, description = "Exact industry, or \"all\""),
        ("location" = Option<String>, Query, description = "Exact location, or \"all\""),
        ("page" = Option<usize>, Query, description = "1-based page"),
        ("page_size" = Option<usize>, Query, description = "Defaults to 10")
    ),
    responses((status = 200, description = "One page of matching jobs"))
)]
pub async fn browse_jobs(data: web::Data<AppState>, query: web::Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let jobs = data.repo.list_jobs().await.map_err(|e| {
        error!("listing jobs failed: {e}");
        ApiError::from(e)
    })?;
    let view: PageView<Job> = Listing::new(&jobs)
        .search(query.q.as_deref(), |j| {
            let mut fields = vec![j.title.as_str(), j.company.as_str()];
            fields.extend(j.skills.as_deref());
            fields
        })
        .category(choice(&query.job_type), |j| j.job_type.as_str())
        .category(choice(&query.experience_level), |j| j.experience_level.as_str())
        .category(choice(&query.industry), |j| j.industry.as_str())
        .category(choice(&query.location), |j| j.location.as_str())
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}
