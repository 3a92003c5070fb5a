use actix_web::{web, HttpResponse};
use tracing::{error, info};

use super::{choice, require, AppState, ListQuery};
use crate::auth::Session;
use crate::dispatch::ActionKind;
use crate::error::ApiError;
use crate::listing::Listing;
use crate::models::{Profile, UpdateProfile};
use crate::moderation::{self, Collection, PAGE_SIZE};
use crate::policy::Area;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/admin/stats").route(web::get().to(stats)))
        .service(web::resource("/admin/backend-status").route(web::get().to(backend_status)))
        .service(web::resource("/admin/profiles/{user_id}").route(web::put().to(update_profile)))
        .service(web::resource("/admin/{collection}").route(web::get().to(list_collection)))
        .service(web::resource("/admin/{collection}/{id}/{action}").route(web::post().to(moderate)));
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Moderation desk counters", body = crate::moderation::DeskStats),
        (status = 403, description = "Admins only", body = crate::error::ApiErrorBody)
    )
)]
pub async fn stats(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    require(&data, &session, Area::AdminDashboard).await?;
    Ok(HttpResponse::Ok().json(data.desk.read().await.stats()))
}

pub async fn list_collection(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    require(&data, &session, Area::AdminDashboard).await?;
    let collection: Collection = path.into_inner().parse()?;
    let desk = data.desk.read().await;
    let (q, status, page) = (query.q.as_deref(), choice(&query.status), query.page());
    let size = query.page_size(PAGE_SIZE);
    let body = match collection {
        Collection::Users => serde_json::to_value(
            Listing::new(&desk.users)
                .search(q, |u| vec![u.name.as_str(), u.email.as_str()])
                .category(status, |u| moderation::user_status(u.status))
                .sorted(query.sort())
                .page(page, size),
        ),
        Collection::Posts => serde_json::to_value(
            Listing::new(&desk.posts)
                .search(q, |p| vec![p.author.as_str(), p.excerpt.as_str()])
                .category(status, |p| moderation::post_status(p.status))
                .sorted(query.sort())
                .page(page, size),
        ),
        Collection::Projects => serde_json::to_value(
            Listing::new(&desk.projects)
                .search(q, |p| vec![p.title.as_str(), p.owner.as_str()])
                .category(status, |p| moderation::review_status(p.status))
                .sorted(query.sort())
                .page(page, size),
        ),
        Collection::Jobs => serde_json::to_value(
            Listing::new(&desk.jobs)
                .search(q, |j| vec![j.title.as_str(), j.company.as_str()])
                .category(status, |j| moderation::review_status(j.status))
                .sorted(query.sort())
                .page(page, size),
        ),
    }
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn moderate(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, ApiError> {
    require(&data, &session, Area::AdminDashboard).await?;
    let (collection, id, raw) = path.into_inner();
    let collection: Collection = collection.parse()?;
    let action: ActionKind = raw.parse()?;
    let outcome = data.desk.write().await.apply(collection, &id, action)?;
    metrics::increment_counter!("filmcollab_mutations_total", "action" => action.as_str());
    info!(admin = session.user_id(), action = action.as_str(), "{}", outcome.notice.message);
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/admin/backend-status",
    responses(
        (status = 200, description = "Classified backend health"),
        (status = 403, description = "Admins only", body = crate::error::ApiErrorBody)
    )
)]
pub async fn backend_status(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    require(&data, &session, Area::AdminDashboard).await?;
    let status = data.repo.probe().await;
    info!(?status, "backend probe");
    Ok(HttpResponse::Ok().json(status))
}

#[utoipa::path(
    put,
    path = "/api/admin/profiles/{user_id}",
    params(("user_id" = String, Path, description = "Profile owner")),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 403, description = "Admins only", body = crate::error::ApiErrorBody)
    )
)]
pub async fn update_profile(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ApiError> {
    require(&data, &session, Area::AdminDashboard).await?;
    let user_id = path.into_inner();
    let update = payload.into_inner();
    let current = data.repo.get_profile(&user_id).await?;
    let profile = match current {
        Some(p) => Profile {
            role: update.role.unwrap_or(p.role),
            full_name: update.full_name.unwrap_or(p.full_name),
            user_id: p.user_id,
        },
        None => Profile {
            role: update.role.unwrap_or(crate::auth::Role::User),
            full_name: update.full_name.ok_or_else(|| ApiError::MissingFields(vec!["full_name"]))?,
            user_id,
        },
    };
    let saved = data.repo.upsert_profile(profile).await.map_err(|e| {
        error!("saving profile failed: {e}");
        ApiError::from(e)
    })?;
    info!(admin = session.user_id(), user = %saved.user_id, role = saved.role.as_str(), "profile updated");
    Ok(HttpResponse::Ok().json(saved))
}
