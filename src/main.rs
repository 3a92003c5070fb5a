use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use filmcollab::openapi::ApiDoc;
use filmcollab::repo::Repo;
use filmcollab::{configure, AppConfig, AppState, SecurityHeaders};

const WORKSPACE_SWEEP: Duration = Duration::from_secs(60);

async fn metrics_endpoint(handle: web::Data<PrometheusHandle>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(handle.render())
}

#[cfg(all(feature = "inmem-store", not(feature = "postgres-store")))]
async fn build_repo(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Repo>> {
    use filmcollab::repo::inmem::InMemRepo;
    std::fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("creating data dir '{}'", cfg.data_dir.display()))?;
    info!("Using in-memory repository backend (snapshot in {})", cfg.data_dir.display());
    Ok(Arc::new(InMemRepo::new(&cfg.data_dir)))
}

#[cfg(feature = "postgres-store")]
async fn build_repo(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Repo>> {
    use filmcollab::repo::pg::PgRepo;
    use sqlx::postgres::PgPoolOptions;
    let url = cfg
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set for postgres-store")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("connecting to Postgres")?;
    sqlx::migrate!("./migrations").run(&pool).await.context("running migrations")?;
    info!("Using Postgres repository backend");
    Ok(Arc::new(PgRepo::new(pool)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = AppConfig::from_env()?;
    info!("Bootstrapping FilmCollab server");
    info!("Frontend URL: {}", cfg.frontend_url.as_deref().unwrap_or("http://localhost:5173"));

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let repo = build_repo(&cfg).await?;
    let (host, port) = (cfg.host.clone(), cfg.port);
    let hsts = cfg.enable_hsts;
    let frontend = cfg.frontend_url.clone();
    let idle = cfg.workspace_idle;
    let state = AppState::new(repo, cfg);

    let workspaces = state.workspaces.clone();
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(WORKSPACE_SWEEP);
        loop {
            tick.tick().await;
            let evicted = workspaces.evict_idle(idle);
            if evicted > 0 {
                info!(evicted, remaining = workspaces.len(), "evicted idle workspaces");
            }
        }
    });
    let openapi = ApiDoc::openapi();
    info!("OpenAPI document generated");

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // local Vite dev server
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .supports_credentials()
                .max_age(3600);
            if let Some(front) = frontend.as_deref() {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(SecurityHeaders::default().with_hsts(hsts))
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(prometheus.clone()))
            .configure(configure)
            .route("/metrics", web::get().to(metrics_endpoint))
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind((host.as_str(), port))?;

    info!("Listening on http://{host}:{port}");
    server.run().await?;
    Ok(())
}
