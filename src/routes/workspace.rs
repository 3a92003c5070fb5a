//! User-dashboard surfaces. Every handler works on the caller's in-memory
//! workspace and applies its mutation under a single write lock.

use std::convert::Infallible;

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use super::{choice, require, AppState, ListQuery};
use crate::auth::{Role, Session};
use crate::directory;
use crate::dispatch::{self, ActionKind, Notice, Outcome};
use crate::error::ApiError;
use crate::feed;
use crate::inbox::InboxEvent;
use crate::listing::{Listing, PageView};
use crate::models::{ChatMessage, Conversation, NewConversation, NewMessage, NewPost, NewProject, NewUpload, Person};
use crate::network;
use crate::policy::Area;
use crate::projects;
use crate::workspace::SharedWorkspace;

const PAGE_SIZE: usize = 10;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    .service(web::resource("/projects/{id}/{action}").route(web::post().to(project_action)))
    .service(
        web::resource("/directory")
            .route(web::get().to(list_directory))
            .route(web::post().to(upload_to_directory)),
    )
    .service(web::resource("/network/connections").route(web::get().to(list_connections)))
    .service(web::resource("/network/connections/{id}").route(web::delete().to(remove_connection)))
    .service(web::resource("/network/pending").route(web::get().to(list_pending)))
    .service(web::resource("/network/pending/{id}/{action}").route(web::post().to(pending_action)))
    .service(web::resource("/network/suggestions").route(web::get().to(list_suggestions)))
    .service(web::resource("/network/suggestions/{id}/connect").route(web::post().to(connect)))
    .service(
        web::resource("/inbox")
            .route(web::get().to(list_conversations))
            .route(web::post().to(open_conversation)),
    )
    // registered before /inbox/{id}
    .service(web::resource("/inbox/stream").route(web::get().to(inbox_stream)))
    .service(web::resource("/inbox/{id}").route(web::get().to(get_conversation)))
    .service(web::resource("/inbox/{id}/messages").route(web::post().to(send_message)))
    .service(web::resource("/inbox/{id}/read").route(web::post().to(mark_read)))
    .service(
        web::resource("/feed")
            .route(web::get().to(list_feed))
            .route(web::post().to(create_post)),
    )
    .service(web::resource("/feed/{id}/{action}").route(web::post().to(react_to_post)))
    .service(
        web::resource("/preferences/sidebar")
            .route(web::get().to(get_sidebar))
            .route(web::put().to(set_sidebar)),
    );
}

async fn workspace_for(session: &Session, data: &AppState) -> Result<SharedWorkspace, ApiError> {
    require(data, session, Area::UserDashboard).await?;
    Ok(data.workspaces.get(session.user_id()))
}

fn applied(session: &Session, action: ActionKind, notice: &Notice) {
    metrics::increment_counter!("filmcollab_mutations_total", "action" => action.as_str());
    info!(user = session.user_id(), action = action.as_str(), "{}", notice.message);
}

fn parse_action(raw: &str) -> Result<ActionKind, ApiError> {
    Ok(raw.parse::<ActionKind>()?)
}

// ---------------- Projects -------------------------------------------------

pub async fn list_projects(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.projects)
        .search(query.q.as_deref(), projects::project_fields)
        .category(choice(&query.industry), |p| p.industry.as_str())
        .category(choice(&query.status), |p| p.status.as_str())
        .category(choice(&query.project_type), |p| p.kind.as_str())
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn create_project(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<NewProject>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let new = payload.into_inner();
    let missing = new.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }
    let project = projects::create(new, session.display_name(), Utc::now().date_naive());
    let mut ws = shared.write().await;
    ws.projects.insert(0, project.clone());
    info!(user = session.user_id(), project = %project.id, "project created");
    Ok(HttpResponse::Created().json(project))
}

pub async fn project_action(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let (id, raw) = path.into_inner();
    let action = parse_action(&raw)?;
    let mut ws = shared.write().await;
    let (next, notice) = projects::apply(&ws.projects, &id, action, session.display_name())?;
    ws.projects = next;
    applied(&session, action, &notice);
    let record = dispatch::find(&ws.projects, &id).cloned();
    Ok(HttpResponse::Ok().json(Outcome { notice, data: record }))
}

// ---------------- Directory ------------------------------------------------

pub async fn list_directory(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.directory)
        .search(query.q.as_deref(), directory::item_fields)
        .category(choice(&query.kind), |i| i.kind().as_str())
        .within(query.range.unwrap_or_default(), Utc::now(), |i| i.meta().upload_date)
        .sorted(query.sort())
        .page(query.page(), query.page_size(directory::PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn upload_to_directory(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<NewUpload>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let upload = payload.into_inner();
    let missing: Vec<&'static str> = [("title", &upload.title), ("url", &upload.url)]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }
    let item = directory::record_upload(upload, session.display_name(), Utc::now());
    shared.write().await.directory.insert(0, item.clone());
    info!(user = session.user_id(), kind = item.kind().as_str(), "upload recorded");
    Ok(HttpResponse::Created().json(item))
}

// ---------------- Network --------------------------------------------------

pub async fn list_connections(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.network.connections)
        .search(query.q.as_deref(), |c| network::person_fields(&c.person))
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn list_pending(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.network.pending)
        .search(query.q.as_deref(), |p| network::person_fields(&p.person))
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn list_suggestions(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.network.suggestions)
        .search(query.q.as_deref(), |s| network::person_fields(&s.person))
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn connect(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let id = path.into_inner();
    let (request, notice) = shared.write().await.network.connect(&id, Utc::now())?;
    applied(&session, ActionKind::Connect, &notice);
    Ok(HttpResponse::Ok().json(Outcome { notice, data: Some(request) }))
}

pub async fn pending_action(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let (id, raw) = path.into_inner();
    let action = parse_action(&raw)?;
    let mut ws = shared.write().await;
    let response = match action {
        ActionKind::Accept => {
            let (connection, notice) = ws.network.accept(&id, Utc::now())?;
            applied(&session, action, &notice);
            HttpResponse::Ok().json(Outcome { notice, data: Some(connection) })
        }
        ActionKind::Decline | ActionKind::Cancel => {
            let notice = if action == ActionKind::Decline { ws.network.decline(&id)? } else { ws.network.cancel(&id)? };
            applied(&session, action, &notice);
            HttpResponse::Ok().json(Outcome::<()> { notice, data: None })
        }
        other => {
            return Err(ApiError::BadRequest(format!("action '{other}' does not apply to a pending request")));
        }
    };
    Ok(response)
}

pub async fn remove_connection(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let notice = shared.write().await.network.disconnect(&path.into_inner());
    applied(&session, ActionKind::Delete, &notice);
    Ok(HttpResponse::Ok().json(Outcome::<()> { notice, data: None }))
}

// ---------------- Inbox ----------------------------------------------------

#[derive(Debug, Serialize)]
struct InboxView {
    #[serde(flatten)]
    page: PageView<Conversation>,
    unread: u32,
}

pub async fn list_conversations(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let conversations = ws.inbox.conversations();
    let page = Listing::new(&conversations)
        .search(query.q.as_deref(), |c| network::person_fields(&c.participant))
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(InboxView { page, unread: ws.inbox.total_unread() }))
}

pub async fn get_conversation(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let convo = ws.inbox.get(&path.into_inner()).ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(convo))
}

fn as_participant(session: &Session) -> Person {
    Person {
        id: session.user_id().to_string(),
        name: session.display_name().to_string(),
        role: String::new(),
        location: String::new(),
        avatar: String::new(),
    }
}

/// Direct conversation with another member; 201 when it is new.
pub async fn open_conversation(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<NewConversation>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let req = payload.into_inner();
    let missing: Vec<&'static str> = [("user_id", &req.user_id), ("name", &req.name)]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }
    if req.user_id.trim() == session.user_id() {
        return Err(ApiError::BadRequest("cannot open a conversation with yourself".into()));
    }
    let participant = Person {
        id: req.user_id.trim().to_string(),
        name: req.name.trim().to_string(),
        role: String::new(),
        location: String::new(),
        avatar: String::new(),
    };
    let (convo, created) = shared.write().await.inbox.open(participant);
    if created {
        info!(user = session.user_id(), with = %convo.participant.id, "conversation opened");
        Ok(HttpResponse::Created().json(convo))
    } else {
        Ok(HttpResponse::Ok().json(convo))
    }
}

/// Copies `message` into the recipient's inbox when the conversation
/// partner is a member. Seeded contacts have no inbox of their own.
async fn deliver(data: &AppState, session: &Session, recipient: &str, message: &ChatMessage) {
    if recipient == session.user_id() {
        return;
    }
    let member = data.workspaces.contains(recipient)
        || match data.repo.get_profile(recipient).await {
            Ok(profile) => profile.is_some_and(|p| p.role == Role::User),
            Err(e) => {
                error!(recipient, "recipient lookup failed, not delivering: {e}");
                false
            }
        };
    if !member {
        return;
    }
    let shared = data.workspaces.get(recipient);
    let delivered = shared
        .write()
        .await
        .inbox
        .deliver(as_participant(session), message.kind, message.content.clone(), message.timestamp);
    match delivered {
        Ok(_) => info!(from = session.user_id(), to = recipient, "message delivered"),
        Err(e) => error!(from = session.user_id(), to = recipient, "delivery failed: {e}"),
    }
}

pub async fn send_message(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewMessage>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let msg = payload.into_inner();
    if msg.content.trim().is_empty() {
        return Err(ApiError::MissingFields(vec!["content"]));
    }
    if !data.rate_limiter.allow_message(session.user_id()) {
        warn!(user = session.user_id(), "message rate limited");
        return Err(ApiError::TooManyRequests);
    }
    let id = path.into_inner();
    // the sender's lock is released before the recipient's is taken
    let (sent, recipient) = {
        let mut ws = shared.write().await;
        let sent = ws.inbox.send(&id, msg, Utc::now())?;
        let recipient = ws.inbox.get(&id).map(|c| c.participant.id.clone());
        (sent, recipient)
    };
    if let Some(recipient) = recipient {
        deliver(&data, &session, &recipient, &sent).await;
    }
    Ok(HttpResponse::Created().json(sent))
}

pub async fn mark_read(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let convo = shared.write().await.inbox.mark_read(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(convo))
}

fn sse_frame(event: &InboxEvent) -> web::Bytes {
    let name = match event {
        InboxEvent::Message { .. } => "message",
        InboxEvent::Read { .. } => "read",
    };
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".into());
    web::Bytes::from(format!("event: {name}\ndata: {payload}\n\n"))
}

/// Server-sent events for the caller's inbox. Slow subscribers skip the
/// events they missed rather than ending the stream.
pub async fn inbox_stream(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let rx = shared.read().await.inbox.subscribe();
    let user = session.user_id().to_string();
    // holding the workspace keeps it from being evicted while the stream is open
    let stream = futures_util::stream::unfold((rx, user, shared), |(mut rx, user, shared)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok::<_, Infallible>(sse_frame(&event)), (rx, user, shared))),
                Err(RecvError::Lagged(skipped)) => warn!(user = %user, skipped, "inbox subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream))
}

// ---------------- Community ------------------------------------------------

pub async fn list_feed(
    session: Session,
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let ws = shared.read().await;
    let view = Listing::new(&ws.feed)
        .search(query.q.as_deref(), feed::post_fields)
        .sorted(query.sort())
        .page(query.page(), query.page_size(PAGE_SIZE));
    Ok(HttpResponse::Ok().json(view))
}

pub async fn create_post(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<NewPost>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let new = payload.into_inner();
    if new.content.trim().is_empty() && new.media.is_none() {
        return Err(ApiError::MissingFields(vec!["content"]));
    }
    if !data.rate_limiter.allow_post(session.user_id()) {
        warn!(user = session.user_id(), "post rate limited");
        return Err(ApiError::TooManyRequests);
    }
    let mut ws = shared.write().await;
    let (next, post) = feed::publish(&ws.feed, new, session.display_name(), Utc::now());
    ws.feed = next;
    info!(user = session.user_id(), post = %post.id, "post published");
    Ok(HttpResponse::Created().json(post))
}

pub async fn react_to_post(
    session: Session,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let (id, raw) = path.into_inner();
    let action = parse_action(&raw)?;
    let mut ws = shared.write().await;
    let (next, notice) = feed::react(&ws.feed, &id, action)?;
    ws.feed = next;
    applied(&session, action, &notice);
    let record = dispatch::find(&ws.feed, &id).cloned();
    Ok(HttpResponse::Ok().json(Outcome { notice, data: record }))
}

// ---------------- Preferences ----------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct SidebarPreference {
    pub collapsed: bool,
}

pub async fn get_sidebar(session: Session, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let collapsed = shared.read().await.sidebar_collapsed;
    Ok(HttpResponse::Ok().json(SidebarPreference { collapsed }))
}

pub async fn set_sidebar(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<SidebarPreference>,
) -> Result<HttpResponse, ApiError> {
    let shared = workspace_for(&session, &data).await?;
    let pref = payload.into_inner();
    shared.write().await.sidebar_collapsed = pref.collapsed;
    Ok(HttpResponse::Ok().json(pref))
}
