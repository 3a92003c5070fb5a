use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// Job rows are the only records with a server-assigned id
pub type Id = i64;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Job {
    pub id: Id,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub experience_level: String,
    pub industry: String,
    pub salary_range: Option<String>,
    pub skills: Option<String>, // comma-separated, as submitted
    pub description: String,
    pub benefits: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl crate::listing::Listable for Job {
    fn is_listable(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
    fn label(&self) -> &str {
        &self.title
    }
}

impl Job {
    pub fn skill_list(&self) -> Vec<&str> {
        self.skills
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Body of `POST /api/jobs`. Every field defaults so that missing and empty
/// required fields are reported the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub experience_level: String,
    pub industry: String,
    pub description: String,
    pub salary_range: Option<String>,
    pub skills: Option<String>,
    pub benefits: Option<String>,
}

impl NewJob {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("job_type", &self.job_type),
            ("experience_level", &self.experience_level),
            ("industry", &self.industry),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user_id: String,
    pub role: Role,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub role: Option<Role>,
    pub full_name: Option<String>,
}

// ---------------- Projects -------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Ongoing,
    Completed,
    Planning,
    #[serde(rename = "Post-Production")]
    PostProduction,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "Ongoing",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Planning => "Planning",
            ProjectStatus::PostProduction => "Post-Production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub industry: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ProjectStatus,
    pub location: String,
    pub created_date: NaiveDate,
    pub description: String,
    pub tagline: String,
    pub team_members: Vec<String>,
    pub roles_required: Vec<String>,
    pub budget: String,
    pub duration: String,
    pub genre: String,
    pub featured: bool,
    pub popular: bool,
    #[serde(default)]
    pub joined: bool,
    #[serde(default)]
    pub saved: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    pub industry: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<ProjectStatus>,
    pub location: String,
    pub description: String,
    pub tagline: String,
    pub roles_required: Vec<String>,
    pub budget: String,
    pub duration: String,
    pub genre: String,
}

impl NewProject {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("industry", &self.industry),
            ("type", &self.kind),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

// ---------------- Directory media -----------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMeta {
    pub id: String,
    pub title: String,
    pub username: String,
    pub upload_date: DateTime<Utc>,
    pub views: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A directory entry, tagged by media kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectoryItem {
    Image {
        #[serde(flatten)]
        meta: UploadMeta,
        #[serde(rename = "thumbnailUrl")]
        thumbnail_url: String,
    },
    Video {
        #[serde(flatten)]
        meta: UploadMeta,
        #[serde(rename = "videoUrl")]
        video_url: String,
    },
    Document {
        #[serde(flatten)]
        meta: UploadMeta,
        #[serde(rename = "fileUrl")]
        file_url: String,
        ext: String,
    },
    Audio {
        #[serde(flatten)]
        meta: UploadMeta,
        #[serde(rename = "audioUrl")]
        audio_url: String,
    },
}

impl DirectoryItem {
    pub fn meta(&self) -> &UploadMeta {
        match self {
            DirectoryItem::Image { meta, .. }
            | DirectoryItem::Video { meta, .. }
            | DirectoryItem::Document { meta, .. }
            | DirectoryItem::Audio { meta, .. } => meta,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            DirectoryItem::Image { .. } => MediaKind::Image,
            DirectoryItem::Video { .. } => MediaKind::Video,
            DirectoryItem::Document { .. } => MediaKind::Document,
            DirectoryItem::Audio { .. } => MediaKind::Audio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
        }
    }
}

/// Upload form: only the URL is recorded, no bytes are transferred.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUpload {
    pub kind: MediaKind,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ---------------- Network --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub role: String,
    pub location: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(flatten)]
    pub person: Person,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(flatten)]
    pub person: Person,
    pub direction: Direction,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub person: Person,
    pub mutuals: u32,
}

// ---------------- Messaging ------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Them,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Document,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participant: Person,
    pub messages: Vec<ChatMessage>,
    pub unread: u32,
}

impl Conversation {
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }
}

/// Opens a direct conversation with another member.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConversation {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    pub content: String,
}

// ---------------- Community ------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PostMedia {
    Image { url: String },
    Video { url: String },
    Document { url: String, ext: String },
    Audio { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: String,
    pub author: String,
    pub content: String,
    pub media: Option<PostMedia>,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub liked: bool,
    pub comments: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub content: String,
    #[serde(default)]
    pub media: Option<PostMedia>,
}

// ---------------- Admin projections ---------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    Published,
    Pending,
    Flagged,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPost {
    pub id: String,
    pub author: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub reports: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProject {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminJob {
    pub id: String,
    pub title: String,
    pub company: String,
    pub status: ReviewStatus,
    pub posted_at: DateTime<Utc>,
}
