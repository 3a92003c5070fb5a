use chrono::{DateTime, Utc};

use crate::dispatch::Keyed;
use crate::listing::Listable;
use crate::models::{DirectoryItem, MediaKind, NewUpload, UploadMeta};

pub const PAGE_SIZE: usize = 8;

impl Keyed for DirectoryItem {
    fn key(&self) -> &str {
        &self.meta().id
    }
}

impl Listable for DirectoryItem {
    fn is_listable(&self) -> bool {
        !self.meta().title.trim().is_empty()
    }
    fn popularity(&self) -> u64 {
        self.meta().views
    }
    fn label(&self) -> &str {
        &self.meta().title
    }
}

pub fn item_fields(item: &DirectoryItem) -> Vec<&str> {
    let meta = item.meta();
    let mut fields = vec![meta.title.as_str(), meta.username.as_str()];
    fields.extend(meta.tags.iter().map(String::as_str));
    fields
}

/// Record an upload. Only the URL is kept; document extensions are taken
/// from the URL path.
pub fn record_upload(new: NewUpload, username: &str, now: DateTime<Utc>) -> DirectoryItem {
    let meta = UploadMeta {
        id: uuid::Uuid::new_v4().to_string(),
        title: new.title.trim().to_string(),
        username: username.to_string(),
        upload_date: now,
        views: 0,
        tags: new.tags,
    };
    match new.kind {
        MediaKind::Image => DirectoryItem::Image { meta, thumbnail_url: new.url },
        MediaKind::Video => DirectoryItem::Video { meta, video_url: new.url },
        MediaKind::Audio => DirectoryItem::Audio { meta, audio_url: new.url },
        MediaKind::Document => {
            let ext = extension_of(&new.url);
            DirectoryItem::Document { meta, file_url: new.url, ext }
        }
    }
}

fn extension_of(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}
