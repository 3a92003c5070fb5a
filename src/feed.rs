use chrono::{DateTime, Utc};

use crate::dispatch::{self, ActionKind, DispatchError, Keyed, Notice};
use crate::listing::Listable;
use crate::models::{CommunityPost, NewPost};

impl Keyed for CommunityPost {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Listable for CommunityPost {
    fn is_listable(&self) -> bool {
        !self.content.trim().is_empty() || self.media.is_some()
    }
    fn popularity(&self) -> u64 {
        self.likes as u64
    }
    fn label(&self) -> &str {
        &self.author
    }
}

pub fn post_fields(p: &CommunityPost) -> Vec<&str> {
    vec![p.author.as_str(), p.content.as_str()]
}

/// Like / unlike. Liking twice does not double count.
pub fn react(posts: &[CommunityPost], id: &str, action: ActionKind) -> Result<(Vec<CommunityPost>, Notice), DispatchError> {
    let like = match action {
        ActionKind::Like => true,
        ActionKind::Unlike => false,
        other => return Err(DispatchError::NotApplicable { action: other.to_string(), target: "a post" }),
    };
    let next = dispatch::update(posts, id, |p| {
        let mut p = p.clone();
        if p.liked != like {
            p.liked = like;
            p.likes = if like { p.likes + 1 } else { p.likes.saturating_sub(1) };
        }
        p
    })?;
    let author = dispatch::find(&next, id).map(|p| format!("{}'s post", p.author)).unwrap_or_default();
    Ok((next, Notice::for_action(action, &author)))
}

/// New posts go to the top of the feed.
pub fn publish(posts: &[CommunityPost], new: NewPost, author: &str, now: DateTime<Utc>) -> (Vec<CommunityPost>, CommunityPost) {
    let post = CommunityPost {
        id: uuid::Uuid::new_v4().to_string(),
        author: author.to_string(),
        content: new.content.trim().to_string(),
        media: new.media,
        created_at: now,
        likes: 0,
        liked: false,
        comments: 0,
    };
    let mut next = Vec::with_capacity(posts.len() + 1);
    next.push(post.clone());
    next.extend(posts.iter().cloned());
    (next, post)
}
