//! Immutable-update primitives behind every user and moderator action.
//!
//! Each primitive takes the current collection by reference and returns a new
//! one; callers swap the result in under a single lock so a transfer between
//! two collections is never observed half-done.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Approve,
    Reject,
    Suspend,
    Reinstate,
    Flag,
    Delete,
    Connect,
    Accept,
    Decline,
    Cancel,
    Save,
    Unsave,
    Join,
    Leave,
    Like,
    Unlike,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
            ActionKind::Suspend => "suspend",
            ActionKind::Reinstate => "reinstate",
            ActionKind::Flag => "flag",
            ActionKind::Delete => "delete",
            ActionKind::Connect => "connect",
            ActionKind::Accept => "accept",
            ActionKind::Decline => "decline",
            ActionKind::Cancel => "cancel",
            ActionKind::Save => "save",
            ActionKind::Unsave => "unsave",
            ActionKind::Join => "join",
            ActionKind::Leave => "leave",
            ActionKind::Like => "like",
            ActionKind::Unlike => "unlike",
        }
    }

    /// Past-tense verb for notices.
    fn past(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approved",
            ActionKind::Reject => "rejected",
            ActionKind::Suspend => "suspended",
            ActionKind::Reinstate => "reinstated",
            ActionKind::Flag => "flagged",
            ActionKind::Delete => "deleted",
            ActionKind::Connect => "sent a connection request to",
            ActionKind::Accept => "accepted",
            ActionKind::Decline => "declined",
            ActionKind::Cancel => "cancelled",
            ActionKind::Save => "saved",
            ActionKind::Unsave => "removed from saved",
            ActionKind::Join => "joined",
            ActionKind::Leave => "left",
            ActionKind::Like => "liked",
            ActionKind::Unlike => "unliked",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase())).map_err(|_| {
            DispatchError::NotApplicable { action: s.to_string(), target: "any record" }
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("no record with id '{0}'")]
    NotFound(String),
    #[error("action '{action}' does not apply to {target}")]
    NotApplicable { action: String, target: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Info,
    Warning,
}

/// Transient, user-facing confirmation of an applied mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub tone: Tone,
    pub message: String,
}

impl Notice {
    pub fn new(tone: Tone, message: impl Into<String>) -> Self {
        Self { tone, message: message.into() }
    }

    pub fn for_action(action: ActionKind, subject: &str) -> Self {
        let tone = match action {
            ActionKind::Reject | ActionKind::Suspend | ActionKind::Flag | ActionKind::Delete => Tone::Warning,
            ActionKind::Decline | ActionKind::Cancel | ActionKind::Leave | ActionKind::Unsave | ActionKind::Unlike => {
                Tone::Info
            }
            _ => Tone::Success,
        };
        Self::new(tone, format!("You {} {subject}", action.past()))
    }
}

/// Result of a dispatched action: the updated record (when one survives)
/// plus the notice to surface.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn position<T: Keyed>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|t| t.key() == id)
}

pub fn find<'a, T: Keyed>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|t| t.key() == id)
}

/// Map over `items`, replacing the record whose key is `id` with `f(record)`.
/// Every other record is carried over untouched.
pub fn update<T, F>(items: &[T], id: &str, f: F) -> Result<Vec<T>, DispatchError>
where
    T: Keyed + Clone,
    F: FnOnce(&T) -> T,
{
    let idx = position(items, id).ok_or_else(|| DispatchError::NotFound(id.to_string()))?;
    let mut next = items.to_vec();
    next[idx] = f(&items[idx]);
    Ok(next)
}

/// Filter out the record whose key is `id`. Absent ids leave the collection
/// unchanged, so repeated deletes are harmless.
pub fn remove<T: Keyed + Clone>(items: &[T], id: &str) -> Vec<T> {
    items.iter().filter(|t| t.key() != id).cloned().collect()
}

/// Move the record `id` out of `source` and prepend `derive(record)` to
/// `dest`. Both new collections are returned together.
pub fn transfer<S, D, F>(source: &[S], dest: &[D], id: &str, derive: F) -> Result<(Vec<S>, Vec<D>), DispatchError>
where
    S: Keyed + Clone,
    D: Clone,
    F: FnOnce(&S) -> D,
{
    let moved = find(source, id).ok_or_else(|| DispatchError::NotFound(id.to_string()))?;
    let mut next_dest = Vec::with_capacity(dest.len() + 1);
    next_dest.push(derive(moved));
    next_dest.extend(dest.iter().cloned());
    Ok((remove(source, id), next_dest))
}
