//! Shared moderation desk behind the admin dashboard.

use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::dispatch::{self, ActionKind, DispatchError, Keyed, Notice, Outcome};
use crate::listing::Listable;
use crate::models::{AdminJob, AdminPost, AdminProject, AdminUser, PostStatus, ReviewStatus, UserStatus};

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Posts,
    Projects,
    Jobs,
}

impl Collection {
    fn target(&self) -> &'static str {
        match self {
            Collection::Users => "a user",
            Collection::Posts => "a post",
            Collection::Projects => "a project",
            Collection::Jobs => "a job",
        }
    }
}

impl FromStr for Collection {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Collection::Users),
            "posts" => Ok(Collection::Posts),
            "projects" => Ok(Collection::Projects),
            "jobs" => Ok(Collection::Jobs),
            other => Err(DispatchError::NotFound(other.to_string())),
        }
    }
}

pub fn user_status(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "Active",
        UserStatus::Suspended => "Suspended",
    }
}

pub fn post_status(s: PostStatus) -> &'static str {
    match s {
        PostStatus::Published => "Published",
        PostStatus::Pending => "Pending",
        PostStatus::Flagged => "Flagged",
        PostStatus::Rejected => "Rejected",
    }
}

pub fn review_status(s: ReviewStatus) -> &'static str {
    match s {
        ReviewStatus::Pending => "Pending",
        ReviewStatus::Approved => "Approved",
        ReviewStatus::Rejected => "Rejected",
    }
}

macro_rules! keyed_by_id {
    ($($t:ty => $label:ident),* $(,)?) => {$(
        impl Keyed for $t {
            fn key(&self) -> &str {
                &self.id
            }
        }
        impl Listable for $t {
            fn label(&self) -> &str {
                &self.$label
            }
        }
    )*};
}

keyed_by_id!(AdminUser => name, AdminPost => author, AdminProject => title, AdminJob => title);

/// A moderated record, whatever collection it lives in.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    User(AdminUser),
    Post(AdminPost),
    Project(AdminProject),
    Job(AdminJob),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeskStats {
    pub total_users: usize,
    pub active_users: usize,
    pub suspended_users: usize,
    pub published_posts: usize,
    pub pending_posts: usize,
    pub flagged_posts: usize,
    pub pending_projects: usize,
    pub pending_jobs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ModerationDesk {
    pub users: Vec<AdminUser>,
    pub posts: Vec<AdminPost>,
    pub projects: Vec<AdminProject>,
    pub jobs: Vec<AdminJob>,
}

impl ModerationDesk {
    /// Apply one moderation action. Delete is accepted by every collection
    /// and is idempotent; status actions only where the status exists.
    pub fn apply(&mut self, collection: Collection, id: &str, action: ActionKind) -> Result<Outcome<Record>, DispatchError> {
        if action == ActionKind::Delete {
            return Ok(self.delete(collection, id));
        }
        let not_applicable = || DispatchError::NotApplicable { action: action.to_string(), target: collection.target() };
        let record = match collection {
            Collection::Users => {
                let status = match action {
                    ActionKind::Suspend => UserStatus::Suspended,
                    ActionKind::Reinstate => UserStatus::Active,
                    _ => return Err(not_applicable()),
                };
                self.users = dispatch::update(&self.users, id, |u| AdminUser { status, ..u.clone() })?;
                dispatch::find(&self.users, id).cloned().map(Record::User)
            }
            Collection::Posts => {
                let status = match action {
                    ActionKind::Approve => PostStatus::Published,
                    ActionKind::Reject => PostStatus::Rejected,
                    ActionKind::Flag => PostStatus::Flagged,
                    _ => return Err(not_applicable()),
                };
                self.posts = dispatch::update(&self.posts, id, |p| AdminPost { status, ..p.clone() })?;
                dispatch::find(&self.posts, id).cloned().map(Record::Post)
            }
            Collection::Projects => {
                let status = review(action).ok_or_else(not_applicable)?;
                self.projects = dispatch::update(&self.projects, id, |p| AdminProject { status, ..p.clone() })?;
                dispatch::find(&self.projects, id).cloned().map(Record::Project)
            }
            Collection::Jobs => {
                let status = review(action).ok_or_else(not_applicable)?;
                self.jobs = dispatch::update(&self.jobs, id, |j| AdminJob { status, ..j.clone() })?;
                dispatch::find(&self.jobs, id).cloned().map(Record::Job)
            }
        };
        let subject = record.as_ref().map(Record::subject).unwrap_or(id).to_string();
        Ok(Outcome { notice: Notice::for_action(action, &subject), data: record })
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Outcome<Record> {
        let subject = match collection {
            Collection::Users => {
                let s = dispatch::find(&self.users, id).map(|u| u.name.clone());
                self.users = dispatch::remove(&self.users, id);
                s
            }
            Collection::Posts => {
                let s = dispatch::find(&self.posts, id).map(|p| format!("{}'s post", p.author));
                self.posts = dispatch::remove(&self.posts, id);
                s
            }
            Collection::Projects => {
                let s = dispatch::find(&self.projects, id).map(|p| p.title.clone());
                self.projects = dispatch::remove(&self.projects, id);
                s
            }
            Collection::Jobs => {
                let s = dispatch::find(&self.jobs, id).map(|j| j.title.clone());
                self.jobs = dispatch::remove(&self.jobs, id);
                s
            }
        };
        Outcome { notice: Notice::for_action(ActionKind::Delete, subject.as_deref().unwrap_or(id)), data: None }
    }

    pub fn stats(&self) -> DeskStats {
        let users = |s: UserStatus| self.users.iter().filter(|u| u.status == s).count();
        let posts = |s: PostStatus| self.posts.iter().filter(|p| p.status == s).count();
        DeskStats {
            total_users: self.users.len(),
            active_users: users(UserStatus::Active),
            suspended_users: users(UserStatus::Suspended),
            published_posts: posts(PostStatus::Published),
            pending_posts: posts(PostStatus::Pending),
            flagged_posts: posts(PostStatus::Flagged),
            pending_projects: self.projects.iter().filter(|p| p.status == ReviewStatus::Pending).count(),
            pending_jobs: self.jobs.iter().filter(|j| j.status == ReviewStatus::Pending).count(),
        }
    }
}

fn review(action: ActionKind) -> Option<ReviewStatus> {
    match action {
        ActionKind::Approve => Some(ReviewStatus::Approved),
        ActionKind::Reject => Some(ReviewStatus::Rejected),
        _ => None,
    }
}

impl Record {
    fn subject(&self) -> &str {
        match self {
            Record::User(u) => &u.name,
            Record::Post(p) => &p.author,
            Record::Project(p) => &p.title,
            Record::Job(j) => &j.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn desk() -> ModerationDesk {
        crate::seed::moderation_desk(Utc::now())
    }

    #[test]
    fn suspend_then_reinstate() {
        let mut d = desk();
        let id = d.users[0].id.clone();
        let out = d.apply(Collection::Users, &id, ActionKind::Suspend).unwrap();
        assert!(matches!(out.data, Some(Record::User(ref u)) if u.status == UserStatus::Suspended));
        d.apply(Collection::Users, &id, ActionKind::Reinstate).unwrap();
        assert_eq!(d.users[0].status, UserStatus::Active);
    }

    #[test]
    fn status_actions_are_scoped_per_collection() {
        let mut d = desk();
        let id = d.users[0].id.clone();
        let err = d.apply(Collection::Users, &id, ActionKind::Approve).unwrap_err();
        assert_eq!(err, DispatchError::NotApplicable { action: "approve".into(), target: "a user" });
        let job = d.jobs[0].id.clone();
        assert!(d.apply(Collection::Jobs, &job, ActionKind::Flag).is_err());
    }

    #[test]
    fn delete_is_idempotent_and_updates_stats() {
        let mut d = desk();
        let before = d.stats();
        let id = d.users[0].id.clone();
        d.apply(Collection::Users, &id, ActionKind::Delete).unwrap();
        let again = d.apply(Collection::Users, &id, ActionKind::Delete).unwrap();
        assert!(again.data.is_none());
        assert_eq!(d.stats().total_users, before.total_users - 1);
    }

    #[test]
    fn approving_a_post_publishes_it() {
        let mut d = desk();
        let pending = d.posts.iter().find(|p| p.status == PostStatus::Pending).unwrap().id.clone();
        let before = d.stats();
        d.apply(Collection::Posts, &pending, ActionKind::Approve).unwrap();
        let after = d.stats();
        assert_eq!(after.pending_posts, before.pending_posts - 1);
        assert_eq!(after.published_posts, before.published_posts + 1);
    }

    #[test]
    fn unknown_collection() {
        assert!("reviews".parse::<Collection>().is_err());
        assert_eq!("jobs".parse::<Collection>().unwrap(), Collection::Jobs);
    }
}
