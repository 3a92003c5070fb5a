use chrono::NaiveDate;

use crate::dispatch::{self, ActionKind, DispatchError, Keyed, Notice};
use crate::listing::Listable;
use crate::models::{NewProject, Project, ProjectStatus};

impl Keyed for Project {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Listable for Project {
    fn is_listable(&self) -> bool {
        !self.title.trim().is_empty()
    }
    fn popularity(&self) -> u64 {
        // featured first, then popular, then team size
        (self.featured as u64) << 32 | (self.popular as u64) << 31 | self.team_members.len() as u64
    }
    fn label(&self) -> &str {
        &self.title
    }
}

pub fn project_fields(p: &Project) -> Vec<&str> {
    vec![p.title.as_str(), p.tagline.as_str(), p.genre.as_str()]
}

/// Join / leave / save / unsave on one project of the member's board.
pub fn apply(projects: &[Project], id: &str, action: ActionKind, member: &str) -> Result<(Vec<Project>, Notice), DispatchError> {
    if !matches!(action, ActionKind::Join | ActionKind::Leave | ActionKind::Save | ActionKind::Unsave) {
        return Err(DispatchError::NotApplicable { action: action.to_string(), target: "a project" });
    }
    let next = dispatch::update(projects, id, |p| {
        let mut p = p.clone();
        match action {
            ActionKind::Join => {
                p.joined = true;
                if !p.team_members.iter().any(|m| m == member) {
                    p.team_members.push(member.to_string());
                }
            }
            ActionKind::Leave => {
                p.joined = false;
                p.team_members.retain(|m| m != member);
            }
            ActionKind::Save => p.saved = true,
            ActionKind::Unsave => p.saved = false,
            _ => {}
        }
        p
    })?;
    let title = dispatch::find(&next, id).map(|p| p.title.clone()).unwrap_or_default();
    Ok((next, Notice::for_action(action, &title)))
}

/// Build a project from the creation form; the creator is its first member.
pub fn create(new: NewProject, owner: &str, today: NaiveDate) -> Project {
    Project {
        id: uuid::Uuid::new_v4().to_string(),
        title: new.title.trim().to_string(),
        industry: new.industry.trim().to_string(),
        kind: new.kind.trim().to_string(),
        status: new.status.unwrap_or(ProjectStatus::Planning),
        location: new.location,
        created_date: today,
        description: new.description,
        tagline: new.tagline,
        team_members: vec![owner.to_string()],
        roles_required: new.roles_required,
        budget: new.budget,
        duration: new.duration,
        genre: new.genre,
        featured: false,
        popular: false,
        joined: true,
        saved: false,
    }
}
