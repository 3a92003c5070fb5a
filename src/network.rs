use chrono::{DateTime, Utc};

use crate::dispatch::{self, ActionKind, DispatchError, Keyed, Notice};
use crate::listing::Listable;
use crate::models::{Connection, Direction, PendingRequest, Person, Suggestion};

impl Keyed for Connection {
    fn key(&self) -> &str {
        &self.person.id
    }
}

impl Keyed for PendingRequest {
    fn key(&self) -> &str {
        &self.person.id
    }
}

impl Keyed for Suggestion {
    fn key(&self) -> &str {
        &self.person.id
    }
}

impl Listable for Connection {
    fn is_listable(&self) -> bool {
        !self.person.name.trim().is_empty()
    }
    fn label(&self) -> &str {
        &self.person.name
    }
}

impl Listable for PendingRequest {
    fn label(&self) -> &str {
        &self.person.name
    }
}

impl Listable for Suggestion {
    fn popularity(&self) -> u64 {
        self.mutuals as u64
    }
    fn label(&self) -> &str {
        &self.person.name
    }
}

/// Search fields shared by every people list: name and role.
pub fn person_fields(p: &Person) -> Vec<&str> {
    vec![p.name.as_str(), p.role.as_str()]
}

/// Connections, pending requests and suggestions of one member.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub connections: Vec<Connection>,
    pub pending: Vec<PendingRequest>,
    pub suggestions: Vec<Suggestion>,
}

impl Network {
    /// suggestion → pending (sent)
    pub fn connect(&mut self, id: &str, now: DateTime<Utc>) -> Result<(PendingRequest, Notice), DispatchError> {
        let (suggestions, pending) = dispatch::transfer(&self.suggestions, &self.pending, id, |s| PendingRequest {
            person: s.person.clone(),
            direction: Direction::Sent,
            requested_at: now,
        })?;
        self.suggestions = suggestions;
        self.pending = pending;
        let created = self.pending[0].clone();
        let notice = Notice::for_action(ActionKind::Connect, &created.person.name);
        Ok((created, notice))
    }

    /// pending (received) → connection
    pub fn accept(&mut self, id: &str, now: DateTime<Utc>) -> Result<(Connection, Notice), DispatchError> {
        self.expect_direction(id, Direction::Received, ActionKind::Accept)?;
        let (pending, connections) = dispatch::transfer(&self.pending, &self.connections, id, |p| Connection {
            person: p.person.clone(),
            connected_at: now,
        })?;
        self.pending = pending;
        self.connections = connections;
        let created = self.connections[0].clone();
        let notice = Notice::for_action(ActionKind::Accept, &created.person.name);
        Ok((created, notice))
    }

    /// Drop a received request.
    pub fn decline(&mut self, id: &str) -> Result<Notice, DispatchError> {
        let req = self.expect_direction(id, Direction::Received, ActionKind::Decline)?;
        let notice = Notice::for_action(ActionKind::Decline, &req.person.name);
        self.pending = dispatch::remove(&self.pending, id);
        Ok(notice)
    }

    /// Withdraw a sent request.
    pub fn cancel(&mut self, id: &str) -> Result<Notice, DispatchError> {
        let req = self.expect_direction(id, Direction::Sent, ActionKind::Cancel)?;
        let notice = Notice::for_action(ActionKind::Cancel, &req.person.name);
        self.pending = dispatch::remove(&self.pending, id);
        Ok(notice)
    }

    /// Removing an unknown connection is a no-op.
    pub fn disconnect(&mut self, id: &str) -> Notice {
        let name = dispatch::find(&self.connections, id)
            .map(|c| c.person.name.clone())
            .unwrap_or_else(|| id.to_string());
        self.connections = dispatch::remove(&self.connections, id);
        Notice::for_action(ActionKind::Delete, &name)
    }

    fn expect_direction(&self, id: &str, want: Direction, action: ActionKind) -> Result<PendingRequest, DispatchError> {
        let req = dispatch::find(&self.pending, id).ok_or_else(|| DispatchError::NotFound(id.to_string()))?;
        if req.direction != want {
            let target = match req.direction {
                Direction::Sent => "a sent request",
                Direction::Received => "a received request",
            };
            return Err(DispatchError::NotApplicable { action: action.to_string(), target });
        }
        Ok(req.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: id.into(),
            name: name.into(),
            role: "Cinematographer".into(),
            location: "Mumbai".into(),
            avatar: String::new(),
        }
    }

    fn network() -> Network {
        let now = Utc::now();
        Network {
            connections: vec![],
            pending: vec![PendingRequest { person: person("p1", "Marcus Lee"), direction: Direction::Received, requested_at: now }],
            suggestions: vec![Suggestion { person: person("s1", "Priya Singh"), mutuals: 4 }],
        }
    }

    #[test]
    fn connect_moves_suggestion_to_pending_sent() {
        let mut n = network();
        let (req, notice) = n.connect("s1", Utc::now()).unwrap();
        assert!(n.suggestions.is_empty());
        assert_eq!(req.direction, Direction::Sent);
        assert_eq!(n.pending.len(), 2);
        assert!(n.pending.iter().any(|p| p.person.id == "s1" && p.direction == Direction::Sent));
        assert!(notice.message.contains("Priya Singh"));
    }

    #[test]
    fn accept_creates_connection() {
        let mut n = network();
        let (conn, _) = n.accept("p1", Utc::now()).unwrap();
        assert_eq!(conn.person.name, "Marcus Lee");
        assert!(n.pending.is_empty());
        assert_eq!(n.connections.len(), 1);
    }

    #[test]
    fn cannot_accept_own_request() {
        let mut n = network();
        n.connect("s1", Utc::now()).unwrap();
        let err = n.accept("s1", Utc::now()).unwrap_err();
        assert!(matches!(err, DispatchError::NotApplicable { .. }));
        assert!(n.cancel("s1").is_ok());
        assert_eq!(n.pending.len(), 1);
    }

    #[test]
    fn decline_and_unknown_ids() {
        let mut n = network();
        n.decline("p1").unwrap();
        assert!(n.pending.is_empty());
        assert_eq!(n.decline("p1").unwrap_err(), DispatchError::NotFound("p1".into()));
        n.disconnect("nobody");
        assert!(n.connections.is_empty());
    }
}
