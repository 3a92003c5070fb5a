use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::dispatch::{self, DispatchError, Keyed};
use crate::listing::Listable;
use crate::models::{ChatMessage, Conversation, MessageKind, NewMessage, Person, Sender};

const EVENT_BUFFER: usize = 64;

impl Keyed for Conversation {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Listable for Conversation {
    fn popularity(&self) -> u64 {
        self.unread as u64
    }
    fn label(&self) -> &str {
        &self.participant.name
    }
}

/// Pushed to subscribers of a member's inbox.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboxEvent {
    Message { conversation_id: String, message: ChatMessage, unread: u32 },
    Read { conversation_id: String },
}

/// A member's conversations plus the push channel their clients listen on.
#[derive(Debug)]
pub struct Inbox {
    conversations: Vec<Conversation>,
    events: broadcast::Sender<InboxEvent>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Inbox {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { conversations, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.events.subscribe()
    }

    /// Conversations ordered by latest activity.
    pub fn conversations(&self) -> Vec<Conversation> {
        let mut v = self.conversations.clone();
        v.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        v
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        dispatch::find(&self.conversations, id)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread).sum()
    }

    /// Outgoing message from the member.
    pub fn send(&mut self, id: &str, msg: NewMessage, now: DateTime<Utc>) -> Result<ChatMessage, DispatchError> {
        self.append(id, Sender::Me, msg.kind, msg.content, now)
    }

    /// Conversation with `participant`, created empty when there is none yet.
    /// The flag is true when it was created.
    pub fn open(&mut self, participant: Person) -> (Conversation, bool) {
        if let Some(existing) = self.with_participant(&participant.id) {
            return (existing.clone(), false);
        }
        let convo = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            participant,
            messages: Vec::new(),
            unread: 0,
        };
        self.conversations.push(convo.clone());
        (convo, true)
    }

    pub fn with_participant(&self, participant_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.participant.id == participant_id)
    }

    /// Message from another member, filed under the conversation with them.
    pub fn deliver(
        &mut self,
        from: Person,
        kind: MessageKind,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, DispatchError> {
        let (convo, _) = self.open(from);
        self.receive(&convo.id, kind, content, now)
    }

    fn receive(
        &mut self,
        id: &str,
        kind: MessageKind,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, DispatchError> {
        self.append(id, Sender::Them, kind, content.into(), now)
    }

    pub fn mark_read(&mut self, id: &str) -> Result<Conversation, DispatchError> {
        self.conversations = dispatch::update(&self.conversations, id, |c| {
            let mut c = c.clone();
            c.unread = 0;
            c.messages.iter_mut().for_each(|m| m.read = true);
            c
        })?;
        let _ = self.events.send(InboxEvent::Read { conversation_id: id.to_string() });
        self.get(id).cloned().ok_or_else(|| DispatchError::NotFound(id.to_string()))
    }

    fn append(
        &mut self,
        id: &str,
        sender: Sender,
        kind: MessageKind,
        content: String,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, DispatchError> {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            kind,
            content,
            timestamp: now,
            read: sender == Sender::Me,
        };
        self.conversations = dispatch::update(&self.conversations, id, |c| {
            let mut c = c.clone();
            c.messages.push(message.clone());
            if sender == Sender::Them {
                c.unread += 1;
            }
            c
        })?;
        let unread = self.get(id).map(|c| c.unread).unwrap_or_default();
        // no subscribers is fine
        let _ = self.events.send(InboxEvent::Message {
            conversation_id: id.to_string(),
            message: message.clone(),
            unread,
        });
        Ok(message)
    }
}
