//! The per-session conversation state: the transcript message model, the
//! mutable state container owned by the runtime, and the snapshot shape
//! persisted by the session store.

use crate::flow::{Element, ElementKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Bot,
    User,
}

/// The content type of a transcript entry. Bot entries mirror the element
/// kind they reveal; user entries are `Option`, `Form` or `Text` replies.
/// The serialized form doubles as the gateway `content_type` string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    Options,
    Form,
    Input,
    Option,
    Unknown,
}

impl From<&ElementKind> for MessageKind {
    fn from(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Text => MessageKind::Text,
            ElementKind::Image { .. } => MessageKind::Image,
            ElementKind::Video { .. } => MessageKind::Video,
            ElementKind::Audio { .. } => MessageKind::Audio,
            ElementKind::Options { .. } => MessageKind::Options,
            ElementKind::Form { .. } => MessageKind::Form,
            ElementKind::Input { .. } => MessageKind::Input,
            ElementKind::Unknown(_) => MessageKind::Unknown,
        }
    }
}

/// One transcript entry.
///
/// Bot messages are appended by the node processor with `is_typing = true`
/// and empty content, then completed in place once the simulated typing
/// delay elapses. User messages are appended complete by the interaction
/// handlers. Entries are never deleted except by a full session reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    /// The origin node, for bot-authored entries.
    pub node_id: Option<String>,
    pub content: String,
    pub kind: MessageKind,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Transient reveal flag: the message has been appended but its
    /// content is still being "typed".
    pub is_typing: bool,
    /// Back-reference to the originating element, needed to resolve which
    /// option or field a later interaction refers to.
    pub element: Option<Element>,
    /// Set once the message's interactive controls have been used;
    /// renders them disabled and makes re-use a no-op.
    pub interacted: bool,
}

impl Message {
    /// A bot message at the start of its reveal.
    pub fn bot_typing(node_id: &str, element: &Element) -> Self {
        Self {
            id: format!("bot-{}", Uuid::new_v4().simple()),
            node_id: Some(node_id.to_string()),
            content: String::new(),
            kind: MessageKind::from(&element.kind),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            is_typing: true,
            element: Some(element.clone()),
            interacted: false,
        }
    }

    /// A complete bot message with no backing element (used for canned
    /// fallback replies).
    pub fn bot_text_typing(content_kind: MessageKind) -> Self {
        Self {
            id: format!("bot-{}", Uuid::new_v4().simple()),
            node_id: None,
            content: String::new(),
            kind: content_kind,
            sender: Sender::Bot,
            timestamp: Utc::now(),
            is_typing: true,
            element: None,
            interacted: false,
        }
    }

    /// A complete user reply.
    pub fn user(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4().simple()),
            node_id: None,
            content: content.into(),
            kind,
            sender: Sender::User,
            timestamp: Utc::now(),
            is_typing: false,
            element: None,
            interacted: false,
        }
    }

    /// Whether this message still offers an interaction to the user.
    pub fn awaits_interaction(&self) -> bool {
        self.sender == Sender::Bot
            && !self.is_typing
            && !self.interacted
            && self
                .element
                .as_ref()
                .is_some_and(|element| element.kind.is_interactive())
    }
}

/// The mutable state of one browser-session-equivalent conversation.
/// Single writer: only the node processor and the interaction handlers
/// mutate it, and the runtime serializes their access.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub current_node_id: Option<String>,
    pub session_id: Option<String>,
    /// Transient UI marker for the most recently chosen option text.
    pub selected_option: Option<String>,
    pub is_loading: bool,
}

impl ConversationState {
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|message| message.id == message_id)
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            messages: self.messages.clone(),
            current_node_id: self.current_node_id.clone(),
        }
    }
}

/// The shape persisted by the session store for transcript resume: the
/// full message list plus the traversal cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    pub messages: Vec<Message>,
    pub current_node_id: Option<String>,
}
