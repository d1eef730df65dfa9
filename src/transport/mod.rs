//! The backend service boundary: session creation, message logging,
//! node-view tracking and session termination, consumed as a black box.
//!
//! Every call is best-effort from the runtime's point of view: a failure
//! is logged and never alters local traversal state.

mod http;
mod null;

pub use http::HttpGateway;
pub use null::NullGateway;

use crate::error::TransportError;
use crate::session::{MessageKind, Sender};
use async_trait::async_trait;
use serde::Serialize;

/// The wire shape of a logged transcript message
/// (`POST /api/sessions/{sessionId}/messages`).
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub sender: Sender,
    pub content: String,
    pub content_type: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub metadata: serde_json::Value,
}

/// Context about the end user attached to session creation. Field names
/// follow the backend's expectations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// The backend gateway contract.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetches the raw flow document JSON for a published assistant.
    async fn fetch_flow(&self, public_id: &str) -> Result<String, TransportError>;

    /// Creates a conversation session and returns its id.
    async fn create_session(
        &self,
        assistant_id: &str,
        user_info: &UserInfo,
    ) -> Result<String, TransportError>;

    /// Logs one transcript message against a session.
    async fn log_message(
        &self,
        session_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), TransportError>;

    /// Marks a node as viewed within a session.
    async fn node_viewed(&self, session_id: &str, node_id: &str) -> Result<(), TransportError>;

    /// Marks a session as closed.
    async fn end_session(&self, session_id: &str) -> Result<(), TransportError>;
}
