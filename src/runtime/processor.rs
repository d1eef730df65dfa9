//! The node processor: reveals a node's elements into the transcript with
//! a simulated typing cadence and pauses on the first interactive one.

use super::Runtime;
use crate::flow::FlowNode;
use crate::session::{Message, MessageKind, Sender};
use crate::transport::OutboundMessage;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

impl Runtime {
    /// Reveals the elements of a node in order.
    ///
    /// Each element gets exactly one transcript message: appended with the
    /// typing flag set, completed in place after the typing delay. Elements
    /// are revealed strictly sequentially; an interactive element (options
    /// with at least one option, a form with at least one field, or an
    /// inline input) stops processing and leaves the node awaiting
    /// interaction. A node that ends on passive elements stays put until
    /// the embedder advances explicitly.
    pub(crate) async fn process_node(&self, node_id: &str) {
        let Some(node) = self.inner.flow.node(node_id) else {
            warn!(node_id, "cannot process unknown node");
            return;
        };
        if node.elements.is_empty() {
            warn!(node_id, "node has no elements to reveal");
            return;
        }

        let token = self.reveal_token();
        self.report_node_entry(node);

        for element in &node.elements {
            let message = Message::bot_typing(&node.id, element);
            let message_id = message.id.clone();
            self.push_message(message);

            let delay = self.typing().delay_for(&element.content);
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(node_id, "reveal cancelled by session reset");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // The transcript may have been reset while we slept; in that
            // case the message is gone and the node is abandoned.
            if !self.complete_message(&message_id, &element.content) {
                return;
            }

            if element.kind.is_interactive() {
                break;
            }
        }
    }

    /// Once-per-entry side effects, all fire-and-forget: the node-viewed
    /// report, the prompt text as a tracked bot message, and the session
    /// termination request for terminal nodes. Skipped entirely when no
    /// session exists; failures never block traversal.
    fn report_node_entry(&self, node: &FlowNode) {
        let Some(session_id) = self.session_id() else {
            return;
        };

        {
            let gateway = self.gateway();
            let session_id = session_id.clone();
            let node_id = node.id.clone();
            tokio::spawn(async move {
                if let Err(error) = gateway.node_viewed(&session_id, &node_id).await {
                    warn!(%error, %node_id, "node-viewed report failed");
                }
            });
        }

        if let Some(first) = node.elements.first() {
            if !first.content.trim().is_empty() {
                let outbound = OutboundMessage {
                    sender: Sender::Bot,
                    content: first.content.clone(),
                    content_type: MessageKind::from(&first.kind),
                    node_id: Some(node.id.clone()),
                    metadata: json!({ "timestamp": Utc::now().timestamp_millis() }),
                };
                self.spawn_log_message(session_id.clone(), outbound);
            }
        }

        if node.is_terminal() {
            let gateway = self.gateway();
            tokio::spawn(async move {
                if let Err(error) = gateway.end_session(&session_id).await {
                    warn!(%error, "session-end request failed");
                }
            });
        }
    }

    /// Reveals a canned bot reply (no backing element) with the usual
    /// typing cadence.
    pub(crate) async fn reveal_bot_text(&self, content: &str) {
        let message = Message::bot_text_typing(MessageKind::Text);
        let message_id = message.id.clone();
        self.push_message(message);

        let token = self.reveal_token();
        let delay = self.typing().delay_for(content);
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        self.complete_message(&message_id, content);
    }
}
