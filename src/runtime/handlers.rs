//! The interaction handlers: option selection, form submission, inline
//! input submission and free-text entry. All follow the same shape:
//! validate, record the user message, report it to the gateway
//! (fire-and-forget), resolve the next node, resume the node processor.
//!
//! Handlers invoked with missing context (an unknown message id, a
//! message without the expected element, an already-used control) are
//! silent no-ops. Validation failures are returned for inline display
//! and leave the conversation state untouched.

use super::Runtime;
use crate::error::InteractionError;
use crate::flow::InputKind;
use crate::session::{Message, MessageKind, Sender};
use crate::transport::OutboundMessage;
use chrono::Utc;
use itertools::Itertools;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

const UNMATCHED_REPLY: &str =
    "Sorry, I didn't catch that. Please pick one of the suggested options.";

/// Outcome of matching free text against the latest options prompt.
enum TextMatch {
    NoPrompt,
    NoMatch,
    Matched(Option<String>),
}

impl Runtime {
    /// Handles a click on one option of an options prompt.
    ///
    /// The chosen option's `target_node_id` wins when it resolves to an
    /// existing node; otherwise traversal falls back to the default edge
    /// of the current node. Re-selecting on an already-answered prompt is
    /// a no-op.
    pub async fn select_option(&self, message_id: &str, option_text: &str) {
        let resolved = {
            let state = self.inner.state.lock();
            let Some(message) = state.message(message_id) else {
                return;
            };
            if message.is_typing || message.interacted {
                return;
            }
            let Some(options) = message.element.as_ref().and_then(|e| e.kind.options()) else {
                return;
            };
            let Some(option) = options.iter().find(|option| option.text == option_text) else {
                return;
            };
            (option.target_node_id.clone(), message.node_id.clone())
        };
        let (target, origin_node) = resolved;

        {
            let mut state = self.inner.state.lock();
            state.selected_option = Some(option_text.to_string());
            if let Some(message) = state.message_mut(message_id) {
                message.interacted = true;
            }
            state
                .messages
                .push(Message::user(MessageKind::Option, option_text));
        }
        self.after_mutation();

        self.log_user_message(
            option_text.to_string(),
            MessageKind::Option,
            origin_node,
            json!({
                "option_text": option_text,
                "timestamp": Utc::now().timestamp_millis(),
            }),
        );

        if let Some(target_id) = target {
            if self.inner.flow.node(&target_id).is_some() {
                self.set_current_node(&target_id);
                self.process_node(&target_id).await;
                return;
            }
            debug!(%target_id, "option target does not resolve; using default edge");
        }
        self.advance_via_default_edge().await;
    }

    /// Handles a form submission with the control values keyed by field
    /// name. Every required field must carry a non-empty trimmed value;
    /// otherwise the offending field names are returned and nothing is
    /// recorded or advanced.
    pub async fn submit_form(
        &self,
        message_id: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), InteractionError> {
        let resolved = {
            let state = self.inner.state.lock();
            let Some(message) = state.message(message_id) else {
                return Ok(());
            };
            if message.is_typing || message.interacted {
                return Ok(());
            }
            let Some(fields) = message.element.as_ref().and_then(|e| e.kind.form_fields())
            else {
                return Ok(());
            };
            if fields.is_empty() {
                return Ok(());
            }
            (fields.to_vec(), message.node_id.clone())
        };
        let (fields, origin_node) = resolved;

        let missing: Vec<String> = fields
            .iter()
            .filter(|field| {
                field.required
                    && values
                        .get(&field.name)
                        .is_none_or(|value| value.trim().is_empty())
            })
            .map(|field| field.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(InteractionError::MissingRequiredFields { fields: missing });
        }

        // One reply echoing the whole form, in declared field order.
        let content = fields
            .iter()
            .filter_map(|field| {
                let value = values.get(&field.name)?.trim();
                (!value.is_empty()).then(|| format!("{}: {}", field.label, value))
            })
            .join("\n");

        {
            let mut state = self.inner.state.lock();
            if let Some(message) = state.message_mut(message_id) {
                message.interacted = true;
            }
            state
                .messages
                .push(Message::user(MessageKind::Form, content.clone()));
        }
        self.after_mutation();

        self.log_user_message(
            content,
            MessageKind::Form,
            origin_node,
            json!({
                "form_values": values,
                "timestamp": Utc::now().timestamp_millis(),
            }),
        );

        self.advance_via_default_edge().await;
        Ok(())
    }

    /// Handles an inline input submission. The value must be non-empty
    /// after trimming; email inputs must look like `local@domain.tld`
    /// and number inputs must parse.
    pub async fn submit_input(
        &self,
        message_id: &str,
        value: &str,
    ) -> Result<(), InteractionError> {
        let resolved = {
            let state = self.inner.state.lock();
            let Some(message) = state.message(message_id) else {
                return Ok(());
            };
            if message.is_typing || message.interacted {
                return Ok(());
            }
            let Some(input_kind) = message.element.as_ref().and_then(|e| e.kind.input_kind())
            else {
                return Ok(());
            };
            (input_kind, message.node_id.clone())
        };
        let (input_kind, origin_node) = resolved;

        let value = value.trim();
        if value.is_empty() {
            return Err(InteractionError::EmptyInput);
        }
        match input_kind {
            InputKind::Email if !is_valid_email(value) => {
                return Err(InteractionError::InvalidEmail(value.to_string()));
            }
            InputKind::Number if value.parse::<f64>().is_err() => {
                return Err(InteractionError::InvalidNumber(value.to_string()));
            }
            _ => {}
        }

        {
            let mut state = self.inner.state.lock();
            if let Some(message) = state.message_mut(message_id) {
                message.interacted = true;
            }
            state
                .messages
                .push(Message::user(MessageKind::Text, value));
        }
        self.after_mutation();

        self.log_user_message(
            value.to_string(),
            MessageKind::Text,
            origin_node,
            json!({
                "input_type": input_kind,
                "timestamp": Utc::now().timestamp_millis(),
            }),
        );

        self.advance_via_default_edge().await;
        Ok(())
    }

    /// Handles free text typed into the composer. The text is matched
    /// case-insensitively against the latest options prompt: a match with
    /// a resolvable target jumps there, a miss gets a canned bot reply,
    /// and with no prompt on record the text is just transcribed.
    pub async fn send_text(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        {
            let mut state = self.inner.state.lock();
            state.messages.push(Message::user(MessageKind::Text, text));
        }
        self.after_mutation();

        self.log_user_message(
            text.to_string(),
            MessageKind::Text,
            self.current_node_id(),
            json!({ "timestamp": Utc::now().timestamp_millis() }),
        );

        let matched = {
            let state = self.inner.state.lock();
            let prompt = state.messages.iter().rev().find(|message| {
                message.sender == Sender::Bot
                    && message
                        .element
                        .as_ref()
                        .and_then(|e| e.kind.options())
                        .is_some_and(|options| !options.is_empty())
            });
            match prompt.and_then(|message| message.element.as_ref()) {
                None => TextMatch::NoPrompt,
                Some(element) => {
                    let options = element.kind.options().unwrap_or_default();
                    match options
                        .iter()
                        .find(|option| option.text.eq_ignore_ascii_case(text))
                    {
                        Some(option) => TextMatch::Matched(option.target_node_id.clone()),
                        None => TextMatch::NoMatch,
                    }
                }
            }
        };

        match matched {
            TextMatch::NoPrompt => {}
            TextMatch::Matched(target) => {
                if let Some(target_id) = target {
                    if self.inner.flow.node(&target_id).is_some() {
                        self.set_current_node(&target_id);
                        self.process_node(&target_id).await;
                    }
                }
            }
            TextMatch::NoMatch => self.reveal_bot_text(UNMATCHED_REPLY).await,
        }
    }

    /// The shared non-option transition: follow the first edge out of the
    /// current node, or end traversal silently when there is none.
    pub(crate) async fn advance_via_default_edge(&self) {
        let Some(current) = self.current_node_id() else {
            return;
        };
        let Some(next_id) = self
            .inner
            .flow
            .default_next(&current)
            .map(|node| node.id.clone())
        else {
            debug!(%current, "no outgoing edge; conversation ended");
            return;
        };
        self.set_current_node(&next_id);
        self.process_node(&next_id).await;
    }

    fn log_user_message(
        &self,
        content: String,
        kind: MessageKind,
        node_id: Option<String>,
        metadata: serde_json::Value,
    ) {
        let Some(session_id) = self.session_id() else {
            return;
        };
        let outbound = OutboundMessage {
            sender: Sender::User,
            content,
            content_type: kind,
            node_id,
            metadata,
        };
        self.spawn_log_message(session_id, outbound);
    }
}

/// Intentionally simple email check: ASCII, exactly one `@`, a `.`
/// somewhere after it with characters on both sides, and no whitespace
/// anywhere.
fn is_valid_email(value: &str) -> bool {
    if !value.is_ascii() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}
