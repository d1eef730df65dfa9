//! Common test utilities: flow builders, a recording gateway, a failing
//! gateway and an in-memory session store.
use async_trait::async_trait;
use kaiwa::prelude::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the runtime told the gateway, in call order.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum GatewayCall {
    SessionCreated { assistant_id: String },
    MessageLogged {
        sender: Sender,
        content: String,
        content_type: MessageKind,
        node_id: Option<String>,
    },
    NodeViewed(String),
    SessionEnded(String),
}

/// A gateway that records every call and always succeeds.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
}

#[allow(dead_code)]
impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn node_views(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::NodeViewed(node_id) => Some(node_id),
                _ => None,
            })
            .collect()
    }

    pub fn ended_sessions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, GatewayCall::SessionEnded(_)))
            .count()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn fetch_flow(&self, _public_id: &str) -> std::result::Result<String, TransportError> {
        Err(TransportError::Disabled)
    }

    async fn create_session(
        &self,
        assistant_id: &str,
        _user_info: &UserInfo,
    ) -> std::result::Result<String, TransportError> {
        self.calls.lock().push(GatewayCall::SessionCreated {
            assistant_id: assistant_id.to_string(),
        });
        Ok("sess-1".to_string())
    }

    async fn log_message(
        &self,
        _session_id: &str,
        message: &OutboundMessage,
    ) -> std::result::Result<(), TransportError> {
        self.calls.lock().push(GatewayCall::MessageLogged {
            sender: message.sender,
            content: message.content.clone(),
            content_type: message.content_type,
            node_id: message.node_id.clone(),
        });
        Ok(())
    }

    async fn node_viewed(&self, _session_id: &str, node_id: &str) -> std::result::Result<(), TransportError> {
        self.calls
            .lock()
            .push(GatewayCall::NodeViewed(node_id.to_string()));
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> std::result::Result<(), TransportError> {
        self.calls
            .lock()
            .push(GatewayCall::SessionEnded(session_id.to_string()));
        Ok(())
    }
}

/// A gateway where every call fails, to prove transport trouble never
/// alters traversal.
#[allow(dead_code)]
pub struct FailingGateway;

#[async_trait]
impl Gateway for FailingGateway {
    async fn fetch_flow(&self, _public_id: &str) -> std::result::Result<String, TransportError> {
        Err(TransportError::Status(500))
    }

    async fn create_session(
        &self,
        _assistant_id: &str,
        _user_info: &UserInfo,
    ) -> std::result::Result<String, TransportError> {
        Err(TransportError::Status(500))
    }

    async fn log_message(
        &self,
        _session_id: &str,
        _message: &OutboundMessage,
    ) -> std::result::Result<(), TransportError> {
        Err(TransportError::Status(500))
    }

    async fn node_viewed(&self, _session_id: &str, _node_id: &str) -> std::result::Result<(), TransportError> {
        Err(TransportError::Status(500))
    }

    async fn end_session(&self, _session_id: &str) -> std::result::Result<(), TransportError> {
        Err(TransportError::Status(500))
    }
}

/// An in-memory session store.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, (Option<String>, Option<TranscriptSnapshot>)>>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_transcript(&self, key: &str) -> Option<TranscriptSnapshot> {
        self.entries
            .lock()
            .get(key)
            .and_then(|(_, snapshot)| snapshot.clone())
    }

    pub fn seed_transcript(&self, key: &str, snapshot: TranscriptSnapshot) {
        self.entries
            .lock()
            .entry(key.to_string())
            .or_default()
            .1 = Some(snapshot);
    }
}

impl SessionStore for MemoryStore {
    fn load_flow(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .get(key)
            .and_then(|(flow, _)| flow.clone()))
    }

    fn save_flow(&self, key: &str, json: &str) -> std::result::Result<(), StoreError> {
        self.entries
            .lock()
            .entry(key.to_string())
            .or_default()
            .0 = Some(json.to_string());
        Ok(())
    }

    fn load_transcript(&self, key: &str) -> std::result::Result<Option<TranscriptSnapshot>, StoreError> {
        Ok(self.saved_transcript(key))
    }

    fn save_transcript(&self, key: &str, snapshot: &TranscriptSnapshot) -> std::result::Result<(), StoreError> {
        self.seed_transcript(key, snapshot.clone());
        Ok(())
    }

    fn clear(&self, key: &str) -> std::result::Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// --- Flow builders ---

#[allow(dead_code)]
pub fn text_el(id: &str, content: &str) -> Element {
    Element {
        id: id.to_string(),
        content: content.to_string(),
        kind: ElementKind::Text,
    }
}

#[allow(dead_code)]
pub fn opt(text: &str, target: Option<&str>) -> OptionChoice {
    OptionChoice {
        text: text.to_string(),
        image_url: None,
        target_node_id: target.map(str::to_string),
    }
}

#[allow(dead_code)]
pub fn options_el(id: &str, content: &str, options: Vec<OptionChoice>) -> Element {
    Element {
        id: id.to_string(),
        content: content.to_string(),
        kind: ElementKind::Options { options },
    }
}

#[allow(dead_code)]
pub fn input_el(id: &str, content: &str, input_kind: InputKind) -> Element {
    Element {
        id: id.to_string(),
        content: content.to_string(),
        kind: ElementKind::Input {
            input_kind,
            placeholder: None,
        },
    }
}

#[allow(dead_code)]
pub fn field(name: &str, label: &str, required: bool) -> FormField {
    FormField {
        name: name.to_string(),
        label: label.to_string(),
        kind: FieldKind::Text,
        required,
        placeholder: None,
        options: Vec::new(),
    }
}

#[allow(dead_code)]
pub fn form_el(id: &str, content: &str, fields: Vec<FormField>) -> Element {
    Element {
        id: id.to_string(),
        content: content.to_string(),
        kind: ElementKind::Form {
            fields,
            description: None,
        },
    }
}

#[allow(dead_code)]
pub fn node(id: &str, kind: NodeKind, elements: Vec<Element>) -> FlowNode {
    FlowNode {
        id: id.to_string(),
        kind,
        label: None,
        elements,
    }
}

#[allow(dead_code)]
pub fn edge(source: &str, target: &str) -> FlowEdge {
    FlowEdge {
        source: source.to_string(),
        target: target.to_string(),
    }
}

#[allow(dead_code)]
pub fn doc(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> FlowDocument {
    FlowDocument::new("flow-1", "Test flow", nodes, edges).expect("valid test flow")
}

/// The branching scenario: start reveals a greeting, the question node
/// offers Yes/No where Yes jumps to a terminal node and the default edge
/// leads elsewhere.
///
/// start("Hello") -> question(Yes -> c, default -> d); c("Great!", end);
/// d("Okay.")
#[allow(dead_code)]
pub fn branching_flow() -> FlowDocument {
    doc(
        vec![
            node("start", NodeKind::Start, vec![text_el("e1", "Hello")]),
            node(
                "question",
                NodeKind::Standard,
                vec![options_el(
                    "e2",
                    "Do you want the good news?",
                    vec![opt("Yes", Some("c")), opt("No", None)],
                )],
            ),
            node("c", NodeKind::End, vec![text_el("e3", "Great!")]),
            node("d", NodeKind::Standard, vec![text_el("e4", "Okay.")]),
        ],
        vec![edge("start", "question"), edge("question", "d")],
    )
}

/// Lets the fire-and-forget gateway tasks run to completion on the
/// current-thread test runtime.
#[allow(dead_code)]
pub async fn drain_spawned_tasks() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
