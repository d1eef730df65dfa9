//! The traversal engine: owns the conversation state, walks the flow
//! graph, and coordinates the node processor, the interaction handlers,
//! the backend gateway and the local session store.
//!
//! Concurrency model: one logical conversation per `Runtime`. State lives
//! behind a mutex that is only ever held between suspension points, never
//! across one, so a reveal in progress does not block reads or a reset.
//! Gateway reporting is fire-and-forget on spawned tasks. Pending reveals
//! hold a clone of a cancellation token that `reset` swaps out, so a
//! reveal scheduled before a reset can never complete into the fresh
//! transcript.

mod handlers;
mod processor;

use crate::error::InitError;
use crate::flow::{FlowDocument, IntoFlow};
use crate::render::{RenderedMessage, render_transcript};
use crate::session::{ConversationState, Message};
use crate::store::SessionStore;
use crate::transport::{Gateway, NullGateway, OutboundMessage, UserInfo};
use crate::ui::UiFlow;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The simulated typing cadence: a floor, plus a per-character cost for
/// longer texts.
#[derive(Debug, Clone, Copy)]
pub struct TypingConfig {
    pub floor: Duration,
    pub per_char: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(500),
            per_char: Duration::from_millis(10),
        }
    }
}

impl TypingConfig {
    pub fn delay_for(&self, content: &str) -> Duration {
        let chars = content.chars().count() as u32;
        self.per_char
            .checked_mul(chars)
            .unwrap_or(self.floor)
            .max(self.floor)
    }
}

/// Builds a [`Runtime`] with explicit collaborator wiring. Defaults: a
/// [`NullGateway`], no store, standard typing cadence.
pub struct RuntimeBuilder {
    flow: FlowDocument,
    gateway: Arc<dyn Gateway>,
    store: Option<Arc<dyn SessionStore>>,
    store_key: Option<String>,
    typing: TypingConfig,
    user_info: UserInfo,
}

impl RuntimeBuilder {
    fn new(flow: FlowDocument) -> Self {
        Self {
            flow,
            gateway: Arc::new(NullGateway),
            store: None,
            store_key: None,
            typing: TypingConfig::default(),
            user_info: UserInfo::default(),
        }
    }

    pub fn gateway(mut self, gateway: impl Gateway + 'static) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    pub fn shared_gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the store key, which defaults to the flow's id.
    pub fn store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = Some(key.into());
        self
    }

    pub fn typing(mut self, typing: TypingConfig) -> Self {
        self.typing = typing;
        self
    }

    pub fn user_info(mut self, user_info: UserInfo) -> Self {
        self.user_info = user_info;
        self
    }

    pub fn build(self) -> Runtime {
        let store_key = self.store_key.unwrap_or_else(|| {
            if self.flow.id.is_empty() {
                "default".to_string()
            } else {
                self.flow.id.clone()
            }
        });
        let (revision, _) = watch::channel(0);
        Runtime {
            inner: Arc::new(Inner {
                flow: self.flow,
                state: Mutex::new(ConversationState {
                    is_loading: true,
                    ..ConversationState::default()
                }),
                gateway: self.gateway,
                store: self.store,
                store_key,
                typing: self.typing,
                user_info: self.user_info,
                revision,
                reveal_token: Mutex::new(CancellationToken::new()),
            }),
        }
    }
}

/// The conversation runtime. Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

struct Inner {
    flow: FlowDocument,
    state: Mutex<ConversationState>,
    gateway: Arc<dyn Gateway>,
    store: Option<Arc<dyn SessionStore>>,
    store_key: String,
    typing: TypingConfig,
    user_info: UserInfo,
    revision: watch::Sender<u64>,
    reveal_token: Mutex<CancellationToken>,
}

impl Runtime {
    pub fn builder(flow: FlowDocument) -> RuntimeBuilder {
        RuntimeBuilder::new(flow)
    }

    pub fn flow(&self) -> &FlowDocument {
        &self.inner.flow
    }

    /// A snapshot of the transcript.
    pub fn transcript(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    pub fn current_node_id(&self) -> Option<String> {
        self.inner.state.lock().current_node_id.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.state.lock().session_id.clone()
    }

    pub fn selected_option(&self) -> Option<String> {
        self.inner.state.lock().selected_option.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().is_loading
    }

    /// Whether the conversation is paused on an interactive element.
    pub fn is_awaiting_interaction(&self) -> bool {
        self.inner
            .state
            .lock()
            .messages
            .last()
            .is_some_and(Message::awaits_interaction)
    }

    /// A receiver that observes a revision counter bumped on every state
    /// mutation, for UIs that re-render on change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Renders the current transcript to its presentational form.
    pub fn render(&self) -> Vec<RenderedMessage> {
        let state = self.inner.state.lock();
        render_transcript(&state.messages, state.selected_option.as_deref())
    }

    /// Starts the conversation: restores a saved transcript when the
    /// store has one, otherwise creates a backend session (best-effort)
    /// and processes the start node.
    ///
    /// Failing to identify a start node is fatal and should be surfaced
    /// to the end user; a failed session creation is not, and merely
    /// disables analytics for the rest of the session.
    pub async fn start(&self) -> Result<(), InitError> {
        let start_id = self
            .inner
            .flow
            .start_node()
            .map(|node| node.id.clone())
            .ok_or(InitError::StartNodeNotFound)?;

        if let Some(store) = &self.inner.store {
            match store.load_transcript(&self.inner.store_key) {
                Ok(Some(snapshot)) if !snapshot.messages.is_empty() => {
                    debug!(key = %self.inner.store_key, "restoring saved transcript");
                    {
                        let mut state = self.inner.state.lock();
                        state.messages = snapshot.messages;
                        state.current_node_id = snapshot.current_node_id;
                        state.is_loading = false;
                    }
                    self.bump_revision();
                    return Ok(());
                }
                Ok(_) => {}
                Err(error) => warn!(%error, "failed to load saved transcript"),
            }
        }

        {
            let mut state = self.inner.state.lock();
            state.is_loading = false;
            state.current_node_id = Some(start_id.clone());
        }
        self.bump_revision();

        match self
            .inner
            .gateway
            .create_session(&self.inner.flow.id, &self.inner.user_info)
            .await
        {
            Ok(session_id) => {
                debug!(%session_id, "session created");
                self.inner.state.lock().session_id = Some(session_id);
            }
            Err(error) => {
                warn!(%error, "session creation failed; continuing without analytics")
            }
        }

        self.process_node(&start_id).await;
        Ok(())
    }

    /// Discards the session: cancels pending reveals, requests session
    /// termination (best-effort), clears the transcript and the store
    /// entry, and starts over from the start node.
    pub async fn reset(&self) -> Result<(), InitError> {
        {
            let mut token = self.inner.reveal_token.lock();
            token.cancel();
            *token = CancellationToken::new();
        }

        if let Some(session_id) = self.session_id() {
            let gateway = Arc::clone(&self.inner.gateway);
            tokio::spawn(async move {
                if let Err(error) = gateway.end_session(&session_id).await {
                    warn!(%error, "session-end request failed");
                }
            });
        }

        {
            let mut state = self.inner.state.lock();
            state.messages.clear();
            state.current_node_id = None;
            state.session_id = None;
            state.selected_option = None;
            state.is_loading = true;
        }
        self.bump_revision();

        if let Some(store) = &self.inner.store {
            if let Err(error) = store.clear(&self.inner.store_key) {
                warn!(%error, "failed to clear session store entry");
            }
        }

        self.start().await
    }

    /// Follows the default edge out of the current node, for embedders
    /// that want to continue past a node whose elements are all passive.
    /// Silent no-op when there is no cursor or no outgoing edge.
    pub async fn advance(&self) {
        self.advance_via_default_edge().await;
    }

    pub(crate) fn reveal_token(&self) -> CancellationToken {
        self.inner.reveal_token.lock().clone()
    }

    pub(crate) fn set_current_node(&self, node_id: &str) {
        self.inner.state.lock().current_node_id = Some(node_id.to_string());
        self.after_mutation();
    }

    pub(crate) fn push_message(&self, message: Message) {
        self.inner.state.lock().messages.push(message);
        self.after_mutation();
    }

    /// Completes a revealed message in place. Returns false when the
    /// message no longer exists (the transcript was reset meanwhile).
    pub(crate) fn complete_message(&self, message_id: &str, content: &str) -> bool {
        let found = {
            let mut state = self.inner.state.lock();
            match state.message_mut(message_id) {
                Some(message) => {
                    message.is_typing = false;
                    message.content = content.to_string();
                    true
                }
                None => false,
            }
        };
        if found {
            self.after_mutation();
        }
        found
    }

    pub(crate) fn spawn_log_message(&self, session_id: String, outbound: OutboundMessage) {
        let gateway = Arc::clone(&self.inner.gateway);
        tokio::spawn(async move {
            if let Err(error) = gateway.log_message(&session_id, &outbound).await {
                warn!(%error, "message log failed");
            }
        });
    }

    pub(crate) fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.inner.gateway)
    }

    pub(crate) fn typing(&self) -> TypingConfig {
        self.inner.typing
    }

    fn bump_revision(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn after_mutation(&self) {
        self.bump_revision();
        if let Some(store) = &self.inner.store {
            let snapshot = self.inner.state.lock().snapshot();
            if let Err(error) = store.save_transcript(&self.inner.store_key, &snapshot) {
                warn!(%error, "failed to persist transcript");
            }
        }
    }
}

/// Resolves the flow document for an assistant: the cached raw JSON when
/// the store has a readable copy, otherwise a gateway fetch that is then
/// cached. Fetch and parse failures are the fatal initialization path.
pub async fn load_flow_document(
    gateway: &dyn Gateway,
    store: Option<&dyn SessionStore>,
    public_id: &str,
) -> Result<FlowDocument, InitError> {
    if let Some(store) = store {
        match store.load_flow(public_id) {
            Ok(Some(json)) => match UiFlow::from_json(&json).and_then(IntoFlow::into_flow) {
                Ok(flow) => {
                    debug!(public_id, "flow loaded from local cache");
                    return Ok(flow);
                }
                Err(error) => warn!(%error, "cached flow is unreadable; refetching"),
            },
            Ok(None) => {}
            Err(error) => warn!(%error, "failed to read cached flow"),
        }
    }

    let json = gateway.fetch_flow(public_id).await?;
    let flow = UiFlow::from_json(&json)?.into_flow()?;
    if let Some(store) = store {
        if let Err(error) = store.save_flow(public_id, &json) {
            warn!(%error, "failed to cache flow document");
        }
    }
    Ok(flow)
}
