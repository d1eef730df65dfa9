//! Prelude module for convenient imports
//!
//! Re-exports the types most embedders need: the flow model and its
//! conversion entry points, the runtime and its builder, the renderer,
//! and the gateway/store collaborators.
//!
//! # Example
//!
//! ```rust,no_run
//! use kaiwa::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/flow.json")?;
//! let flow = UiFlow::from_json(&json)?.into_flow()?;
//!
//! let runtime = Runtime::builder(flow).build();
//! runtime.start().await?;
//!
//! for rendered in runtime.render() {
//!     println!("{}", TranscriptFormatter::format_message(&rendered));
//! }
//! # Ok(())
//! # }
//! ```

// Flow model and conversion
pub use crate::flow::{
    Element, ElementKind, FieldKind, FlowDocument, FlowEdge, FlowNode, FormField, InputKind,
    IntoFlow, NodeKind, OptionChoice,
};
pub use crate::ui::UiFlow;

// Runtime
pub use crate::runtime::{Runtime, RuntimeBuilder, TypingConfig, load_flow_document};

// Session types
pub use crate::session::{ConversationState, Message, MessageKind, Sender, TranscriptSnapshot};

// Rendering
pub use crate::render::{
    FormReplyLine, MediaKind, MessageBody, RenderedForm, RenderedInput, RenderedMessage,
    RenderedOption, TranscriptFormatter, render_message, render_transcript,
};

// Collaborators
pub use crate::store::{FileStore, SessionStore};
pub use crate::transport::{Gateway, HttpGateway, NullGateway, OutboundMessage, UserInfo};

// Error types
pub use crate::error::{
    FlowConversionError, InitError, InteractionError, StoreError, TransportError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
