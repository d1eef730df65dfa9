//! # Kaiwa - Conversation Flow Runtime
//!
//! **Kaiwa** walks end users through chatbot flows authored in a visual
//! node editor. A flow is a directed graph: each node holds an ordered
//! list of elements (text, media, option prompts, forms, inline inputs)
//! that are revealed with a simulated typing cadence, and edges define the
//! default transition between nodes. Option prompts can override the
//! default edge with an explicit target node, which is how flows branch.
//!
//! ## Core Workflow
//!
//! The runtime is format-agnostic: it operates on a canonical
//! [`flow::FlowDocument`]. The primary workflow is:
//!
//! 1.  **Load a flow**: parse the editor's JSON export with
//!     [`ui::UiFlow::from_json`] (or implement [`flow::IntoFlow`] for your
//!     own format) and convert it into a `FlowDocument`.
//! 2.  **Build a runtime**: wire the collaborators explicitly with
//!     [`runtime::Runtime::builder`] - a [`transport::Gateway`] for the
//!     backend (HTTP or the local no-op one) and optionally a
//!     [`store::SessionStore`] for flow caching and transcript resume.
//! 3.  **Start**: [`runtime::Runtime::start`] creates a session
//!     (best-effort) and reveals the start node's elements.
//! 4.  **Interact**: feed user actions back in with `select_option`,
//!     `submit_form`, `submit_input` or `send_text`; the runtime resolves
//!     the next node and keeps revealing.
//! 5.  **Render**: map the transcript to a presentational tree with
//!     [`render::render_transcript`] (pure and idempotent) whenever the
//!     [`runtime::Runtime::changes`] channel ticks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kaiwa::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("flow.json")?;
//!     let flow = UiFlow::from_json(&json)?.into_flow()?;
//!
//!     let runtime = Runtime::builder(flow)
//!         .gateway(HttpGateway::new("https://chat.example.com"))
//!         .store(FileStore::new(".kaiwa-cache"))
//!         .build();
//!
//!     runtime.start().await?;
//!
//!     // The start node revealed its elements; answer the first prompt.
//!     if let Some(prompt) = runtime.transcript().last().cloned() {
//!         runtime.select_option(&prompt.id, "Yes").await;
//!     }
//!
//!     for rendered in runtime.render() {
//!         println!("{}", TranscriptFormatter::format_message(&rendered));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error policy
//!
//! Only two things are fatal: failing to obtain a flow document and
//! failing to identify its start node (both are [`error::InitError`]).
//! Interaction validation problems come back as
//! [`error::InteractionError`] for inline display and never move the
//! conversation. Everything touching the backend or the local store is
//! best-effort: logged via `tracing` and absorbed.

pub mod error;
pub mod flow;
pub mod prelude;
pub mod render;
pub mod runtime;
pub mod session;
pub mod store;
pub mod transport;
pub mod ui;
