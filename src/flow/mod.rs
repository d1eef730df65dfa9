//! The canonical flow model: a directed graph of nodes holding ordered
//! reveal elements, plus the conversion trait for editor formats.

mod conversion;
mod definition;

pub use conversion::IntoFlow;
pub use definition::{
    Element, ElementKind, FieldKind, FlowDocument, FlowEdge, FlowNode, FormField, InputKind,
    NodeKind, OptionChoice,
};
