//! Raw wire structures for the visual editor's flow JSON, and their
//! conversion into the canonical model.

mod types;

pub use types::{
    UiEdge, UiElement, UiFlow, UiFormField, UiNode, UiNodeData, UiOption, UiSelectOption,
};
