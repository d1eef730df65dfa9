use super::definition::FlowDocument;
use crate::error::FlowConversionError;

/// A trait for custom editor or backend formats that can be converted into
/// a canonical `FlowDocument`.
///
/// This is the extension point that keeps the runtime format-agnostic: the
/// bundled [`crate::ui::UiFlow`] covers the visual editor's JSON export,
/// and embedders with their own authoring format implement this trait on
/// their parsed structs instead.
pub trait IntoFlow {
    /// Consumes the object and converts it into a traversable flow.
    fn into_flow(self) -> Result<FlowDocument, FlowConversionError>;
}
