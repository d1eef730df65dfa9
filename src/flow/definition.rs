use crate::error::FlowConversionError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The complete, canonical definition of a conversation flow, ready for
/// traversal. This is the target structure for any editor-format
/// conversion and is immutable for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct FlowDocument {
    pub id: String,
    pub name: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    index: AHashMap<String, usize>,
}

impl FlowDocument {
    /// Builds a document and its node index. Rejects duplicate node ids,
    /// which would otherwise shadow each other during lookup.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        nodes: Vec<FlowNode>,
        edges: Vec<FlowEdge>,
    ) -> Result<Self, FlowConversionError> {
        let mut index = AHashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(FlowConversionError::Validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            nodes,
            edges,
            index,
        })
    }

    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        self.index.get(node_id).map(|position| &self.nodes[*position])
    }

    /// The entry node: the node explicitly marked as the start, or the
    /// first node without any incoming edge.
    pub fn start_node(&self) -> Option<&FlowNode> {
        self.nodes
            .iter()
            .find(|node| node.kind == NodeKind::Start)
            .or_else(|| {
                self.nodes
                    .iter()
                    .find(|node| !self.edges.iter().any(|edge| edge.target == node.id))
            })
    }

    /// The default transition out of a node: the target of the first edge
    /// (in document order) whose source is `node_id`. Returns `None` when
    /// the node has no outgoing edge or the target id does not resolve.
    pub fn default_next(&self, node_id: &str) -> Option<&FlowNode> {
        self.edges
            .iter()
            .find(|edge| edge.source == node_id)
            .and_then(|edge| self.node(&edge.target))
    }
}

/// A graph vertex holding an ordered list of elements to reveal when the
/// conversation enters it.
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub elements: Vec<Element>,
}

impl FlowNode {
    pub fn is_terminal(&self) -> bool {
        self.kind == NodeKind::End
    }
}

/// The node discriminator the runtime cares about. The editor knows more
/// node flavors (interaction, condition, action); traversal only needs to
/// distinguish the entry and terminal markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    End,
    Standard,
}

/// A directed default transition between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
}

/// One unit of bot output attached to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: String,
    pub content: String,
    pub kind: ElementKind,
}

/// The shape of an element. Exactly one shape applies per element type;
/// unknown editor types degrade to a plain text rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ElementKind {
    Text,
    Image { media_url: Option<String> },
    Video { media_url: Option<String> },
    Audio { media_url: Option<String> },
    Options { options: Vec<OptionChoice> },
    Form { fields: Vec<FormField>, description: Option<String> },
    Input { input_kind: InputKind, placeholder: Option<String> },
    Unknown(String),
}

impl ElementKind {
    /// Whether revealing this element pauses the node processor until the
    /// user interacts. An options element without options (or a form
    /// without fields) is inert and does not pause.
    pub fn is_interactive(&self) -> bool {
        match self {
            ElementKind::Options { options } => !options.is_empty(),
            ElementKind::Form { fields, .. } => !fields.is_empty(),
            ElementKind::Input { .. } => true,
            _ => false,
        }
    }

    pub fn options(&self) -> Option<&[OptionChoice]> {
        match self {
            ElementKind::Options { options } => Some(options),
            _ => None,
        }
    }

    pub fn form_fields(&self) -> Option<&[FormField]> {
        match self {
            ElementKind::Form { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn input_kind(&self) -> Option<InputKind> {
        match self {
            ElementKind::Input { input_kind, .. } => Some(*input_kind),
            _ => None,
        }
    }
}

/// One selectable answer of an options element. `target_node_id` overrides
/// the default edge when it resolves to an existing node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionChoice {
    pub text: String,
    pub image_url: Option<String>,
    pub target_node_id: Option<String>,
}

/// One control of a form element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Tel,
    Date,
    Url,
    Textarea,
    Select,
    Checkbox,
    Radio,
}

/// The declared type of an inline input element, which decides the
/// validation applied on submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Email,
    Number,
}
