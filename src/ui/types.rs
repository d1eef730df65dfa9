use crate::error::FlowConversionError;
use crate::flow::{
    Element, ElementKind, FieldKind, FlowDocument, FlowEdge, FlowNode, FormField, InputKind,
    IntoFlow, NodeKind, OptionChoice,
};
use serde::Deserialize;
use uuid::Uuid;

/// The raw flow document as exported by the visual editor and served by
/// the backend (`GET /api/assistants/{publicId}/flow`).
#[derive(Debug, Deserialize)]
pub struct UiFlow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<UiNode>,
    #[serde(default)]
    pub edges: Vec<UiEdge>,
}

impl UiFlow {
    pub fn from_json(json: &str) -> Result<Self, FlowConversionError> {
        serde_json::from_str(json).map_err(|e| FlowConversionError::JsonParse(e.to_string()))
    }
}

/// A raw editor node. The node discriminator appears at the top level in
/// the published flow and under `data` in the editor's own store; both are
/// accepted, with the top-level one winning.
#[derive(Debug, Deserialize)]
pub struct UiNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub data: Option<UiNodeData>,
}

#[derive(Debug, Deserialize)]
pub struct UiNodeData {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub elements: Vec<UiElement>,
}

/// A raw reveal element with the editor's camelCase field names.
#[derive(Debug, Deserialize)]
pub struct UiElement {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub element_type: String,
    pub content: Option<String>,
    pub options: Option<Vec<UiOption>>,
    #[serde(alias = "formFields")]
    pub form_fields: Option<Vec<UiFormField>>,
    #[serde(alias = "formDescription")]
    pub form_description: Option<String>,
    #[serde(alias = "inputType")]
    pub input_type: Option<String>,
    pub placeholder: Option<String>,
    #[serde(alias = "mediaUrl")]
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UiOption {
    pub text: String,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(alias = "targetNodeId")]
    pub target_node_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UiFormField {
    pub name: Option<String>,
    pub id: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<UiSelectOption>,
}

/// Select/radio choices arrive either as plain strings or as objects with
/// any of `value`/`label`/`text` set, depending on which editor version
/// exported the flow.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UiSelectOption {
    Text(String),
    Object {
        value: Option<String>,
        label: Option<String>,
        text: Option<String>,
    },
}

impl UiSelectOption {
    fn into_text(self) -> String {
        match self {
            UiSelectOption::Text(text) => text,
            UiSelectOption::Object { value, label, text } => {
                value.or(label).or(text).unwrap_or_default()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UiEdge {
    pub source: String,
    pub target: String,
}

impl IntoFlow for UiFlow {
    fn into_flow(self) -> Result<FlowDocument, FlowConversionError> {
        let nodes = self.nodes.into_iter().map(convert_node).collect();
        let edges = self
            .edges
            .into_iter()
            .map(|edge| FlowEdge {
                source: edge.source,
                target: edge.target,
            })
            .collect();
        FlowDocument::new(self.id, self.name, nodes, edges)
    }
}

fn convert_node(node: UiNode) -> FlowNode {
    let (label, data_type, elements) = match node.data {
        Some(data) => (data.label, data.data_type, data.elements),
        None => (None, None, Vec::new()),
    };
    let kind = node_kind(node.node_type.as_deref().or(data_type.as_deref()));
    FlowNode {
        id: node.id,
        kind,
        label,
        elements: elements.into_iter().map(convert_element).collect(),
    }
}

fn node_kind(raw: Option<&str>) -> NodeKind {
    match raw {
        Some("start") | Some("startNode") => NodeKind::Start,
        Some("end") | Some("endNode") => NodeKind::End,
        _ => NodeKind::Standard,
    }
}

fn convert_element(element: UiElement) -> Element {
    let kind = match element.element_type.as_str() {
        "text" => ElementKind::Text,
        "image" => ElementKind::Image { media_url: element.media_url },
        "video" => ElementKind::Video { media_url: element.media_url },
        "audio" => ElementKind::Audio { media_url: element.media_url },
        // The public chat runtime and the editor preview disagree on the
        // tag for option prompts; accept both.
        "options" | "question" => ElementKind::Options {
            options: element
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|option| OptionChoice {
                    text: option.text,
                    image_url: option.image_url,
                    target_node_id: option.target_node_id,
                })
                .collect(),
        },
        "form" => ElementKind::Form {
            fields: element
                .form_fields
                .unwrap_or_default()
                .into_iter()
                .map(convert_form_field)
                .collect(),
            description: element.form_description,
        },
        "input" => ElementKind::Input {
            input_kind: input_kind(element.input_type.as_deref()),
            placeholder: element.placeholder,
        },
        other => ElementKind::Unknown(other.to_string()),
    };
    Element {
        id: element
            .id
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        content: element.content.unwrap_or_default(),
        kind,
    }
}

fn convert_form_field(field: UiFormField) -> FormField {
    // The field's submission key falls back from `name` to `id` to the
    // label; form markup uses the same fallback chain.
    let label = field.label.clone();
    let name = field
        .name
        .or(field.id)
        .or(label)
        .unwrap_or_default();
    FormField {
        label: field.label.unwrap_or_else(|| name.clone()),
        name,
        kind: field_kind(field.field_type.as_deref()),
        required: field.required,
        placeholder: field.placeholder,
        options: field
            .options
            .into_iter()
            .map(UiSelectOption::into_text)
            .collect(),
    }
}

fn field_kind(raw: Option<&str>) -> FieldKind {
    match raw {
        Some("email") => FieldKind::Email,
        Some("number") => FieldKind::Number,
        Some("tel") => FieldKind::Tel,
        Some("date") => FieldKind::Date,
        Some("url") => FieldKind::Url,
        Some("textarea") => FieldKind::Textarea,
        Some("select") => FieldKind::Select,
        Some("checkbox") => FieldKind::Checkbox,
        Some("radio") => FieldKind::Radio,
        _ => FieldKind::Text,
    }
}

fn input_kind(raw: Option<&str>) -> InputKind {
    match raw {
        Some("email") => InputKind::Email,
        Some("number") => InputKind::Number,
        _ => InputKind::Text,
    }
}
