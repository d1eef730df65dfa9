//! Pure mapping from transcript messages to a presentational tree.
//!
//! Rendering reads nothing but its inputs and is idempotent: two calls
//! over an unchanged transcript yield identical output. The only two
//! state-dependent decisions are the sender header (shown once per run of
//! consecutive bot messages) and the selected-option marker.

mod formatter;

pub use formatter::TranscriptFormatter;

use crate::flow::{ElementKind, FormField, InputKind};
use crate::session::{Message, MessageKind, Sender};

/// The presentational form of one transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub message_id: String,
    pub sender: Sender,
    /// Whether to show the bot header above this entry: true for a bot
    /// message that is first in the transcript or follows a non-bot one.
    pub show_header: bool,
    pub body: MessageBody,
    pub options: Vec<RenderedOption>,
    pub form: Option<RenderedForm>,
    pub input: Option<RenderedInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// The reveal is still in progress; show a typing indicator.
    Typing,
    Text(String),
    Media {
        kind: MediaKind,
        url: String,
        caption: Option<String>,
    },
    /// A submitted form echoed back as `label: value` rows.
    FormReply(Vec<FormReplyLine>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormReplyLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOption {
    pub text: String,
    pub image_url: Option<String>,
    pub selected: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedForm {
    pub fields: Vec<FormField>,
    pub description: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInput {
    pub input_kind: InputKind,
    pub placeholder: Option<String>,
    pub enabled: bool,
}

/// Renders the whole transcript in order.
pub fn render_transcript(
    messages: &[Message],
    selected_option: Option<&str>,
) -> Vec<RenderedMessage> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let previous = index.checked_sub(1).map(|i| &messages[i]);
            render_message(message, previous, selected_option)
        })
        .collect()
}

/// Renders a single entry given its predecessor (for the header decision).
pub fn render_message(
    message: &Message,
    previous: Option<&Message>,
    selected_option: Option<&str>,
) -> RenderedMessage {
    let show_header = message.sender == Sender::Bot
        && previous.is_none_or(|prev| prev.sender != Sender::Bot);

    let body = if message.is_typing {
        MessageBody::Typing
    } else {
        render_body(message)
    };

    let mut rendered = RenderedMessage {
        message_id: message.id.clone(),
        sender: message.sender,
        show_header,
        body,
        options: Vec::new(),
        form: None,
        input: None,
    };

    // Interactive attachments only appear on fully revealed bot messages.
    if message.sender == Sender::Bot && !message.is_typing {
        if let Some(element) = &message.element {
            let enabled = !message.interacted;
            match &element.kind {
                ElementKind::Options { options } if !options.is_empty() => {
                    rendered.options = options
                        .iter()
                        .map(|option| RenderedOption {
                            text: option.text.clone(),
                            image_url: option.image_url.clone(),
                            selected: selected_option == Some(option.text.as_str())
                                && message.interacted,
                            enabled,
                        })
                        .collect();
                }
                ElementKind::Form { fields, description } if !fields.is_empty() => {
                    rendered.form = Some(RenderedForm {
                        fields: fields.clone(),
                        description: description.clone(),
                        enabled,
                    });
                }
                ElementKind::Input { input_kind, placeholder } => {
                    rendered.input = Some(RenderedInput {
                        input_kind: *input_kind,
                        placeholder: placeholder.clone(),
                        enabled,
                    });
                }
                _ => {}
            }
        }
    }

    rendered
}

fn render_body(message: &Message) -> MessageBody {
    if let Some(element) = &message.element {
        let media = match &element.kind {
            ElementKind::Image { media_url } => media_url.as_ref().map(|url| (MediaKind::Image, url)),
            ElementKind::Video { media_url } => media_url.as_ref().map(|url| (MediaKind::Video, url)),
            ElementKind::Audio { media_url } => media_url.as_ref().map(|url| (MediaKind::Audio, url)),
            _ => None,
        };
        // Media without a url degrades to its caption text, like any
        // unknown element kind.
        if let Some((kind, url)) = media {
            return MessageBody::Media {
                kind,
                url: url.clone(),
                caption: (!message.content.is_empty()).then(|| message.content.clone()),
            };
        }
    }

    if message.kind == MessageKind::Form && message.sender == Sender::User {
        return MessageBody::FormReply(
            message
                .content
                .lines()
                .map(|line| match line.split_once(": ") {
                    Some((label, value)) => FormReplyLine {
                        label: label.to_string(),
                        value: value.to_string(),
                    },
                    None => FormReplyLine {
                        label: String::new(),
                        value: line.to_string(),
                    },
                })
                .collect(),
        );
    }

    MessageBody::Text(message.content.clone())
}
