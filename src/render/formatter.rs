use super::{MediaKind, MessageBody, RenderedMessage};
use crate::session::Sender;
use itertools::Itertools;

/// Formats rendered messages into terminal text for the bundled runners.
pub struct TranscriptFormatter;

impl TranscriptFormatter {
    /// Format one rendered entry as lines of terminal output.
    pub fn format_message(rendered: &RenderedMessage) -> String {
        let mut lines: Vec<String> = Vec::new();

        if rendered.show_header {
            lines.push("Assistant".to_string());
        }

        let prefix = match rendered.sender {
            Sender::Bot => "  ",
            Sender::User => "> ",
        };

        match &rendered.body {
            MessageBody::Typing => lines.push(format!("{prefix}...")),
            MessageBody::Text(text) if text.is_empty() => {}
            MessageBody::Text(text) => lines.push(format!("{prefix}{text}")),
            MessageBody::Media { kind, url, caption } => {
                let tag = match kind {
                    MediaKind::Image => "image",
                    MediaKind::Video => "video",
                    MediaKind::Audio => "audio",
                };
                lines.push(format!("{prefix}[{tag}] {url}"));
                if let Some(caption) = caption {
                    lines.push(format!("{prefix}{caption}"));
                }
            }
            MessageBody::FormReply(reply) => {
                for line in reply {
                    if line.label.is_empty() {
                        lines.push(format!("{prefix}{}", line.value));
                    } else {
                        lines.push(format!("{prefix}{}: {}", line.label, line.value));
                    }
                }
            }
        }

        for (index, option) in rendered.options.iter().enumerate() {
            let marker = if option.selected { "*" } else { " " };
            lines.push(format!("{prefix}{marker}[{}] {}", index + 1, option.text));
        }

        if let Some(form) = &rendered.form {
            if let Some(description) = &form.description {
                lines.push(format!("{prefix}{description}"));
            }
            for field in &form.fields {
                let required = if field.required { " (required)" } else { "" };
                lines.push(format!("{prefix}- {}{required}", field.label));
            }
        }

        if let Some(input) = &rendered.input {
            let placeholder = input.placeholder.as_deref().unwrap_or("Your answer...");
            lines.push(format!("{prefix}[{placeholder}]"));
        }

        lines.iter().join("\n")
    }

    /// Format a full rendered transcript, one entry per block.
    pub fn format_transcript(rendered: &[RenderedMessage]) -> String {
        rendered
            .iter()
            .map(Self::format_message)
            .filter(|block| !block.is_empty())
            .join("\n")
    }
}
