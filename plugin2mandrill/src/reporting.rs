//! Diagnostic messages produced while converting a plugin.
//!
//! These can be converted to [`Diagnostic`]s in order to present them to the
//! user.
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::ops::Range;

use crate::FileId;

/// Messages produced while walking the plugin tree.
#[derive(Debug, Clone)]
pub enum Message {
    /// A field type token outside the known Assembly vocabulary. The field
    /// is still emitted, with the `undefined_fixme` placeholder token.
    UnknownFieldType {
        file_id: FileId,
        range: Range<usize>,
        name: String,
        suggestion: Option<&'static str>,
    },
    /// The document has no `plugin` element to convert.
    MissingPluginElement { file_id: FileId },
    /// Element nesting deeper than the walker is prepared to follow.
    DepthLimitExceeded {
        file_id: FileId,
        range: Range<usize>,
        limit: usize,
    },
}

impl Message {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Message::UnknownFieldType {
                file_id,
                range,
                name,
                suggestion,
            } => {
                let mut notes = vec!["the field will be emitted as `undefined_fixme`".to_owned()];
                if let Some(suggestion) = suggestion {
                    notes.push(format!("help: did you mean `{suggestion}`?"));
                }

                Diagnostic::warning()
                    .with_message(format!("unknown field type `{name}`"))
                    .with_labels(vec![Label::primary(*file_id, range.clone())
                        .with_message("not a known field type")])
                    .with_notes(notes)
            }
            Message::MissingPluginElement { file_id } => Diagnostic::warning()
                .with_message("no `plugin` element found")
                .with_labels(vec![Label::primary(*file_id, 0..0)])
                .with_notes(vec!["only the empty root block will be emitted".to_owned()]),
            Message::DepthLimitExceeded {
                file_id,
                range,
                limit,
            } => Diagnostic::error()
                .with_message(format!("element nesting exceeds {limit} levels"))
                .with_labels(vec![Label::primary(*file_id, range.clone())
                    .with_message("nested too deeply to convert")]),
        }
    }
}
