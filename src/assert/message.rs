//! Extra-context arguments and their composition into report rows.

use std::fmt;

/// One extra-context argument passed alongside an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgArg {
    /// A plain message.
    Text(String),
    /// Carries the test name into the report without reading as a message.
    Name(String),
    /// Any other value, already rendered with `Debug`.
    Other(String),
}

impl MsgArg {
    pub fn text(message: impl Into<String>) -> Self {
        MsgArg::Text(message.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        MsgArg::Name(name.into())
    }

    pub fn other<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        MsgArg::Other(format!("{value:?}"))
    }
}

impl From<&str> for MsgArg {
    fn from(message: &str) -> Self {
        MsgArg::Text(message.to_owned())
    }
}

impl From<String> for MsgArg {
    fn from(message: String) -> Self {
        MsgArg::Text(message)
    }
}

/// A `(label, content)` row of a failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledContent {
    pub label: String,
    pub content: String,
}

impl LabeledContent {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Turns extra-context arguments into report rows.
///
/// With several arguments, plain messages are joined into one `Messages`
/// row and the last name carrier becomes a `Name` row; other values are
/// dropped. An empty name carrier anywhere discards every row.
pub fn message_from_args(args: &[MsgArg]) -> Vec<LabeledContent> {
    match args {
        [] => Vec::new(),
        [single] => match single {
            MsgArg::Text(text) | MsgArg::Other(text) => {
                vec![LabeledContent::new("Messages", text)]
            }
            MsgArg::Name(name) if name.is_empty() => Vec::new(),
            MsgArg::Name(name) => vec![LabeledContent::new("Name", name)],
        },
        many => {
            let mut texts = Vec::new();
            let mut name = None;
            for arg in many {
                match arg {
                    MsgArg::Text(text) => texts.push(text.as_str()),
                    MsgArg::Name(carried) if carried.is_empty() => return Vec::new(),
                    MsgArg::Name(carried) => name = Some(LabeledContent::new("Name", carried)),
                    MsgArg::Other(_) => {}
                }
            }

            let mut combined = Vec::new();
            if !texts.is_empty() {
                combined.push(LabeledContent::new("Messages", texts.join(", ")));
            }
            combined.extend(name);
            combined
        }
    }
}
