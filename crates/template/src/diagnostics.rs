//! Non-fatal rendering diagnostics and the sinks that receive them.
use std::fmt;

/// A condition that is reported and then skipped; rendering always continues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// No element with the list's target tag name exists in the markup.
    TargetNotFound { tag: String },
    /// A scalar batch entry whose value is not a string.
    TypeMismatch { key: String, type_name: &'static str },
    /// A list item that is neither text nor a mapping carrying the content key.
    MalformedListItem {
        tag: String,
        index: usize,
        reason: String,
    },
    /// An attribute of a list item that cannot be written to an element.
    InvalidAttribute { tag: String, name: String },
    /// A list kind outside `ul`/`ol`.
    InvalidListKind { kind: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TargetNotFound { tag } => write!(f, "can't find tag => {tag}"),
            Diagnostic::TypeMismatch { key, type_name } => {
                write!(f, "item of element '{key}' is not string type. type: {type_name}")
            }
            Diagnostic::MalformedListItem { tag, index, reason } => {
                write!(f, "list item {index} for tag '{tag}' skipped: {reason}")
            }
            Diagnostic::InvalidAttribute { tag, name } => {
                write!(f, "attribute {name:?} for a list item of tag '{tag}' skipped")
            }
            Diagnostic::InvalidListKind { kind } => write!(f, "list kind value is wrong => {kind}"),
        }
    }
}

/// Receives warning-level diagnostic messages.
pub trait Diagnostics {
    fn warn(&mut self, message: &str);

    fn report(&mut self, diagnostic: &Diagnostic) {
        self.warn(&diagnostic.to_string());
    }
}

/// Forwards every message to the `log` facade at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&mut self, message: &str) {
        log::warn!(target: "mirage.template", "{message}");
    }
}

/// Keeps every message, in emission order.
#[derive(Clone, Debug, Default)]
pub struct CollectingDiagnostics {
    messages: Vec<String>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warn(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn warn(&mut self, message: &str) {
        (**self).warn(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_the_diagnostic() {
        let mut sink = CollectingDiagnostics::new();
        sink.report(&Diagnostic::TargetNotFound {
            tag: "menu".to_string(),
        });
        sink.report(&Diagnostic::TypeMismatch {
            key: "count".to_string(),
            type_name: "integer",
        });
        assert_eq!(
            sink.messages(),
            &[
                "can't find tag => menu".to_string(),
                "item of element 'count' is not string type. type: integer".to_string(),
            ]
        );
    }

    #[test]
    fn mutable_references_forward_to_the_sink() {
        fn emit(mut sink: impl Diagnostics) {
            sink.warn("one");
        }
        let mut sink = CollectingDiagnostics::new();
        emit(&mut sink);
        assert_eq!(sink.messages(), &["one".to_string()]);
    }
}
