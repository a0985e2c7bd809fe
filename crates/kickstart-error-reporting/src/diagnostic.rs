//! Core diagnostic message types.

use std::fmt;

use kickstart_source_map::SourceInfo;
use serde::{Deserialize, Serialize};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A warning that doesn't prevent completion but indicates a problem
    Warning,
    /// Informational message
    Info,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
        }
    }
}

/// How detail items should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
}

/// The content of a message or detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text content
    Plain(String),
    /// Markdown content (backticks mark names and values)
    Markdown(String),
}

impl MessageContent {
    /// Get the raw string content for display
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) | MessageContent::Markdown(s) => s,
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    /// The kind of detail (error, info)
    pub kind: DetailKind,
    /// The content of the detail
    pub content: MessageContent,
}

/// A structured diagnostic: code, title, problem, details and hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Optional error code (e.g., "K-2-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Brief title for the diagnostic
    pub title: String,

    /// The kind of diagnostic
    pub kind: DiagnosticKind,

    /// The problem statement (the "what")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<MessageContent>,

    /// Specific details (the "where/why")
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<DetailItem>,

    /// Optional hints for fixing
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hints: Vec<MessageContent>,

    /// Where in a configuration document the issue occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Create a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Render this diagnostic as text.
    ///
    /// ```text
    /// Warning [K-2-1]: Autoloader Registration Failed
    ///   --> loaders.yaml:3:11
    /// Could not register `Kickstart\Autoload` for namespace `My\Lib`
    /// ✖ permission denied
    /// ? Check the sandbox policy?
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(self.kind.label());
        if let Some(code) = &self.code {
            out.push_str(" [");
            out.push_str(code);
            out.push(']');
        }
        out.push_str(": ");
        out.push_str(&self.title);
        out.push('\n');

        if let Some(location) = &self.location {
            out.push_str("  --> ");
            out.push_str(&location.to_string());
            out.push('\n');
        }

        if let Some(problem) = &self.problem {
            out.push_str(problem.as_str());
            out.push('\n');
        }

        for detail in &self.details {
            let bullet = match detail.kind {
                DetailKind::Error => "✖",
                DetailKind::Info => "ℹ",
            };
            out.push_str(bullet);
            out.push(' ');
            out.push_str(detail.content.as_str());
            out.push('\n');
        }

        for hint in &self.hints {
            out.push_str("? ");
            out.push_str(hint.as_str());
            out.push('\n');
        }

        out
    }

    /// Render this diagnostic as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_text().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_text() {
        let msg = DiagnosticMessage::warning("Something odd");
        assert_eq!(msg.to_text(), "Warning: Something odd\n");
        assert!(!msg.is_error());
    }

    #[test]
    fn test_text_with_everything() {
        let mut msg = DiagnosticMessage::error("Bad value");
        msg.code = Some("K-1-2".into());
        msg.location = Some(SourceInfo::new(Some("app.yaml".into()), 0, 3, 7, 2));
        msg.problem = Some("`!new` needs a class name".into());
        msg.details.push(DetailItem {
            kind: DetailKind::Error,
            content: "got a sequence".into(),
        });
        msg.hints.push("Write `!new ClassName`?".into());

        assert_eq!(
            msg.to_text(),
            "Error [K-1-2]: Bad value\n  --> app.yaml:3:7\n`!new` needs a class name\n✖ got a sequence\n? Write `!new ClassName`?\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let mut msg = DiagnosticMessage::warning("Unknown tag");
        msg.code = Some("K-1-1".into());
        let json = msg.to_json();
        assert_eq!(json["kind"], "warning");
        assert_eq!(json["code"], "K-1-1");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_display_trims_newline() {
        let msg = DiagnosticMessage::error("Boom");
        assert_eq!(msg.to_string(), "Error: Boom");
    }
}
