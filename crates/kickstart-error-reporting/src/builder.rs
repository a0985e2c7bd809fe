//! Builder API for diagnostic messages.

use kickstart_source_map::SourceInfo;

use crate::catalog::get_error_info;
use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};

/// Builder for creating diagnostic messages.
///
/// # Example
///
/// ```
/// use kickstart_error_reporting::DiagnosticMessageBuilder;
///
/// let error = DiagnosticMessageBuilder::error("Invalid period")
///     .with_code("K-1-3")
///     .problem("`!period` must be a duration like `1 day 2 hours`")
///     .add_detail("Found `soon`")
///     .add_hint("Use units such as `seconds`, `minutes` or `days`?")
///     .build();
///
/// assert_eq!(error.code, Some("K-1-3".to_string()));
/// assert_eq!(error.details.len(), 1);
/// assert_eq!(error.hints.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    /// Create a new builder with the specified kind and title.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    /// Create an error diagnostic builder.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Create a warning diagnostic builder.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Create an info diagnostic builder.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    /// Builder for a catalogued code: title and default problem come from the catalog.
    ///
    /// An unknown code keeps the code itself as title.
    ///
    /// ```
    /// use kickstart_error_reporting::{DiagnosticKind, DiagnosticMessageBuilder};
    ///
    /// let msg = DiagnosticMessageBuilder::from_code(DiagnosticKind::Warning, "K-1-1").build();
    /// assert_eq!(msg.title, "Unknown Tag");
    /// assert_eq!(msg.code.as_deref(), Some("K-1-1"));
    /// ```
    pub fn from_code(kind: DiagnosticKind, code: &str) -> Self {
        match get_error_info(code) {
            Some(info) => Self::new(kind, info.title.as_str())
                .with_code(code)
                .problem(MessageContent::Plain(info.message_template.clone())),
            None => Self::new(kind, code).with_code(code),
        }
    }

    /// Set the error code (`K-<subsystem>-<number>`).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement.
    pub fn problem(mut self, stmt: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(stmt.into());
        self
    }

    /// Add an error detail.
    pub fn add_detail(mut self, detail: impl Into<MessageContent>) -> Self {
        self.message.details.push(DetailItem {
            kind: DetailKind::Error,
            content: detail.into(),
        });
        self
    }

    /// Add an info detail.
    pub fn add_info(mut self, info: impl Into<MessageContent>) -> Self {
        self.message.details.push(DetailItem {
            kind: DetailKind::Info,
            content: info.into(),
        });
        self
    }

    /// Add a hint for fixing the problem.
    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    /// Attach a source location.
    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Attach a source location if one is known.
    pub fn with_optional_location(mut self, location: Option<SourceInfo>) -> Self {
        if location.is_some() {
            self.message.location = location;
        }
        self
    }

    /// Build the diagnostic message.
    pub fn build(self) -> DiagnosticMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_kinds() {
        assert_eq!(
            DiagnosticMessageBuilder::error("e").build().kind,
            DiagnosticKind::Error
        );
        assert_eq!(
            DiagnosticMessageBuilder::warning("w").build().kind,
            DiagnosticKind::Warning
        );
        assert_eq!(
            DiagnosticMessageBuilder::info("i").build().kind,
            DiagnosticKind::Info
        );
    }

    #[test]
    fn test_detail_order_is_kept() {
        let msg = DiagnosticMessageBuilder::warning("w")
            .add_detail("first")
            .add_info("second")
            .build();
        assert_eq!(msg.details[0].kind, DetailKind::Error);
        assert_eq!(msg.details[1].kind, DetailKind::Info);
        assert_eq!(msg.details[1].content.as_str(), "second");
    }

    #[test]
    fn test_from_code_uses_catalog() {
        let msg = DiagnosticMessageBuilder::from_code(DiagnosticKind::Warning, "K-2-3").build();
        assert_eq!(msg.title, "Side Effect Denied");
        assert_eq!(msg.code.as_deref(), Some("K-2-3"));
        assert!(msg.problem.is_some());

        let msg = DiagnosticMessageBuilder::from_code(DiagnosticKind::Error, "K-1-3")
            .problem("Cannot parse `soon`")
            .build();
        assert_eq!(msg.title, "Invalid Period");
        assert_eq!(msg.problem.unwrap().as_str(), "Cannot parse `soon`");
    }

    #[test]
    fn test_from_unknown_code() {
        let msg = DiagnosticMessageBuilder::from_code(DiagnosticKind::Error, "K-9-9").build();
        assert_eq!(msg.title, "K-9-9");
        assert!(msg.problem.is_none());
    }

    #[test]
    fn test_optional_location() {
        let msg = DiagnosticMessageBuilder::warning("w")
            .with_optional_location(None)
            .build();
        assert!(msg.location.is_none());

        let msg = DiagnosticMessageBuilder::warning("w")
            .with_optional_location(Some(SourceInfo::default()))
            .build();
        assert!(msg.location.is_some());
    }
}
