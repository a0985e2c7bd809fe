//! Error severities and error-handler descriptors.

use bitflags::bitflags;
use serde::Serialize;

/// Handler name reported for handlers built without an explicit `class`.
pub const DEFAULT_ERROR_HANDLER_CLASS: &str = "Kickstart\\ErrorHandler";

bitflags! {
    /// Error severities a handler can subscribe to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    #[serde(transparent)]
    pub struct Severity: u32 {
        const ERROR = 1;
        const WARNING = 2;
        const PARSE = 4;
        const NOTICE = 8;
        const CORE_ERROR = 16;
        const CORE_WARNING = 32;
        const COMPILE_ERROR = 64;
        const COMPILE_WARNING = 128;
        const USER_ERROR = 256;
        const USER_WARNING = 512;
        const USER_NOTICE = 1024;
        const STRICT = 2048;
        const RECOVERABLE_ERROR = 4096;
        const DEPRECATED = 8192;
        const USER_DEPRECATED = 16384;
        const ALL = 32767;
    }
}

impl Severity {
    /// Look up a severity by its configuration name.
    ///
    /// Case-insensitive; spaces and dashes count as underscores and an `E_`
    /// prefix is optional, so `user warning`, `E_USER_WARNING` and
    /// `user-warning` all name [`Severity::USER_WARNING`].
    pub fn parse_level(name: &str) -> Option<Severity> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        let normalized = normalized.strip_prefix("E_").unwrap_or(&normalized);
        if normalized.is_empty() {
            return None;
        }
        Severity::from_name(normalized)
    }
}

/// A process error handler and the severities it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorHandler {
    /// Handler implementation name
    pub class: String,
    /// Severities routed to this handler; `None` means all of them
    pub error_types: Option<Severity>,
}

impl ErrorHandler {
    pub fn new(class: impl Into<String>, error_types: Option<Severity>) -> Self {
        Self {
            class: class.into(),
            error_types,
        }
    }

    /// Whether an error of `severity` reaches this handler.
    pub fn handles(&self, severity: Severity) -> bool {
        match self.error_types {
            Some(mask) => mask.intersects(severity),
            None => true,
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_HANDLER_CLASS, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_forms() {
        assert_eq!(Severity::parse_level("warning"), Some(Severity::WARNING));
        assert_eq!(Severity::parse_level("E_USER_WARNING"), Some(Severity::USER_WARNING));
        assert_eq!(Severity::parse_level("user warning"), Some(Severity::USER_WARNING));
        assert_eq!(Severity::parse_level(" user-deprecated "), Some(Severity::USER_DEPRECATED));
        assert_eq!(Severity::parse_level("all"), Some(Severity::ALL));
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        assert_eq!(Severity::parse_level("catastrophe"), None);
        assert_eq!(Severity::parse_level(""), None);
        assert_eq!(Severity::parse_level("E_"), None);
    }

    #[test]
    fn test_all_covers_every_level() {
        for (_, flag) in Severity::all().iter_names() {
            assert!(Severity::ALL.contains(flag));
        }
        assert_eq!(Severity::ALL.bits(), 32767);
    }

    #[test]
    fn test_handles() {
        let handler = ErrorHandler::new("App\\Handler", Some(Severity::ERROR | Severity::WARNING));
        assert!(handler.handles(Severity::WARNING));
        assert!(!handler.handles(Severity::NOTICE));

        let everything = ErrorHandler::default();
        assert!(everything.handles(Severity::USER_NOTICE));
        assert_eq!(everything.class, DEFAULT_ERROR_HANDLER_CLASS);
    }
}
