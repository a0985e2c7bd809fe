//! Diagnostic messages for kickstart.
//!
//! Non-fatal problems found while interpreting configuration (an unknown tag,
//! an autoloader that could not be registered) are reported as
//! [`DiagnosticMessage`]s rather than errors. Each message has a stable code
//! of the form `K-<subsystem>-<number>` listed in the [`catalog`].
//!
//! ```
//! use kickstart_error_reporting::DiagnosticMessageBuilder;
//!
//! let warning = DiagnosticMessageBuilder::warning("Unknown tag")
//!     .with_code("K-1-1")
//!     .problem("Tag `!frobnicate` has no handler")
//!     .add_hint("Did you mean `!period`?")
//!     .build();
//!
//! assert!(warning.to_text().contains("Warning [K-1-1]: Unknown tag"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
