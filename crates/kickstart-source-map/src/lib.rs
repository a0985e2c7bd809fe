//! Source locations for kickstart configuration documents.
//!
//! Every node produced by `kickstart-yaml` and every diagnostic produced by
//! the interpreter carries a [`SourceInfo`] pointing back into the document it
//! came from.
//!
//! # Example
//!
//! ```rust
//! use kickstart_source_map::SourceInfo;
//!
//! let info = SourceInfo::new(Some("app.yaml".into()), 12, 2, 5, 8);
//! assert_eq!(info.end_offset(), 20);
//! assert_eq!(info.to_string(), "app.yaml:2:5");
//! ```

mod source_info;

pub use source_info::SourceInfo;
