//! # kickstart-yaml
//!
//! YAML parsing with source location tracking and tag capture.
//!
//! This crate wraps `yaml-rust2::Yaml` in [`YamlWithSourceInfo`], which adds a
//! source location and the node's tag (for example `!period` or
//! `!autoloadRegister`) to every node of the tree. A single input may hold
//! several concatenated documents; [`parse_documents`] returns all of them so
//! callers can report how many were found.
//!
//! Tags are recorded, not interpreted. The only exception is the YAML core
//! schema (`!!str`, `!!int`, `!!float`, `!!bool`, `!!null`), which is applied
//! to scalars while parsing.
//!
//! ## Example
//!
//! ```rust
//! use kickstart_yaml::parse_documents;
//!
//! let docs = parse_documents("timeout: !period 30 seconds\n---\nother: 1\n", None).unwrap();
//! assert_eq!(docs.len(), 2);
//!
//! let timeout = docs[0].get_hash_value("timeout").unwrap();
//! assert_eq!(timeout.local_tag(), Some("period"));
//! assert_eq!(timeout.yaml.as_str(), Some("30 seconds"));
//! ```

mod error;
mod parser;
mod yaml_with_source_info;

pub use error::{Error, Result};
pub use kickstart_source_map::SourceInfo;
pub use parser::{parse, parse_documents, parse_documents_at, parse_file};
pub use yaml_with_source_info::{YamlHashEntry, YamlTag, YamlWithSourceInfo};
