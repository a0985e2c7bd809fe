//! Source location information for document nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the text it was parsed from.
///
/// `offset` is a byte offset into the file. When a document is parsed from
/// the middle of a file (a non-zero read offset), the offset is shifted so it
/// still points into the file, while `line` and `col` count from the start of
/// the text that was actually read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Byte offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters not bytes)
    pub col: usize,

    /// Length in bytes
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Move the byte offset forward by `base` bytes.
    pub fn shifted(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }

    /// Get the end offset (exclusive) of this location.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }

    /// Smallest location covering both `self` and `other`.
    ///
    /// Line and column are taken from whichever location starts first.
    pub fn cover(&self, other: &SourceInfo) -> SourceInfo {
        let (first, _) = if self.offset <= other.offset {
            (self, other)
        } else {
            (other, self)
        };
        let end = self.end_offset().max(other.end_offset());
        SourceInfo {
            file: first.file.clone(),
            offset: first.offset,
            line: first.line,
            col: first.col,
            len: end - first.offset,
        }
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.col),
            None => write!(f, "<input>:{}:{}", self.line, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_creation() {
        let info = SourceInfo::new(Some("test.yaml".into()), 10, 2, 5, 8);
        assert_eq!(info.file, Some("test.yaml".into()));
        assert_eq!(info.offset, 10);
        assert_eq!(info.line, 2);
        assert_eq!(info.col, 5);
        assert_eq!(info.len, 8);
        assert_eq!(info.end_offset(), 18);
    }

    #[test]
    fn test_shifted_keeps_line() {
        let info = SourceInfo::new(None, 3, 1, 4, 2).shifted(100);
        assert_eq!(info.offset, 103);
        assert_eq!(info.line, 1);
        assert_eq!(info.end_offset(), 105);
    }

    #[test]
    fn test_cover() {
        let key = SourceInfo::new(None, 0, 1, 1, 5);
        let value = SourceInfo::new(None, 7, 1, 8, 3);
        let entry = value.cover(&key);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.len, 10);
        assert_eq!(entry.col, 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceInfo::default().to_string(), "<input>:1:1");
        let info = SourceInfo::default().with_file("app.yaml");
        assert_eq!(info.to_string(), "app.yaml:1:1");
    }

    #[test]
    fn test_serde_round_trip() {
        let info = SourceInfo::new(Some("a.yaml".into()), 1, 1, 2, 3);
        let json = serde_json::to_string(&info).unwrap();
        let back: SourceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
