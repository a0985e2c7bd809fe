//! YAML parser that builds YamlWithSourceInfo trees.

use std::collections::HashMap;

use crate::{Error, Result, SourceInfo, YamlHashEntry, YamlTag, YamlWithSourceInfo};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};
use yaml_rust2::Yaml;

/// Parse the first YAML document of `content`.
///
/// # Example
///
/// ```rust
/// use kickstart_yaml::parse;
///
/// let yaml = parse("title: My Document").unwrap();
/// assert!(yaml.is_hash());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or contains no document.
pub fn parse(content: &str) -> Result<YamlWithSourceInfo> {
    first_document(parse_documents(content, None)?)
}

/// Parse the first YAML document of `content`, recording `filename` in
/// every source location.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or contains no document.
pub fn parse_file(content: &str, filename: &str) -> Result<YamlWithSourceInfo> {
    first_document(parse_documents(content, Some(filename))?)
}

/// Parse every document in `content`.
///
/// An input without any document (empty, or only comments) yields an empty
/// vector.
///
/// # Errors
///
/// Returns an error if any document is invalid YAML.
pub fn parse_documents(content: &str, filename: Option<&str>) -> Result<Vec<YamlWithSourceInfo>> {
    parse_documents_at(content, filename, 0)
}

/// Parse every document in `content`, which was read starting at byte
/// `base_offset` of its file.
///
/// Byte offsets in the returned source locations are shifted by
/// `base_offset` so that they point into the original file.
///
/// # Errors
///
/// Returns an error if any document is invalid YAML.
pub fn parse_documents_at(
    content: &str,
    filename: Option<&str>,
    base_offset: usize,
) -> Result<Vec<YamlWithSourceInfo>> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::new(content);

    parser
        .load(&mut builder, true)
        .map_err(|e| Error::from(e).with_file(filename, base_offset))?;

    let mut documents = builder
        .result()
        .map_err(|e| e.with_file(filename, base_offset))?;
    if filename.is_some() || base_offset > 0 {
        for doc in &mut documents {
            doc.relocate(filename, base_offset);
        }
    }
    Ok(documents)
}

fn first_document(documents: Vec<YamlWithSourceInfo>) -> Result<YamlWithSourceInfo> {
    documents
        .into_iter()
        .next()
        .ok_or_else(|| Error::ParseError {
            message: "No YAML document found".into(),
            location: None,
        })
}

/// Builder that implements MarkedEventReceiver to construct YamlWithSourceInfo.
struct YamlBuilder {
    /// Byte offset of every character, present only for non-ASCII input
    /// (yaml-rust2 markers count characters).
    char_offsets: Option<Vec<usize>>,

    /// Length of the source in bytes
    source_len: usize,

    /// Stack of collections being constructed
    stack: Vec<BuildNode>,

    /// Root of the document currently being parsed
    root: Option<YamlWithSourceInfo>,

    /// Completed documents
    documents: Vec<YamlWithSourceInfo>,

    /// Anchored nodes of the current document, by anchor id
    anchors: HashMap<usize, YamlWithSourceInfo>,

    /// First structural error seen; events cannot fail, so it is reported at the end
    error: Option<Error>,
}

enum BuildNode {
    Sequence {
        start_marker: Marker,
        anchor_id: usize,
        tag: Option<Tag>,
        items: Vec<YamlWithSourceInfo>,
    },
    Mapping {
        start_marker: Marker,
        anchor_id: usize,
        tag: Option<Tag>,
        entries: Vec<(YamlWithSourceInfo, Option<YamlWithSourceInfo>)>,
    },
}

impl YamlBuilder {
    fn new(source: &str) -> Self {
        let char_offsets = if source.is_ascii() {
            None
        } else {
            Some(source.char_indices().map(|(i, _)| i).collect())
        };
        Self {
            char_offsets,
            source_len: source.len(),
            stack: Vec::new(),
            root: None,
            documents: Vec::new(),
            anchors: HashMap::new(),
            error: None,
        }
    }

    fn result(mut self) -> Result<Vec<YamlWithSourceInfo>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        // A stream cut short without DocumentEnd still yields its root.
        if let Some(root) = self.root.take() {
            self.documents.push(root);
        }
        Ok(self.documents)
    }

    fn fail(&mut self, message: &str, marker: &Marker) {
        if self.error.is_none() {
            self.error = Some(Error::InvalidStructure {
                message: message.to_string(),
                location: Some(self.make_source_info(marker, 0)),
            });
        }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        match &self.char_offsets {
            None => char_index,
            Some(table) => table.get(char_index).copied().unwrap_or(self.source_len),
        }
    }

    fn make_source_info(&self, marker: &Marker, len: usize) -> SourceInfo {
        SourceInfo::new(
            None,
            self.byte_offset(marker.index()),
            marker.line() + 1,
            marker.col() + 1,
            len,
        )
    }

    fn span_between(&self, start: &Marker, end: &Marker) -> SourceInfo {
        let len = self
            .byte_offset(end.index())
            .saturating_sub(self.byte_offset(start.index()));
        self.make_source_info(start, len)
    }

    fn make_tag(&self, tag: Option<Tag>, source_info: &SourceInfo) -> Option<YamlTag> {
        tag.map(|tag| YamlTag {
            handle: tag.handle,
            suffix: tag.suffix,
            source_info: source_info.clone(),
        })
    }

    fn push_complete(&mut self, node: YamlWithSourceInfo, anchor_id: usize) {
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, node.clone());
        }

        let Some(parent) = self.stack.last_mut() else {
            self.root = Some(node);
            return;
        };

        match parent {
            BuildNode::Sequence { items, .. } => items.push(node),
            BuildNode::Mapping { entries, .. } => {
                if let Some((_, value)) = entries.last_mut() {
                    if value.is_none() {
                        *value = Some(node);
                        return;
                    }
                }
                // This is a new key
                entries.push((node, None));
            }
        }
    }

    fn on_scalar(
        &mut self,
        value: String,
        style: TScalarStyle,
        anchor_id: usize,
        tag: Option<Tag>,
        marker: &Marker,
    ) {
        let source_info = self.make_source_info(marker, value.len());
        let tag = self.make_tag(tag, &source_info);

        let yaml = match tag.as_ref().filter(|t| t.is_core()) {
            Some(core) => match apply_core_tag(&core.suffix, &value, style) {
                Ok(yaml) => yaml,
                Err(message) => {
                    self.fail(&message, marker);
                    Yaml::BadValue
                }
            },
            None if matches!(style, TScalarStyle::Plain) => parse_scalar_value(&value),
            None => Yaml::String(value),
        };

        let node = YamlWithSourceInfo::new_scalar(yaml, source_info).with_tag(tag);
        self.push_complete(node, anchor_id);
    }

    fn on_sequence_end(&mut self, marker: &Marker) {
        let Some(BuildNode::Sequence {
            start_marker,
            anchor_id,
            tag,
            items,
        }) = self.stack.pop()
        else {
            self.fail("sequence end without a matching start", marker);
            return;
        };

        let source_info = self.span_between(&start_marker, marker);
        let tag = self.make_tag(tag, &source_info);
        let yaml = Yaml::Array(items.iter().map(|n| n.yaml.clone()).collect());
        let node = YamlWithSourceInfo::new_array(yaml, source_info, items).with_tag(tag);
        self.push_complete(node, anchor_id);
    }

    fn on_mapping_end(&mut self, marker: &Marker) {
        let Some(BuildNode::Mapping {
            start_marker,
            anchor_id,
            tag,
            entries,
        }) = self.stack.pop()
        else {
            self.fail("mapping end without a matching start", marker);
            return;
        };

        let source_info = self.span_between(&start_marker, marker);
        let mut hash_entries = Vec::with_capacity(entries.len());
        let mut yaml_pairs = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            let Some(value) = value else {
                self.fail("mapping key without a value", marker);
                return;
            };
            yaml_pairs.push((key.yaml.clone(), value.yaml.clone()));
            hash_entries.push(YamlHashEntry::new(key, value));
        }

        let tag = self.make_tag(tag, &source_info);
        let yaml = Yaml::Hash(yaml_pairs.into_iter().collect());
        let node = YamlWithSourceInfo::new_hash(yaml, source_info, hash_entries).with_tag(tag);
        self.push_complete(node, anchor_id);
    }
}

impl MarkedEventReceiver for YamlBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}

            Event::DocumentStart => {
                self.stack.clear();
                self.anchors.clear();
                self.root = None;
            }

            Event::DocumentEnd => {
                if let Some(root) = self.root.take() {
                    self.documents.push(root);
                }
            }

            Event::Scalar(value, style, anchor_id, tag) => {
                self.on_scalar(value, style, anchor_id, tag, &marker);
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Sequence {
                    start_marker: marker,
                    anchor_id,
                    tag,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => self.on_sequence_end(&marker),

            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Mapping {
                    start_marker: marker,
                    anchor_id,
                    tag,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => self.on_mapping_end(&marker),

            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id).cloned() {
                Some(node) => self.push_complete(node, 0),
                None => self.fail("alias refers to an unknown anchor", &marker),
            },
        }
    }
}

/// Apply a YAML core schema tag (`!!str`, `!!int`, ...) to a scalar.
fn apply_core_tag(suffix: &str, value: &str, style: TScalarStyle) -> std::result::Result<Yaml, String> {
    match suffix {
        "str" => Ok(Yaml::String(value.to_string())),
        "int" => value
            .parse::<i64>()
            .map(Yaml::Integer)
            .map_err(|_| format!("'{}' is not a valid !!int", value)),
        "float" => value
            .parse::<f64>()
            .map(|_| Yaml::Real(value.to_string()))
            .map_err(|_| format!("'{}' is not a valid !!float", value)),
        "bool" => match value {
            "true" | "True" | "TRUE" => Ok(Yaml::Boolean(true)),
            "false" | "False" | "FALSE" => Ok(Yaml::Boolean(false)),
            _ => Err(format!("'{}' is not a valid !!bool", value)),
        },
        "null" => Ok(Yaml::Null),
        _ if matches!(style, TScalarStyle::Plain) => Ok(parse_scalar_value(value)),
        _ => Ok(Yaml::String(value.to_string())),
    }
}

/// Parse a plain scalar into the appropriate Yaml type.
///
/// Handles integers, floats, booleans, null, and strings.
fn parse_scalar_value(value: &str) -> Yaml {
    if let Ok(i) = value.parse::<i64>() {
        return Yaml::Integer(i);
    }

    if value.parse::<f64>().is_ok() {
        return Yaml::Real(value.to_string());
    }

    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            Yaml::Boolean(true)
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            Yaml::Boolean(false)
        }
        "null" | "Null" | "NULL" | "~" | "" => Yaml::Null,
        _ => Yaml::String(value.to_string()),
    }
}
