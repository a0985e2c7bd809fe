//! YAML value with source location and tag tracking.

use crate::SourceInfo;
use yaml_rust2::Yaml;

/// Handle used by yaml-rust2 for `!!` tags once resolved.
const CORE_SCHEMA_HANDLE: &str = "tag:yaml.org,2002:";

/// A tag attached to a YAML node, e.g. `!period` or `!!str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlTag {
    /// Tag handle (`!` for local tags, `!!` or the core schema prefix for core tags)
    pub handle: String,

    /// Tag suffix (`period` for `!period`)
    pub suffix: String,

    /// Location of the tagged node
    pub source_info: SourceInfo,
}

impl YamlTag {
    /// Local (application) tags are the ones written with a single `!`.
    pub fn is_local(&self) -> bool {
        self.handle == "!" || self.handle.is_empty()
    }

    /// Core schema tags (`!!str`, `!!int`, ...).
    pub fn is_core(&self) -> bool {
        self.handle == "!!" || self.handle == CORE_SCHEMA_HANDLE
    }
}

/// A YAML value with source location information.
///
/// Uses the owned data approach: `yaml` holds the complete `yaml-rust2`
/// value for code that doesn't care about locations, while `children`
/// mirrors its structure with source-tracked nodes. Tags are kept on every
/// node so that an interpreter can resolve them bottom-up.
#[derive(Debug, Clone)]
pub struct YamlWithSourceInfo {
    /// The complete yaml-rust2::Yaml value (owned).
    pub yaml: Yaml,

    /// Source location for this node.
    pub source_info: SourceInfo,

    /// Tag written on this node, if any.
    pub tag: Option<YamlTag>,

    /// Source-tracked children (parallel structure).
    children: Children,
}

#[derive(Debug, Clone)]
enum Children {
    /// No children (for scalars, Null, BadValue)
    None,

    /// Array elements with source tracking
    Array(Vec<YamlWithSourceInfo>),

    /// Hash entries with source tracking
    Hash(Vec<YamlHashEntry>),
}

/// A key-value pair in a YAML mapping with source tracking.
#[derive(Debug, Clone)]
pub struct YamlHashEntry {
    /// The key with source tracking
    pub key: YamlWithSourceInfo,

    /// The value with source tracking
    pub value: YamlWithSourceInfo,

    /// Source location of the entire entry (key + value)
    pub entry_span: SourceInfo,
}

impl YamlWithSourceInfo {
    /// Create a new YamlWithSourceInfo for a scalar or leaf node.
    pub fn new_scalar(yaml: Yaml, source_info: SourceInfo) -> Self {
        Self {
            yaml,
            source_info,
            tag: None,
            children: Children::None,
        }
    }

    /// Create a new YamlWithSourceInfo for an array/sequence.
    pub fn new_array(
        yaml: Yaml,
        source_info: SourceInfo,
        children: Vec<YamlWithSourceInfo>,
    ) -> Self {
        Self {
            yaml,
            source_info,
            tag: None,
            children: Children::Array(children),
        }
    }

    /// Create a new YamlWithSourceInfo for a hash/mapping.
    pub fn new_hash(yaml: Yaml, source_info: SourceInfo, entries: Vec<YamlHashEntry>) -> Self {
        Self {
            yaml,
            source_info,
            tag: None,
            children: Children::Hash(entries),
        }
    }

    /// Attach a tag to this node.
    pub fn with_tag(mut self, tag: Option<YamlTag>) -> Self {
        self.tag = tag;
        self
    }

    /// Suffix of the node's local tag (`period` for `!period`).
    pub fn local_tag(&self) -> Option<&str> {
        self.tag
            .as_ref()
            .filter(|tag| tag.is_local())
            .map(|tag| tag.suffix.as_str())
    }

    /// Check if this is a scalar value (not array or hash).
    pub fn is_scalar(&self) -> bool {
        matches!(self.children, Children::None)
    }

    /// Check if this is an array.
    pub fn is_array(&self) -> bool {
        matches!(self.children, Children::Array(_))
    }

    /// Check if this is a hash.
    pub fn is_hash(&self) -> bool {
        matches!(self.children, Children::Hash(_))
    }

    /// Get array children if this is an array.
    pub fn as_array(&self) -> Option<&[YamlWithSourceInfo]> {
        match &self.children {
            Children::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get hash entries if this is a hash.
    pub fn as_hash(&self) -> Option<&[YamlHashEntry]> {
        match &self.children {
            Children::Hash(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get a value from a hash by key (string comparison).
    pub fn get_hash_value(&self, key: &str) -> Option<&YamlWithSourceInfo> {
        self.as_hash()?
            .iter()
            .find(|entry| entry.key.yaml.as_str() == Some(key))
            .map(|entry| &entry.value)
    }

    /// Get an array element by index.
    pub fn get_array_item(&self, index: usize) -> Option<&YamlWithSourceInfo> {
        self.as_array()?.get(index)
    }

    /// Get the number of children (array length or hash entry count).
    pub fn len(&self) -> usize {
        match &self.children {
            Children::None => 0,
            Children::Array(items) => items.len(),
            Children::Hash(entries) => entries.len(),
        }
    }

    /// Check if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume self and return array children if this is an array.
    pub fn into_array(self) -> Option<(Vec<YamlWithSourceInfo>, SourceInfo)> {
        match self.children {
            Children::Array(items) => Some((items, self.source_info)),
            _ => None,
        }
    }

    /// Consume self and return hash entries if this is a hash.
    pub fn into_hash(self) -> Option<(Vec<YamlHashEntry>, SourceInfo)> {
        match self.children {
            Children::Hash(entries) => Some((entries, self.source_info)),
            _ => None,
        }
    }

    /// Shift every location in the tree and stamp it with `filename`.
    pub(crate) fn relocate(&mut self, filename: Option<&str>, base_offset: usize) {
        relocate_info(&mut self.source_info, filename, base_offset);
        if let Some(tag) = &mut self.tag {
            relocate_info(&mut tag.source_info, filename, base_offset);
        }
        match &mut self.children {
            Children::None => {}
            Children::Array(items) => {
                for item in items {
                    item.relocate(filename, base_offset);
                }
            }
            Children::Hash(entries) => {
                for entry in entries {
                    entry.key.relocate(filename, base_offset);
                    entry.value.relocate(filename, base_offset);
                    relocate_info(&mut entry.entry_span, filename, base_offset);
                }
            }
        }
    }
}

fn relocate_info(info: &mut SourceInfo, filename: Option<&str>, base_offset: usize) {
    info.offset += base_offset;
    if let Some(file) = filename {
        info.file = Some(file.to_string());
    }
}

impl YamlHashEntry {
    /// Create a new YamlHashEntry; the entry span covers key and value.
    pub fn new(key: YamlWithSourceInfo, value: YamlWithSourceInfo) -> Self {
        let entry_span = key.source_info.cover(&value.source_info);
        Self {
            key,
            value,
            entry_span,
        }
    }
}
