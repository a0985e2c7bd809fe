//! Conversion from YAML nodes to resolved values.
//!
//! Children are converted before their parent, so a tag handler always sees
//! a value whose own tags have already been applied. A node's tag is
//! dispatched exactly once, right after its children.

use kickstart_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};
use kickstart_yaml::YamlWithSourceInfo;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::registry::{NodeKind, TagInfo};
use crate::types::{Mapping, Value, key_string};

impl Interpreter {
    /// Convert a YAML tree, applying every local tag bottom-up.
    pub fn convert(&self, yaml: YamlWithSourceInfo) -> Result<Value> {
        let kind = NodeKind::of(&yaml);
        let tag = yaml.tag.clone().filter(|tag| tag.is_local());
        let value = match kind {
            NodeKind::Sequence => {
                let items = yaml.into_array().map(|(items, _)| items).unwrap_or_default();
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(self.convert(item)?);
                }
                Value::Sequence(converted)
            }
            NodeKind::Mapping => {
                let entries = yaml.into_hash().map(|(entries, _)| entries).unwrap_or_default();
                let mut converted = Mapping::with_capacity(entries.len());
                for entry in entries {
                    let key = key_string(&entry.key.yaml);
                    converted.insert(key, self.convert(entry.value)?);
                }
                Value::Mapping(converted)
            }
            NodeKind::Scalar => Value::from_yaml(&yaml.yaml),
        };

        match tag {
            Some(tag) => {
                let info = TagInfo::new(tag.suffix, kind, tag.source_info);
                self.apply_tag(value, &info)
            }
            None => Ok(value),
        }
    }

    /// Run the handler registered for `tag`; unknown tags keep their value.
    pub fn apply_tag(&self, value: Value, tag: &TagInfo) -> Result<Value> {
        match self.registry().get(&tag.name) {
            Some(handler) => handler.handle(self, value, tag),
            None => {
                self.env().warn(unknown_tag(tag));
                Ok(value)
            }
        }
    }
}

fn unknown_tag(tag: &TagInfo) -> DiagnosticMessage {
    DiagnosticMessageBuilder::from_code(DiagnosticKind::Warning, "K-1-1")
        .problem(format!("Tag `!{}` has no handler; its value is used as written", tag.name))
        .with_location(tag.source_info.clone())
        .build()
}
