//! Lazy file reads (`!read`) and reuse-key injection.
//!
//! `!read db.yaml` does not touch the filesystem. It produces a
//! [`Value::Deferred`] holding a [`PendingRead`]; the file is parsed only when
//! the consumer calls [`PendingRead::resolve`], which is also when the
//! consumer's position in the configuration tree (the reuse id) is known.

use serde::Serialize;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::types::{LOCAL_REUSE_KEY, NEW_KEY, Value};

/// A postponed `!read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRead {
    /// File to read, relative to the config root unless absolute
    pub filename: String,
    /// Byte offset to start reading at
    pub offset: u64,
}

impl PendingRead {
    pub fn new(filename: impl Into<String>, offset: u64) -> Self {
        Self {
            filename: filename.into(),
            offset,
        }
    }

    /// Parse the file (first document) and tag a construction request with
    /// the reuse key `id.join(".")`.
    pub fn resolve<S: AsRef<str>>(&self, interpreter: &Interpreter, id: Option<&[S]>) -> Result<Value> {
        tracing::debug!(filename = %self.filename, offset = self.offset, "resolving deferred read");
        let parsed = interpreter.parse_file(&self.filename, self.offset)?;
        Ok(inject_reuse_key(parsed.value, id))
    }
}

/// Add `local_reuse` to a `{new: params}` value that lacks one.
///
/// Anything that is not a construction request, and any request that already
/// names its reuse key, is returned unchanged. An empty id adds nothing.
pub fn inject_reuse_key<S: AsRef<str>>(mut value: Value, id: Option<&[S]>) -> Value {
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return value;
    };
    if let Some(params) = value
        .as_mapping_mut()
        .and_then(|map| map.get_mut(NEW_KEY))
        .and_then(Value::as_mapping_mut)
    {
        if !params.contains_key(LOCAL_REUSE_KEY) {
            let key = id.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(".");
            params.insert(LOCAL_REUSE_KEY.to_string(), Value::String(key));
        }
    }
    value
}

impl Interpreter {
    /// Resolve every deferred read in `value`.
    ///
    /// Each deferred node is resolved with its position as the reuse id:
    /// `base_id` followed by the mapping keys (and sequence indexes) leading
    /// to it. Content loaded this way is walked as well, so reads nested in
    /// read files are resolved too.
    pub fn resolve_deferred(&self, value: Value, base_id: &[String]) -> Result<Value> {
        let mut path = base_id.to_vec();
        self.resolve_deferred_at(value, &mut path)
    }

    fn resolve_deferred_at(&self, value: Value, path: &mut Vec<String>) -> Result<Value> {
        match value {
            Value::Deferred(read) => {
                let loaded = read.resolve(self, Some(path.as_slice()))?;
                self.resolve_deferred_at(loaded, path)
            }
            Value::Mapping(map) => {
                let mut resolved = crate::types::Mapping::with_capacity(map.len());
                for (key, item) in map {
                    path.push(key.clone());
                    let item = self.resolve_deferred_at(item, path)?;
                    path.pop();
                    resolved.insert(key, item);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Sequence(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    path.push(index.to_string());
                    resolved.push(self.resolve_deferred_at(item, path)?);
                    path.pop();
                }
                Ok(Value::Sequence(resolved))
            }
            other => Ok(other),
        }
    }
}
