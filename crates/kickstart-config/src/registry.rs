//! Tag name to handler dispatch.
//!
//! The registry is an explicit table built once when an [`Interpreter`] is
//! constructed. [`TagRegistry::builtin`] holds every tag kickstart ships with;
//! applications add their own through [`TagRegistry::register`]. Any function
//! or closure with the right signature is a [`TagHandler`].

use std::collections::HashMap;
use std::fmt;

use kickstart_source_map::SourceInfo;
use kickstart_yaml::YamlWithSourceInfo;

use crate::error::{ConfigError, Result};
use crate::handlers;
use crate::interpreter::Interpreter;
use crate::types::Value;

/// Shape of the node a tag was written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl NodeKind {
    pub fn of(yaml: &YamlWithSourceInfo) -> Self {
        if yaml.is_array() {
            NodeKind::Sequence
        } else if yaml.is_hash() {
            NodeKind::Mapping
        } else {
            NodeKind::Scalar
        }
    }
}

/// What a handler knows about the tag it was called for.
#[derive(Debug, Clone, PartialEq)]
pub struct TagInfo {
    /// Tag name without the leading `!`
    pub name: String,
    pub kind: NodeKind,
    pub source_info: SourceInfo,
}

impl TagInfo {
    pub fn new(name: impl Into<String>, kind: NodeKind, source_info: SourceInfo) -> Self {
        Self {
            name: name.into(),
            kind,
            source_info,
        }
    }

    /// `InvalidTagValue` pointing at this tag.
    pub fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidTagValue {
            tag: self.name.clone(),
            message: message.into(),
            location: Some(self.source_info.clone()),
        }
    }
}

/// Transforms the (already resolved) value of a tagged node.
pub trait TagHandler: Send + Sync {
    fn handle(&self, interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value>;
}

impl<F> TagHandler for F
where
    F: Fn(&Interpreter, Value, &TagInfo) -> Result<Value> + Send + Sync,
{
    fn handle(&self, interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
        self(interpreter, value, tag)
    }
}

/// Table of tag handlers.
#[derive(Default)]
pub struct TagRegistry {
    handlers: HashMap<String, Box<dyn TagHandler>>,
}

impl TagRegistry {
    /// Registry without any handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in tag.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("ini_set", handlers::process::ini_set);
        registry.register("setTimeLimit", handlers::process::set_time_limit);
        registry.register("setTimezone", handlers::process::set_timezone);
        registry.register("period", handlers::values::period);
        registry.register("script_path", handlers::values::script_path);
        registry.register("cache_path", handlers::values::cache_path);
        registry.register("local_path", handlers::values::local_path);
        registry.register("read", handlers::values::read);
        registry.register("new", handlers::values::new);
        registry.register("reuse", handlers::values::reuse);
        registry.register("autoloadRegister", handlers::register::autoload_register);
        registry.register("errorHandlerRegister", handlers::register::error_handler_register);
        registry
    }

    /// Add or replace the handler for `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: impl TagHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Remove a handler; the tag then passes through as unknown.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn TagHandler> {
        self.handlers.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered tag names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.names())
            .finish()
    }
}
