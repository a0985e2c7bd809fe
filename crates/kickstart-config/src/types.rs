//! Resolved configuration values.

use indexmap::IndexMap;
use kickstart_runtime::{Autoload, ErrorHandler};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use yaml_rust2::Yaml;

use crate::read::PendingRead;

/// Marker key of a construction request: `{new: {class: ..., ...}}`.
pub const NEW_KEY: &str = "new";

/// Marker key of a singleton lookup: `{reuse: key}`.
pub const REUSE_KEY: &str = "reuse";

/// Reuse key carried inside a construction request.
pub const LOCAL_REUSE_KEY: &str = "local_reuse";

/// Class key inside a construction request.
pub const CLASS_KEY: &str = "class";

/// Ordered string-keyed mapping.
pub type Mapping = IndexMap<String, Value>;

/// A configuration value after tag resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    /// A file read postponed until [`PendingRead::resolve`] is called
    Deferred(PendingRead),
    /// An autoloader registered by `!autoloadRegister`
    Loader(Autoload),
    /// An error handler registered by `!errorHandlerRegister`
    ErrorHandler(ErrorHandler),
}

/// What a factory is asked to do with a marker mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction<'a> {
    /// Build an object from `class` plus parameters
    New(&'a Mapping),
    /// Fetch the singleton stored under this key
    Reuse(&'a Value),
}

impl Value {
    /// `{new: params}`
    pub fn new_request(params: Mapping) -> Self {
        let mut map = Mapping::new();
        map.insert(NEW_KEY.to_string(), Value::Mapping(params));
        Value::Mapping(map)
    }

    /// `{reuse: key}`
    pub fn reuse_request(key: Value) -> Self {
        let mut map = Mapping::new();
        map.insert(REUSE_KEY.to_string(), key);
        Value::Mapping(map)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&PendingRead> {
        match self {
            Value::Deferred(read) => Some(read),
            _ => None,
        }
    }

    /// Look up a mapping entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?.get(key)
    }

    /// Follow a path of mapping keys.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter().try_fold(self, |value, key| value.get(key.as_ref()))
    }

    /// Null, empty string, empty sequence or empty mapping.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Interpret a single-key marker mapping.
    pub fn instruction(&self) -> Option<Instruction<'_>> {
        let map = self.as_mapping()?;
        if map.len() != 1 {
            return None;
        }
        if let Some(Value::Mapping(params)) = map.get(NEW_KEY) {
            return Some(Instruction::New(params));
        }
        map.get(REUSE_KEY).map(Instruction::Reuse)
    }

    /// Scalar rendered as text: strings verbatim, numbers in display form,
    /// `true` as `"1"`, `false` and null as `""`. Containers have none.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Convert plain YAML (no tags) into a value.
    pub fn from_yaml(yaml: &Yaml) -> Value {
        match yaml {
            Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => Value::Null,
            Yaml::Boolean(b) => Value::Bool(*b),
            Yaml::Integer(i) => Value::Integer(*i),
            Yaml::Real(text) => text
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::String(text.clone())),
            Yaml::String(s) => Value::String(s.clone()),
            Yaml::Array(items) => Value::Sequence(items.iter().map(Value::from_yaml).collect()),
            Yaml::Hash(hash) => Value::Mapping(
                hash.iter()
                    .map(|(k, v)| (key_string(k), Value::from_yaml(v)))
                    .collect(),
            ),
        }
    }
}

/// Mapping keys are strings; other scalar keys use their display form.
pub(crate) fn key_string(yaml: &Yaml) -> String {
    match yaml {
        Yaml::String(s) | Yaml::Real(s) => s.clone(),
        Yaml::Integer(i) => i.to_string(),
        Yaml::Boolean(b) => b.to_string(),
        Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => String::new(),
        Yaml::Array(_) | Yaml::Hash(_) => format!("{:?}", yaml),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Deferred(read) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$read", read)?;
                map.end()
            }
            Value::Loader(loader) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$autoload", loader)?;
                map.end()
            }
            Value::ErrorHandler(handler) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$error_handler", handler)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(class: &str) -> Mapping {
        let mut params = Mapping::new();
        params.insert(CLASS_KEY.to_string(), Value::from(class));
        params
    }

    #[test]
    fn test_instruction_new() {
        let value = Value::new_request(params("Db"));
        match value.instruction() {
            Some(Instruction::New(params)) => assert_eq!(params["class"], Value::from("Db")),
            other => panic!("expected New, got {:?}", other),
        }
    }

    #[test]
    fn test_instruction_reuse() {
        let value = Value::reuse_request(Value::from("db"));
        assert_eq!(value.instruction(), Some(Instruction::Reuse(&Value::from("db"))));
    }

    #[test]
    fn test_no_instruction_for_plain_mappings() {
        let mut map = Mapping::new();
        map.insert("new".into(), Value::Mapping(params("Db")));
        map.insert("extra".into(), Value::Null);
        assert_eq!(Value::Mapping(map).instruction(), None);
        assert_eq!(Value::from("new").instruction(), None);

        let mut map = Mapping::new();
        map.insert("new".into(), Value::from("Db"));
        assert_eq!(Value::Mapping(map).instruction(), None);
    }

    #[test]
    fn test_scalar_strings() {
        assert_eq!(Value::Bool(true).to_scalar_string().as_deref(), Some("1"));
        assert_eq!(Value::Bool(false).to_scalar_string().as_deref(), Some(""));
        assert_eq!(Value::Null.to_scalar_string().as_deref(), Some(""));
        assert_eq!(Value::Integer(128).to_scalar_string().as_deref(), Some("128"));
        assert_eq!(Value::Real(0.5).to_scalar_string().as_deref(), Some("0.5"));
        assert_eq!(Value::Sequence(vec![]).to_scalar_string(), None);
    }

    #[test]
    fn test_get_path() {
        let mut inner = Mapping::new();
        inner.insert("b".into(), Value::Integer(1));
        let mut outer = Mapping::new();
        outer.insert("a".into(), Value::Mapping(inner));
        let value = Value::Mapping(outer);

        assert_eq!(value.get_path(&["a", "b"]), Some(&Value::Integer(1)));
        assert_eq!(value.get_path(&["a", "c"]), None);
        assert_eq!(value.get_path::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_from_yaml_keys_are_strings() {
        let docs = yaml_rust2::YamlLoader::load_from_str("1: one\ntrue: yes\n~: nothing\n").unwrap();
        let value = Value::from_yaml(&docs[0]);
        let keys: Vec<&str> = value.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1", "true", ""]);
    }

    #[test]
    fn test_serialize_json() {
        let mut map = Mapping::new();
        map.insert("timeout".into(), Value::Integer(30));
        map.insert("ratio".into(), Value::Real(0.25));
        map.insert("tags".into(), Value::Sequence(vec![Value::from("a"), Value::Null]));
        map.insert(
            "later".into(),
            Value::Deferred(PendingRead::new("db.yaml", 0)),
        );
        let json = serde_json::to_value(Value::Mapping(map)).unwrap();
        assert_eq!(json["timeout"], 30);
        assert_eq!(json["ratio"], 0.25);
        assert_eq!(json["tags"][1], serde_json::Value::Null);
        assert_eq!(json["later"]["$read"]["filename"], "db.yaml");
    }
}
