//! Tags that only transform their value.

use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::interpreter::Interpreter;
use crate::period::parse_period;
use crate::read::PendingRead;
use crate::registry::TagInfo;
use crate::types::{CLASS_KEY, Mapping, Value};

/// `!period 1 day` → seconds as an integer.
pub fn period(_: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    match value {
        Value::String(text) => {
            let duration = parse_period(&text)?;
            i64::try_from(duration.as_secs())
                .map(Value::Integer)
                .map_err(|_| ConfigError::InvalidPeriod(text))
        }
        Value::Integer(seconds) if seconds >= 0 => Ok(Value::Integer(seconds)),
        Value::Null => Err(ConfigError::InvalidPeriod(String::new())),
        _ => Err(tag.invalid("expected a duration such as `1 day 2 hours`")),
    }
}

pub fn script_path(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    join_root(&interpreter.paths().script, value, tag)
}

pub fn cache_path(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    join_root(&interpreter.paths().cache, value, tag)
}

pub fn local_path(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    join_root(&interpreter.paths().local, value, tag)
}

/// Root alone for an empty value, `root/value` otherwise.
fn join_root(root: &Path, value: Value, tag: &TagInfo) -> Result<Value> {
    let relative = value
        .to_scalar_string()
        .ok_or_else(|| tag.invalid("expected a relative path"))?;
    // The suffix always stays below the root, even when written absolute.
    let relative = relative.trim_start_matches(['/', '\\']);
    let path = if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    };
    Ok(Value::String(path.to_string_lossy().into_owned()))
}

/// `!read file.yaml` or `!read {filename: file.yaml, offset: 120}`.
pub fn read(_: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    let pending = match &value {
        Value::String(filename) if !filename.is_empty() => PendingRead::new(filename.as_str(), 0),
        Value::Mapping(map) => {
            let filename = map
                .get("filename")
                .and_then(Value::as_str)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| tag.invalid("`filename` is required"))?;
            let offset = match map.get("offset") {
                None | Some(Value::Null) => 0,
                Some(Value::Integer(n)) => {
                    u64::try_from(*n).map_err(|_| tag.invalid("`offset` must not be negative"))?
                }
                Some(_) => return Err(tag.invalid("`offset` must be an integer")),
            };
            PendingRead::new(filename, offset)
        }
        _ => return Err(tag.invalid("expected a filename or {filename, offset}")),
    };
    Ok(Value::Deferred(pending))
}

/// `!new Class` or `!new {class: Class, ...params}` → `{new: params}`.
pub fn new(_: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    match value {
        Value::String(class) if !class.is_empty() => {
            let mut params = Mapping::new();
            params.insert(CLASS_KEY.to_string(), Value::String(class));
            Ok(Value::new_request(params))
        }
        Value::Mapping(params) => Ok(Value::new_request(params)),
        _ => Err(tag.invalid("expected a class name or a mapping")),
    }
}

/// `!reuse key` → `{reuse: key}`.
pub fn reuse(_: &Interpreter, value: Value, _: &TagInfo) -> Result<Value> {
    Ok(Value::reuse_request(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::InterpreterOptions;
    use crate::registry::NodeKind;
    use kickstart_runtime::NativeEnvironment;
    use kickstart_source_map::SourceInfo;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn interpreter() -> Interpreter {
        let options = InterpreterOptions {
            script_path: Some(PathBuf::from("/app")),
            config_path: Some(PathBuf::from("/app/.config/Kickstart")),
            cache_path: Some(PathBuf::from("/app/.cache")),
            local_path: Some(PathBuf::from("/app/.local")),
            ..Default::default()
        };
        Interpreter::new(Arc::new(NativeEnvironment::isolated()), options)
    }

    fn info(name: &str) -> TagInfo {
        TagInfo::new(name, NodeKind::Scalar, SourceInfo::default())
    }

    #[test]
    fn test_period_values() {
        let interp = interpreter();
        assert_eq!(
            period(&interp, Value::from("30 seconds"), &info("period")).unwrap(),
            Value::Integer(30)
        );
        assert_eq!(
            period(&interp, Value::Integer(45), &info("period")).unwrap(),
            Value::Integer(45)
        );
        assert!(matches!(
            period(&interp, Value::from("whenever"), &info("period")),
            Err(ConfigError::InvalidPeriod(_))
        ));
        assert!(matches!(
            period(&interp, Value::Sequence(vec![]), &info("period")),
            Err(ConfigError::InvalidTagValue { .. })
        ));
    }

    #[test]
    fn test_path_tags() {
        let interp = interpreter();
        assert_eq!(
            cache_path(&interp, Value::from("sessions"), &info("cache_path")).unwrap(),
            Value::from("/app/.cache/sessions")
        );
        assert_eq!(
            local_path(&interp, Value::Null, &info("local_path")).unwrap(),
            Value::from("/app/.local")
        );
        assert_eq!(
            script_path(&interp, Value::from(""), &info("script_path")).unwrap(),
            Value::from("/app")
        );
        assert!(script_path(&interp, Value::Sequence(vec![]), &info("script_path")).is_err());
    }

    #[test]
    fn test_path_tags_keep_root_for_leading_separator() {
        let interp = interpreter();
        assert_eq!(
            cache_path(&interp, Value::from("/sessions"), &info("cache_path")).unwrap(),
            Value::from("/app/.cache/sessions")
        );
        assert_eq!(
            local_path(&interp, Value::from("/"), &info("local_path")).unwrap(),
            Value::from("/app/.local")
        );
    }

    #[test]
    fn test_read_forms() {
        let interp = interpreter();
        assert_eq!(
            read(&interp, Value::from("db.yaml"), &info("read")).unwrap(),
            Value::Deferred(PendingRead::new("db.yaml", 0))
        );

        let mut map = Mapping::new();
        map.insert("filename".into(), Value::from("multi.yaml"));
        map.insert("offset".into(), Value::Integer(42));
        assert_eq!(
            read(&interp, Value::Mapping(map), &info("read")).unwrap(),
            Value::Deferred(PendingRead::new("multi.yaml", 42))
        );

        let mut map = Mapping::new();
        map.insert("offset".into(), Value::Integer(1));
        assert!(read(&interp, Value::Mapping(map), &info("read")).is_err());
        assert!(read(&interp, Value::Integer(3), &info("read")).is_err());
    }

    #[test]
    fn test_new_shapes() {
        let interp = interpreter();
        let value = new(&interp, Value::from("Foo"), &info("new")).unwrap();
        assert_eq!(value.get_path(&["new", "class"]), Some(&Value::from("Foo")));

        let mut params = Mapping::new();
        params.insert("class".into(), Value::from("Foo"));
        params.insert("x".into(), Value::Integer(1));
        let value = new(&interp, Value::Mapping(params.clone()), &info("new")).unwrap();
        assert_eq!(value.get("new"), Some(&Value::Mapping(params)));

        assert!(new(&interp, Value::Integer(1), &info("new")).is_err());
        assert!(new(&interp, Value::Null, &info("new")).is_err());
    }

    #[test]
    fn test_reuse_wraps_anything() {
        let interp = interpreter();
        assert_eq!(
            reuse(&interp, Value::from("db"), &info("reuse")).unwrap(),
            Value::reuse_request(Value::from("db"))
        );
    }
}
