//! Tags that change process-wide settings.
//!
//! Each tag applies its value through the interpreter's environment and then
//! returns the value unchanged. A side effect the environment refuses
//! (`PermissionDenied`, e.g. under a read-only sandbox) becomes a `K-2-3`
//! warning; any other failure is an error.

use std::time::Duration;

use kickstart_runtime::{RuntimeError, RuntimeResult};

use super::side_effect_warning;
use crate::error::{ConfigError, Result};
use crate::interpreter::Interpreter;
use crate::registry::TagInfo;
use crate::types::Value;

fn apply<T>(
    interpreter: &Interpreter,
    tag: &TagInfo,
    what: impl FnOnce() -> String,
    result: RuntimeResult<T>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error @ RuntimeError::PermissionDenied(_)) => {
            interpreter
                .env()
                .warn(side_effect_warning("K-2-3", what(), &error, tag));
            Ok(None)
        }
        Err(source) => Err(ConfigError::TagFailed {
            tag: tag.name.clone(),
            location: Some(tag.source_info.clone()),
            source,
        }),
    }
}

/// `!ini_set {name: value, ...}`: set each directive.
pub fn ini_set(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    let Some(directives) = value.as_mapping() else {
        return Ok(value);
    };
    for (name, setting) in directives {
        let setting = setting
            .to_scalar_string()
            .ok_or_else(|| tag.invalid(format!("directive `{}` needs a scalar value", name)))?;
        let previous = apply(
            interpreter,
            tag,
            || format!("Could not set directive `{}`", name),
            interpreter.env().set_directive(name, &setting),
        )?;
        if let Some(previous) = previous {
            tracing::debug!(name = %name, value = %setting, previous = ?previous, "directive set");
        }
    }
    Ok(value)
}

/// `!setTimeLimit 30`: seconds, `0` for no limit.
pub fn set_time_limit(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    let seconds = match &value {
        Value::Integer(n) => Some(*n),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let seconds = seconds
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| tag.invalid("expected a non-negative number of seconds"))?;
    let limit = (seconds > 0).then(|| Duration::from_secs(seconds));

    apply(
        interpreter,
        tag,
        || format!("Could not set the time limit to {}s", seconds),
        interpreter.env().set_time_limit(limit),
    )?;
    Ok(value)
}

/// `!setTimezone Europe/Berlin`
pub fn set_timezone(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    let Some(name) = value.as_str() else {
        return Err(tag.invalid("expected a timezone name"));
    };
    apply(
        interpreter,
        tag,
        || format!("Could not set the timezone to `{}`", name),
        interpreter.env().set_timezone(name),
    )?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::InterpreterOptions;
    use crate::registry::NodeKind;
    use crate::types::Mapping;
    use kickstart_runtime::{EnvironmentPolicy, NativeEnvironment, SandboxedEnvironment};
    use kickstart_source_map::SourceInfo;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn options() -> InterpreterOptions {
        InterpreterOptions {
            script_path: Some(PathBuf::from("/app")),
            ..Default::default()
        }
    }

    fn info(name: &str) -> TagInfo {
        TagInfo::new(name, NodeKind::Scalar, SourceInfo::default())
    }

    #[test]
    fn test_ini_set_applies_every_entry() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let mut map = Mapping::new();
        map.insert("memory_limit".into(), Value::from("256M"));
        map.insert("display_errors".into(), Value::Bool(false));
        map.insert("precision".into(), Value::Integer(14));
        let value = Value::Mapping(map);

        let result = ini_set(&interp, value.clone(), &info("ini_set")).unwrap();
        assert_eq!(result, value);
        assert_eq!(env.directive("memory_limit").as_deref(), Some("256M"));
        assert_eq!(env.directive("display_errors").as_deref(), Some(""));
        assert_eq!(env.directive("precision").as_deref(), Some("14"));
    }

    #[test]
    fn test_ini_set_ignores_non_mappings() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());
        let result = ini_set(&interp, Value::from("memory_limit"), &info("ini_set")).unwrap();
        assert_eq!(result, Value::from("memory_limit"));
        assert_eq!(env.directive("memory_limit"), None);
    }

    #[test]
    fn test_ini_set_rejects_nested_values() {
        let interp = Interpreter::new(Arc::new(NativeEnvironment::isolated()), options());
        let mut map = Mapping::new();
        map.insert("memory_limit".into(), Value::Sequence(vec![]));
        assert!(matches!(
            ini_set(&interp, Value::Mapping(map), &info("ini_set")),
            Err(ConfigError::InvalidTagValue { .. })
        ));
    }

    #[test]
    fn test_time_limit_forms() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        set_time_limit(&interp, Value::Integer(30), &info("setTimeLimit")).unwrap();
        assert_eq!(env.time_limit(), Some(Duration::from_secs(30)));

        set_time_limit(&interp, Value::from(" 90 "), &info("setTimeLimit")).unwrap();
        assert_eq!(env.time_limit(), Some(Duration::from_secs(90)));

        set_time_limit(&interp, Value::Integer(0), &info("setTimeLimit")).unwrap();
        assert_eq!(env.time_limit(), None);

        assert!(set_time_limit(&interp, Value::Integer(-1), &info("setTimeLimit")).is_err());
        assert!(set_time_limit(&interp, Value::from("soon"), &info("setTimeLimit")).is_err());
    }

    #[test]
    fn test_timezone() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = set_timezone(&interp, Value::from("UTC"), &info("setTimezone")).unwrap();
        assert_eq!(value, Value::from("UTC"));
        assert_eq!(env.timezone().as_deref(), Some("UTC"));

        assert!(matches!(
            set_timezone(&interp, Value::from(""), &info("setTimezone")),
            Err(ConfigError::TagFailed { .. })
        ));
        assert!(matches!(
            set_timezone(&interp, Value::Integer(1), &info("setTimezone")),
            Err(ConfigError::InvalidTagValue { .. })
        ));
    }

    #[test]
    fn test_denied_side_effects_warn() {
        let native = NativeEnvironment::isolated();
        let sandbox = SandboxedEnvironment::new(native.clone(), EnvironmentPolicy::read_only());
        let interp = Interpreter::new(Arc::new(sandbox), options());

        let value = set_timezone(&interp, Value::from("UTC"), &info("setTimezone")).unwrap();
        assert_eq!(value, Value::from("UTC"));
        assert_eq!(native.timezone(), None);

        let warnings = native.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code.as_deref(), Some("K-2-3"));
    }
}
