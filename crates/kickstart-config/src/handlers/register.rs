//! `!autoloadRegister` and `!errorHandlerRegister`.
//!
//! Registration never aborts interpretation: when the environment cannot
//! register a collaborator, a warning is reported (`K-2-1` for loaders,
//! `K-2-2` for error handlers) and the collaborator is still returned.

use std::path::{Path, PathBuf};

use kickstart_runtime::{
    Autoload, AutoloadState, DEFAULT_ERROR_HANDLER_CLASS, ErrorHandler, Severity,
};

use super::side_effect_warning;
use crate::error::{ConfigError, Result};
use crate::interpreter::Interpreter;
use crate::registry::TagInfo;
use crate::types::{CLASS_KEY, Value};

/// Register one loader per state in the value; returns the loaders.
///
/// ```yaml
/// loaders: !autoloadRegister
///   - ~                          # Kickstart namespace at the install root
///   - My\Lib                     # namespace My\Lib under <install root>/My/Lib
///   - {namespace: Vendor, path: /opt/vendor, extension: .wasm}
/// ```
pub fn autoload_register(interpreter: &Interpreter, value: Value, tag: &TagInfo) -> Result<Value> {
    let states = match value {
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| autoload_state(item, tag))
            .collect::<Result<Vec<_>>>()?,
        other => vec![autoload_state(other, tag)?],
    };

    let install_root = &interpreter.paths().install_root;
    let mut loaders = Vec::with_capacity(states.len());
    for mut state in states {
        state.path = state
            .path
            .map(|path| resolve_against(interpreter, install_root, path));
        let loader = Autoload::from_state(state, install_root);

        match interpreter.env().register_autoloader(&loader) {
            Ok(()) => tracing::info!(
                namespace = %loader.namespace,
                path = %loader.path.display(),
                "registered autoloader"
            ),
            Err(error) => interpreter.env().warn(side_effect_warning(
                "K-2-1",
                format!(
                    "Could not register `{}` for namespace `{}`",
                    loader.class, loader.namespace
                ),
                &error,
                tag,
            )),
        }
        loaders.push(Value::Loader(loader));
    }
    Ok(Value::Sequence(loaders))
}

fn autoload_state(value: Value, tag: &TagInfo) -> Result<AutoloadState> {
    match value {
        Value::Null => Ok(AutoloadState::default()),
        Value::String(s) if s.is_empty() => Ok(AutoloadState::default()),
        Value::String(s) => Ok(AutoloadState {
            path: Some(PathBuf::from(s.replace('\\', "/"))),
            namespace: Some(s),
            ..Default::default()
        }),
        Value::Mapping(map) => {
            let field = |key: &str| -> Result<Option<String>> {
                match map.get(key) {
                    None | Some(Value::Null) => Ok(None),
                    Some(value) => value
                        .to_scalar_string()
                        .map(Some)
                        .ok_or_else(|| tag.invalid(format!("`{}` must be a string", key))),
                }
            };
            for key in map.keys() {
                if !matches!(
                    key.as_str(),
                    "namespace" | "path" | "separator" | "extension" | CLASS_KEY
                ) {
                    tracing::debug!(key = %key, "ignoring unknown autoload key");
                }
            }
            Ok(AutoloadState {
                class: field(CLASS_KEY)?,
                namespace: field("namespace")?,
                path: field("path")?.map(PathBuf::from),
                separator: field("separator")?,
                extension: field("extension")?,
            })
        }
        _ => Err(tag.invalid("expected a namespace, a mapping or a list of them")),
    }
}

/// Relative paths hang off `root`; existing directories are canonicalized.
fn resolve_against(interpreter: &Interpreter, root: &Path, path: PathBuf) -> PathBuf {
    let path = if path.is_absolute() { path } else { root.join(path) };
    if interpreter.env().is_dir(&path) {
        interpreter.env().canonicalize(&path).unwrap_or(path)
    } else {
        path
    }
}

/// Install an error handler for the listed severities.
///
/// ```yaml
/// errors: !errorHandlerRegister [warning, user warning, E_NOTICE]
/// strict: !errorHandlerRegister {class: App\Strict, error_types: all}
/// ```
pub fn error_handler_register(
    interpreter: &Interpreter,
    value: Value,
    tag: &TagInfo,
) -> Result<Value> {
    let (class, types) = match value {
        Value::Mapping(map) => {
            let class = match map.get(CLASS_KEY) {
                None | Some(Value::Null) => DEFAULT_ERROR_HANDLER_CLASS.to_string(),
                Some(Value::String(class)) if !class.is_empty() => class.clone(),
                Some(_) => return Err(tag.invalid("`class` must be a name")),
            };
            let types = severity_mask(map.get("error_types").unwrap_or(&Value::Null), tag)?;
            (class, types)
        }
        other => (
            DEFAULT_ERROR_HANDLER_CLASS.to_string(),
            severity_mask(&other, tag)?,
        ),
    };
    let handler = ErrorHandler::new(class, types);

    match interpreter.env().register_error_handler(&handler) {
        Ok(()) => tracing::info!(
            class = %handler.class,
            error_types = ?handler.error_types,
            "registered error handler"
        ),
        Err(error) => interpreter.env().warn(side_effect_warning(
            "K-2-2",
            format!(
                "Could not register `{}` for {}",
                handler.class,
                describe_mask(handler.error_types)
            ),
            &error,
            tag,
        )),
    }
    Ok(Value::ErrorHandler(handler))
}

/// Combined mask of the named severities; `None` when nothing is named.
fn severity_mask(value: &Value, tag: &TagInfo) -> Result<Option<Severity>> {
    let names: Vec<&Value> = match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.iter().collect(),
        single => vec![single],
    };
    if names.is_empty() {
        return Ok(None);
    }

    let mut mask = Severity::empty();
    for item in names {
        mask |= match item {
            Value::String(name) => {
                Severity::parse_level(name).ok_or_else(|| ConfigError::UnknownSeverity(name.clone()))?
            }
            Value::Integer(bits) => u32::try_from(*bits)
                .ok()
                .and_then(Severity::from_bits)
                .ok_or_else(|| ConfigError::UnknownSeverity(bits.to_string()))?,
            _ => return Err(tag.invalid("error types must be names or numbers")),
        };
    }
    Ok(Some(mask))
}

fn describe_mask(mask: Option<Severity>) -> String {
    match mask {
        None => "all severities".to_string(),
        Some(mask) => mask
            .iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::InterpreterOptions;
    use crate::registry::NodeKind;
    use crate::types::Mapping;
    use kickstart_runtime::{EnvironmentPolicy, NativeEnvironment, SandboxedEnvironment};
    use kickstart_source_map::SourceInfo;
    use std::sync::Arc;

    fn options() -> InterpreterOptions {
        InterpreterOptions {
            script_path: Some(PathBuf::from("/app")),
            install_root: Some(PathBuf::from("/opt/kickstart-test-root")),
            ..Default::default()
        }
    }

    fn info(name: &str) -> TagInfo {
        TagInfo::new(name, NodeKind::Scalar, SourceInfo::default())
    }

    fn state_mapping(entries: &[(&str, &str)]) -> Value {
        let mut map = Mapping::new();
        for (key, value) in entries {
            map.insert((*key).to_string(), Value::from(*value));
        }
        Value::Mapping(map)
    }

    fn loaders(value: &Value) -> Vec<&Autoload> {
        value
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| match v {
                Value::Loader(loader) => loader,
                other => panic!("expected a loader, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_default_state() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = autoload_register(&interp, Value::Null, &info("autoloadRegister")).unwrap();
        let registered = loaders(&value);
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].namespace, "Kickstart");
        assert_eq!(registered[0].path, PathBuf::from("/opt/kickstart-test-root"));
        assert_eq!(env.autoloaders(None).len(), 1);
    }

    #[test]
    fn test_string_state() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value =
            autoload_register(&interp, Value::from("My\\Lib"), &info("autoloadRegister")).unwrap();
        let registered = loaders(&value);
        assert_eq!(registered[0].namespace, "My\\Lib");
        assert!(registered[0].path.ends_with("My/Lib"));
        assert!(registered[0].path.starts_with("/opt/kickstart-test-root"));
    }

    #[test]
    fn test_mapping_and_sequence_states() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = Value::Sequence(vec![
            Value::Null,
            state_mapping(&[
                ("namespace", "vendor.pkg"),
                ("path", "/srv/vendor"),
                ("separator", "."),
                ("extension", ".wasm"),
                ("class", "Vendor\\Loader"),
            ]),
        ]);
        let value = autoload_register(&interp, value, &info("autoloadRegister")).unwrap();
        let registered = loaders(&value);
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[1].class, "Vendor\\Loader");
        assert_eq!(registered[1].path, PathBuf::from("/srv/vendor"));
        assert_eq!(
            registered[1].filename_for("vendor.pkg.Thing"),
            Some(PathBuf::from("/srv/vendor/Thing.wasm"))
        );
        assert_eq!(env.autoloaders(None).len(), 2);
    }

    #[test]
    fn test_equal_states_register_separately() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = Value::Sequence(vec![Value::from("My\\Lib"), Value::from("My\\Lib")]);
        let value = autoload_register(&interp, value, &info("autoloadRegister")).unwrap();
        let returned = loaders(&value);
        assert_eq!(returned.len(), 2);
        assert!(!returned[0].same_instance(&returned[1]));
        assert_eq!(env.autoloaders(Some(&["My\\Lib"])).len(), 2);
    }

    #[test]
    fn test_bad_autoload_value() {
        let interp = Interpreter::new(Arc::new(NativeEnvironment::isolated()), options());
        assert!(matches!(
            autoload_register(&interp, Value::Integer(3), &info("autoloadRegister")),
            Err(ConfigError::InvalidTagValue { .. })
        ));
    }

    #[test]
    fn test_autoload_failure_is_a_warning() {
        let native = NativeEnvironment::isolated();
        let sandbox = SandboxedEnvironment::new(native.clone(), EnvironmentPolicy::read_only());
        let interp = Interpreter::new(Arc::new(sandbox), options());

        let value = autoload_register(&interp, Value::from("My\\Lib"), &info("autoloadRegister"))
            .unwrap();
        assert_eq!(loaders(&value).len(), 1);
        assert!(native.autoloaders(None).is_empty());

        let warnings = native.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code.as_deref(), Some("K-2-1"));
        assert!(warnings[0].to_text().contains("My\\Lib"));
    }

    #[test]
    fn test_error_handler_names() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = Value::Sequence(vec![Value::from("warning"), Value::from("user warning")]);
        let result = error_handler_register(&interp, value, &info("errorHandlerRegister")).unwrap();
        let Value::ErrorHandler(handler) = result else {
            panic!("expected an error handler");
        };
        assert_eq!(
            handler.error_types,
            Some(Severity::WARNING | Severity::USER_WARNING)
        );
        assert_eq!(handler.class, DEFAULT_ERROR_HANDLER_CLASS);
        assert_eq!(env.error_handler(), Some(handler));
    }

    #[test]
    fn test_error_handler_mapping() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());

        let value = state_mapping(&[("class", "App\\Strict"), ("error_types", "E_ALL")]);
        error_handler_register(&interp, value, &info("errorHandlerRegister")).unwrap();
        let handler = env.error_handler().unwrap();
        assert_eq!(handler.class, "App\\Strict");
        assert_eq!(handler.error_types, Some(Severity::ALL));
    }

    #[test]
    fn test_error_handler_defaults() {
        let env = NativeEnvironment::isolated();
        let interp = Interpreter::new(Arc::new(env.clone()), options());
        error_handler_register(&interp, Value::Null, &info("errorHandlerRegister")).unwrap();
        assert_eq!(env.error_handler(), Some(ErrorHandler::default()));

        error_handler_register(&interp, Value::Integer(3), &info("errorHandlerRegister")).unwrap();
        assert_eq!(
            env.error_handler().unwrap().error_types,
            Some(Severity::ERROR | Severity::WARNING)
        );
    }

    #[test]
    fn test_unknown_severity() {
        let interp = Interpreter::new(Arc::new(NativeEnvironment::isolated()), options());
        let err = error_handler_register(&interp, Value::from("catastrophe"), &info("x"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSeverity(name) if name == "catastrophe"));
    }

    #[test]
    fn test_error_handler_failure_is_a_warning() {
        let native = NativeEnvironment::isolated();
        let sandbox = SandboxedEnvironment::new(native.clone(), EnvironmentPolicy::read_only());
        let interp = Interpreter::new(Arc::new(sandbox), options());

        let result =
            error_handler_register(&interp, Value::from("notice"), &info("errorHandlerRegister"))
                .unwrap();
        assert!(matches!(result, Value::ErrorHandler(_)));
        assert!(native.error_handler().is_none());
        assert_eq!(native.warnings()[0].code.as_deref(), Some("K-2-2"));
    }
}
