//! Boundary to the object factory.
//!
//! The interpreter only produces construction requests (`{new: ...}`,
//! `{reuse: ...}`); building objects is the job of a [`Factory`] supplied by
//! the application. [`load_named`] ties the two together: it reads
//! `<name>.yaml`, resolves deferred reads, hands the configuration to the
//! factory and asks it for the object.

use thiserror::Error;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::types::Value;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("No configuration registered for '{0}'")]
    Unconfigured(String),

    #[error("Cannot build '{name}': {message}")]
    Build { name: String, message: String },
}

/// Builds objects from resolved configuration.
pub trait Factory {
    type Object;

    /// Store the configuration for `name`.
    fn configure(&mut self, name: &str, config: Value) -> std::result::Result<(), FactoryError>;

    /// The object currently configured for `name`.
    fn current(&mut self, name: &str) -> std::result::Result<Self::Object, FactoryError>;
}

/// Where a named configuration comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedLoad {
    /// File to read instead of `<name>.yaml`
    pub filename: Option<String>,
    /// Byte offset to start reading at
    pub offset: u64,
}

/// Load `<name>.yaml`, configure `factory` with it and return the object.
///
/// Deferred reads in the file are resolved with reuse ids rooted at `name`.
pub fn load_named<F: Factory>(
    interpreter: &Interpreter,
    factory: &mut F,
    name: &str,
    load: NamedLoad,
) -> Result<F::Object> {
    let filename = load.filename.unwrap_or_else(|| format!("{}.yaml", name));
    tracing::debug!(name, filename = %filename, offset = load.offset, "loading named configuration");

    let parsed = interpreter.parse_file(&filename, load.offset)?;
    let value = interpreter.resolve_deferred(parsed.value, &[name.to_string()])?;

    factory.configure(name, value)?;
    Ok(factory.current(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_error_display() {
        assert_eq!(
            FactoryError::Unconfigured("db".into()).to_string(),
            "No configuration registered for 'db'"
        );
        let err = FactoryError::Build {
            name: "db".into(),
            message: "missing class".into(),
        };
        assert_eq!(err.to_string(), "Cannot build 'db': missing class");
    }

    #[test]
    fn test_named_load_default() {
        let load = NamedLoad::default();
        assert_eq!(load.filename, None);
        assert_eq!(load.offset, 0);
    }
}
