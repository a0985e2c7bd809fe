/*
 * interpreter.rs
 *
 * The document interpreter: resolves configuration roots once, then parses
 * YAML files or strings and converts them into Values through the tag
 * registry.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kickstart_runtime::{DEFAULT_NAMESPACE, Environment, NativeEnvironment, SharedEnvironment};

use crate::error::{ConfigError, Result};
use crate::path::{CACHE_SENTINEL, LOCAL_SENTINEL, config_sentinel, find_path};
use crate::registry::{TagHandler, TagRegistry};
use crate::types::Value;

pub const SCRIPT_PATH_VAR: &str = "KICKSTART_SCRIPT_PATH";
pub const CONFIG_PATH_VAR: &str = "KICKSTART_CONFIG_PATH";
pub const CACHE_PATH_VAR: &str = "KICKSTART_CACHE_PATH";
pub const LOCAL_PATH_VAR: &str = "KICKSTART_LOCAL_PATH";

/// Construction options. Every root left as `None` is discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpreterOptions {
    pub script_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub local_path: Option<PathBuf>,
    /// Base for relative autoload paths (defaults to the script root)
    pub install_root: Option<PathBuf>,
    /// Namespace used for the config sentinel (defaults to `Kickstart`)
    pub namespace: Option<String>,
}

impl InterpreterOptions {
    /// Roots taken from `KICKSTART_*_PATH` environment variables.
    pub fn from_env(env: &dyn Environment) -> Self {
        let var = |name: &str| {
            env.env_get(name)
                .ok()
                .flatten()
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };
        Self {
            script_path: var(SCRIPT_PATH_VAR),
            config_path: var(CONFIG_PATH_VAR),
            cache_path: var(CACHE_PATH_VAR),
            local_path: var(LOCAL_PATH_VAR),
            install_root: None,
            namespace: None,
        }
    }

    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: InterpreterOptions) -> Self {
        Self {
            script_path: self.script_path.or(fallback.script_path),
            config_path: self.config_path.or(fallback.config_path),
            cache_path: self.cache_path.or(fallback.cache_path),
            local_path: self.local_path.or(fallback.local_path),
            install_root: self.install_root.or(fallback.install_root),
            namespace: self.namespace.or(fallback.namespace),
        }
    }
}

/// Resolved roots. Fixed for the lifetime of an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub script: PathBuf,
    pub config: PathBuf,
    pub cache: PathBuf,
    pub local: PathBuf,
    pub install_root: PathBuf,
    pub namespace: String,
}

impl ConfigPaths {
    /// Explicit options win; otherwise search upward from the script root
    /// and fall back to it.
    pub fn resolve(env: &dyn Environment, options: InterpreterOptions) -> Self {
        let script = options.script_path.unwrap_or_else(|| {
            env.script_dir().unwrap_or_else(|err| {
                tracing::debug!(error = %err, "script directory unknown, using '.'");
                PathBuf::from(".")
            })
        });
        let namespace = options
            .namespace
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let config = options
            .config_path
            .unwrap_or_else(|| find_path(env, &script, &config_sentinel(&namespace)));
        let cache = options
            .cache_path
            .unwrap_or_else(|| find_path(env, &script, CACHE_SENTINEL));
        let local = options
            .local_path
            .unwrap_or_else(|| find_path(env, &script, LOCAL_SENTINEL));
        let install_root = options.install_root.unwrap_or_else(|| script.clone());

        Self {
            script,
            config,
            cache,
            local,
            install_root,
            namespace,
        }
    }
}

/// Which documents of a multi-document source become the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentSelection {
    /// The first document
    #[default]
    First,
    /// The document at this index; `Null` if there is none
    Index(usize),
    /// A sequence of every document
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Byte offset to start reading at
    pub offset: u64,
    pub documents: DocumentSelection,
}

/// Result of a parse: the selected value and the number of documents found.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: Value,
    pub ndocs: usize,
}

/// Interprets tagged YAML configuration.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use kickstart_config::{Interpreter, InterpreterOptions, Value};
/// use kickstart_runtime::NativeEnvironment;
///
/// let options = InterpreterOptions {
///     script_path: Some("/srv/app".into()),
///     ..Default::default()
/// };
/// let interpreter = Interpreter::new(Arc::new(NativeEnvironment::isolated()), options);
///
/// let parsed = interpreter.parse_str("timeout: !period 30 seconds").unwrap();
/// assert_eq!(parsed.value.get("timeout"), Some(&Value::Integer(30)));
/// assert_eq!(parsed.ndocs, 1);
/// ```
pub struct Interpreter {
    env: SharedEnvironment,
    paths: ConfigPaths,
    registry: TagRegistry,
}

impl Interpreter {
    /// Interpreter with the built-in tags.
    pub fn new(env: SharedEnvironment, options: InterpreterOptions) -> Self {
        Self::with_registry(env, options, TagRegistry::builtin())
    }

    pub fn with_registry(
        env: SharedEnvironment,
        options: InterpreterOptions,
        registry: TagRegistry,
    ) -> Self {
        let paths = ConfigPaths::resolve(env.as_ref(), options);
        tracing::debug!(
            script = %paths.script.display(),
            config = %paths.config.display(),
            cache = %paths.cache.display(),
            local = %paths.local.display(),
            "resolved configuration roots"
        );
        Self {
            env,
            paths,
            registry,
        }
    }

    /// Interpreter over the process environment, with roots from
    /// `KICKSTART_*_PATH` variables where `options` leaves them unset.
    pub fn native(options: InterpreterOptions) -> Self {
        let env: SharedEnvironment = Arc::new(NativeEnvironment::new());
        let options = options.or(InterpreterOptions::from_env(env.as_ref()));
        Self::new(env, options)
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    pub fn shared_env(&self) -> SharedEnvironment {
        Arc::clone(&self.env)
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Add or replace a tag handler.
    pub fn register_tag(&mut self, name: impl Into<String>, handler: impl TagHandler + 'static) {
        self.registry.register(name, handler);
    }

    /// Relative inputs are taken from the config root.
    pub fn resolve_input(&self, input: &Path) -> PathBuf {
        if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.paths.config.join(input)
        }
    }

    /// Parse the first document of a file, starting at byte `offset`.
    pub fn parse_file(&self, input: impl AsRef<Path>, offset: u64) -> Result<Parsed> {
        self.parse_file_with(
            input,
            &ParseOptions {
                offset,
                ..Default::default()
            },
        )
    }

    pub fn parse_file_with(&self, input: impl AsRef<Path>, options: &ParseOptions) -> Result<Parsed> {
        let path = self.resolve_input(input.as_ref());
        let content = self
            .env
            .read_to_string_from(&path, options.offset)
            .map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        let offset = usize::try_from(options.offset)
            .map_err(|_| ConfigError::InvalidOffset { offset: options.offset })?;
        let filename = path.to_string_lossy();
        self.interpret(&content, Some(filename.as_ref()), offset, options.documents)
    }

    /// Parse the first document of a string.
    pub fn parse_str(&self, text: &str) -> Result<Parsed> {
        self.parse_str_with(text, &ParseOptions::default())
    }

    /// Parse a string; a non-zero offset skips that many bytes first.
    pub fn parse_str_with(&self, text: &str, options: &ParseOptions) -> Result<Parsed> {
        let offset = usize::try_from(options.offset)
            .map_err(|_| ConfigError::InvalidOffset { offset: options.offset })?;
        let content = if offset >= text.len() {
            ""
        } else {
            text.get(offset..)
                .ok_or(ConfigError::InvalidOffset { offset: options.offset })?
        };
        self.interpret(content, None, offset, options.documents)
    }

    /// Parse a file and hand the value and document count to `f`.
    pub fn with_file<F>(&self, input: impl AsRef<Path>, offset: u64, f: F) -> Result<&Self>
    where
        F: FnOnce(Value, usize),
    {
        let parsed = self.parse_file(input, offset)?;
        f(parsed.value, parsed.ndocs);
        Ok(self)
    }

    /// Parse a string and hand the value and document count to `f`.
    pub fn with_string<F>(&self, text: &str, f: F) -> Result<&Self>
    where
        F: FnOnce(Value, usize),
    {
        let parsed = self.parse_str(text)?;
        f(parsed.value, parsed.ndocs);
        Ok(self)
    }

    fn interpret(
        &self,
        content: &str,
        filename: Option<&str>,
        offset: usize,
        selection: DocumentSelection,
    ) -> Result<Parsed> {
        let span = tracing::debug_span!(
            "parse",
            input = filename.unwrap_or("<string>"),
            offset,
            ndocs = tracing::field::Empty
        )
        .entered();

        let documents = kickstart_yaml::parse_documents_at(content, filename, offset)?;
        let ndocs = documents.len();
        span.record("ndocs", ndocs);

        let value = match selection {
            DocumentSelection::First => match documents.into_iter().next() {
                Some(doc) => self.convert(doc)?,
                None => Value::Null,
            },
            DocumentSelection::Index(index) => match documents.into_iter().nth(index) {
                Some(doc) => self.convert(doc)?,
                None => Value::Null,
            },
            DocumentSelection::All => {
                let mut values = Vec::with_capacity(ndocs);
                for doc in documents {
                    values.push(self.convert(doc)?);
                }
                Value::Sequence(values)
            }
        };
        Ok(Parsed { value, ndocs })
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("paths", &self.paths)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
