/*
 * sandbox.rs
 *
 * SandboxedEnvironment: a decorator that checks an EnvironmentPolicy before
 * delegating to another Environment.
 *
 * Reads are filtered by path pattern. Each class of side effect (directives,
 * time limit, timezone, loader and handler registration) has its own switch.
 * Denied operations fail with RuntimeError::PermissionDenied; path lookups
 * on denied paths simply report "not found".
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kickstart_error_reporting::DiagnosticMessage;

use crate::autoload::Autoload;
use crate::error_handler::ErrorHandler;
use crate::traits::{Environment, RuntimeError, RuntimeResult};

/// A path pattern that can match files/directories.
///
/// Supports:
/// - Everything: "*"
/// - Directory prefixes: "/etc/kickstart/" (matches everything under)
/// - Wildcards: "/etc/kickstart/*.yaml" (prefix before the first `*` plus suffix after the last)
/// - Exact paths: "/etc/kickstart/app.yaml"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern matching everything below `dir`.
    pub fn under(dir: &Path) -> Self {
        let mut pattern = dir.to_string_lossy().to_string();
        if !pattern.ends_with(std::path::MAIN_SEPARATOR) {
            pattern.push(std::path::MAIN_SEPARATOR);
        }
        Self(pattern)
    }

    pub fn matches(&self, path: &Path) -> bool {
        let pattern = &self.0;
        let path_str = path.to_string_lossy();

        if pattern == "*" {
            return true;
        }

        if let Some((prefix, _)) = pattern.split_once('*') {
            let suffix = pattern.rsplit('*').next().unwrap_or("");
            path_str.starts_with(prefix) && path_str.ends_with(suffix)
        } else if pattern.ends_with('/') || pattern.ends_with(std::path::MAIN_SEPARATOR) {
            let trimmed = pattern.trim_end_matches(['/', '\\']);
            path_str == trimmed
                || path_str
                    .strip_prefix(trimmed)
                    .is_some_and(|rest| rest.starts_with(['/', '\\']))
        } else {
            path_str == pattern.as_str()
        }
    }
}

/// What a sandboxed environment may do.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentPolicy {
    /// Paths allowed for reading. Empty = no read access.
    pub allow_read: Vec<PathPattern>,
    /// Paths explicitly denied for reading. Takes precedence over allow_read.
    pub deny_read: Vec<PathPattern>,
    /// Environment variables that may be read. "*" allows all.
    pub allow_env: Vec<String>,
    pub allow_directives: bool,
    pub allow_time_limit: bool,
    pub allow_timezone: bool,
    pub allow_autoload: bool,
    pub allow_error_handler: bool,
}

impl EnvironmentPolicy {
    /// Everything allowed.
    pub fn trusted() -> Self {
        Self {
            allow_read: vec![PathPattern::new("*")],
            deny_read: vec![],
            allow_env: vec!["*".to_string()],
            allow_directives: true,
            allow_time_limit: true,
            allow_timezone: true,
            allow_autoload: true,
            allow_error_handler: true,
        }
    }

    /// Reads anywhere, no process-wide side effects.
    pub fn read_only() -> Self {
        Self {
            allow_read: vec![PathPattern::new("*")],
            allow_env: vec!["*".to_string()],
            ..Self::default()
        }
    }

    /// Reads confined to `root`, no environment variables, no side effects.
    pub fn confined(root: &Path) -> Self {
        Self {
            allow_read: vec![PathPattern::under(root)],
            ..Self::default()
        }
    }

    pub fn can_read(&self, path: &Path) -> bool {
        !self.deny_read.iter().any(|p| p.matches(path))
            && self.allow_read.iter().any(|p| p.matches(path))
    }

    pub fn can_env(&self, name: &str) -> bool {
        self.allow_env.iter().any(|v| v == "*" || v == name)
    }
}

/// Environment decorator enforcing an [`EnvironmentPolicy`].
pub struct SandboxedEnvironment<E: Environment> {
    inner: E,
    policy: EnvironmentPolicy,
}

impl<E: Environment> SandboxedEnvironment<E> {
    pub fn new(inner: E, policy: EnvironmentPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn policy(&self) -> &EnvironmentPolicy {
        &self.policy
    }

    fn check(&self, allowed: bool, what: impl FnOnce() -> String) -> RuntimeResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(RuntimeError::PermissionDenied(what()))
        }
    }
}

impl<E: Environment> Environment for SandboxedEnvironment<E> {
    fn is_dir(&self, path: &Path) -> bool {
        self.policy.can_read(path) && self.inner.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.policy.can_read(path) && self.inner.is_file(path)
    }

    fn read_to_string_from(&self, path: &Path, offset: u64) -> RuntimeResult<String> {
        self.check(self.policy.can_read(path), || {
            format!("read '{}'", path.display())
        })?;
        self.inner.read_to_string_from(path, offset)
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn script_dir(&self) -> RuntimeResult<PathBuf> {
        self.inner.script_dir()
    }

    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>> {
        if !self.policy.can_env(name) {
            return Ok(None);
        }
        self.inner.env_get(name)
    }

    fn set_directive(&self, name: &str, value: &str) -> RuntimeResult<Option<String>> {
        self.check(self.policy.allow_directives, || {
            format!("set directive '{}'", name)
        })?;
        self.inner.set_directive(name, value)
    }

    fn set_time_limit(&self, limit: Option<Duration>) -> RuntimeResult<()> {
        self.check(self.policy.allow_time_limit, || "set time limit".to_string())?;
        self.inner.set_time_limit(limit)
    }

    fn set_timezone(&self, name: &str) -> RuntimeResult<()> {
        self.check(self.policy.allow_timezone, || {
            format!("set timezone '{}'", name)
        })?;
        self.inner.set_timezone(name)
    }

    fn register_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        self.check(self.policy.allow_autoload, || {
            format!("register autoloader for '{}'", loader.namespace)
        })?;
        self.inner.register_autoloader(loader)
    }

    fn unregister_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        self.check(self.policy.allow_autoload, || {
            format!("unregister autoloader for '{}'", loader.namespace)
        })?;
        self.inner.unregister_autoloader(loader)
    }

    fn register_error_handler(&self, handler: &ErrorHandler) -> RuntimeResult<()> {
        self.check(self.policy.allow_error_handler, || {
            format!("register error handler '{}'", handler.class)
        })?;
        self.inner.register_error_handler(handler)
    }

    fn warn(&self, diagnostic: DiagnosticMessage) {
        self.inner.warn(diagnostic)
    }
}

/// Type alias for a thread-safe shared environment.
pub type SharedEnvironment = Arc<dyn Environment>;

impl<T: Environment + ?Sized> Environment for Arc<T> {
    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn read_to_string_from(&self, path: &Path, offset: u64) -> RuntimeResult<String> {
        (**self).read_to_string_from(path, offset)
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        (**self).canonicalize(path)
    }

    fn script_dir(&self) -> RuntimeResult<PathBuf> {
        (**self).script_dir()
    }

    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>> {
        (**self).env_get(name)
    }

    fn set_directive(&self, name: &str, value: &str) -> RuntimeResult<Option<String>> {
        (**self).set_directive(name, value)
    }

    fn set_time_limit(&self, limit: Option<Duration>) -> RuntimeResult<()> {
        (**self).set_time_limit(limit)
    }

    fn set_timezone(&self, name: &str) -> RuntimeResult<()> {
        (**self).set_timezone(name)
    }

    fn register_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        (**self).register_autoloader(loader)
    }

    fn unregister_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        (**self).unregister_autoloader(loader)
    }

    fn register_error_handler(&self, handler: &ErrorHandler) -> RuntimeResult<()> {
        (**self).register_error_handler(handler)
    }

    fn warn(&self, diagnostic: DiagnosticMessage) {
        (**self).warn(diagnostic)
    }
}
