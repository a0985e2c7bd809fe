/*
 * traits.rs
 *
 * Defines the Environment trait and supporting types for the runtime
 * abstraction layer.
 *
 * Tag handlers never touch process state directly. Every side effect
 * (directives, time limit, timezone, autoloader and error-handler
 * registration) goes through an Environment, so it is visible at the
 * handler's call boundary and can be swapped out:
 * - NativeEnvironment: real filesystem, process-wide state
 * - SandboxedEnvironment: policy-checked decorator around another environment
 */

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kickstart_error_reporting::DiagnosticMessage;

use crate::autoload::Autoload;
use crate::error_handler::ErrorHandler;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// Permission denied (with detailed reason)
    PermissionDenied(String),

    /// Operation not supported by this environment
    NotSupported(String),

    /// An argument was rejected (bad directive name, bad timezone, ...)
    InvalidArgument(String),

    /// The configured execution time limit has elapsed
    TimeLimitExceeded(Duration),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            RuntimeError::NotSupported(msg) => write!(f, "Operation not supported: {}", msg),
            RuntimeError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            RuntimeError::TimeLimitExceeded(limit) => {
                write!(f, "Execution time limit of {}s exceeded", limit.as_secs())
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

/// Capability object through which configuration tags reach the process.
///
/// Implementations must be shareable across threads; the interpreter itself
/// is single-threaded but an environment usually outlives it and is handed to
/// several interpreters over the life of a process.
pub trait Environment: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // FILESYSTEM
    // ═══════════════════════════════════════════════════════════════════════

    /// Check if path exists and is a directory. Errors count as "no".
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path exists and is a regular file. Errors count as "no".
    fn is_file(&self, path: &Path) -> bool;

    /// Read a file as UTF-8, starting at byte `offset`.
    ///
    /// An offset past the end of the file yields an empty string.
    fn read_to_string_from(&self, path: &Path, offset: u64) -> RuntimeResult<String>;

    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        self.read_to_string_from(path, 0)
    }

    /// Canonicalize a path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    // ═══════════════════════════════════════════════════════════════════════
    // PROCESS
    // ═══════════════════════════════════════════════════════════════════════

    /// Directory containing the launching program.
    fn script_dir(&self) -> RuntimeResult<PathBuf>;

    /// Get single environment variable.
    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>>;

    // ═══════════════════════════════════════════════════════════════════════
    // PROCESS-WIDE SETTINGS
    // ═══════════════════════════════════════════════════════════════════════

    /// Set a runtime directive, returning its previous value.
    fn set_directive(&self, name: &str, value: &str) -> RuntimeResult<Option<String>>;

    /// Set the execution time ceiling and restart its clock. `None` removes it.
    fn set_time_limit(&self, limit: Option<Duration>) -> RuntimeResult<()>;

    /// Set the default timezone (`Europe/Berlin`, `UTC`, ...).
    fn set_timezone(&self, name: &str) -> RuntimeResult<()>;

    // ═══════════════════════════════════════════════════════════════════════
    // REGISTRATION
    // ═══════════════════════════════════════════════════════════════════════

    /// Register an autoloader. Registering the same instance again is a no-op;
    /// separately built loaders with equal settings are registered separately.
    fn register_autoloader(&self, loader: &Autoload) -> RuntimeResult<()>;

    /// Remove a previously registered autoloader. Removing one that is not
    /// registered warns and succeeds.
    fn unregister_autoloader(&self, loader: &Autoload) -> RuntimeResult<()>;

    /// Install an error handler; it replaces the current one.
    fn register_error_handler(&self, handler: &ErrorHandler) -> RuntimeResult<()>;

    // ═══════════════════════════════════════════════════════════════════════
    // REPORTING
    // ═══════════════════════════════════════════════════════════════════════

    /// Report a non-fatal problem.
    fn warn(&self, diagnostic: DiagnosticMessage);
}
