/*
 * lib.rs
 *
 * Process environment abstraction for kickstart.
 *
 * Configuration tags such as `!ini_set`, `!setTimezone` or
 * `!autoloadRegister` change process-wide state. They do so only through the
 * Environment trait defined here, so callers decide what a configuration
 * file is allowed to touch:
 * - NativeEnvironment: real filesystem and process settings
 * - SandboxedEnvironment: policy-checked wrapper (dry runs, untrusted files)
 */

pub mod autoload;
pub mod error_handler;
pub mod native;
pub mod sandbox;
pub mod traits;

pub use autoload::{
    Autoload, AutoloadState, DEFAULT_AUTOLOAD_CLASS, DEFAULT_NAMESPACE, DEFAULT_SEPARATOR,
};
pub use error_handler::{DEFAULT_ERROR_HANDLER_CLASS, ErrorHandler, Severity};
pub use native::{MAX_RECORDED_WARNINGS, NativeEnvironment};
pub use sandbox::{EnvironmentPolicy, PathPattern, SandboxedEnvironment, SharedEnvironment};
pub use traits::{Environment, RuntimeError, RuntimeResult};
