//! Tag-dispatching YAML configuration interpreter.
//!
//! A configuration file is plain YAML in which some nodes carry a local tag:
//!
//! ```yaml
//! settings: !ini_set {memory_limit: 256M}
//! timeout: !period 30 seconds
//! cache: !cache_path sessions
//! database: !read database.yaml
//! mailer: !new {class: App\Mailer, host: localhost}
//! ```
//!
//! The [`Interpreter`] converts such a document bottom-up: children first,
//! then the handler registered for the node's tag (see [`TagRegistry`]). The
//! result is a [`Value`] tree of plain data plus construction requests
//! (`{new: ...}`, `{reuse: ...}`) for an application [`Factory`], and
//! [`Value::Deferred`] reads that are only parsed when resolved.
//!
//! Tags that touch the process (`ini_set`, `setTimeLimit`, `setTimezone`,
//! `autoloadRegister`, `errorHandlerRegister`) go through the
//! [`kickstart_runtime::Environment`] the interpreter was built with.

mod convert;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod interpreter;
pub mod path;
pub mod period;
pub mod read;
pub mod registry;
pub mod types;

pub use error::{ConfigError, Result};
pub use factory::{Factory, FactoryError, NamedLoad, load_named};
pub use interpreter::{
    ConfigPaths, DocumentSelection, Interpreter, InterpreterOptions, ParseOptions, Parsed,
};
pub use path::find_path;
pub use period::parse_period;
pub use read::{PendingRead, inject_reuse_key};
pub use registry::{NodeKind, TagHandler, TagInfo, TagRegistry};
pub use types::{Instruction, Mapping, Value};
