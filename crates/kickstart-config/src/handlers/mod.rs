//! Built-in tag handlers.
//!
//! * [`values`]: pure transformations (`new`, `reuse`, `read`, `period`, path tags)
//! * [`process`]: process settings (`ini_set`, `setTimeLimit`, `setTimezone`)
//! * [`register`]: collaborator registration (`autoloadRegister`, `errorHandlerRegister`)

pub mod process;
pub mod register;
pub mod values;

use kickstart_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};
use kickstart_runtime::RuntimeError;

use crate::registry::TagInfo;

/// Warning for a side effect the environment refused or failed to perform.
pub(crate) fn side_effect_warning(
    code: &str,
    problem: String,
    error: &RuntimeError,
    tag: &TagInfo,
) -> DiagnosticMessage {
    DiagnosticMessageBuilder::from_code(DiagnosticKind::Warning, code)
        .problem(problem)
        .add_detail(error.to_string())
        .add_info(format!("Written as `!{}`", tag.name))
        .with_location(tag.source_info.clone())
        .build()
}
