/*
 * parse.rs
 *
 * Parse command implementation
 */

//! `kickstart parse`: interpret a file and print the value graph.
//!
//! The graph is written to stdout as pretty JSON and the document count to
//! stderr. With `--dry-run` the process environment is wrapped in a
//! read-only sandbox, so side-effect tags report a warning instead of
//! changing anything.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use kickstart_config::{
    ConfigError, DocumentSelection, Interpreter, InterpreterOptions, ParseOptions,
};
use kickstart_runtime::{
    EnvironmentPolicy, NativeEnvironment, SandboxedEnvironment, SharedEnvironment,
};

/// Arguments for the parse command
#[derive(Debug)]
pub struct ParseArgs {
    pub input: PathBuf,
    pub offset: u64,
    pub all: bool,
    pub resolve: bool,
    pub dry_run: bool,
    pub options: InterpreterOptions,
}

/// Execute the parse command
pub fn execute(args: ParseArgs) -> Result<()> {
    let native = NativeEnvironment::new();
    let env: SharedEnvironment = if args.dry_run {
        Arc::new(SandboxedEnvironment::new(
            native,
            EnvironmentPolicy::read_only(),
        ))
    } else {
        Arc::new(native)
    };
    let options = args.options.or(InterpreterOptions::from_env(env.as_ref()));
    let interpreter = Interpreter::new(env, options);

    let parse_options = ParseOptions {
        offset: args.offset,
        documents: if args.all {
            DocumentSelection::All
        } else {
            DocumentSelection::First
        },
    };
    let path = interpreter.resolve_input(&args.input);
    debug!(path = %path.display(), dry_run = args.dry_run, "parsing");

    let parsed = interpreter
        .parse_file_with(&args.input, &parse_options)
        .map_err(report)
        .with_context(|| format!("Failed to interpret {}", path.display()))?;

    let value = if args.resolve {
        interpreter
            .resolve_deferred(parsed.value, &[])
            .map_err(report)
            .context("Failed to resolve deferred reads")?
    } else {
        parsed.value
    };

    let json = serde_json::to_string_pretty(&value).context("Failed to serialize result")?;
    println!("{}", json);
    eprintln!("ndocs: {}", parsed.ndocs);
    Ok(())
}

/// Print the error as a diagnostic before it is propagated.
fn report(error: ConfigError) -> ConfigError {
    eprintln!("{}", error.to_diagnostic().to_text());
    error
}
