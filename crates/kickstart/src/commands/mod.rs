//! Command implementations for the kickstart CLI
//!
//! Each command module handles the CLI interface and delegates to
//! kickstart-config for the actual work.

pub mod find_path;
pub mod parse;
pub mod period;
pub mod tags;
