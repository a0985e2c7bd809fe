//! `kickstart find-path`: nearest ancestor holding a sentinel.

use std::path::Path;

use anyhow::Result;

use kickstart_config::find_path;
use kickstart_runtime::NativeEnvironment;

/// Execute the find-path command
pub fn execute(start: &Path, sentinel: &str) -> Result<()> {
    let env = NativeEnvironment::new();
    let found = find_path(&env, start, sentinel);
    println!("{}", found.display());
    Ok(())
}
