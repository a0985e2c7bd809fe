//! `kickstart tags`: list built-in tag names.

use anyhow::Result;

use kickstart_config::TagRegistry;

/// Execute the tags command
pub fn execute() -> Result<()> {
    let registry = TagRegistry::builtin();
    for name in registry.names() {
        println!("!{}", name);
    }
    Ok(())
}
