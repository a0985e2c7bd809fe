//! `kickstart period`: print a period in seconds.

use anyhow::{Context, Result};

use kickstart_config::parse_period;

/// Execute the period command
pub fn execute(text: &str) -> Result<()> {
    let duration = parse_period(text).with_context(|| format!("Cannot parse period '{}'", text))?;
    println!("{}", duration.as_secs());
    Ok(())
}
