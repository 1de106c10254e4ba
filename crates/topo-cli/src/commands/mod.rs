pub mod backends;
pub mod network;
pub mod truss;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `design` to stdout as pretty JSON, or its summary otherwise.
pub(crate) fn emit<T: Serialize>(design: &T, summary: impl FnOnce() -> String, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(design).context("serializing design")?;
        println!("{}", text);
    } else {
        println!("{}", summary());
    }
    Ok(())
}
