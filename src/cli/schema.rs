//! `helpdesk schema` command implementation.

use crate::error::Result;
use crate::tools::schema_document;

/// Print the versioned tool schema as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn run() -> Result<()> {
    println!("{}", render()?);
    Ok(())
}

fn render() -> Result<String> {
    Ok(serde_json::to_string_pretty(&schema_document())?)
}
