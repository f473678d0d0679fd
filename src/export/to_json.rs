use std::error::Error;

use crate::build::BuildOutput;

/// Serializes the full build result, geometry included, for downstream
/// tooling.
pub fn render(output: &BuildOutput) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string_pretty(output)?)
}
