//! JSON result renderer

use super::ClassificationResult;
use crate::CertigradeResult;

/// Render a result as a compact JSON document
pub fn render(result: &ClassificationResult) -> CertigradeResult<String> {
    serde_json::to_string(result).map_err(crate::CertigradeError::Serde)
}

/// Render a result as pretty-printed JSON
pub fn render_pretty(result: &ClassificationResult) -> CertigradeResult<String> {
    serde_json::to_string_pretty(result).map_err(crate::CertigradeError::Serde)
}

/// Write a result document to disk
pub fn write_report(
    result: &ClassificationResult,
    output: &std::path::Path,
    pretty: bool,
) -> CertigradeResult<()> {
    let content = if pretty {
        render_pretty(result)?
    } else {
        render(result)?
    };
    std::fs::write(output, content).map_err(crate::CertigradeError::Io)
}
