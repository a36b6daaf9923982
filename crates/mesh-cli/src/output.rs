//! Shared output helpers.

use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable report as JSON. Text output is done by each command.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
        }
    }
}

/// Format a point for text output.
pub fn point(p: &[f64; 3]) -> String {
    format!("({:.4}, {:.4}, {:.4})", p[0], p[1], p[2])
}
