//! Structured (JSON/YAML) output and partial-failure reporting

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::analysis::PartialFailure;
use crate::cli::OutputFormat;

/// Serialize a value as JSON or YAML; any other format is a caller bug and
/// falls back to YAML.
pub fn render_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value).into_diagnostic()?;
            json.push('\n');
            Ok(json)
        }
        _ => serde_yml::to_string(value).into_diagnostic(),
    }
}

pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    print!("{}", render_structured(value, format)?);
    Ok(())
}

/// Report skipped items on stderr so stdout stays parseable
pub fn warn_partial_failures(failures: &[PartialFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!(
        "{} {} item(s) could not be fully processed:",
        style("!").yellow(),
        failures.len()
    );
    for failure in failures {
        eprintln!(
            "  {} [{}] {}",
            style(&failure.item_id).cyan(),
            failure.stage,
            failure.message
        );
    }
}
