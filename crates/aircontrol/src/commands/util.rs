//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use crate::error::CliError;

/// Parse a JSON argument given inline or as `@path/to/file.json`.
pub fn read_json_arg(field: &str, raw: &str) -> Result<Value, CliError> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))?,
        None => raw.to_owned(),
    };

    let value: Value = serde_json::from_str(&text).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid JSON: {e}"),
    })?;

    if !value.is_object() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(value)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
