pub mod json;
pub mod minimal;
pub mod table;
pub mod text;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Text => text::print_text(value),
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The fixed no-quote message, when present in the output value.
pub(crate) fn no_quote_message(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.get("quote_available").and_then(Value::as_bool) == Some(false) {
        obj.get("message").and_then(Value::as_str)
    } else {
        None
    }
}
