use serde_json::Value;

/// Print just the key answer from a quote, for scripting.
///
/// Priority order: the monthly repayment, then the blended rate, then the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    if let Some(message) = super::no_quote_message(value) {
        println!("{}", message);
        return;
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["monthly_repayment", "annual_rate", "effective_rate", "total_repayment"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
