use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Quote as a field/value table, with a second table for the lender share
/// breakdown when one is present.
pub fn print_table(value: &Value) {
    if let Some(message) = super::no_quote_message(value) {
        println!("{}", message);
        return;
    }

    let Some(envelope) = value.as_object() else {
        println!("{}", value);
        return;
    };
    let Some(Value::Object(result)) = envelope.get("result") else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        if key == "allocation" {
            continue;
        }
        builder.push_record([key.to_string(), format_value(val)]);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Object(allocation)) = result.get("allocation") {
        if let Some(Value::Array(shares)) = allocation.get("shares") {
            print_share_table(shares);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for warning in warnings {
                if let Value::String(s) = warning {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn print_share_table(shares: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Lender", "Rate", "Amount", "Share of loan"]);
    for share in shares {
        if let Value::Object(s) = share {
            builder.push_record([
                s.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                s.get("rate").map(format_value).unwrap_or_default(),
                s.get("amount").map(format_value).unwrap_or_default(),
                s.get("share_of_loan").map(format_value).unwrap_or_default(),
            ]);
        }
    }
    println!("\n{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
