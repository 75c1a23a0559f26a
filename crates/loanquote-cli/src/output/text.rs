use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Human quote presenter: the four quote lines, or the no-quote message
/// when the market could not fund the request.
pub fn print_text(value: &Value) {
    if let Some(message) = super::no_quote_message(value) {
        println!("{}", message);
        return;
    }

    let quote = value.as_object().and_then(|m| m.get("result")).and_then(Value::as_object);
    if let Some(quote) = quote {
        let fields = (
            decimal_field(quote, "requested_amount"),
            decimal_field(quote, "annual_rate"),
            decimal_field(quote, "monthly_repayment"),
            decimal_field(quote, "total_repayment"),
        );
        if let (Some(amount), Some(rate), Some(monthly), Some(total)) = fields {
            println!("Requested amount: £{}", amount.normalize());
            println!("Rate: {}%", (rate * dec!(100)).round_dp(1));
            println!("Monthly repayment: £{}", monthly);
            println!("Total repayment: £{}", total);
            return;
        }
    }

    // Anything that is not a quote envelope falls through as plain JSON.
    println!("{}", value);
}

/// Decimals arrive as JSON strings; bare numbers are accepted too.
fn decimal_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<Decimal> {
    match map.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
