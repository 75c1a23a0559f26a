use rust_decimal::Decimal;

use loanquote_core::market::Lender;

/// Read a market listing CSV: one header row, then `name,rate,available`
/// records in listing order. Malformed rows abort with the offending line
/// number.
pub fn read_market_csv(path: &str) -> Result<Vec<Lender>, Box<dyn std::error::Error>> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| format!("Failed to open '{}': {}", path, e))?;

    let mut lenders = Vec::new();
    for (index, record) in reader.deserialize::<(String, Decimal, Decimal)>().enumerate() {
        let (name, rate, available) = record.map_err(|e| {
            // Line 1 is the header.
            format!("Malformed market record on line {}: {}", index + 2, e)
        })?;
        lenders.push(Lender::new(name, rate, available));
    }

    if lenders.is_empty() {
        return Err(format!("Market file '{}' contains no lender records", path).into());
    }

    Ok(lenders)
}
