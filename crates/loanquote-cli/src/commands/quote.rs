use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use loanquote_core::allocation::AllocationPolicy;
use loanquote_core::quote::{self, QuoteInput, DEFAULT_NUMBER_OF_PAYMENTS};
use loanquote_core::LoanQuoteError;

use crate::input;

/// Fixed reply when the market cannot fund the request.
pub const NO_QUOTE_MESSAGE: &str = "Sorry, it is not possible to provide a quote this time.";

/// Arguments for loan quoting
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to the market listing CSV (header row, then name,rate,available)
    #[arg(long)]
    pub market: Option<String>,

    /// Requested loan amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Number of monthly payments
    #[arg(long, default_value_t = DEFAULT_NUMBER_OF_PAYMENTS)]
    pub payments: u32,

    /// Allocation policy
    #[arg(long, value_enum, default_value = "best-rate")]
    pub policy: PolicyArg,
}

/// Command-line policy selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Drain the cheapest lenders first
    BestRate,
    /// Trickle contributions across the whole market
    Distributed,
}

impl From<PolicyArg> for AllocationPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::BestRate => AllocationPolicy::BestRate,
            PolicyArg::Distributed => AllocationPolicy::Distributed,
        }
    }
}

/// JSON request shape accepted via --input or piped stdin.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub market_file: String,
    pub loan_amount: Decimal,
    #[serde(default)]
    pub number_of_payments: Option<u32>,
    #[serde(default)]
    pub policy: Option<AllocationPolicy>,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (market_path, loan_amount, payments, policy) = if let Some(ref path) = args.input {
        resolve_request(input::file::read_json(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        resolve_request(serde_json::from_value(data)?)
    } else {
        (
            args.market
                .clone()
                .ok_or("--market is required (or provide --input)")?,
            args.amount.ok_or("--amount is required (or provide --input)")?,
            args.payments,
            args.policy.into(),
        )
    };

    let lenders = input::market::read_market_csv(&market_path)?;

    let quote_input = QuoteInput {
        lenders,
        loan_amount,
        number_of_payments: payments,
        policy,
    };

    match quote::generate_quote(&quote_input) {
        Ok(result) => Ok(serde_json::to_value(result)?),
        Err(LoanQuoteError::InsufficientLiquidity { requested, available }) => {
            // A market that cannot fund the request is a quote outcome,
            // not a command failure.
            Ok(serde_json::json!({
                "quote_available": false,
                "message": NO_QUOTE_MESSAGE,
                "requested": requested,
                "market_total": available,
            }))
        }
        Err(e) => Err(e.into()),
    }
}

fn resolve_request(request: QuoteRequest) -> (String, Decimal, u32, AllocationPolicy) {
    (
        request.market_file,
        request.loan_amount,
        request.number_of_payments.unwrap_or(DEFAULT_NUMBER_OF_PAYMENTS),
        request.policy.unwrap_or_default(),
    )
}
