//! Quote composition: run an allocation policy over the market, then
//! derive the repayment schedule from the blended rate.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::allocation::{
    best_rate, distributed, AllocationInput, AllocationOutput, AllocationPolicy,
};
use crate::market::Lender;
use crate::repayment;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanQuoteResult;

/// Number of monthly payments used when a request does not specify a term.
pub const DEFAULT_NUMBER_OF_PAYMENTS: u32 = 36;

fn default_payments() -> u32 {
    DEFAULT_NUMBER_OF_PAYMENTS
}

/// Full input for a loan quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInput {
    /// Market listing, in load order
    pub lenders: Vec<Lender>,
    /// Requested principal
    pub loan_amount: Money,
    /// Term in monthly payments
    #[serde(default = "default_payments")]
    pub number_of_payments: u32,
    /// Allocation policy to run
    #[serde(default)]
    pub policy: AllocationPolicy,
}

/// A borrower-facing quote. Derived from the allocation result; not
/// independently mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub requested_amount: Money,
    /// Blended annual rate as a decimal
    pub annual_rate: Rate,
    pub monthly_repayment: Money,
    pub total_repayment: Money,
    pub number_of_payments: u32,
    /// How the market funded the request
    pub allocation: AllocationOutput,
}

/// Quote a loan request against a market listing, carrying any allocation
/// warnings through to the quote envelope.
pub fn generate_quote(input: &QuoteInput) -> LoanQuoteResult<ComputationOutput<Quote>> {
    let start = Instant::now();

    let alloc_input = AllocationInput {
        lenders: input.lenders.clone(),
        loan_amount: input.loan_amount,
    };
    let allocated = match input.policy {
        AllocationPolicy::BestRate => best_rate::allocate_best_rate(&alloc_input)?,
        AllocationPolicy::Distributed => distributed::allocate_distributed(&alloc_input)?,
    };
    let ComputationOutput { result: allocation, warnings, .. } = allocated;

    let monthly = repayment::monthly_repayment(
        allocation.effective_rate,
        input.loan_amount,
        input.number_of_payments,
    )?;
    let total = repayment::total_repayment(monthly, input.number_of_payments);

    let quote = Quote {
        requested_amount: input.loan_amount,
        annual_rate: allocation.effective_rate,
        monthly_repayment: monthly,
        total_repayment: total,
        number_of_payments: input.number_of_payments,
        allocation,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Loan quote — market allocation blended rate amortised monthly over the term",
        &serde_json::json!({
            "policy": input.policy,
            "number_of_payments": input.number_of_payments,
            "monthly_rate": "annual_rate / 12",
        }),
        warnings,
        elapsed,
        quote,
    ))
}
