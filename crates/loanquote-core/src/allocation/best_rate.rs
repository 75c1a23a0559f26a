//! Greedy lowest-rate-first allocation.
//!
//! Drains each lender in rate order: a lender holding less than the
//! remaining need gives everything it has, the first lender able to cover
//! the remainder is drawn partially, and the blended rate weights each
//! contributing lender's rate by its share of the loan.

use std::time::Instant;

use rust_decimal::Decimal;

use crate::error::LoanQuoteError;
use crate::market::Market;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::LoanQuoteResult;

use super::{AllocationInput, AllocationOutput, MAX_ALLOCATION_PASSES};

/// Allocate the requested amount across the cheapest lenders first and
/// blend their rates weighted by amount lent.
pub fn allocate_best_rate(
    input: &AllocationInput,
) -> LoanQuoteResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();

    super::validate_input(input)?;
    let market = Market::new(input.lenders.clone());
    let total_available = super::check_liquidity(&market, input.loan_amount)?;
    let mut active = super::activate(&market);

    let mut remaining = input.loan_amount;
    let mut passes = 0u32;
    while remaining > Decimal::ZERO {
        passes += 1;
        if passes > MAX_ALLOCATION_PASSES {
            return Err(LoanQuoteError::ConvergenceFailure {
                function: "allocate_best_rate".into(),
                iterations: MAX_ALLOCATION_PASSES,
                last_delta: remaining,
            });
        }
        for lender in active.iter_mut() {
            if remaining.is_zero() {
                break;
            }
            // Everything if the lender cannot cover the remainder,
            // otherwise exactly the remainder.
            let draw = if lender.available < remaining {
                lender.available
            } else {
                remaining
            };
            lender.commit(draw);
            remaining -= draw;
        }
    }

    // Single pass over final committed amounts; each lender's weight is
    // its share of the loan.
    let shares = super::shares_from(&active, input.loan_amount);
    let effective_rate: Rate = shares.iter().map(|s| s.share_of_loan * s.rate).sum();

    let output = AllocationOutput {
        effective_rate,
        total_allocated: input.loan_amount - remaining,
        shares,
        rate_samples: None,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Best-rate allocation — cheapest lenders drained first, rate weighted by amount lent",
        &serde_json::json!({
            "policy": "best_rate",
            "loan_amount": input.loan_amount,
            "lender_count": input.lenders.len(),
            "total_available": total_available,
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}
