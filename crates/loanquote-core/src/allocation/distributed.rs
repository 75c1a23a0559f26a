//! Distributed allocation.
//!
//! Spreads the loan across the whole market instead of draining the
//! cheapest lenders outright: while the running total is more than 10%
//! short of the target, every lender trickles in 2% of its original
//! capital per pass, cheapest first. Once within reach, the pass switches
//! to the greedy fill logic. Each touch records the lender's flat rate as
//! one sample and the blended rate is the arithmetic mean of all samples,
//! not an amount-weighted figure, so frequent small contributors move the
//! result as much as a single large one.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LoanQuoteError;
use crate::market::Market;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::LoanQuoteResult;

use super::{AllocationInput, AllocationOutput, MAX_ALLOCATION_PASSES};

/// Fraction of a lender's original capital contributed per trickle touch.
const TRICKLE_PCT: Decimal = dec!(0.02);
/// The trickle phase ends once one more 10% growth step would reach the
/// target.
const GROWTH_THROTTLE: Decimal = dec!(0.10);

/// Allocate the requested amount by trickling contributions across the
/// market and blend the per-touch rate samples into their mean.
pub fn allocate_distributed(
    input: &AllocationInput,
) -> LoanQuoteResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();

    super::validate_input(input)?;
    let market = Market::new(input.lenders.clone());
    let total_available = super::check_liquidity(&market, input.loan_amount)?;
    let mut active = super::activate(&market);

    let loan_amount = input.loan_amount;
    let mut warnings: Vec<String> = Vec::new();
    let mut exhausted_warned = vec![false; active.len()];
    let mut rate_samples: Vec<Rate> = Vec::new();
    let mut sum_lent = Decimal::ZERO;
    let mut passes = 0u32;

    // Passes always run over the whole market; the termination check sits
    // at the pass boundary, so trailing lenders in the final pass are
    // still touched (and sampled) with nothing left to commit.
    while sum_lent < loan_amount {
        passes += 1;
        if passes > MAX_ALLOCATION_PASSES {
            return Err(LoanQuoteError::ConvergenceFailure {
                function: "allocate_distributed".into(),
                iterations: MAX_ALLOCATION_PASSES,
                last_delta: loan_amount - sum_lent,
            });
        }
        for (idx, lender) in active.iter_mut().enumerate() {
            if sum_lent + sum_lent * GROWTH_THROTTLE < loan_amount {
                // Trickle phase: 2% of the lender's original capital per
                // touch, capped at its remaining funds and at the
                // remaining need.
                if lender.available > Decimal::ZERO {
                    let mut draw = lender.original_available * TRICKLE_PCT;
                    if draw > lender.available {
                        draw = lender.available;
                    }
                    let remaining = loan_amount - sum_lent;
                    if draw > remaining {
                        draw = remaining;
                    }
                    lender.commit(draw);
                    sum_lent += draw;
                    rate_samples.push(lender.rate);
                } else if !exhausted_warned[idx] {
                    warnings.push(format!("{} has no remaining capital", lender.name));
                    exhausted_warned[idx] = true;
                }
            } else {
                // Fill phase: everything if the lender cannot cover the
                // remainder, otherwise exactly the remainder. The touch
                // is sampled whatever the amount committed.
                let remaining = loan_amount - sum_lent;
                let draw = if lender.available < remaining {
                    lender.available
                } else {
                    remaining
                };
                lender.commit(draw);
                sum_lent += draw;
                rate_samples.push(lender.rate);
            }
        }
    }

    if rate_samples.is_empty() {
        return Err(LoanQuoteError::DivisionByZero {
            context: "distributed rate sample mean".into(),
        });
    }
    let sample_total: Decimal = rate_samples.iter().copied().sum();
    let effective_rate = sample_total / Decimal::from(rate_samples.len() as u64);

    let shares = super::shares_from(&active, loan_amount);
    let output = AllocationOutput {
        effective_rate,
        total_allocated: sum_lent,
        shares,
        rate_samples: Some(rate_samples.len()),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Distributed allocation — 2% trickle per lender under a 10% growth throttle, mean of per-touch rate samples",
        &serde_json::json!({
            "policy": "distributed",
            "loan_amount": input.loan_amount,
            "lender_count": input.lenders.len(),
            "total_available": total_available,
            "trickle_pct": TRICKLE_PCT,
            "growth_throttle": GROWTH_THROTTLE,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::market::Lender;

    /// Two equal lenders; a 100 request takes three trickle rounds.
    fn standard_input() -> AllocationInput {
        AllocationInput {
            lenders: vec![
                Lender::new("A", dec!(0.05), dec!(1000)),
                Lender::new("B", dec!(0.07), dec!(1000)),
            ],
            loan_amount: dec!(100),
        }
    }

    // -----------------------------------------------------------------------
    // 1. Worked trickle example: 20 per touch, mean of six samples
    //    A 20, B 20 | A 20, B 20 | A 20 (request met), B sampled at zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_trickle_mean_of_samples() {
        let result = allocate_distributed(&standard_input()).unwrap();
        let out = &result.result;

        assert_eq!(out.rate_samples, Some(6));
        // (3 * 0.05 + 3 * 0.07) / 6
        assert_eq!(out.effective_rate, dec!(0.36) / dec!(6));
        assert_eq!(out.effective_rate, dec!(0.06));
    }

    // -----------------------------------------------------------------------
    // 2. Committed amounts from the same run: A 60, B 40
    // -----------------------------------------------------------------------
    #[test]
    fn test_trickle_share_breakdown() {
        let result = allocate_distributed(&standard_input()).unwrap();
        let out = &result.result;

        assert_eq!(out.total_allocated, dec!(100));
        assert_eq!(out.shares.len(), 2);
        assert_eq!(out.shares[0].name, "A");
        assert_eq!(out.shares[0].amount, dec!(60));
        assert_eq!(out.shares[1].name, "B");
        assert_eq!(out.shares[1].amount, dec!(40));
    }

    // -----------------------------------------------------------------------
    // 3. Single lender trickles until the remainder cap closes the run
    // -----------------------------------------------------------------------
    #[test]
    fn test_single_lender_mean_is_own_rate() {
        let input = AllocationInput {
            lenders: vec![Lender::new("A", dec!(0.05), dec!(1000))],
            loan_amount: dec!(100),
        };
        let result = allocate_distributed(&input).unwrap();
        let out = &result.result;

        assert_eq!(out.effective_rate, dec!(0.05));
        assert_eq!(out.rate_samples, Some(5));
        assert_eq!(out.shares[0].amount, dec!(100));
    }

    // -----------------------------------------------------------------------
    // 4. A trickle draw larger than the remaining need is capped
    // -----------------------------------------------------------------------
    #[test]
    fn test_trickle_draw_capped_at_remaining_need() {
        let input = AllocationInput {
            lenders: vec![Lender::new("Big", dec!(0.05), dec!(10000))],
            loan_amount: dec!(100),
        };
        let result = allocate_distributed(&input).unwrap();
        let out = &result.result;

        // 2% of 10000 would be 200; only the 100 needed is drawn.
        assert_eq!(out.total_allocated, dec!(100));
        assert_eq!(out.rate_samples, Some(1));
        assert_eq!(out.shares[0].amount, dec!(100));
    }

    // -----------------------------------------------------------------------
    // 5. Exhausted lenders are skipped while trickling but sampled in the
    //    fill pass, dragging the mean toward their rate
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_capital_lender_skipped_then_sampled() {
        let input = AllocationInput {
            lenders: vec![
                Lender::new("A", dec!(0.05), dec!(1000)),
                Lender::new("Empty", dec!(0.99), dec!(0)),
            ],
            loan_amount: dec!(100),
        };
        let result = allocate_distributed(&input).unwrap();
        let out = &result.result;

        // Five trickle touches from A, one zero-fill sample from Empty.
        assert_eq!(out.rate_samples, Some(6));
        assert_eq!(out.effective_rate, dec!(1.24) / dec!(6));

        // Empty committed nothing and never appears in the breakdown.
        assert_eq!(out.shares.len(), 1);
        assert_eq!(out.shares[0].name, "A");
        assert_eq!(out.shares[0].amount, dec!(100));

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Empty"));
    }

    // -----------------------------------------------------------------------
    // 6. Mean stays within the sampled rate band
    // -----------------------------------------------------------------------
    #[test]
    fn test_mean_within_sampled_rate_band() {
        let input = AllocationInput {
            lenders: vec![
                Lender::new("A", dec!(0.031), dec!(620)),
                Lender::new("B", dec!(0.069), dec!(480)),
                Lender::new("C", dec!(0.071), dec!(520)),
                Lender::new("D", dec!(0.104), dec!(170)),
            ],
            loan_amount: dec!(1000),
        };
        let result = allocate_distributed(&input).unwrap();
        let rate = result.result.effective_rate;

        assert!(rate >= dec!(0.031) && rate <= dec!(0.104), "rate {rate} out of band");
        assert_eq!(result.result.total_allocated, dec!(1000));
    }

    // -----------------------------------------------------------------------
    // 7. Strict liquidity gate, identical to the best-rate policy
    // -----------------------------------------------------------------------
    #[test]
    fn test_exact_total_is_insufficient() {
        let mut input = standard_input();
        input.loan_amount = dec!(2000);

        match allocate_distributed(&input).unwrap_err() {
            LoanQuoteError::InsufficientLiquidity { requested, available } => {
                assert_eq!(requested, dec!(2000));
                assert_eq!(available, dec!(2000));
            }
            other => panic!("Expected InsufficientLiquidity, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // 8. Two runs over identical listings give identical results
    // -----------------------------------------------------------------------
    #[test]
    fn test_deterministic_across_runs() {
        let first = allocate_distributed(&standard_input()).unwrap();
        let second = allocate_distributed(&standard_input()).unwrap();

        assert_eq!(first.result.effective_rate, second.result.effective_rate);
        assert_eq!(first.result.rate_samples, second.result.rate_samples);
        let amounts = |out: &AllocationOutput| -> Vec<_> {
            out.shares.iter().map(|s| (s.name.clone(), s.amount)).collect()
        };
        assert_eq!(amounts(&first.result), amounts(&second.result));
    }

    // -----------------------------------------------------------------------
    // 9. Committed state never exceeds what a lender originally offered
    // -----------------------------------------------------------------------
    #[test]
    fn test_no_lender_overcommits() {
        let input = AllocationInput {
            lenders: vec![
                Lender::new("A", dec!(0.04), dec!(50)),
                Lender::new("B", dec!(0.10), dec!(200)),
            ],
            loan_amount: dec!(150),
        };
        let result = allocate_distributed(&input).unwrap();
        let out = &result.result;

        let total: Decimal = out.shares.iter().map(|s| s.amount).sum();
        assert_eq!(total, dec!(150));
        for share in &out.shares {
            let original = input
                .lenders
                .iter()
                .find(|l| l.name == share.name)
                .map(|l| l.available)
                .unwrap();
            assert!(share.amount <= original, "{} overcommitted", share.name);
        }
    }

    // -----------------------------------------------------------------------
    // 10. Metadata carries the trickle parameters
    // -----------------------------------------------------------------------
    #[test]
    fn test_metadata_populated() {
        let result = allocate_distributed(&standard_input()).unwrap();

        assert!(result.methodology.contains("Distributed"));
        assert_eq!(result.assumptions["trickle_pct"], serde_json::json!(dec!(0.02)));
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
    }
}
