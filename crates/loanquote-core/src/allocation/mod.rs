//! Allocation engine: distributes a requested loan across the lender
//! market and blends the contributing rates into a single effective rate.
//!
//! Two policies are provided. [`best_rate`] greedily drains the cheapest
//! lenders completely, drawing partially from the first lender able to
//! cover the remainder. [`distributed`] trickles small contributions
//! across the whole market while still prioritising cheaper lenders,
//! switching to a bulk fill once the running total is within 10% of the
//! target. Allocation is all-or-nothing at the market level: a market
//! that cannot fund the full request yields a typed
//! `InsufficientLiquidity` error, never a partial rate.

pub mod best_rate;
pub mod distributed;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanQuoteError;
use crate::market::{Lender, Market};
use crate::types::{Money, Rate};
use crate::LoanQuoteResult;

/// Upper bound on passes over the market before an allocation run is
/// reported as stalled. Valid inputs complete in far fewer passes.
const MAX_ALLOCATION_PASSES: u32 = 100;

/// Allocation policy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    #[default]
    BestRate,
    Distributed,
}

/// Full input for one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Market listing, in load order
    pub lenders: Vec<Lender>,
    /// Requested principal
    pub loan_amount: Money,
}

/// One lender's committed share of a funded loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderShare {
    pub name: String,
    /// The lender's own annual rate
    pub rate: Rate,
    /// Amount this lender committed
    pub amount: Money,
    /// `amount / loan_amount`
    pub share_of_loan: Rate,
}

/// Result of a successful allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutput {
    /// Blended annual rate for the full request
    pub effective_rate: Rate,
    /// Equals the requested amount whenever allocation succeeds
    pub total_allocated: Money,
    /// Contributing lenders, cheapest first
    pub shares: Vec<LenderShare>,
    /// Number of per-touch rate samples (distributed policy only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_samples: Option<usize>,
}

/// Per-run lender state, built fresh for every allocation call. The
/// mutable fields live only for the duration of one run; callers never
/// observe them directly.
///
/// Invariant: `lent + available == original_available` and
/// `available >= 0` at all times.
#[derive(Debug, Clone)]
pub(crate) struct ActiveLender {
    pub(crate) name: String,
    pub(crate) rate: Rate,
    pub(crate) available: Money,
    pub(crate) original_available: Money,
    pub(crate) lent: Money,
}

impl ActiveLender {
    fn from_listing(lender: &Lender) -> Self {
        ActiveLender {
            name: lender.name.clone(),
            rate: lender.rate,
            available: lender.available,
            original_available: lender.available,
            lent: Decimal::ZERO,
        }
    }

    /// Move `amount` from available to lent. Callers cap `amount` at
    /// `available` before committing.
    pub(crate) fn commit(&mut self, amount: Money) {
        self.available -= amount;
        self.lent += amount;
    }
}

/// Rate-sorted run state for a fresh allocation over `market`.
pub(crate) fn activate(market: &Market) -> Vec<ActiveLender> {
    market.rate_sorted().iter().map(ActiveLender::from_listing).collect()
}

pub(crate) fn validate_input(input: &AllocationInput) -> LoanQuoteResult<()> {
    if input.loan_amount <= Decimal::ZERO {
        return Err(LoanQuoteError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if input.lenders.is_empty() {
        return Err(LoanQuoteError::InvalidInput {
            field: "lenders".into(),
            reason: "Market must contain at least one lender".into(),
        });
    }
    for lender in &input.lenders {
        if lender.name.is_empty() {
            return Err(LoanQuoteError::InvalidInput {
                field: "name".into(),
                reason: "Lender name cannot be empty".into(),
            });
        }
        if lender.rate < Decimal::ZERO {
            return Err(LoanQuoteError::InvalidInput {
                field: "rate".into(),
                reason: format!("{}: rate cannot be negative", lender.name),
            });
        }
        if lender.available < Decimal::ZERO {
            return Err(LoanQuoteError::InvalidInput {
                field: "available".into(),
                reason: format!("{}: available capital cannot be negative", lender.name),
            });
        }
    }
    Ok(())
}

/// Liquidity gate. The market total must strictly exceed the request: a
/// market whose total exactly equals the loan amount is treated as
/// insufficient. Inherited behaviour, kept as-is.
pub(crate) fn check_liquidity(market: &Market, loan_amount: Money) -> LoanQuoteResult<Money> {
    let total_available = market.total_available();
    if total_available <= loan_amount {
        return Err(LoanQuoteError::InsufficientLiquidity {
            requested: loan_amount,
            available: total_available,
        });
    }
    Ok(total_available)
}

/// Share breakdown from final committed state, skipping lenders that
/// committed nothing.
pub(crate) fn shares_from(active: &[ActiveLender], loan_amount: Money) -> Vec<LenderShare> {
    active
        .iter()
        .filter(|l| l.lent > Decimal::ZERO)
        .map(|l| LenderShare {
            name: l.name.clone(),
            rate: l.rate,
            amount: l.lent,
            share_of_loan: l.lent / loan_amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn two_lender_input() -> AllocationInput {
        AllocationInput {
            lenders: vec![
                Lender::new("A", dec!(0.05), dec!(1000)),
                Lender::new("B", dec!(0.07), dec!(1000)),
            ],
            loan_amount: dec!(1500),
        }
    }

    // ── run state ─────────────────────────────────────────────────────────

    #[test]
    fn commit_preserves_the_capital_invariant() {
        let lender = Lender::new("A", dec!(0.05), dec!(1000));
        let mut active = ActiveLender::from_listing(&lender);
        active.commit(dec!(300));
        active.commit(dec!(150.50));

        assert_eq!(active.lent, dec!(450.50));
        assert_eq!(active.available, dec!(549.50));
        assert_eq!(active.lent + active.available, active.original_available);
    }

    #[test]
    fn activate_sorts_by_rate_and_resets_lent() {
        let market = Market::new(vec![
            Lender::new("B", dec!(0.07), dec!(200)),
            Lender::new("A", dec!(0.05), dec!(100)),
        ]);
        let active = activate(&market);
        assert_eq!(active[0].name, "A");
        assert_eq!(active[1].name, "B");
        assert!(active.iter().all(|l| l.lent.is_zero()));
        assert!(active.iter().all(|l| l.available == l.original_available));
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn zero_loan_amount_rejected() {
        let mut input = two_lender_input();
        input.loan_amount = dec!(0);
        match validate_input(&input).unwrap_err() {
            LoanQuoteError::InvalidInput { field, .. } => assert_eq!(field, "loan_amount"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn negative_loan_amount_rejected() {
        let mut input = two_lender_input();
        input.loan_amount = dec!(-100);
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn empty_market_rejected() {
        let input = AllocationInput { lenders: vec![], loan_amount: dec!(100) };
        match validate_input(&input).unwrap_err() {
            LoanQuoteError::InvalidInput { field, .. } => assert_eq!(field, "lenders"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn negative_rate_rejected() {
        let mut input = two_lender_input();
        input.lenders[1].rate = dec!(-0.01);
        match validate_input(&input).unwrap_err() {
            LoanQuoteError::InvalidInput { field, reason } => {
                assert_eq!(field, "rate");
                assert!(reason.contains("B"));
            }
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn negative_available_rejected() {
        let mut input = two_lender_input();
        input.lenders[0].available = dec!(-1);
        match validate_input(&input).unwrap_err() {
            LoanQuoteError::InvalidInput { field, .. } => assert_eq!(field, "available"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn empty_lender_name_rejected() {
        let mut input = two_lender_input();
        input.lenders[0].name.clear();
        match validate_input(&input).unwrap_err() {
            LoanQuoteError::InvalidInput { field, .. } => assert_eq!(field, "name"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    // ── liquidity gate ────────────────────────────────────────────────────

    #[test]
    fn market_equal_to_request_is_insufficient() {
        let market = Market::new(two_lender_input().lenders);
        match check_liquidity(&market, dec!(2000)).unwrap_err() {
            LoanQuoteError::InsufficientLiquidity { requested, available } => {
                assert_eq!(requested, dec!(2000));
                assert_eq!(available, dec!(2000));
            }
            other => panic!("Expected InsufficientLiquidity, got {:?}", other),
        }
    }

    #[test]
    fn market_strictly_above_request_passes() {
        let market = Market::new(two_lender_input().lenders);
        assert_eq!(check_liquidity(&market, dec!(1999.99)).unwrap(), dec!(2000));
    }

    // ── share breakdown ───────────────────────────────────────────────────

    #[test]
    fn shares_skip_lenders_that_committed_nothing() {
        let market = Market::new(two_lender_input().lenders);
        let mut active = activate(&market);
        active[0].commit(dec!(750));

        let shares = shares_from(&active, dec!(750));
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].name, "A");
        assert_eq!(shares[0].amount, dec!(750));
        assert_eq!(shares[0].share_of_loan, dec!(1));
    }
}
