//! Annuity repayment arithmetic: the monthly payment that fully amortises
//! a principal over a fixed number of periods, and the total repaid.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::LoanQuoteError;
use crate::types::{Money, Rate};
use crate::LoanQuoteResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly payment that fully amortises `principal` over `n_payments`
/// periods at a per-period rate of `annual_rate / 12`, rounded to 2 dp.
pub fn monthly_repayment(
    annual_rate: Rate,
    principal: Money,
    n_payments: u32,
) -> LoanQuoteResult<Money> {
    if n_payments == 0 {
        return Err(LoanQuoteError::InvalidInput {
            field: "n_payments".into(),
            reason: "Number of payments must be > 0".into(),
        });
    }
    if principal <= Decimal::ZERO {
        return Err(LoanQuoteError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(LoanQuoteError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }

    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    if monthly_rate.is_zero() {
        return Ok((principal / Decimal::from(n_payments)).round_dp(2));
    }

    let one_plus_r = Decimal::ONE + monthly_rate;
    let factor = one_plus_r.powd(Decimal::from(n_payments));
    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / monthly_rate;

    if annuity_factor.is_zero() {
        return Err(LoanQuoteError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    Ok((principal / annuity_factor).round_dp(2))
}

/// Total repaid over the life of the loan, rounded to 2 dp.
pub fn total_repayment(monthly: Money, n_payments: u32) -> Money {
    (monthly * Decimal::from(n_payments)).round_dp(2)
}
