use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanQuoteError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient market liquidity: requested {requested}, market offers {available}")]
    InsufficientLiquidity { requested: Decimal, available: Decimal },

    #[error("Convergence failure: {function} did not converge after {iterations} passes (remaining: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}
