pub mod error;
pub mod market;
pub mod types;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "repayment")]
pub mod repayment;

#[cfg(feature = "quote")]
pub mod quote;

pub use error::LoanQuoteError;
pub use types::*;

/// Standard result type for all loanquote operations
pub type LoanQuoteResult<T> = Result<T, LoanQuoteError>;
