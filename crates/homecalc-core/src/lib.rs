pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loan")]
pub mod loan;

#[cfg(feature = "payroll")]
pub mod payroll;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "savings")]
pub mod savings;

#[cfg(feature = "construction")]
pub mod construction;

pub use error::CalcError;
pub use types::*;

/// Standard result type for all homecalc operations
pub type CalcResult<T> = Result<T, CalcError>;
