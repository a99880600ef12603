pub mod catalog;
pub mod error;
pub mod types;

#[cfg(feature = "margin")]
pub mod margin;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "breakeven")]
pub mod breakeven;

pub use error::UnitEconomicsError;
pub use types::*;

/// Standard result type for all unit-economics operations
pub type UnitEconomicsResult<T> = Result<T, UnitEconomicsError>;
