pub mod roi;
pub mod solver;

pub use roi::RoiContext;
pub use solver::{break_even, BreakEvenResult};
