pub mod calculator;
pub mod fees;

pub use calculator::{margin_percent, true_margin};
pub use fees::{FeeToggle, FeeToggles};
