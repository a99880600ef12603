pub mod breakeven;
pub mod catalog;
pub mod cohort;
pub mod margin;
pub mod projection;
