pub mod cohort;
pub mod projection;

pub use cohort::active_users;
pub use projection::{build_projection, CustomOverride, ProjectionPoint};
