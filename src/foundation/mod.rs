/// Canvas dimensions, geometry re-exports and angle helpers.
pub mod core;
/// Error taxonomy shared by every stage.
pub mod error;
pub(crate) mod math;
