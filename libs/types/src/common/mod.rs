//! Common value types shared across the pair engine crates

pub mod errors;
pub mod fixed_point;
pub mod identifiers;
