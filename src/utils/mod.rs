//! Shared utilities.

pub mod validation;

pub use validation::validate_addresses;
