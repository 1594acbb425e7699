//! Error types for fixed-point arithmetic and identifier validation
//!
//! Covers the failure modes of UQ112x112 price construction and conversion,
//! as well as parsing failures for 20-byte addresses.

use thiserror::Error;

/// Errors that can occur while parsing or validating an [`Address`](crate::Address)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Input is not valid hexadecimal
    #[error("Invalid hex string: '{input}'")]
    InvalidHex { input: String },

    /// Decoded byte length does not match the expected width
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors that can occur during fixed-point arithmetic operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixedPointError {
    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,

    /// Operand exceeds the 112-bit integer range a UQ112x112 can encode
    #[error("Overflow: operand {value} exceeds 112-bit range")]
    Overflow { value: u128 },

    /// Value cannot be represented as a `rust_decimal::Decimal`
    #[error("Value {value} is not representable as a decimal")]
    NotRepresentable { value: String },
}
