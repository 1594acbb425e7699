//! # Pair Types Library
//!
//! Shared type system for the constant-product pair engine and its collaborators.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: Amounts are native-precision integers, prices are
//!   UQ112x112 fixed point stored in 256-bit integers
//! - **Type Safety**: Asset, holder and pair identities are all [`Address`], never raw bytes
//! - **Clear Boundaries**: Decimal conversion happens only at the display edge
//!
//! ## Quick Start
//!
//! ```rust
//! use pair_types::{Address, PairEvent, UQ112x112, U256};
//!
//! let token = Address::from_hex("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
//! assert!(!token.is_zero());
//!
//! // Price of 4 units of b per unit of a
//! let price = UQ112x112::ratio(4000, 1000).unwrap();
//! assert_eq!(price.integer_part(), U256::from(4u128));
//!
//! let event = PairEvent::Sync { reserve_a: 1000, reserve_b: 4000 };
//! assert_eq!(event.name(), "sync");
//! ```

#[cfg(feature = "common")]
pub mod common;

#[cfg(feature = "events")]
pub mod events;

pub use ethnum::U256;

#[cfg(feature = "common")]
pub use common::errors::{FixedPointError, ValidationError};
#[cfg(feature = "common")]
pub use common::fixed_point::UQ112x112;
#[cfg(feature = "common")]
pub use common::identifiers::Address;

#[cfg(feature = "events")]
pub use events::PairEvent;
