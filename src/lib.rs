#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Allocation errors reported by the fallible table operations.
pub mod error;

/// A HashMap implementation using separate chaining.
///
/// This module provides a `HashMap` that stores entries in per-bucket linked
/// chains with cached hash values and a standard key-value map interface with
/// configurable hashers.
pub mod hash_map;

pub use error::TableError;
pub use hash_map::Entry;
pub use hash_map::HashMap;
