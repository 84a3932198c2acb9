use alloc::collections::TryReserveError;

use thiserror::Error;

/// The error type returned by the fallible [`HashMap`](crate::HashMap)
/// operations.
///
/// The table allocates in two places: the bucket-head array and the entry
/// storage behind it. Either reservation can fail, and the variant records
/// which one did. A failed operation leaves the table unchanged and usable at
/// its prior capacity.
#[derive(Debug, Error)]
pub enum TableError {
    /// The bucket-head array could not be allocated.
    #[error("failed to allocate bucket array for {capacity} buckets")]
    Buckets {
        /// The bucket count the table attempted to allocate.
        capacity: usize,
        /// The underlying reservation failure.
        source: TryReserveError,
    },

    /// Storage for additional entries could not be allocated.
    #[error("failed to allocate entry storage")]
    Entries {
        /// The underlying reservation failure.
        source: TryReserveError,
    },

    /// A capacity computation overflowed `usize`.
    ///
    /// Raised when a requested capacity cannot be rounded up to a power of
    /// two, or when doubling the bucket array would overflow.
    #[error("capacity overflow")]
    CapacityOverflow,
}
