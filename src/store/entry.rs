//! Store Entry Module
//!
//! Defines the structure for individual store entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Entry Value ==
/// What a key holds: a plain byte value or a list of byte values.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Bytes(Vec<u8>),
    List(Vec<Vec<u8>>),
}

// == Store Entry ==
/// Represents a single store entry with value and expiry.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored value
    pub value: EntryValue,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry with optional TTL.
    ///
    /// The expiry saturates at `u64::MAX` ms, so huge TTLs mean "practically never".
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(value: EntryValue, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl_seconds.map(|ttl| ttl.saturating_mul(1000).saturating_add(now));

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
