use std::{error, fmt};

/// A value that can live in a `VersionedCache`. Implementors carry a
/// monotonic version (§4.3) and the keys the cache indexes them by.
pub trait CacheEntry: Clone + Send + Sync + 'static {
    /// Monotonically increasing per logical object; used by `update_local`'s
    /// CAS comparison.
    fn version(&self) -> i64;

    fn primary_key(&self) -> String;

    /// Most entries have one; vehicle positions additionally key by
    /// `sequence_resolve_key` and similar — secondary-key lookups alias the
    /// same underlying node (§3 invariant).
    fn secondary_key(&self) -> Option<String> {
        None
    }

    fn encode(&self) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> Result<Self, CacheError>
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    Decode(String),
    Remote(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Decode(message) => write!(f, "failed to decode cache entry: {message}"),
            CacheError::Remote(message) => write!(f, "remote cache mirror error: {message}"),
        }
    }
}

impl error::Error for CacheError {}
