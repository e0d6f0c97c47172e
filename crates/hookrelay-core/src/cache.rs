//! Lookup cache port.
//!
//! The cache stores serialized values under string keys. It is never
//! authoritative: callers treat every error as a miss.

use hookrelay_types::error::CacheError;

/// A TTL- and capacity-bounded string cache.
pub trait LookupCache: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, CacheError>> + Send;

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;

    fn invalidate(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;
}
