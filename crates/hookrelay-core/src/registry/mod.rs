//! Event registry: path lookups through the cache, and the registration
//! lifecycle that keeps the cache consistent with the store.

pub mod lifecycle;
pub mod resolver;

pub use lifecycle::EventRegistry;
pub use resolver::EventResolver;
