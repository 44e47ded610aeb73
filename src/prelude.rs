//! Prelude module - Commonly used types for quick imports
//!
//! This module re-exports the most commonly used types from CacheFuse,
//! allowing users to import them with a single `use cachefuse::prelude::*;`
//! statement instead of importing each type individually.

// Core types - always available
pub use crate::config::BreakerConfig;
pub use crate::error::{CircuitState, FuseError};
pub use crate::executor::{FetchOptions, FetchOutcome, RequestExecutor};
pub use crate::response::{CachedValue, Response, StreamHandle};

// Transport seam
pub use crate::transport::{ResponseType, Transport, TransportBody, TransportRequest};

// Feature-gated exports
#[cfg(feature = "http")]
pub use crate::transport::ReqwestTransport;
