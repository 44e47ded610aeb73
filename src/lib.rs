//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! CacheFuse - Circuit Breaker with Cache Fallback
//!
//! Executes outbound requests through a per-endpoint circuit breaker and
//! degrades to the last cached response when the endpoint fails or is blocked.
//!
//! # API Layers
//!
//! ## Prelude (Quick Start)
//!
//! Use `use cachefuse::prelude::*;` to import all commonly used types.
//!
//! ## Core API
//!
//! - [`RequestExecutor`] - Runs a request through the breaker and the caches
//! - [`BreakerRegistry`] - Per-identity breaker state machine
//! - [`ResponseCache`] - In-memory and disk-backed response cache
//! - [`BreakerConfig`] - Configuration
//! - [`FuseError`] - Error types
//!
//! ## Extensions (feature-gated)
//!
//! - reqwest transport (requires `http` feature, enabled by default)
//! - Logging initialisation (requires `telemetry` feature)
//!
//! # Examples
//!
//! ```rust,no_run
//! use cachefuse::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = RequestExecutor::builder()
//!         .config(BreakerConfig::new(5, Duration::from_secs(10)))
//!         .build()
//!         .unwrap();
//!
//!     // 失败或熔断时返回缓存值，没有缓存则为 None
//!     let response = executor
//!         .fetch(FetchOptions::get("https://example.com/api/items"))
//!         .await;
//!     println!("{:?}", response);
//! }
//! ```
//!
//! # Features
//!
//! - **Per-endpoint breaker**: Closed / Open / HalfOpen keyed by method and URL
//! - **Single trial probing**: One request admitted per cold-period expiry
//! - **Two-tier fallback**: Streamed responses on disk, decoded values in memory
//! - **Null-collapsing API**: `fetch` returns a value or `None`, `fetch_outcome` tells why

pub mod prelude;

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod response;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod transport;

// 重新导出常用类型
pub use cache::{
    cache_key, path_only, request_id, DiskCache, MemoryCache, ResponseCache, StagedFile,
};
pub use circuit_breaker::{BreakerRegistry, BreakerSnapshot, BreakerState, RegistryStats};
pub use config::BreakerConfig;
pub use error::{CircuitState, FuseError, StorageError, TransportError};
pub use executor::{FetchOptions, FetchOutcome, RequestExecutor, RequestExecutorBuilder};
pub use response::{CachedValue, Response, StreamHandle};
#[cfg(feature = "telemetry")]
pub use telemetry::init_logging;
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{ResponseType, Transport, TransportBody, TransportRequest};
