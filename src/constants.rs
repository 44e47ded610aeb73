//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Centralized configuration constants for CacheFuse.
//!
//! All default values used by the breaker, the executor and the caches are
//! defined here.

// ============================================================================
// Circuit Breaker Constants
// ============================================================================

/// Default failure threshold for the breaker.
///
/// The breaker opens once the failure count of an identity strictly exceeds
/// this value.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cold period in seconds.
///
/// Minimum time an open breaker waits before admitting a trial request.
pub const DEFAULT_COLD_PERIOD_SECS: f64 = 10.0;

// ============================================================================
// Executor Constants
// ============================================================================

/// Default per-request timeout in seconds.
///
/// Applied when a request does not carry its own timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 60.0;

// ============================================================================
// Cache Constants
// ============================================================================

/// Name of the cache directory, created next to the running executable.
pub const CACHE_DIR_NAME: &str = "_cache";

/// Suffix for in-progress disk writes before they are renamed into place.
pub const TEMP_FILE_SUFFIX: &str = ".partial";
