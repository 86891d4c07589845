//! Core constants for the QR scanning pipeline.
//!
//! Centralizes the defaults shared by the camera, decoder, lookup and
//! scanner crates so a deployment tunes them in one place.
//!
//! # Usage
//!
//! ```
//! use shelfscan_core::constants::*;
//! use std::time::Duration;
//!
//! let timeout = Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 30);
//! assert_eq!((DEFAULT_IDEAL_WIDTH, DEFAULT_IDEAL_HEIGHT), (1280, 720));
//! ```

// ============================================================================
// Capture Defaults
// ============================================================================

/// Ideal capture width requested from the camera, in pixels.
///
/// The device may deliver a different resolution; this is a hint, not a
/// requirement.
pub const DEFAULT_IDEAL_WIDTH: u32 = 1280;

/// Ideal capture height requested from the camera, in pixels.
pub const DEFAULT_IDEAL_HEIGHT: u32 = 720;

/// Default display refresh cadence used to pace frame sampling (Hz).
pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

/// Lowest accepted refresh cadence (Hz).
pub const MIN_REFRESH_RATE_HZ: u32 = 1;

/// Highest accepted refresh cadence (Hz).
///
/// Anything faster than a high-refresh panel only burns CPU on duplicate
/// frames.
pub const MAX_REFRESH_RATE_HZ: u32 = 240;

// ============================================================================
// Item Code Constraints
// ============================================================================

/// Maximum accepted length of a decoded item code, in bytes.
///
/// A version 40 QR symbol holds at most 2953 bytes, but inventory labels are
/// short (`INV-` followed by a 16 character token). Anything longer than this
/// is not an inventory label.
pub const MAX_ITEM_CODE_LENGTH: usize = 512;

/// Prefix of codes minted by the inventory backend.
///
/// Informational only: foreign codes are still looked up and simply resolve
/// to `NotFound`.
pub const ITEM_CODE_PREFIX: &str = "INV-";

// ============================================================================
// Lookup Defaults
// ============================================================================

/// Default base URL of the inventory API.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Path, relative to the API base, under which codes are resolved.
///
/// The code itself is appended as a single percent-encoded path segment:
/// `GET {base}/items/qr/scan/{code}`.
pub const LOOKUP_PATH: [&str; 3] = ["items", "qr", "scan"];

/// Default lookup timeout (milliseconds).
///
/// # Value: 30000ms (30 seconds)
///
/// Matches the request timeout of the web client. Expiry is reported as a
/// transient lookup failure.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 30_000;

/// Minimum allowed lookup timeout (milliseconds).
pub const MIN_LOOKUP_TIMEOUT_MS: u64 = 100;

/// Maximum allowed lookup timeout (milliseconds).
pub const MAX_LOOKUP_TIMEOUT_MS: u64 = 120_000;

// ============================================================================
// Session Defaults
// ============================================================================

/// Consecutive `retry()` calls allowed before the session gives up.
///
/// The counter resets whenever an acquisition succeeds.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_bounds_are_ordered() {
        assert!(MIN_LOOKUP_TIMEOUT_MS <= DEFAULT_LOOKUP_TIMEOUT_MS);
        assert!(DEFAULT_LOOKUP_TIMEOUT_MS <= MAX_LOOKUP_TIMEOUT_MS);
    }

    #[test]
    fn test_refresh_bounds_are_ordered() {
        assert!(MIN_REFRESH_RATE_HZ <= DEFAULT_REFRESH_RATE_HZ);
        assert!(DEFAULT_REFRESH_RATE_HZ <= MAX_REFRESH_RATE_HZ);
    }

    #[test]
    fn test_lookup_path() {
        assert_eq!(LOOKUP_PATH.join("/"), "items/qr/scan");
    }
}
