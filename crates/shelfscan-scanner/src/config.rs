use std::time::Duration;

use shelfscan_camera::CaptureConstraints;
use shelfscan_core::constants::{
    DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_REFRESH_RATE_HZ, MAX_LOOKUP_TIMEOUT_MS,
    MAX_REFRESH_RATE_HZ, MIN_LOOKUP_TIMEOUT_MS, MIN_REFRESH_RATE_HZ,
};
use shelfscan_core::{Error, Result};
use shelfscan_decoder::DecodeOptions;

/// Configuration for a scan controller.
///
/// # Example
///
/// ```
/// use shelfscan_scanner::ScannerConfig;
/// use std::time::Duration;
///
/// let config = ScannerConfig::default()
///     .lookup_timeout(Duration::from_secs(5))
///     .auto_lookup(false);
///
/// assert!(config.validate().is_ok());
/// assert!(!config.auto_lookup);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// What to ask the camera for.
    pub constraints: CaptureConstraints,

    /// Passed to every decode call.
    pub decode: DecodeOptions,

    /// Upper bound for one lookup. Expiry is a transient lookup failure.
    pub lookup_timeout: Duration,

    /// Frame sampling cadence while scanning.
    pub refresh_rate_hz: u32,

    /// Look a code up as soon as it is decoded. When off, the session waits
    /// in `Detected` for an explicit lookup request.
    pub auto_lookup: bool,

    /// Consecutive retries allowed without a successful acquisition.
    pub max_retries: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            decode: DecodeOptions::default(),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            auto_lookup: true,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ScannerConfig {
    pub fn constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn decode(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }

    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn refresh_rate_hz(mut self, rate: u32) -> Self {
        self.refresh_rate_hz = rate;
        self
    }

    pub fn auto_lookup(mut self, auto: bool) -> Self {
        self.auto_lookup = auto;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Interval between two frame samples.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.refresh_rate_hz.max(1)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the refresh rate or the lookup timeout is
    /// out of range, or the ideal resolution is zero-sized.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_REFRESH_RATE_HZ..=MAX_REFRESH_RATE_HZ).contains(&self.refresh_rate_hz) {
            return Err(Error::Config(format!(
                "refresh_rate_hz must be between {MIN_REFRESH_RATE_HZ} and {MAX_REFRESH_RATE_HZ}, got {}",
                self.refresh_rate_hz
            )));
        }

        let timeout_ms = self.lookup_timeout.as_millis();
        if !(u128::from(MIN_LOOKUP_TIMEOUT_MS)..=u128::from(MAX_LOOKUP_TIMEOUT_MS))
            .contains(&timeout_ms)
        {
            return Err(Error::Config(format!(
                "lookup_timeout must be between {MIN_LOOKUP_TIMEOUT_MS}ms and {MAX_LOOKUP_TIMEOUT_MS}ms, got {timeout_ms}ms"
            )));
        }

        let resolution = self.constraints.ideal_resolution;
        if resolution.width == 0 || resolution.height == 0 {
            return Err(Error::Config(format!(
                "ideal resolution must be non-zero, got {resolution}"
            )));
        }

        Ok(())
    }
}
