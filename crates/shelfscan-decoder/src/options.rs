use serde::{Deserialize, Serialize};

/// Options passed to every decode call.
///
/// # Examples
///
/// ```
/// use shelfscan_decoder::DecodeOptions;
///
/// let options = DecodeOptions::default();
/// assert!(!options.tolerate_polarity);
///
/// let options = DecodeOptions::default().with_tolerate_polarity(true);
/// assert!(options.tolerate_polarity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Also accept light-on-dark symbols.
    ///
    /// Off by default: printed labels are dark-on-light, and the extra pass
    /// doubles the cost of every frame without a symbol.
    pub tolerate_polarity: bool,
}

impl DecodeOptions {
    pub fn with_tolerate_polarity(mut self, tolerate: bool) -> Self {
        self.tolerate_polarity = tolerate;
        self
    }
}
