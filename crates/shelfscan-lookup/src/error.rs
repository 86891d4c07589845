use thiserror::Error;

/// Why a lookup could not produce an answer.
///
/// Every variant is transient from the scanner's point of view: the user
/// may retry. A definite "no such item" is not an error, see
/// [`LookupResult::NotFound`](crate::LookupResult::NotFound).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No answer within the configured timeout.
    #[error("Lookup timed out after {0}ms")]
    Timeout(u64),

    /// The API answered with an unexpected status.
    #[error("Lookup API returned {status}{}", detail(.message))]
    Status { status: u16, message: Option<String> },

    /// The API could not be reached.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The response body was not a valid item.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The configured base URL cannot carry a path.
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("Request failed: {0}")]
    Request(String),
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl LookupError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            // reqwest does not report the limit; the client replaces this
            Self::Timeout(0)
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LookupError::Timeout(30_000), "Lookup timed out after 30000ms")]
    #[case(
        LookupError::Status { status: 500, message: Some("boom".into()) },
        "Lookup API returned 500: boom"
    )]
    #[case(LookupError::Status { status: 502, message: None }, "Lookup API returned 502")]
    #[case(LookupError::Connect("refused".into()), "Connection failed: refused")]
    fn test_display(#[case] error: LookupError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_is_timeout() {
        assert!(LookupError::Timeout(1).is_timeout());
        assert!(!LookupError::Decode("x".into()).is_timeout());
    }
}
