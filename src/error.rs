/// Error taxonomy for the generation and collection pipelines
use thiserror::Error;

/// Everything that can go wrong between "user clicked a tab" and "summary
/// rendered". Each variant's display text is the view-local message shown to
/// the user; nothing here is ever allowed to escape to the host page.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("An API key for {0} is required. Add it on the extension options page.")]
    MissingCredential(&'static str),

    #[error("The API key was rejected by the provider. Check it on the options page.")]
    Auth,

    #[error("The provider's rate limit was exceeded. Wait a moment and refresh.")]
    RateLimited,

    #[error("provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("The provider response contained no summary text.")]
    EmptyResponse,

    #[error("No transcript could be extracted. Check that this video has one.")]
    NoTranscript,

    #[error("No comments could be collected for this video.")]
    NoComments,

    // Result resolved after navigating away; dropped silently, never shown.
    #[error("result arrived for a previous video")]
    Stale,
}

impl SummarizeError {
    /// Stale results are discarded without touching the UI.
    pub fn is_silent(&self) -> bool {
        matches!(self, SummarizeError::Stale)
    }
}

impl From<reqwest::Error> for SummarizeError {
    fn from(err: reqwest::Error) -> Self {
        SummarizeError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_includes_status_and_detail() {
        let err = SummarizeError::Provider {
            status: 503,
            message: "model overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: 503 - model overloaded");
    }

    #[test]
    fn test_only_stale_is_silent() {
        assert!(SummarizeError::Stale.is_silent());
        assert!(!SummarizeError::Auth.is_silent());
        assert!(!SummarizeError::RateLimited.is_silent());
        assert!(!SummarizeError::NoTranscript.is_silent());
    }
}
