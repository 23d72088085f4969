//! Error taxonomy for the widget engine
//!
//! None of these ever reach the host page. Each subsystem recovers locally:
//! config falls back to defaults, patterns stop matching, theme probes read
//! as non-dark, and content failures render an inline fallback message.

use thiserror::Error;

/// Transport-level failure from an [`crate::host::HttpClient`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("unreadable body: {0}")]
    Body(String),
}

/// Malformed or unreachable configuration layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("remote config unavailable: {0}")]
    Remote(#[from] TransportError),
    #[error("remote config is not valid JSON: {0}")]
    Parse(String),
    #[error("invalid options object: {0}")]
    Options(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{pattern}` does not compile: {reason}")]
    Compile { pattern: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("dark selector `{0}` has an empty attribute name")]
    EmptyAttribute(String),
}

/// Why a summary could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("summary response is not valid JSON: {0}")]
    Decode(String),
    #[error("summary service reported failure: {0}")]
    Rejected(String),
    #[error("summary service returned no text")]
    Empty,
    #[error("no content source configured for this page")]
    NoSource,
}

/// Umbrella error, used where several subsystems meet (the WASM boundary)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_wraps_into_content_error() {
        let err: ContentError = TransportError::Status(502).into();
        assert_eq!(err.to_string(), "unexpected status 502");
    }

    #[test]
    fn test_widget_error_display_is_transparent() {
        let err: WidgetError = ThemeError::EmptyAttribute("=dark".into()).into();
        assert!(err.to_string().contains("=dark"));
    }
}
