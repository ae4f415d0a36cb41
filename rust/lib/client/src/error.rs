use thiserror::Error;

/// Client-side API error.
///
/// `Api` carries the server-reported message from a `success: false`
/// envelope. Everything else is a transport or decoding failure and is
/// surfaced to the user as a generic failure notice.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Api { message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Message reported by the server, if this is an envelope failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message } => Some(message),
            _ => None,
        }
    }

    /// Server message when there is one, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.server_message() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_just_the_server_message() {
        let err = ApiError::Api { message: "name is required".into() };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn message_or_prefers_server_message() {
        let err = ApiError::Api { message: "duplicate gstno".into() };
        assert_eq!(err.message_or("Failed to save"), "duplicate gstno");

        let err = ApiError::Decode("expected value".into());
        assert_eq!(err.message_or("Failed to save"), "Failed to save");
    }
}
