//! Client error types with clear, actionable messages

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PinballMapError>;

/// Errors returned by the Pinball Map client
#[derive(Error, Debug)]
pub enum PinballMapError {
    /// A write operation was attempted without usable credentials
    #[error("Pinball Map authentication_token and user_email required for this operation.\n\nSet them with --token/--email, PINBALLMAP_TOKEN/PINBALLMAP_EMAIL, or supply\nuser_email and user_password so the client can log in.")]
    AuthenticationRequired,

    /// The API rejected the supplied credentials
    #[error("Pinball Map authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The operation needs a location id and none was configured
    #[error("Need a location id (use --location or set location_id in the config)")]
    MissingLocation,

    /// The operation needs a region name and none was configured
    #[error("Need a region name (use --region or set region_name in the config)")]
    MissingRegion,

    /// The API answered with a non-success status
    #[error("Pinball Map API returned HTTP {status} for {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The request could not be sent or its body could not be read
    #[error("Pinball Map request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("Failed to decode {context}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PinballMapError {
    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        PinballMapError::Decode {
            context: context.into(),
            source,
        }
    }

    /// Whether retrying with fresh credentials could change the outcome
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            PinballMapError::AuthenticationRequired | PinballMapError::AuthenticationFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_names_status_and_url() {
        let err = PinballMapError::Http {
            status: 422,
            url: "https://pinballmap.com/api/v1/location_machine_xrefs.json".to_string(),
            body: "{\"errors\":\"nope\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 422"));
        assert!(msg.contains("location_machine_xrefs.json"));
    }

    #[test]
    fn test_request_error_message_keeps_cause() {
        let cause = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let cause_text = cause.to_string();

        let msg = PinballMapError::from(cause).to_string();
        assert!(msg.starts_with("Pinball Map request failed: "));
        assert!(msg.ends_with(&cause_text));
    }

    #[test]
    fn test_auth_errors_are_classified() {
        assert!(PinballMapError::AuthenticationRequired.is_auth_error());
        assert!(PinballMapError::AuthenticationFailed("bad".into()).is_auth_error());
        assert!(!PinballMapError::MissingLocation.is_auth_error());
    }
}
