//! Account authentication
//!
//! [`Authenticator`] obtains tokens from credentials. The client composes one
//! with its read/write operations and calls
//! [`PinballMapClient::ensure_authorized`](super::PinballMapClient::ensure_authorized)
//! at the top of every write.
//!
//! Note: the API names things inconsistently. Login takes `login`, writes take
//! `user_token`, and responses call it `authentication_token`.

use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;

use super::transport::Transport;
use crate::catalog::UserDetails;
use crate::error::{PinballMapError, Result};

/// Outcome of a sign-up request the API answered
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account was created; the API sends a confirmation email
    Created(UserDetails),
    /// The API refused, e.g. the account already exists
    Rejected(String),
}

/// Obtains tokens from account credentials
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange a username or email and password for account details
    async fn authenticate(&self, login: &str, password: &str) -> Result<UserDetails>;

    /// Create an account
    async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<SignUpOutcome>;
}

/// Authenticator backed by the Pinball Map users endpoints
pub struct ApiAuthenticator {
    transport: Arc<dyn Transport>,
}

impl ApiAuthenticator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Authenticator for ApiAuthenticator {
    async fn authenticate(&self, login: &str, password: &str) -> Result<UserDetails> {
        let params = [("login", login.to_string()), ("password", password.to_string())];
        let response = self
            .transport
            .request(Method::GET, "users/auth_details.json", &params)
            .await?;

        parse_user_response(response)?.map_err(PinballMapError::AuthenticationFailed)
    }

    async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<SignUpOutcome> {
        let params = [
            ("username", username.to_string()),
            ("email", email.to_string()),
            ("password", password.to_string()),
            ("confirm_password", password.to_string()),
        ];
        let response = self
            .transport
            .request(Method::POST, "users/signup.json", &params)
            .await?;

        Ok(match parse_user_response(response)? {
            Ok(user) => SignUpOutcome::Created(user),
            Err(message) => SignUpOutcome::Rejected(message),
        })
    }
}

/// Split `{"user": {...}}` from `{"errors": ...}`
///
/// The outer error is a malformed body; the inner one is the API's message.
fn parse_user_response(
    mut response: serde_json::Value,
) -> Result<std::result::Result<UserDetails, String>> {
    if let Some(errors) = response.get("errors") {
        let message = match errors {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(Err(message));
    }

    let user = response
        .get_mut("user")
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(user)
        .map(Ok)
        .map_err(|e| PinballMapError::decode("user details", e))
}

/// Token and email currently used for writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub authentication_token: Option<String>,
    pub user_email: Option<String>,
}

impl Session {
    /// Both halves present, ready to send
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.user_email, &self.authentication_token) {
            (Some(email), Some(token)) => Some(Credentials {
                user_email: email.clone(),
                user_token: token.clone(),
            }),
            _ => None,
        }
    }

    pub(crate) fn update(&mut self, user: &UserDetails) {
        self.authentication_token = Some(user.authentication_token.clone());
        self.user_email = Some(user.email.clone());
    }
}

/// Credentials attached to write requests
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub user_email: String,
    pub user_token: String,
}

impl Credentials {
    pub(crate) fn params(&self) -> [(&'static str, String); 2] {
        [
            ("user_email", self.user_email.clone()),
            ("user_token", self.user_token.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_response_success() {
        let response = json!({
            "user": {
                "id": 1,
                "username": "my_username",
                "email": "email@example.com",
                "authentication_token": "tok"
            }
        });
        let user = parse_user_response(response).unwrap().unwrap();
        assert_eq!(user.email, "email@example.com");
        assert_eq!(user.authentication_token, "tok");
        assert_eq!(user.username.as_deref(), Some("my_username"));
    }

    #[test]
    fn test_parse_user_response_errors() {
        let response = json!({
            "errors": "User is not yet confirmed. Please follow emailed confirmation instructions."
        });
        let message = parse_user_response(response).unwrap().unwrap_err();
        assert!(message.starts_with("User is not yet confirmed"));

        let response = json!({"errors": ["Email has already been taken"]});
        let message = parse_user_response(response).unwrap().unwrap_err();
        assert!(message.contains("already been taken"));
    }

    #[test]
    fn test_parse_user_response_malformed() {
        let err = parse_user_response(json!({"unexpected": true})).unwrap_err();
        assert!(matches!(err, PinballMapError::Decode { .. }));
    }

    #[test]
    fn test_session_credentials_need_both_halves() {
        let mut session = Session {
            authentication_token: Some("tok".into()),
            user_email: None,
        };
        assert!(session.credentials().is_none());

        session.user_email = Some("a@b.c".into());
        let creds = session.credentials().unwrap();
        assert_eq!(creds.params()[1], ("user_token", "tok".to_string()));
    }
}
