//! Credentials for talking to a Confluence instance.
//!
//! Tokens are held in `secrecy::SecretBox` so they never end up in logs,
//! debug output or error messages.

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An API token that won't be logged or displayed.
pub struct ApiToken(SecretBox<str>);

impl ApiToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the token. Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Clone for ApiToken {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for ApiToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How requests to an instance are authenticated.
#[derive(Clone, Debug)]
pub enum Auth {
    /// Atlassian Cloud account email + API token, sent as HTTP basic auth.
    Basic { email: String, token: ApiToken },
    /// Personal access token or an acting-user token handed to us by a host app.
    Bearer(ApiToken),
}

impl Auth {
    pub fn basic(email: impl Into<String>, token: impl Into<ApiToken>) -> Self {
        Self::Basic {
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn bearer(token: impl Into<ApiToken>) -> Self {
        Self::Bearer(token.into())
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic { email, token } => request.basic_auth(email, Some(token.expose())),
            Self::Bearer(token) => request.bearer_auth(token.expose()),
        }
    }
}
