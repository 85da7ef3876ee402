//! Authenticated HTTP client handed to status sources.
//!
//! A source never sees credentials: it receives an [`HttpClient`] whose
//! default headers already carry the `Authorization` value, and whose timeout
//! bounds every poll so a hanging service cannot stall the reconciliation loop.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::source::{Result, SourceError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("busylight-sync/", env!("CARGO_PKG_VERSION"));

// ── Credentials ──

/// HTTP Basic Auth pair. Present iff either field is non-empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicAuth {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// `base64(username:password)`, the value after `Basic ` in the header.
    pub fn encoded(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Supported authentication schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    BasicAuth(BasicAuth),
}

impl Credential {
    fn authorization(&self) -> Result<HeaderValue> {
        match self {
            Credential::BasicAuth(auth) => {
                let mut value = HeaderValue::from_str(&format!("Basic {}", auth.encoded()))
                    .map_err(|e| SourceError::Client(format!("authorization header: {e}")))?;
                value.set_sensitive(true);
                Ok(value)
            }
        }
    }
}

// ── Client ──

/// Blocking HTTP client with authentication and timeout baked in.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Build a client. `None` means no authentication.
    pub fn new(credential: Option<&Credential>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(credential) = credential {
            headers.insert(AUTHORIZATION, credential.authorization()?);
        }

        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Client(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient { inner })
    }

    /// Unauthenticated client with the default timeout.
    pub fn unauthenticated() -> Result<Self> {
        Self::new(None, DEFAULT_TIMEOUT)
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// Non-2xx responses are errors; the body is not decoded.
    pub fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self
            .inner
            .get(url.clone())
            .send()
            .map_err(SourceError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(SourceError::Request)?;
        serde_json::from_str(&body).map_err(SourceError::Decode)
    }
}
