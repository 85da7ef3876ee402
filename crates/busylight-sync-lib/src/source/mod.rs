//! Status sources: "is this activity busy right now?" for one external service.
//!
//! Each source owns an authenticated [`HttpClient`], issues one GET per poll
//! and decodes the body straight into its own response type. The response type
//! carries the busy predicate through [`BusyResponse`].

mod fake;
mod toggl;

use std::fmt;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::http::HttpClient;
use crate::registry::Registry;

pub use fake::{FAKE, FAKEAPP_API_PATH, FAKEAPP_API_URL, FakeApp, FakeAppResponse};
pub use toggl::{TOGGL, TOGGL_API_PATH, TOGGL_API_URL, Toggl, TogglResponse, TogglTimeEntry};

// ── Error type ──

#[derive(Debug)]
pub enum SourceError {
    /// No constructor is registered for this source type name.
    NotImplemented(String),
    /// The HTTP client could not be built.
    Client(String),
    /// The configured base URL is not a valid URL.
    InvalidUrl(String),
    /// Network failure or timeout.
    Request(reqwest::Error),
    /// The service answered with a non-2xx status.
    Status { url: String, status: u16 },
    /// The body is not the JSON shape this source expects.
    Decode(serde_json::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotImplemented(name) => write!(f, "{name} is not implemented"),
            SourceError::Client(e) => write!(f, "HTTP client error: {e}"),
            SourceError::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            SourceError::Request(e) => write!(f, "Request failed: {e}"),
            SourceError::Status { url, status } => write!(f, "{url} answered HTTP {status}"),
            SourceError::Decode(e) => write!(f, "Unexpected response body: {e}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Request(e) => Some(e),
            SourceError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

// ── Traits ──

pub trait StatusSource {
    /// Source type name, e.g. `"toggl"`.
    fn name(&self) -> &str;

    fn is_busy(&self) -> Result<bool>;
}

/// A decoded response body that knows whether it means "busy".
pub trait BusyResponse: DeserializeOwned {
    fn is_busy(&self) -> bool;
}

/// GET `url` with `client`, decode into `R`, apply its predicate.
pub fn poll<R: BusyResponse>(client: &HttpClient, url: &Url) -> Result<bool> {
    let response: R = client.get_json(url)?;
    Ok(response.is_busy())
}

/// `base_url` + `path`, keeping any path already present in `base_url`.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let full = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&full).map_err(|e| SourceError::InvalidUrl(format!("{full}: {e}")))
}

// ── Registry ──

/// Per-source settings besides the client.
#[derive(Debug, Clone, Default)]
pub struct SourceParams {
    /// Replaces the source's built-in base URL (self-hosted or test endpoints).
    pub base_url: Option<String>,
}

pub type SourceConstructor = Box<dyn Fn(HttpClient, &SourceParams) -> Result<Box<dyn StatusSource>>>;

pub type SourceRegistry = Registry<SourceConstructor>;

impl Registry<SourceConstructor> {
    /// Registry with every built-in source type.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        registry.register_source(FAKE, |client, params| {
            Ok(Box::new(FakeApp::new(client, params.base_url.as_deref())?) as Box<dyn StatusSource>)
        });
        registry.register_source(TOGGL, |client, params| {
            Ok(Box::new(Toggl::new(client, params.base_url.as_deref())?) as Box<dyn StatusSource>)
        });
        registry
    }

    pub fn register_source(
        &mut self,
        name: &str,
        constructor: impl Fn(HttpClient, &SourceParams) -> Result<Box<dyn StatusSource>> + 'static,
    ) -> &mut Self {
        self.register(name, Box::new(constructor))
    }

    /// Construct the source registered under `name`. Makes no HTTP call.
    pub fn build(
        &self,
        name: &str,
        client: HttpClient,
        params: &SourceParams,
    ) -> Result<Box<dyn StatusSource>> {
        let constructor = self
            .get(name)
            .ok_or_else(|| SourceError::NotImplemented(name.to_string()))?;
        constructor(client, params)
    }
}

// ── Mock source for testing ──

/// Scripted source for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    pub struct MockSourceState {
        pub busy: Cell<bool>,
        pub failing: Cell<bool>,
        pub polls: Cell<usize>,
    }

    /// Clones share state, so a test can flip `busy` after boxing a clone.
    #[derive(Clone)]
    pub struct MockSource {
        name: String,
        state: Rc<MockSourceState>,
    }

    impl MockSource {
        pub fn new(name: &str, busy: bool) -> Self {
            let state = MockSourceState::default();
            state.busy.set(busy);
            MockSource {
                name: name.to_string(),
                state: Rc::new(state),
            }
        }

        pub fn busy(name: &str) -> Self {
            Self::new(name, true)
        }

        pub fn idle(name: &str) -> Self {
            Self::new(name, false)
        }

        /// Every poll fails.
        pub fn failing(name: &str) -> Self {
            let source = Self::new(name, false);
            source.state.failing.set(true);
            source
        }

        pub fn boxed(&self) -> Box<dyn StatusSource> {
            Box::new(self.clone())
        }

        pub fn set_busy(&self, busy: bool) {
            self.state.busy.set(busy);
        }

        pub fn polls(&self) -> usize {
            self.state.polls.get()
        }
    }

    impl StatusSource for MockSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_busy(&self) -> Result<bool> {
            self.state.polls.set(self.state.polls.get() + 1);
            if self.state.failing.get() {
                return Err(SourceError::Client("mock: failure injected".into()));
            }
            Ok(self.state.busy.get())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_is_not_implemented() {
        let registry = SourceRegistry::with_builtin_sources();
        let client = HttpClient::unauthenticated().unwrap();
        let err = registry
            .build("foobar", client, &SourceParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::NotImplemented(_)));
        assert_eq!(err.to_string(), "foobar is not implemented");
    }

    #[test]
    fn builtin_sources_are_registered() {
        let registry = SourceRegistry::with_builtin_sources();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![FAKE, TOGGL]);
    }

    #[test]
    fn build_uses_name_for_dispatch() {
        let registry = SourceRegistry::with_builtin_sources();
        for name in [FAKE, TOGGL] {
            let client = HttpClient::unauthenticated().unwrap();
            let source = registry.build(name, client, &SourceParams::default()).unwrap();
            assert_eq!(source.name(), name);
        }
    }

    #[test]
    fn build_rejects_invalid_base_url() {
        let registry = SourceRegistry::with_builtin_sources();
        let client = HttpClient::unauthenticated().unwrap();
        let params = SourceParams {
            base_url: Some("not a url".into()),
        };
        let err = registry.build(TOGGL, client, &params).err().unwrap();
        assert!(matches!(err, SourceError::InvalidUrl(_)));
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let url = endpoint("http://127.0.0.1:8080/api/", "/is-busy").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/is-busy");
    }

    #[test]
    fn mock_source_counts_polls_and_fails_on_demand() {
        let source = mock::MockSource::failing("flaky");
        assert!(matches!(source.is_busy(), Err(SourceError::Client(_))));
        assert_eq!(source.polls(), 1);
    }
}
