//! Synthetic source answering `{"isBusy": bool}`. Used for testing and demos.

use reqwest::Url;
use serde::Deserialize;

use super::{BusyResponse, Result, StatusSource, endpoint, poll};
use crate::http::HttpClient;

pub const FAKE: &str = "fake";
pub const FAKEAPP_API_URL: &str = "http://fake.app/api";
pub const FAKEAPP_API_PATH: &str = "/is-busy";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FakeAppResponse {
    #[serde(rename = "isBusy")]
    pub is_busy: bool,
}

impl BusyResponse for FakeAppResponse {
    fn is_busy(&self) -> bool {
        self.is_busy
    }
}

pub struct FakeApp {
    client: HttpClient,
    url: Url,
}

impl FakeApp {
    /// `base_url` defaults to [`FAKEAPP_API_URL`].
    pub fn new(client: HttpClient, base_url: Option<&str>) -> Result<Self> {
        let url = endpoint(base_url.unwrap_or(FAKEAPP_API_URL), FAKEAPP_API_PATH)?;
        Ok(FakeApp { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl StatusSource for FakeApp {
    fn name(&self) -> &str {
        FAKE
    }

    fn is_busy(&self) -> Result<bool> {
        poll::<FakeAppResponse>(&self.client, &self.url)
    }
}
