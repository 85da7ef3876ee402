//! Toggl Track: busy while a time entry is running.

use reqwest::Url;
use serde::Deserialize;

use super::{BusyResponse, Result, StatusSource, endpoint, poll};
use crate::http::HttpClient;

pub const TOGGL: &str = "toggl";
pub const TOGGL_API_URL: &str = "https://api.track.toggl.com/api/v8";
pub const TOGGL_API_PATH: &str = "/time_entries/current";

/// Body of `GET /time_entries/current`. `data` is `null` when no timer runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TogglResponse {
    #[serde(default)]
    pub data: Option<TogglTimeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TogglTimeEntry {
    /// `null` and absent both read as no entry.
    #[serde(default)]
    pub id: Option<i64>,
}

impl BusyResponse for TogglResponse {
    fn is_busy(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|entry| entry.id)
            .is_some_and(|id| id != 0)
    }
}

pub struct Toggl {
    client: HttpClient,
    url: Url,
}

impl Toggl {
    /// `base_url` defaults to [`TOGGL_API_URL`].
    pub fn new(client: HttpClient, base_url: Option<&str>) -> Result<Self> {
        let url = endpoint(base_url.unwrap_or(TOGGL_API_URL), TOGGL_API_PATH)?;
        Ok(Toggl { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl StatusSource for Toggl {
    fn name(&self) -> &str {
        TOGGL
    }

    fn is_busy(&self) -> Result<bool> {
        poll::<TogglResponse>(&self.client, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> TogglResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn default_endpoint() {
        let toggl = Toggl::new(HttpClient::unauthenticated().unwrap(), None).unwrap();
        assert_eq!(
            toggl.url().as_str(),
            "https://api.track.toggl.com/api/v8/time_entries/current"
        );
    }

    #[test]
    fn running_entry_is_busy() {
        assert!(decode(r#"{"data": {"id": 436694100, "wid": 777}}"#).is_busy());
    }

    #[test]
    fn zero_id_is_idle() {
        assert!(!decode(r#"{"data": {"id": 0}}"#).is_busy());
    }

    #[test]
    fn null_or_missing_data_is_idle() {
        assert!(!decode(r#"{"data": null}"#).is_busy());
        assert!(!decode("{}").is_busy());
        assert!(!decode(r#"{"data": {}}"#).is_busy());
    }

    #[test]
    fn null_id_is_idle_not_an_error() {
        let response: TogglResponse = serde_json::from_str(r#"{"data": {"id": null}}"#).unwrap();
        assert_eq!(response.data, Some(TogglTimeEntry { id: None }));
        assert!(!response.is_busy());
    }
}
