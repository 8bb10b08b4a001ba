//! Shared blocking HTTP plumbing
//!
//! Every call is a single request bounded by the configured timeout. There
//! are no retries.

use std::time::Duration;

use powny_core::Settings;
use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Longest response body excerpt carried in errors
const BODY_EXCERPT: usize = 512;

/// Where the remote service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Resolve the base URL from `explicit` or `settings`.
    pub fn from_settings(settings: &Settings, explicit: Option<&str>) -> powny_core::Result<Self> {
        let base_url = settings.resolve_api_url(explicit)?;
        Ok(Self::new(base_url, settings.timeout()))
    }
}

/// A blocking client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `path` on this client's base URL followed by `segment` as a single,
    /// percent-encoded path segment.
    pub(crate) fn segment_url(
        &self,
        operation: &'static str,
        path: &str,
        segment: &str,
    ) -> Result<String> {
        if matches!(segment, "" | "." | "..") {
            return Err(Error::InvalidSegment {
                operation,
                segment: segment.to_string(),
            });
        }
        let mut url = Url::parse(&self.url(path)).map_err(|e| Error::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url.into())
    }

    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self.execute(operation, &url, self.http.get(&url))?;
        let response = reject_conflict(operation, &url, response)?;
        decode(operation, &url, response)
    }

    pub(crate) fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        let url = self.url(path);
        self.execute(operation, &url, self.http.post(&url).json(body))
    }

    /// DELETE an absolute `url`, as built by [`segment_url`](Self::segment_url).
    pub(crate) fn delete(&self, operation: &'static str, url: &str) -> Result<Response> {
        self.execute(operation, url, self.http.delete(url))
    }

    /// Send `request` once. Non-2xx statuses become [`Error::Status`],
    /// except 409 which is returned as-is for the caller to interpret.
    fn execute(
        &self,
        operation: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Response> {
        tracing::debug!(operation, url, "sending request");
        let response = request.send().map_err(|source| Error::Request {
            operation,
            target: url.to_string(),
            source,
        })?;

        let status = response.status();
        tracing::debug!(operation, url, status = status.as_u16(), "received response");
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(Error::Status {
            operation,
            target: url.to_string(),
            status: status.as_u16(),
            body: excerpt(&body),
        })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    operation: &'static str,
    url: &str,
    response: Response,
) -> Result<T> {
    response.json().map_err(|e| Error::Decode {
        operation,
        target: url.to_string(),
        reason: e.to_string(),
    })
}

/// Turn an unexpected 409 into a status error.
pub(crate) fn reject_conflict(
    operation: &'static str,
    url: &str,
    response: Response,
) -> Result<Response> {
    if response.status() != StatusCode::CONFLICT {
        return Ok(response);
    }
    Err(Error::Status {
        operation,
        target: url.to_string(),
        status: StatusCode::CONFLICT.as_u16(),
        body: excerpt(&response.text().unwrap_or_default()),
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let config = ApiConfig::new("http://gns:7887/", Duration::from_secs(1));
        assert_eq!(config.base_url, "http://gns:7887");
    }

    #[test]
    fn long_bodies_are_cut() {
        let body = "x".repeat(BODY_EXCERPT + 10);
        let cut = excerpt(&body);
        assert_eq!(cut.len(), BODY_EXCERPT + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("  short \n"), "short");
    }

    #[test]
    fn segment_is_encoded_as_one_path_element() {
        let client =
            ApiClient::new(&ApiConfig::new("http://gns:7887", Duration::from_secs(1))).unwrap();

        let url = client.segment_url("kill", "/v1/jobs", "a/b?c#d").unwrap();
        assert_eq!(url, "http://gns:7887/v1/jobs/a%2Fb%3Fc%23d");

        for bad in ["", ".", ".."] {
            let err = client.segment_url("kill", "/v1/jobs", bad).unwrap_err();
            assert!(matches!(err, Error::InvalidSegment { .. }), "{bad:?}");
        }
    }

    #[test]
    fn config_from_settings_requires_url() {
        let settings = Settings::default();
        assert!(ApiConfig::from_settings(&settings, None).is_err());

        let config = ApiConfig::from_settings(&settings, Some("http://flag/")).unwrap();
        assert_eq!(config.base_url, "http://flag");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
