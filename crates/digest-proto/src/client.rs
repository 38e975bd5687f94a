//! HTTP client for the analysis backend.
//!
//! One method per endpoint. Every method maps the backend's failure signals
//! (non-2xx status, an `error` field, an undecodable body) onto `ClientError`;
//! deciding what the user sees is left to the flow that called it.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::protocol::{
    AskRequest, ChannelSummary, ErrorBody, LoginRequest, LoginResponse, QueryResult,
    SummariesResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Could not reach the backend, or the request could not be built.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    /// The backend answered with an `error` field.
    #[error("{0}")]
    Backend(String),
    /// The body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Message limit for a scrape, parsed from free text without validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLimit {
    /// Optional minus sign and the digits as typed, without leading zeros.
    /// Kept as text so that no value is clamped on the way to the backend.
    Count(String),
    /// The text had no leading integer; forwarded to the backend as `NaN`.
    NotANumber,
}

impl MessageLimit {
    /// Leading-integer parse: skips leading whitespace, accepts one sign,
    /// then as many digits as follow. Anything after the digits is ignored.
    pub fn parse(text: &str) -> Self {
        let s = text.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let digits = &rest[..end];
        if digits.is_empty() {
            return Self::NotANumber;
        }
        match digits.trim_start_matches('0') {
            "" => Self::Count("0".to_string()),
            significant if negative => Self::Count(format!("-{}", significant)),
            significant => Self::Count(significant.to_string()),
        }
    }
}

impl fmt::Display for MessageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => f.write_str(n),
            Self::NotANumber => f.write_str("NaN"),
        }
    }
}

/// What a successful scrape returned, if anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeReceipt {
    pub body: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `/`. Only used to keep the backend warm; the body is ignored.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.http.get(self.url("/")).send().await?;
        Ok(())
    }

    /// POST `/login`. Returns the backend's `authenticated` verdict.
    pub async fn login(&self, password: &str) -> Result<bool, ClientError> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: "Login failed".to_string(),
            });
        }
        let body: LoginResponse = decode(&resp.bytes().await?)?;
        Ok(body.authenticated)
    }

    /// POST `/ask`. A body carrying `error` wins over the status code.
    pub async fn ask(&self, query: &str) -> Result<QueryResult, ClientError> {
        let resp = self
            .http
            .post(self.url("/ask"))
            .json(&AskRequest {
                query: query.to_string(),
            })
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if let Some(message) = error_field(&bytes) {
            return Err(ClientError::Backend(message));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: format!("Query failed ({})", status),
            });
        }
        decode(&bytes)
    }

    /// GET `/channel-summaries`, optionally bypassing the backend cache.
    pub async fn channel_summaries(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<ChannelSummary>, ClientError> {
        let mut req = self.http.get(self.url("/channel-summaries"));
        if force_refresh {
            req = req.query(&[("force_refresh", "true")]);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: "Failed to fetch channel summaries".to_string(),
            });
        }
        let body: SummariesResponse = decode(&resp.bytes().await?)?;
        debug!("[client] received {} channel summaries", body.summaries.len());
        Ok(body.summaries)
    }

    /// POST `/discord/{guild_id}?limit={n}` with no body.
    pub async fn scrape(
        &self,
        guild_id: &str,
        limit: MessageLimit,
    ) -> Result<ScrapeReceipt, ClientError> {
        let url = self.url(&format!("/discord/{}", guild_id));
        debug!("[client] scrape {} limit={}", url, limit);
        let resp = self
            .http
            .post(url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: error_field(&bytes)
                    .unwrap_or_else(|| "Failed to scrape server".to_string()),
            });
        }
        Ok(ScrapeReceipt {
            body: serde_json::from_slice(&bytes).ok(),
        })
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// The `error` field of a JSON body, if the body is JSON and has a non-empty one.
fn error_field(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(bytes)
        .ok()?
        .error
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_limit_parse() {
        let count = |n: &str| MessageLimit::Count(n.to_string());
        assert_eq!(MessageLimit::parse("100"), count("100"));
        assert_eq!(MessageLimit::parse("  42"), count("42"));
        assert_eq!(MessageLimit::parse("12abc"), count("12"));
        assert_eq!(MessageLimit::parse("-5"), count("-5"));
        assert_eq!(MessageLimit::parse("+7"), count("7"));
        assert_eq!(MessageLimit::parse("007"), count("7"));
        assert_eq!(MessageLimit::parse("-0"), count("0"));
        assert_eq!(MessageLimit::parse(""), MessageLimit::NotANumber);
        assert_eq!(MessageLimit::parse("abc"), MessageLimit::NotANumber);
        assert_eq!(MessageLimit::parse("-"), MessageLimit::NotANumber);
    }

    #[test]
    fn test_message_limit_keeps_out_of_range_values() {
        assert_eq!(
            MessageLimit::parse("99999999999999999999").to_string(),
            "99999999999999999999"
        );
        assert_eq!(
            MessageLimit::parse("-9223372036854775808").to_string(),
            "-9223372036854775808"
        );
        assert_eq!(
            MessageLimit::parse("-18446744073709551616 msgs").to_string(),
            "-18446744073709551616"
        );
    }

    #[test]
    fn test_message_limit_display() {
        assert_eq!(MessageLimit::parse("250").to_string(), "250");
        assert_eq!(MessageLimit::NotANumber.to_string(), "NaN");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::with_http(reqwest::Client::new(), "https://api.example/ ");
        assert_eq!(client.base_url(), "https://api.example");
        assert_eq!(client.url("/ask"), "https://api.example/ask");
    }

    #[test]
    fn test_error_field_extraction() {
        assert_eq!(
            error_field(br#"{"error": "boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_field(br#"{"error": ""}"#), None);
        assert_eq!(error_field(br#"{"answer": "ok"}"#), None);
        assert_eq!(error_field(b"<html>"), None);
        assert_eq!(error_field(b""), None);
    }
}
