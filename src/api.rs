use std::time::{Duration, Instant};

use base64::prelude::*;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{Credentials, Endpoints};
use crate::error::{AuthenticationError, DownloadError, ListError, error_body};
use crate::recording::Recording;
use crate::timeframe::DateRange;

const PAGE_SIZE: &str = "300";

const DEFAULT_TOKEN_LIFETIME: u64 = 3600; // when expires_in is absent

// renew this many seconds early
const EXPIRY_MARGIN: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

struct AccessToken {
    header: HeaderValue,
    refresh_at: Instant,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.refresh_at
    }
}

/// Zoom API connection holding the bearer token for the run
pub struct ZoomClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: Endpoints,
    token: Option<AccessToken>,
}

impl ZoomClient {
    pub fn new(
        credentials: Credentials,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            credentials,
            endpoints,
            token: None,
        })
    }

    /// Request a fresh bearer token with the account credentials grant
    pub async fn authenticate(&mut self) -> Result<String, AuthenticationError> {
        tracing::debug!("Generating a new bearer token");

        let basic = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let res = self
            .http
            .post(&self.endpoints.token_url)
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.credentials.account_id.as_str()),
            ])
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .send()
            .await
            .map_err(AuthenticationError::Request)?;

        let status = res.status();
        if !status.is_success() {
            return Err(AuthenticationError::Rejected {
                status,
                body: error_body(res).await,
            });
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| AuthenticationError::Malformed(e.to_string()))?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthenticationError::Malformed("missing access_token".to_string()))?;

        let mut header = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            AuthenticationError::Malformed("access_token is not a valid header value".to_string())
        })?;
        header.set_sensitive(true);

        let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        self.token = Some(AccessToken {
            header,
            refresh_at: Instant::now() + Duration::from_secs(lifetime.saturating_sub(EXPIRY_MARGIN)),
        });
        tracing::debug!(expires_in = lifetime, "New token generated");

        Ok(token)
    }

    async fn auth_headers(&mut self) -> Result<HeaderMap, AuthenticationError> {
        match self.token.as_ref().map(AccessToken::is_expired) {
            Some(false) => {}
            Some(true) => {
                tracing::debug!("Bearer token has expired, generating a new one");
                self.authenticate().await?;
            }
            None => {
                self.authenticate().await?;
            }
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, token.header.clone());
        }
        Ok(headers)
    }

    /// All recordings in `range`, following `next_page_token` until the last page
    pub async fn list_recordings(
        &mut self,
        range: &DateRange,
        channel_type: &str,
    ) -> Result<Vec<Recording>, ListError> {
        if !range.is_ordered() {
            return Err(ListError::InvalidRange {
                from: range.from_param(),
                to: range.to_param(),
            });
        }

        tracing::info!("Getting list of recordings from {range}");
        let endpoint = format!("{}/contact_center/recordings", self.endpoints.api_base_url);
        let from = range.from_param();
        let to = range.to_param();

        let mut recordings = Vec::new();
        let mut page_token = String::new();
        loop {
            let params: Vec<(&str, &str)> = vec![
                ("from", &from),
                ("to", &to),
                ("channel_type", channel_type),
                ("page_size", PAGE_SIZE),
                ("next_page_token", &page_token),
            ];

            let headers = self.auth_headers().await?;
            tracing::debug!("GET {endpoint} (page token {page_token:?})");
            let res = self
                .http
                .get(&endpoint)
                .query(&params)
                .headers(headers)
                .send()
                .await
                .map_err(ListError::Request)?;

            let status = res.status();
            if !status.is_success() {
                return Err(ListError::Status {
                    status,
                    body: error_body(res).await,
                });
            }

            let body = res
                .json::<Value>()
                .await
                .map_err(|e| ListError::Parse(e.to_string()))?;
            let entries: &[Value] = match &body["recordings"] {
                Value::Null => &[],
                Value::Array(entries) => entries.as_slice(),
                _ => return Err(ListError::Parse("\"recordings\" is not an array".to_string())),
            };
            for (index, entry) in entries.iter().enumerate() {
                recordings.push(Recording::from_entry(index, entry)?);
            }

            let next = body["next_page_token"].as_str().unwrap_or_default();
            if next.is_empty() {
                break;
            }
            if next == page_token {
                return Err(ListError::PaginationLoop(page_token));
            }
            page_token = next.to_string();
        }

        tracing::info!("Returning {} records", recordings.len());
        Ok(recordings)
    }

    // caller streams the body
    pub async fn get_media(&mut self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let headers = self.auth_headers().await?;
        tracing::debug!("Downloading {url}");
        let res = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(DownloadError::Request)?;

        let status = res.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status,
                body: error_body(res).await,
            });
        }
        Ok(res)
    }
}
