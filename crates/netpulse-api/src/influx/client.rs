// InfluxDB v2 HTTP client
//
// Thin wrapper over `reqwest::Client`: line-protocol writes to
// `/api/v2/write`, Flux queries to `/api/v2/query` (CSV results), and the
// unauthenticated `/health` probe. Token auth is sent on every request.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::csv::{self, Row};
use super::point::Point;
use crate::error::Error;

/// Connection settings for one InfluxDB v2 bucket.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: Url,
    pub org: String,
    pub bucket: String,
    pub token: SecretString,
    pub timeout: Duration,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Health {
    pub fn is_pass(&self) -> bool {
        self.status == "pass"
    }
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

pub struct InfluxClient {
    http: reqwest::Client,
    config: InfluxConfig,
}

impl InfluxClient {
    /// Build a client with the token installed as a default header.
    pub fn new(config: InfluxConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", config.token.expose_secret()))
            .map_err(|_| Error::Influx {
                status: 0,
                message: "token contains characters not valid in a header".into(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("netpulse/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }

    /// Use a pre-built `reqwest::Client`. The caller is responsible for
    /// attaching the `Authorization` header.
    pub fn with_client(http: reqwest::Client, config: InfluxConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.config.url.join(path)?)
    }

    pub async fn health(&self) -> Result<Health, Error> {
        let url = self.endpoint("/health")?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        // /health answers 503 with a JSON body when the server is failing.
        Ok(resp.json().await?)
    }

    /// Write points with millisecond precision. Points with no usable
    /// fields are skipped; an all-empty batch is a no-op.
    pub async fn write(&self, points: &[Point]) -> Result<(), Error> {
        let body = points
            .iter()
            .filter_map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");
        if body.is_empty() {
            return Ok(());
        }

        let mut url = self.endpoint("/api/v2/write")?;
        url.query_pairs_mut()
            .append_pair("org", &self.config.org)
            .append_pair("bucket", &self.config.bucket)
            .append_pair("precision", "ms");
        debug!(points = points.len(), "POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;
        check_status(resp).await.map(drop)
    }

    /// Run a Flux query and return every row of every result table.
    pub async fn query(&self, flux: &str) -> Result<Vec<Row>, Error> {
        let mut url = self.endpoint("/api/v2/query")?;
        url.query_pairs_mut().append_pair("org", &self.config.org);
        debug!("POST {}", url);

        let body = json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "delimiter": ",",
                "annotations": [],
            },
        });
        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await?;
        let text = check_status(resp).await?.text().await?;
        csv::parse(&text)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let raw = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&raw)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(raw);
    Err(Error::Influx {
        status: status.as_u16(),
        message,
    })
}
