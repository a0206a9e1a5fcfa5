//! Ingestion server HTTP client.

use std::time::Instant;

use reqwest::{Client, Response};
use runwatch_models::{
    AccessCodeResponse, DetectionResult, SensorReading, SnapshotUpload, SnapshotUploadResponse,
    ZoneLayout,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;

/// Client for the ingestion server's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: Client,
    base_url: Url,
}

impl IngestClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("runwatch-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.server_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a reading; the response is the server's classification.
    pub async fn post_reading(&self, reading: &SensorReading) -> ClientResult<DetectionResult> {
        let url = self.base_url.join("/sensor/reading")?;
        self.execute_request("post_reading", async {
            let response = self.http.post(url.clone()).json(reading).send().await?;
            Self::parse_json(response, &url).await
        })
        .await
    }

    /// Upload an evidence frame; returns the stored snapshot URL.
    pub async fn upload_snapshot(&self, upload: &SnapshotUpload) -> ClientResult<String> {
        let url = self.base_url.join("/upload/snapshot")?;
        let body: SnapshotUploadResponse = self
            .execute_request("upload_snapshot", async {
                let response = self.http.post(url.clone()).json(upload).send().await?;
                Self::parse_json(response, &url).await
            })
            .await?;
        Ok(body.url)
    }

    /// Fetch the externally defined zone names.
    pub async fn fetch_zone_layout(&self) -> ClientResult<ZoneLayout> {
        let url = self.base_url.join("/api/map/layout")?;
        self.execute_request("fetch_zone_layout", async {
            let response = self.http.get(url.clone()).send().await?;
            Self::parse_json(response, &url).await
        })
        .await
    }

    /// Rotate the dashboard access code. The code is returned once and not
    /// logged.
    pub async fn reset_access_code(&self) -> ClientResult<AccessCodeResponse> {
        let url = self.base_url.join("/api/auth/reset")?;
        self.execute_request("reset_access_code", async {
            let response = self.http.post(url.clone()).send().await?;
            Self::parse_json(response, &url).await
        })
        .await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &Url) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", url.path(), body),
            ));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::InvalidResponse(format!("{}: {}", url.path(), e))
        })
    }

    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> ClientResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        let span = info_span!("ingest_request", operation = %operation);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);
        debug!(operation, status, latency_ms, "Request finished");

        result
    }
}
