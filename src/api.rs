//! Map API client
//! Fetches the service catalog and per-origin destination summaries.

use crate::catalog::normalize_code;
use crate::colors::DestinationAssignment;
use crate::router::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const FILTERS_PATH: &str = "filters";
const ORIGIN_SUMMARY_PATH: &str = "origin-summary";

/// Errors that can occur while talking to the map API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request superseded")]
    Cancelled,
}

/// Origin zone as echoed back by the summary endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginInfo {
    #[serde(default)]
    pub origin_zone_code: Option<String>,
    #[serde(default)]
    pub origin_zone_name: Option<String>,
}

/// Destination set for one (origin, service) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginSummary {
    #[serde(default)]
    pub origin: Option<OriginInfo>,
    #[serde(default)]
    pub destinations: Vec<DestinationAssignment>,
}

impl OriginSummary {
    /// Normalizes the origin and every destination code
    fn normalized(self) -> Self {
        Self {
            origin: self.origin.map(|o| OriginInfo {
                origin_zone_code: normalize_code(o.origin_zone_code.as_deref()),
                origin_zone_name: o.origin_zone_name,
            }),
            destinations: self
                .destinations
                .into_iter()
                .map(DestinationAssignment::normalized)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    #[serde(default)]
    services: Vec<ServiceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Anything that can answer an origin-summary query
pub trait DestinationSource {
    fn fetch_summary(
        &self,
        origin: &str,
        service: &str,
    ) -> impl Future<Output = Result<OriginSummary, ApiError>> + Send;
}

/// HTTP client for the map API
#[derive(Debug, Clone)]
pub struct MapApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MapApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Lists the shipping services offered by the API
    pub async fn fetch_services(&self) -> Result<Vec<ServiceDescriptor>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(FILTERS_PATH))
            .timeout(self.timeout)
            .send()
            .await?;

        let response = check_status(response).await?;
        let payload: ServicesResponse = response.json().await?;
        tracing::debug!("Fetched {} services", payload.services.len());
        Ok(payload.services)
    }

    /// Destination summary for an origin zone under a service.
    /// A blank origin or service yields an empty summary without a request.
    pub async fn fetch_origin_summary(&self, origin: &str, service: &str) -> Result<OriginSummary, ApiError> {
        let (Some(origin), Some(service)) = (normalize_code(Some(origin)), normalize_code(Some(service))) else {
            return Ok(OriginSummary::default());
        };

        tracing::debug!("Fetching origin summary for {} / {}", origin, service);
        let response = self
            .client
            .get(self.endpoint(ORIGIN_SUMMARY_PATH))
            .query(&[("origin_zone_code", origin.as_str()), ("shipping_type_code", service.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        let response = check_status(response).await?;
        let summary: OriginSummary = response.json().await?;
        Ok(summary.normalized())
    }
}

impl DestinationSource for MapApiClient {
    fn fetch_summary(
        &self,
        origin: &str,
        service: &str,
    ) -> impl Future<Output = Result<OriginSummary, ApiError>> + Send {
        self.fetch_origin_summary(origin, service)
    }
}

/// Turns a non-2xx response into [`ApiError::Status`], using the `error`
/// field of the body when there is one
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Error fetching origin summary".to_string());

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Runs a summary query that is abandoned as soon as `token` is cancelled
pub async fn query_destinations<S: DestinationSource>(
    source: &S,
    origin: &str,
    service: &str,
    token: &CancellationToken,
) -> Result<OriginSummary, ApiError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        result = source.fetch_summary(origin, service) => result,
    }
}
