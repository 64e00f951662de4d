//! HTTP client for the asset service
//!
//! Every request goes through [`AssetServiceClient::execute`], which holds a
//! concurrency permit for the duration of the call and turns failures into
//! [`ApiError`] so callers can classify them after an `anyhow` round trip.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::constants::LIST_PAGE_SIZE;
use super::error::ApiError;
use super::models::{Asset, AssetToCreate, AssetsPage, BulkCreateResponse, Variable};
use super::operations::{Operation, OperationResult};
use super::resilience::{ConcurrencyLimiter, ResilienceConfig};
use super::traits::AssetApi;
use crate::energy::EnergyFlags;

/// Characters of a failed response body kept in the error message
const ERROR_BODY_SNIPPET: usize = 200;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    error_key: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// reqwest-backed client for the asset service
#[derive(Debug, Clone)]
pub struct AssetServiceClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderValue,
    limiter: ConcurrencyLimiter,
}

impl AssetServiceClient {
    /// Create a client for `base_url` authenticating with a bearer `token`.
    ///
    /// Tokens copied out of a browser are often percent-encoded; they are
    /// decoded before use.
    pub fn new(base_url: &str, token: &str, resilience: &ResilienceConfig) -> Result<Self> {
        if base_url.trim().is_empty() {
            anyhow::bail!("Asset service base URL is empty");
        }

        let token = normalize_token(token)?;
        let auth_header = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Invalid access token format")?;

        let client = reqwest::Client::builder()
            .timeout(resilience.timeout)
            .build()
            .context("Failed to initialize HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            auth_header,
            limiter: ConcurrencyLimiter::new(resilience.concurrency.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers
    }

    /// Execute a single operation, waiting for a concurrency permit first
    pub async fn execute(&self, operation: &Operation) -> Result<OperationResult> {
        let _permit = self.limiter.acquire().await?;

        let url = format!("{}{}", self.base_url, operation.path());
        debug!("{} {} ({})", operation.http_method(), url, operation.operation_type());

        let mut request = self
            .client
            .request(operation.http_method(), &url)
            .headers(self.headers());
        if let Some(body) = operation.body()? {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body).into());
        }

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)
                .map_err(|e| ApiError::Malformed(format!("{} - {}", e, snippet(&body))))?
        };

        Ok(OperationResult {
            status_code: status.as_u16(),
            data,
        })
    }

    async fn execute_json<T: DeserializeOwned>(&self, operation: &Operation) -> Result<T> {
        let result = self.execute(operation).await?;
        let parsed = serde_json::from_value(result.data)
            .map_err(|e| ApiError::Malformed(format!("{}: {}", operation.operation_type(), e)))?;
        Ok(parsed)
    }

    /// Walk the paginated listing until every asset has been read
    pub async fn list_all_assets(&self) -> Result<Vec<Asset>> {
        list_all(self, LIST_PAGE_SIZE).await
    }
}

#[async_trait]
impl AssetApi for AssetServiceClient {
    async fn bulk_create(&self, assets: &[AssetToCreate]) -> Result<BulkCreateResponse> {
        self.execute_json(&Operation::bulk_create(assets.to_vec()))
            .await
    }

    async fn bulk_create_variables(&self, variables: &[Variable]) -> Result<()> {
        self.execute(&Operation::bulk_create_variables(variables.to_vec()))
            .await?;
        Ok(())
    }

    async fn add_attribute(&self, asset_id: &str, key: &str, value: &str) -> Result<()> {
        self.execute(&Operation::add_attribute(asset_id, key, value))
            .await?;
        Ok(())
    }

    async fn update_flags(&self, asset_id: &str, flags: &EnergyFlags) -> Result<()> {
        let data = serde_json::to_value(flags).context("Failed to encode energy flags")?;
        self.execute(&Operation::update_asset(asset_id, data)).await?;
        Ok(())
    }

    async fn list_assets(&self, page: usize, page_size: usize) -> Result<AssetsPage> {
        self.execute_json(&Operation::list_assets(page, page_size))
            .await
    }
}

/// Read every page of the listing through any [`AssetApi`].
///
/// Stops on an empty page, a short page, or once `total` assets were read.
pub async fn list_all(api: &dyn AssetApi, page_size: usize) -> Result<Vec<Asset>> {
    let page_size = page_size.max(1);
    let mut assets = Vec::new();
    let mut page = 1;

    loop {
        let batch = api.list_assets(page, page_size).await?;
        let received = batch.assets.len();
        assets.extend(batch.assets);

        debug!("Listed page {} ({} assets, {} so far)", page, received, assets.len());

        let reached_total = batch.total > 0 && assets.len() >= batch.total;
        if received == 0 || received < page_size || reached_total {
            break;
        }
        page += 1;
    }

    info!("Listed {} assets", assets.len());
    Ok(assets)
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

fn normalize_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.contains('%') {
        let decoded = urlencoding::decode(token).context("Access token is not valid percent-encoding")?;
        Ok(decoded.into_owned())
    } else {
        Ok(token.to_string())
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_BODY_SNIPPET).collect()
}

fn status_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => ApiError::Status {
            status,
            error_key: parsed.error_key,
            message: parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status)),
        },
        Err(_) => ApiError::Status {
            status,
            error_key: None,
            message: snippet(body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeAssetApi;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            AssetServiceClient::new("https://assets.example.com/ ", "t", &ResilienceConfig::default())
                .unwrap();
        assert_eq!(client.base_url(), "https://assets.example.com");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(AssetServiceClient::new("  ", "t", &ResilienceConfig::default()).is_err());
    }

    #[test]
    fn test_percent_encoded_token_decoded() {
        assert_eq!(normalize_token("abc%2Bdef%3D").unwrap(), "abc+def=");
        assert_eq!(normalize_token(" plain ").unwrap(), "plain");
    }

    #[test]
    fn test_status_error_uses_body_key() {
        let err = status_error(400, r#"{"errorKey":"InvalidParent","message":"no parent"}"#);
        assert_eq!(err.error_key(), Some("InvalidParent"));
        assert_eq!(err.message(), "no parent");

        let err = status_error(502, "<html>bad gateway</html>");
        assert_eq!(err.error_key(), None);
        assert_eq!(err.message(), "<html>bad gateway</html>");
    }

    #[tokio::test]
    async fn test_list_all_walks_pages() {
        let api = FakeAssetApi::new();
        for i in 0..5 {
            api.push_listed(Asset {
                id: format!("a{}", i),
                name: format!("Asset{}", i),
                ..Default::default()
            });
        }

        let assets = list_all(&api, 2).await.unwrap();
        assert_eq!(assets.len(), 5);
        assert_eq!(api.list_calls(), 3);
    }
}
