//! reqwest-backed Dependency-Track client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::{About, ClientError, DependencyTrackApi, PolicyViolation, PortfolioMetrics, Project};
use crate::pagination::{Page, PageOptions};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the total item count on paginated responses.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Default request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated HTTP client for the Dependency-Track REST API.
#[derive(Clone)]
pub struct DependencyTrackClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for DependencyTrackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyTrackClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DependencyTrackClient {
    /// Create a client for the server at `address`.
    ///
    /// # Errors
    /// Returns `ClientError` if the address is not a usable base URL, the API
    /// key is not a valid header value, or the HTTP client cannot be built.
    pub fn new(address: &str, api_key: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(address)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(address.to_string()));
        }

        let mut key = HeaderValue::from_str(api_key).map_err(|_| ClientError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the server's version information.
    ///
    /// Used at startup to fail fast on an unreachable server.
    pub async fn server_version(&self) -> Result<About, ClientError> {
        let url = self.endpoint(&["api", "version"])?;
        let response = check_status(self.client.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    /// Build an endpoint URL below the base URL, keeping any base path prefix.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        page: PageOptions,
        extra_query: &[(&str, &str)],
    ) -> Result<Page<T>, ClientError> {
        let response = self
            .client
            .get(url)
            .query(extra_query)
            .query(&[("pageSize", page.page_size), ("pageNumber", page.page_number)])
            .send()
            .await?;
        let response = check_status(response)?;
        let total_count = parse_total_count(response.headers())?;
        let items = response.json::<Vec<T>>().await?;
        Ok(Page::new(items, total_count))
    }
}

#[async_trait::async_trait]
impl DependencyTrackApi for DependencyTrackClient {
    async fn get_projects(&self, page: PageOptions) -> Result<Page<Project>, ClientError> {
        let url = self.endpoint(&["api", "v1", "project"])?;
        self.get_page(url, page, &[]).await
    }

    async fn get_projects_by_tag(
        &self,
        tag: &str,
        page: PageOptions,
    ) -> Result<Page<Project>, ClientError> {
        let url = self.endpoint(&["api", "v1", "project", "tag", tag])?;
        self.get_page(url, page, &[]).await
    }

    async fn get_policy_violations(
        &self,
        page: PageOptions,
    ) -> Result<Page<PolicyViolation>, ClientError> {
        let url = self.endpoint(&["api", "v1", "violation"])?;
        self.get_page(url, page, &[("suppressed", "true")]).await
    }

    async fn latest_portfolio_metrics(&self) -> Result<PortfolioMetrics, ClientError> {
        let url = self.endpoint(&["api", "v1", "metrics", "portfolio", "current"])?;
        let response = check_status(self.client.get(url).send().await?)?;
        Ok(response.json().await?)
    }
}

fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            status,
            url: response.url().to_string(),
        })
    }
}

fn parse_total_count(headers: &HeaderMap) -> Result<usize, ClientError> {
    let value = headers
        .get(TOTAL_COUNT_HEADER)
        .ok_or(ClientError::MissingTotalCount)?;
    let text = value
        .to_str()
        .map_err(|_| ClientError::InvalidTotalCount(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    text.trim()
        .parse()
        .map_err(|_| ClientError::InvalidTotalCount(text.to_string()))
}
