//! HTTP client for the storage service.
//!
//! | call                                   | timeout            |
//! |----------------------------------------|--------------------|
//! | `GET  /api/v0/datasets/{id}/`          | `read_timeout`     |
//! | `GET  /api/v0/dataset-versions/{id}/`  | `read_timeout`     |
//! | `GET  /api/v0/data/?output_execution=…`| `read_timeout`     |
//! | `POST /api/v0/dataset-versions/`       | `create_timeout`   |
//!
//! Every request carries `Authorization: Token <token>`. Non-2xx responses
//! become [`ApiError::Status`] with the response body attached; nothing is
//! retried.

use std::time::Duration;

use serde::de::DeserializeOwned;

use versioner_core::{DataItem, Dataset, DatasetId, DatasetVersion, ExecutionId, VersionId};

use crate::error::ApiError;
use crate::models::{CreateVersionRequest, CreatedVersion, Page, PageRequest};

pub const DEFAULT_BASE_URL: &str = "https://app.valohai.com/";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the reconcile and publish phases need from the service.
pub trait DatasetService {
    fn dataset(&self, id: &DatasetId) -> Result<Dataset, ApiError>;

    fn dataset_version(&self, id: &VersionId) -> Result<DatasetVersion, ApiError>;

    /// One page of the (non-purged) data items produced by `execution`,
    /// ordered by id ascending.
    fn execution_outputs(
        &self,
        execution: &ExecutionId,
        page: PageRequest,
    ) -> Result<Vec<DataItem>, ApiError>;

    fn create_dataset_version(
        &self,
        request: &CreateVersionRequest,
    ) -> Result<CreatedVersion, ApiError>;
}

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub read_timeout: Duration,
    pub create_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
        }
    }
}

/// Authenticated blocking client.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    auth_header: String,
    read_timeout: Duration,
    create_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(config.base_url));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(config.read_timeout)
            .build();
        Ok(Self {
            agent,
            base_url,
            auth_header: format!("Token {}", config.token),
            read_timeout: config.read_timeout,
            create_timeout: config.create_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.agent
            .get(url)
            .set("Authorization", &self.auth_header)
            .timeout(self.read_timeout)
    }

    fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: ureq::Request,
    ) -> Result<T, ApiError> {
        let response = request.call().map_err(|e| map_ureq_error(url, e))?;
        decode(url, response)
    }
}

impl DatasetService for ApiClient {
    fn dataset(&self, id: &DatasetId) -> Result<Dataset, ApiError> {
        let url = self.url(&format!("/api/v0/datasets/{id}/"));
        self.fetch_json(&url, self.get(&url))
    }

    fn dataset_version(&self, id: &VersionId) -> Result<DatasetVersion, ApiError> {
        let url = self.url(&format!("/api/v0/dataset-versions/{id}/"));
        self.fetch_json(&url, self.get(&url))
    }

    fn execution_outputs(
        &self,
        execution: &ExecutionId,
        page: PageRequest,
    ) -> Result<Vec<DataItem>, ApiError> {
        let url = self.url("/api/v0/data/");
        let limit = page.limit.to_string();
        let offset = page.offset.to_string();
        let request = self
            .get(&url)
            .query("ordering", "id")
            .query("limit", &limit)
            .query("offset", &offset)
            .query("output_execution", execution.as_str())
            .query("exclude", "output_execution,project")
            .query("purged", "false");
        tracing::debug!(
            execution = %execution,
            offset = page.offset,
            limit = page.limit,
            "listing execution outputs"
        );
        let page: Page<DataItem> = self.fetch_json(&url, request)?;
        Ok(page.results)
    }

    fn create_dataset_version(
        &self,
        request: &CreateVersionRequest,
    ) -> Result<CreatedVersion, ApiError> {
        let url = self.url("/api/v0/dataset-versions/");
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &self.auth_header)
            .timeout(self.create_timeout)
            .send_json(body)
            .map_err(|e| map_ureq_error(&url, e))?;
        decode(&url, response)
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, ApiError> {
    response.into_json().map_err(|e| ApiError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn map_ureq_error(url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => ApiError::Status {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ApiError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}
