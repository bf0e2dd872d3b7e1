//! HTTP client for the Janky API with automatic retries.

use std::time::Duration;

use reqwest::{
    Method, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    auth::Credential,
    config::JankyConfig,
    error::{Error, Result},
    retry::{RetryPolicy, is_retriable_status, parse_retry_after},
};

/// Status and body of a response that was not retried away.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Decodes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self, what: &'static str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| Error::Decode { what, source })
    }
}

/// Why a single attempt did not produce a response.
enum AttemptError {
    /// Worth another attempt: the request never got an answer, or the answer
    /// was a retriable status.
    Retriable {
        message: String,
        retry_after: Option<Duration>,
    },
    /// The server answered but the body was lost. Resending could repeat a
    /// side effect the server already applied.
    Fatal(Error),
}

/// Client shared by the submit and poll phases.
///
/// Every request carries the JSON content type and the credential, and is
/// retried on transport failures, 429 and 5xx responses.
#[derive(Debug, Clone)]
pub struct JankyClient {
    base_url: String,
    http: reqwest::Client,
    credential: Credential,
    retry: RetryPolicy,
}

impl JankyClient {
    /// Creates the client from the run's config.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or the HTTP client
    /// cannot be built.
    pub fn new(config: &JankyConfig, credential: Credential) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self {
            base_url,
            http,
            credential,
            retry: config.retry,
        })
    }

    fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/api/{}", self.base_url, path)
    }

    /// Sends a GET request to an API path.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.execute(Method::GET, path, None).await
    }

    /// Sends a POST request with a JSON body to an API path.
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        let body = serde_json::to_vec(body).map_err(|source| Error::Encode {
            what: "request body",
            source,
        })?;
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        let mut retry = 0;

        loop {
            let attempt = retry + 1;
            debug!(
                %method,
                %url,
                attempt,
                max_attempts = self.retry.max_attempts(),
                "Sending request to Janky"
            );

            let (message, retry_after) =
                match self.attempt(method.clone(), &url, body.clone()).await {
                    Ok(response) => return Ok(response),
                    Err(AttemptError::Fatal(e)) => return Err(e),
                    Err(AttemptError::Retriable {
                        message,
                        retry_after,
                    }) => (message, retry_after),
                };

            if !self.retry.should_retry(retry) {
                return Err(Error::Transient {
                    method: method.to_string(),
                    url,
                    attempts: attempt,
                    message,
                });
            }

            let delay = self.retry.backoff_with_hint(retry, retry_after);
            warn!(
                %method,
                %url,
                attempt,
                error = %message,
                retry_in_ms = delay.as_millis() as u64,
                "Request to Janky failed, retrying"
            );
            sleep(delay).await;
            retry += 1;
        }
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> std::result::Result<ApiResponse, AttemptError> {
        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.credential.header_value());
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| AttemptError::Retriable {
            message: e.to_string(),
            retry_after: None,
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = response.text().await;

        if is_retriable_status(status) {
            let body = body.unwrap_or_default();
            return Err(AttemptError::Retriable {
                message: format!("HTTP {status}: {body}"),
                retry_after,
            });
        }

        match body {
            Ok(body) => Ok(ApiResponse { status, body }),
            Err(source) => Err(AttemptError::Fatal(Error::ResponseBody {
                url: url.to_string(),
                status: status.as_u16(),
                source,
            })),
        }
    }
}
