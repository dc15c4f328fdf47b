use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Error body shape the customer API uses for failures.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Thin JSON client for the customer API: base URL, request timeout, and,
/// once signed in, the bearer token attached to every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()
            .expect("reqwest client");

        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    /// Attach the session token sent with subsequent requests.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", "insights-cli/0.1");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.or(body.message))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::debug!("GET {url} failed with {status}: {message}");
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
