//! HTTP backend over reqwest.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::Backend;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    ActionReply, FilterTemplate, HistoryResponse, QueryRequest, QueryResponse, Schedule,
    TaskStatus,
};

/// Client for the screening service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client from a validated [`Config`].
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(http, config.base_url.clone()))
    }

    /// Uses a caller-provided client (for custom TLS or proxies).
    pub fn with_client(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        debug!(path, "POST");
        let mut builder = self.request(Method::POST, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "(no body)".into());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn query_stocks(&self, req: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.post("/stocks/query", Some(req)).await
    }

    async fn history(&self, code: &str) -> Result<HistoryResponse, ApiError> {
        self.get(&format!("/history/{}", urlencoding::encode(code)))
            .await
    }

    async fn templates(&self) -> Result<Vec<FilterTemplate>, ApiError> {
        self.get("/templates").await
    }

    async fn save_template(&self, template: &FilterTemplate) -> Result<ActionReply, ApiError> {
        self.post("/templates", Some(template)).await
    }

    async fn delete_template(&self, name: &str) -> Result<ActionReply, ApiError> {
        let path = format!("/templates/{}", urlencoding::encode(name));
        debug!(path, "DELETE");
        self.send(self.request(Method::DELETE, &path)).await
    }

    async fn schedule(&self) -> Result<Schedule, ApiError> {
        self.get("/schedule").await
    }

    async fn set_schedule(&self, schedule: &Schedule) -> Result<ActionReply, ApiError> {
        self.post("/schedule", Some(schedule)).await
    }

    async fn trigger_crawl(&self) -> Result<ActionReply, ApiError> {
        self.get("/trigger_crawl").await
    }

    async fn stop_crawl(&self) -> Result<ActionReply, ApiError> {
        self.post::<(), _>("/stop_crawl", None).await
    }

    async fn recalculate(&self) -> Result<ActionReply, ApiError> {
        self.post::<(), _>("/recalculate", None).await
    }

    async fn restart(&self) -> Result<ActionReply, ApiError> {
        match self.post::<(), ActionReply>("/restart", None).await {
            Ok(reply) => Ok(reply),
            // The reload can cut the connection before the reply is written.
            Err(ApiError::Transport(e)) => {
                warn!(error = %e, "restart request lost its connection");
                Ok(ActionReply::ok("restart requested"))
            }
            Err(e) => Err(e),
        }
    }

    async fn status(&self) -> Result<TaskStatus, ApiError> {
        self.get("/status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let backend = HttpBackend::with_client(Client::new(), "http://localhost:8000/api/".into());
        assert_eq!(backend.base_url(), "http://localhost:8000/api");
        assert_eq!(backend.url("/status"), "http://localhost:8000/api/status");
    }

    #[test]
    fn builds_from_config() {
        let backend = HttpBackend::new(&Config::default()).unwrap();
        assert_eq!(backend.name(), crate::config::DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let backend = HttpBackend::with_client(Client::new(), "http://127.0.0.1:9/api".into());
        match backend.status().await {
            Err(ApiError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
