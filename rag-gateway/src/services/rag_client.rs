//! HTTP client for the upstream RAG service.
//!
//! Every method is a relay: it forwards a payload under a bounded timeout and
//! normalizes failures so that upstream error bodies never reach the client.
//! Sends run on detached tasks, so a client disconnect does not abort an
//! in-flight upstream call.

use crate::config::RagServiceConfig;
use crate::dtos::{ChatMessage, UploadResponse};
use gateway_core::error::AppError;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

pub struct RagClient {
    client: Client,
    probe_client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(settings: &RagServiceConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("HTTP client: {}", e)))?;
        let probe_client = Client::builder()
            .timeout(Duration::from_secs(settings.health_timeout_seconds))
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            probe_client,
            base_url: settings.url.clone(),
        })
    }

    /// Forward a spooled upload as multipart form data.
    ///
    /// The file is streamed from disk rather than buffered. It is opened
    /// before the send is detached, so the caller may delete the spool path
    /// as soon as this returns.
    pub async fn upload(
        &self,
        spool_path: &Path,
        original_name: &str,
    ) -> Result<UploadResponse, AppError> {
        let file = tokio::fs::File::open(spool_path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream(body)
            .file_name(original_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("multipart part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let client = self.client.clone();
        let url = format!("{}/upload", self.base_url);
        let task = tokio::spawn(async move {
            let response = client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| map_send_error("/upload", e))?;
            let response = check_status("/upload", response).await?;
            response.json::<UploadResponse>().await.map_err(|e| {
                tracing::error!(endpoint = "/upload", error = %e, "Invalid upstream response body");
                AppError::UpstreamFailed(anyhow::anyhow!("invalid upstream response: {}", e))
            })
        });

        task.await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("relay task: {}", e)))?
    }

    pub async fn ask(
        &self,
        question: &str,
        session_ids: &[String],
        chat_history: &[ChatMessage],
    ) -> Result<serde_json::Value, AppError> {
        self.relay_json(
            "/ask",
            json!({
                "question": question,
                "session_ids": session_ids,
                "chat_history": chat_history,
            }),
        )
        .await
    }

    pub async fn summarize(&self, session_ids: &[String]) -> Result<serde_json::Value, AppError> {
        self.relay_json("/summarize", json!({ "session_ids": session_ids }))
            .await
    }

    pub async fn compare(&self, session_ids: &[String]) -> Result<serde_json::Value, AppError> {
        self.relay_json("/compare", json!({ "session_ids": session_ids }))
            .await
    }

    /// Probe the upstream health endpoint with the short timeout.
    pub async fn health(&self) -> Result<(), AppError> {
        let url = format!("{}/healthz", self.base_url);
        let response = self
            .probe_client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_send_error("/healthz", e))?;

        check_status("/healthz", response).await.map(|_| ())
    }

    async fn relay_json(
        &self,
        endpoint: &'static str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let client = self.client.clone();
        let url = format!("{}{}", self.base_url, endpoint);
        let task = tokio::spawn(async move {
            let response = client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| map_send_error(endpoint, e))?;
            let response = check_status(endpoint, response).await?;
            response.json::<serde_json::Value>().await.map_err(|e| {
                tracing::error!(endpoint, error = %e, "Invalid upstream response body");
                AppError::UpstreamFailed(anyhow::anyhow!("invalid upstream response: {}", e))
            })
        });

        task.await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("relay task: {}", e)))?
    }
}

fn map_send_error(endpoint: &str, err: reqwest::Error) -> AppError {
    if err.is_connect() {
        tracing::error!(endpoint, error = %err, "RAG service unreachable");
        AppError::UpstreamUnavailable
    } else if err.is_timeout() {
        tracing::error!(endpoint, error = %err, "RAG service request timed out");
        AppError::UpstreamFailed(anyhow::anyhow!("upstream timeout"))
    } else {
        tracing::error!(endpoint, error = %err, "RAG service request failed");
        AppError::UpstreamFailed(anyhow::anyhow!("upstream request failed: {}", err))
    }
}

/// Treat non-2xx upstream responses as failures, logging the body locally.
async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable>".to_string());
    tracing::error!(endpoint, status = %status, body = %body, "RAG service returned an error");
    Err(AppError::UpstreamFailed(anyhow::anyhow!(
        "upstream returned {}",
        status
    )))
}
