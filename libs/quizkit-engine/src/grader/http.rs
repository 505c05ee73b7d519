//! HTTP client for a remote grading service.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use super::{GradeError, GradeRequest, GradeResponse, SemanticGrader};

/// Posts grading requests as JSON to a single endpoint.
pub struct HttpGrader {
    client: Client,
    endpoint: String,
}

impl HttpGrader {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GradeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GradeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SemanticGrader for HttpGrader {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(endpoint = %self.endpoint))]
    async fn grade(&self, request: &GradeRequest) -> Result<GradeResponse, GradeError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| GradeError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GradeError::Backend { status, message });
        }

        let response: GradeResponse = resp
            .json()
            .await
            .map_err(|e| GradeError::Parse(e.to_string()))?;

        if let Some(score) = response.score {
            if !(0.0..=1.0).contains(&score) {
                return Err(GradeError::Parse(format!("score out of range: {score}")));
            }
        }

        Ok(response)
    }
}
