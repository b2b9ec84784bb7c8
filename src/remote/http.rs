//! HTTP client for the wellness backend.
//!
//! Scenario content comes from `POST {base}/quiz/generate` and finished
//! sessions go to `POST {base}/session`.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    error::{EngineError, EngineResult},
    models::{Scenario, SubmissionReceipt, SubmissionRequest},
};

use super::{ScenarioProvider, SessionSubmitter};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    context: &'a str,
}

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ScenarioProvider for HttpBackend {
    async fn fetch_scenarios(&self, context: &str) -> EngineResult<Vec<Scenario>> {
        let response = self
            .client
            .post(self.url("quiz/generate"))
            .json(&GenerateRequest { context })
            .send()
            .await
            .map_err(|e| EngineError::ContentUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::ContentUnavailable(format!(
                "quiz generation returned status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<Scenario>>()
            .await
            .map_err(|e| EngineError::ContentUnavailable(format!("malformed scenarios: {e}")))
    }
}

#[async_trait]
impl SessionSubmitter for HttpBackend {
    async fn submit(&self, request: &SubmissionRequest) -> EngineResult<SubmissionReceipt> {
        let response = self
            .client
            .post(self.url("session"))
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::SubmissionFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::SubmissionFailure(format!(
                "session endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json::<SubmissionReceipt>()
            .await
            .map_err(|e| EngineError::SubmissionFailure(format!("unexpected receipt: {e}")))
    }
}
