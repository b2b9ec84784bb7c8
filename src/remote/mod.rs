//! Collaborators outside the engine: where scenarios come from and where the
//! finished record goes.

pub mod http;

use async_trait::async_trait;

use crate::{
    error::EngineResult,
    models::{Scenario, SubmissionReceipt, SubmissionRequest},
};

pub use http::HttpBackend;

#[async_trait]
pub trait ScenarioProvider: Send + Sync {
    /// May return fewer scenarios than needed; the engine falls back itself.
    async fn fetch_scenarios(&self, context: &str) -> EngineResult<Vec<Scenario>>;
}

#[async_trait]
pub trait SessionSubmitter: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> EngineResult<SubmissionReceipt>;
}
