//! Backend access.
//!
//! The four REST calls the client needs sit behind [`MemoryApi`] so the controllers can be
//! driven by a fake in tests.

mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpMemoryApi;

use crate::analysis::AnalysisView;
use crate::model::{MemoryId, MemoryInput, MemoryRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Value of `status` the backend uses to signal an application-level success.
pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(
        "server rejected request (HTTP {status}): {}",
        .message.as_deref().unwrap_or("no message")
    )]
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl ApiError {
    /// The request never produced a usable answer (network failure or unreadable body).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Decode(_))
    }

    /// Message the server attached to a rejection, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of `PUT /memory/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub text: String,
    pub date: String,
    pub gpt_analysis: Value,
}

/// Successful `POST /memory/create` answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateResponse {
    pub memory_id: Option<MemoryId>,
    pub gpt_analysis: Value,
    #[serde(skip)]
    pub analysis: AnalysisView,
    pub image_url: Option<String>,
}

/// Successful `PUT /memory/{id}` answer. `image_url` is present when the server
/// regenerated the picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResponse {
    pub image_url: Option<String>,
}

#[async_trait]
pub trait MemoryApi: Send + Sync {
    async fn create(&self, input: &MemoryInput) -> ApiResult<CreateResponse>;

    async fn list(&self) -> ApiResult<Vec<MemoryRecord>>;

    async fn update(&self, id: &MemoryId, req: &UpdateRequest) -> ApiResult<UpdateResponse>;

    async fn delete(&self, id: &MemoryId) -> ApiResult<()>;
}
