use super::{
    ApiError, ApiResult, CreateResponse, MemoryApi, UpdateRequest, UpdateResponse, STATUS_SUCCESS,
};
use crate::analysis;
use crate::model::{AppConfig, MemoryId, MemoryInput, MemoryRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::debug;

/// reqwest-backed client for the memory service.
#[derive(Debug, Clone)]
pub struct HttpMemoryApi {
    http: reqwest::Client,
    create_url: Url,
    all_url: Url,
    /// `<base>/memory/`, record ids are appended as a path segment.
    memory_url: Url,
}

impl HttpMemoryApi {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let mut base = Url::parse(cfg.base_url.trim())
            .with_context(|| format!("invalid base URL: {}", cfg.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("base URL must be http(s): {}", cfg.base_url);
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self {
            http,
            create_url: base.join("memory/create").context("build create URL")?,
            all_url: base.join("memory/all").context("build list URL")?,
            memory_url: base.join("memory/").context("build record URL")?,
        })
    }

    fn record_url(&self, id: &MemoryId) -> Url {
        let mut url = self.memory_url.clone();
        // http(s) URLs always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str());
        }
        url
    }
}

/// Read the whole body as JSON. An unreadable body is a transport-class failure even when
/// the HTTP status is an error, because there is no server message to show.
async fn read_json(resp: reqwest::Response) -> ApiResult<(StatusCode, Value)> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let body = serde_json::from_slice(&bytes)?;
    Ok((status, body))
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Success requires both an OK HTTP status and `status: "success"` in the body.
fn check_envelope(status: StatusCode, body: &Value) -> ApiResult<()> {
    let app_status = body.get("status").and_then(Value::as_str);
    if status.is_success() && app_status == Some(STATUS_SUCCESS) {
        Ok(())
    } else {
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: server_message(body),
        })
    }
}

fn image_url(body: &Value) -> Option<String> {
    body.get("image_url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl MemoryApi for HttpMemoryApi {
    async fn create(&self, input: &MemoryInput) -> ApiResult<CreateResponse> {
        debug!(url = %self.create_url, "POST memory");
        let resp = self
            .http
            .post(self.create_url.clone())
            .json(input)
            .send()
            .await?;
        let (status, body) = read_json(resp).await?;
        check_envelope(status, &body)?;

        let gpt_analysis = body.get("gpt_analysis").cloned().unwrap_or(Value::Null);
        let memory_id = body
            .get("memory_id")
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value::<MemoryId>(v.clone()).ok());
        Ok(CreateResponse {
            memory_id,
            analysis: analysis::normalize(&gpt_analysis),
            gpt_analysis,
            image_url: image_url(&body),
        })
    }

    async fn list(&self) -> ApiResult<Vec<MemoryRecord>> {
        debug!(url = %self.all_url, "GET memories");
        let resp = self.http.get(self.all_url.clone()).send().await?;
        let (status, body) = read_json(resp).await?;
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: server_message(&body),
            });
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn update(&self, id: &MemoryId, req: &UpdateRequest) -> ApiResult<UpdateResponse> {
        let url = self.record_url(id);
        debug!(%url, "PUT memory");
        let resp = self.http.put(url).json(req).send().await?;
        let (status, body) = read_json(resp).await?;
        check_envelope(status, &body)?;
        Ok(UpdateResponse {
            image_url: image_url(&body),
        })
    }

    async fn delete(&self, id: &MemoryId) -> ApiResult<()> {
        let url = self.record_url(id);
        debug!(%url, "DELETE memory");
        let resp = self.http.delete(url).send().await?;
        let (status, body) = read_json(resp).await?;
        check_envelope(status, &body)
    }
}
