//! Scripted [`MemoryApi`] for controller tests.

use super::{ApiError, ApiResult, CreateResponse, MemoryApi, UpdateRequest, UpdateResponse};
use crate::analysis;
use crate::model::{MemoryId, MemoryInput, MemoryRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(MemoryInput),
    List,
    Update(MemoryId, UpdateRequest),
    Delete(MemoryId),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    calls: Mutex<Vec<Call>>,
    create: Mutex<VecDeque<ApiResult<CreateResponse>>>,
    list: Mutex<VecDeque<ApiResult<Vec<MemoryRecord>>>>,
    update: Mutex<VecDeque<ApiResult<UpdateResponse>>>,
    delete: Mutex<VecDeque<ApiResult<()>>>,
    /// When set, `create` records the call and then waits here before answering.
    create_gate: Option<Arc<Notify>>,
    /// When set, timeline calls with no scripted answer never complete.
    stall_unscripted: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            create_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stall_unscripted: true,
            ..Self::default()
        }
    }

    pub fn on_create(&self, r: ApiResult<CreateResponse>) -> &Self {
        self.create.lock().unwrap().push_back(r);
        self
    }

    pub fn on_list(&self, r: ApiResult<Vec<MemoryRecord>>) -> &Self {
        self.list.lock().unwrap().push_back(r);
        self
    }

    pub fn on_update(&self, r: ApiResult<UpdateResponse>) -> &Self {
        self.update.lock().unwrap().push_back(r);
        self
    }

    pub fn on_delete(&self, r: ApiResult<()>) -> &Self {
        self.delete.lock().unwrap().push_back(r);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn answer<T>(&self, next: Option<ApiResult<T>>) -> ApiResult<T> {
        match next {
            Some(r) => r,
            None if self.stall_unscripted => futures::future::pending().await,
            None => unscripted(),
        }
    }
}

fn unscripted<T>() -> ApiResult<T> {
    Err(ApiError::Rejected {
        status: 500,
        message: Some("unscripted call".into()),
    })
}

#[async_trait]
impl MemoryApi for FakeApi {
    async fn create(&self, input: &MemoryInput) -> ApiResult<CreateResponse> {
        self.record(Call::Create(input.clone()));
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        let next = self.create.lock().unwrap().pop_front();
        next.unwrap_or_else(unscripted)
    }

    async fn list(&self) -> ApiResult<Vec<MemoryRecord>> {
        self.record(Call::List);
        let next = self.list.lock().unwrap().pop_front();
        self.answer(next).await
    }

    async fn update(&self, id: &MemoryId, req: &UpdateRequest) -> ApiResult<UpdateResponse> {
        self.record(Call::Update(id.clone(), req.clone()));
        let next = self.update.lock().unwrap().pop_front();
        self.answer(next).await
    }

    async fn delete(&self, id: &MemoryId) -> ApiResult<()> {
        self.record(Call::Delete(id.clone()));
        let next = self.delete.lock().unwrap().pop_front();
        self.answer(next).await
    }
}

pub(crate) fn created(gpt_analysis: Value, image_url: Option<&str>) -> ApiResult<CreateResponse> {
    Ok(CreateResponse {
        memory_id: Some(MemoryId::new("1")),
        analysis: analysis::normalize(&gpt_analysis),
        gpt_analysis,
        image_url: image_url.map(str::to_string),
    })
}

pub(crate) fn rejected<T>(message: Option<&str>) -> ApiResult<T> {
    Err(ApiError::Rejected {
        status: 200,
        message: message.map(str::to_string),
    })
}

/// A transport-class failure; malformed JSON is classified like a network error.
pub(crate) fn transport_failure<T>() -> ApiResult<T> {
    let err = serde_json::from_str::<Value>("{").unwrap_err();
    Err(ApiError::Decode(err))
}

pub(crate) fn record(id: &str, text: &str, date: &str, gpt_analysis: Value, image_url: Option<&str>) -> MemoryRecord {
    MemoryRecord {
        id: MemoryId::new(id),
        text: text.into(),
        date: date.into(),
        image_url: image_url.map(str::to_string),
        analysis: analysis::normalize(&gpt_analysis),
        gpt_analysis,
    }
}
