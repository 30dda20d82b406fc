use crate::api::{ApiError, ApiResult, MemoryApi, UpdateRequest};
use crate::messages;
use crate::model::{
    AppEvent, Card, Detail, MemoryId, MemoryRecord, Notice, PendingAction, PendingDelete,
    PendingEdit,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// Owns the cached record list and the current selection.
///
/// The cache is never re-fetched after a mutation; each successful update or delete is
/// mirrored into it from the request and response.
pub struct TimelineController<A> {
    api: Arc<A>,
    event_tx: UnboundedSender<AppEvent>,
    memories: Vec<MemoryRecord>,
    selected: Option<MemoryId>,
}

impl<A: MemoryApi> TimelineController<A> {
    pub fn new(api: Arc<A>, event_tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            api,
            event_tx,
            memories: Vec::new(),
            selected: None,
        }
    }

    pub fn memories(&self) -> &[MemoryRecord] {
        &self.memories
    }

    /// Cards for the cached list, in server order.
    pub fn cards(&self) -> Vec<Card> {
        self.memories.iter().map(MemoryRecord::card).collect()
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<&MemoryId> {
        self.selected.as_ref()
    }

    fn emit(&self, ev: AppEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn notify(&self, notice: Notice) {
        self.emit(AppEvent::Notice(notice));
    }

    fn find(&self, id: &MemoryId) -> Option<&MemoryRecord> {
        self.memories.iter().find(|m| &m.id == id)
    }

    fn selected_record(&self) -> Option<&MemoryRecord> {
        self.selected.as_ref().and_then(|id| self.find(id))
    }

    /// Fetch every record and render the list. Returns the number of records.
    pub async fn load_all(&mut self) -> ApiResult<usize> {
        match self.api.list().await {
            Ok(records) => {
                self.memories = records;
                if self.selected_record().is_none() {
                    self.selected = None;
                }
                if self.memories.is_empty() {
                    self.emit(AppEvent::TimelineEmpty {
                        message: messages::TIMELINE_EMPTY.to_string(),
                    });
                } else {
                    self.emit(AppEvent::TimelineLoaded {
                        cards: self.cards(),
                    });
                }
                info!(count = self.memories.len(), "timeline loaded");
                Ok(self.memories.len())
            }
            Err(e) => {
                error!(error = %e, "timeline load failed");
                self.memories.clear();
                self.selected = None;
                self.emit(AppEvent::TimelineLoadFailed {
                    message: messages::TIMELINE_LOAD_FAILED.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Open the detail view for a card and remember it as the mutation target.
    pub fn select(&mut self, id: &MemoryId) -> Option<Detail> {
        let Some(detail) = self.find(id).map(MemoryRecord::detail) else {
            self.notify(Notice::warning(messages::NOTHING_SELECTED));
            return None;
        };
        self.selected = Some(id.clone());
        self.emit(AppEvent::DetailOpened(detail.clone()));
        Some(detail)
    }

    /// Open the editor prefilled with the selected record.
    pub fn open_editor(&self) -> Option<(String, String)> {
        let Some(record) = self.selected_record() else {
            self.notify(Notice::warning(messages::NOTHING_SELECTED));
            return None;
        };
        let (text, date) = (record.text.clone(), record.date.clone());
        self.emit(AppEvent::EditOpened {
            text: text.clone(),
            date: date.clone(),
        });
        Some((text, date))
    }

    /// Validate an edit of the selected record and ask for confirmation.
    pub fn prepare_edit(&self, text: &str, date: &str) -> Option<PendingAction> {
        let Some(id) = self.selected.clone() else {
            self.notify(Notice::warning(messages::NOTHING_TO_EDIT));
            return None;
        };
        let text = text.trim();
        let date = date.trim();
        if text.is_empty() || date.is_empty() {
            self.notify(Notice::warning(messages::EDIT_FIELDS_REQUIRED));
            return None;
        }
        let action = PendingAction::Edit(PendingEdit {
            id,
            text: text.to_string(),
            date: date.to_string(),
        });
        self.emit(AppEvent::ConfirmRequested {
            prompt: messages::CONFIRM_EDIT.to_string(),
            action: action.clone(),
        });
        Some(action)
    }

    /// Ask for confirmation before deleting the selected record.
    pub fn prepare_delete(&self) -> Option<PendingAction> {
        let Some(id) = self.selected.clone() else {
            self.notify(Notice::warning(messages::NOTHING_TO_DELETE));
            return None;
        };
        let action = PendingAction::Delete(PendingDelete { id });
        self.emit(AppEvent::ConfirmRequested {
            prompt: messages::CONFIRM_DELETE.to_string(),
            action: action.clone(),
        });
        Some(action)
    }

    /// Execute a mutation the user confirmed.
    pub async fn commit(&mut self, action: PendingAction) -> ApiResult<()> {
        match action {
            PendingAction::Edit(edit) => self.commit_edit(edit).await,
            PendingAction::Delete(delete) => self.commit_delete(delete).await,
        }
    }

    pub async fn commit_edit(&mut self, edit: PendingEdit) -> ApiResult<()> {
        let req = UpdateRequest {
            text: edit.text.clone(),
            date: edit.date.clone(),
            gpt_analysis: resend_payload(self.find(&edit.id)),
        };

        let resp = match self.api.update(&edit.id, &req).await {
            Ok(resp) => resp,
            Err(e) => {
                self.report_failure(
                    &e,
                    messages::EDIT_FAILED_PREFIX,
                    messages::EDIT_TRANSPORT_ERROR,
                );
                return Err(e);
            }
        };

        if let Some(record) = self.memories.iter_mut().find(|m| m.id == edit.id) {
            record.text = edit.text.clone();
            record.date = edit.date.clone();
            if let Some(url) = resp.image_url.as_ref() {
                record.image_url = Some(url.clone());
            }
        }
        info!(id = %edit.id, new_image = resp.image_url.is_some(), "memory updated");

        self.notify(Notice::info(messages::EDIT_DONE));
        self.emit(AppEvent::CardPatched {
            id: edit.id,
            text: edit.text,
            date: edit.date,
            image_url: resp.image_url,
        });
        self.emit(AppEvent::DetailClosed);
        Ok(())
    }

    pub async fn commit_delete(&mut self, delete: PendingDelete) -> ApiResult<()> {
        if let Err(e) = self.api.delete(&delete.id).await {
            self.report_failure(
                &e,
                messages::DELETE_FAILED_PREFIX,
                messages::DELETE_TRANSPORT_ERROR,
            );
            return Err(e);
        }

        self.memories.retain(|m| m.id != delete.id);
        if self.selected.as_ref() == Some(&delete.id) {
            self.selected = None;
        }
        info!(id = %delete.id, "memory deleted");

        self.notify(Notice::info(messages::DELETE_DONE));
        self.emit(AppEvent::CardRemoved { id: delete.id });
        self.emit(AppEvent::DetailClosed);
        if self.memories.is_empty() {
            self.emit(AppEvent::TimelineEmpty {
                message: messages::TIMELINE_EMPTY.to_string(),
            });
        }
        Ok(())
    }

    fn report_failure(&self, e: &ApiError, prefix: &str, transport_message: &str) {
        if e.is_transport() {
            error!(error = %e, "timeline mutation failed");
            self.notify(Notice::error(transport_message));
        } else {
            warn!(error = %e, "timeline mutation rejected");
            let reason = e.server_message().unwrap_or(messages::GENERIC_FAILURE);
            self.notify(Notice::error(format!("{prefix}{reason}")));
        }
    }
}

/// The analysis is resent untouched; a missing one goes out as an empty object.
fn resend_payload(record: Option<&MemoryRecord>) -> Value {
    record
        .map(|m| m.gpt_analysis.clone())
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| json!({}))
}
