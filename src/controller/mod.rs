//! Session controllers.
//!
//! Each controller owns the state that belongs to one screen and reports every visible
//! effect as an [`AppEvent`](crate::model::AppEvent) so presentation layers stay dumb.

mod submission;
mod timeline;

pub use submission::{SubmissionController, SubmitOutcome};
pub use timeline::TimelineController;

/// Collect every event already queued on `rx`.
pub(crate) fn drain_events(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<crate::model::AppEvent>,
) -> Vec<crate::model::AppEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}
