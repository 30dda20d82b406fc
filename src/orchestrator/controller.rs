//! Session command loop.
//!
//! Owns both controllers for the lifetime of the UI and turns UI commands into controller
//! calls. Events flow back to the presentation layer on the shared event channel.

use crate::api::MemoryApi;
use crate::controller::{SubmissionController, SubmitOutcome, TimelineController};
use crate::messages;
use crate::model::{AppConfig, AppEvent, MemoryId, Notice, PendingAction};
use anyhow::Result;
use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit { text: String, date: String },
    Retry,
    Reload,
    Select(MemoryId),
    OpenEditor,
    SaveEdit { text: String, date: String },
    Delete,
    Confirm(PendingAction),
    /// Write the cached records to the given file.
    Export(PathBuf),
    Quit,
}

/// Run the session until the UI quits or drops its command sender.
pub(crate) async fn run_controller<A: MemoryApi + 'static>(
    api: Arc<A>,
    cfg: &AppConfig,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let submission = SubmissionController::new(api.clone(), event_tx.clone(), cfg.require_date);
    let mut timeline = TimelineController::new(api, event_tx.clone());

    // Commands that arrived while a timeline request was pending.
    let mut deferred: VecDeque<UiCommand> = VecDeque::new();

    // Submissions run on their own task so the UI keeps receiving events while a create
    // request is pending; timeline requests are awaited here, one at a time.
    let mut in_flight: Option<JoinHandle<SubmitOutcome>> = None;

    // Failures are already reported to the UI as events.
    let mut running = until_quit(timeline.load_all(), &mut cmd_rx, &mut deferred).await;

    while running {
        let cmd = match deferred.pop_front() {
            Some(cmd) => Some(cmd),
            None => tokio::select! {
                cmd = cmd_rx.recv() => cmd,
                // Keep the JoinHandle in place until this branch wins so completion is observed.
                done = async {
                    if let Some(h) = in_flight.as_mut() {
                        return h.await;
                    }
                    futures::future::pending().await
                } => {
                    in_flight = None;
                    match done {
                        Ok(SubmitOutcome::Completed(Ok(_))) => info!("memory restored"),
                        Ok(outcome) => debug!(?outcome, "submission finished"),
                        Err(e) => warn!("submission task failed: {e}"),
                    }
                    continue;
                }
            },
        };

        match cmd {
            Some(UiCommand::Submit { text, date }) => {
                if submission_pending(&in_flight, &submission) {
                    debug!("submit ignored, request in flight");
                    continue;
                }
                let ctl = submission.clone();
                in_flight = Some(tokio::spawn(async move { ctl.submit(&text, &date).await }));
            }
            Some(UiCommand::Retry) => {
                if submission_pending(&in_flight, &submission) {
                    debug!("retry ignored, request in flight");
                    continue;
                }
                let ctl = submission.clone();
                in_flight = Some(tokio::spawn(async move { ctl.retry().await }));
            }
            Some(UiCommand::Reload) => {
                running = until_quit(timeline.load_all(), &mut cmd_rx, &mut deferred).await;
            }
            Some(UiCommand::Select(id)) => {
                timeline.select(&id);
            }
            Some(UiCommand::OpenEditor) => {
                timeline.open_editor();
            }
            Some(UiCommand::SaveEdit { text, date }) => {
                timeline.prepare_edit(&text, &date);
            }
            Some(UiCommand::Delete) => {
                timeline.prepare_delete();
            }
            Some(UiCommand::Confirm(action)) => {
                running = until_quit(timeline.commit(action), &mut cmd_rx, &mut deferred).await;
            }
            Some(UiCommand::Export(path)) => {
                let notice = match crate::export::export_json(&path, timeline.memories()) {
                    Ok(()) => {
                        info!(path = %path.display(), "timeline exported");
                        Notice::info(format!(
                            "{}{}",
                            messages::EXPORT_DONE_PREFIX,
                            path.display()
                        ))
                    }
                    Err(e) => {
                        warn!("timeline export failed: {e:#}");
                        Notice::error(format!("{}{e:#}", messages::EXPORT_FAILED_PREFIX))
                    }
                };
                let _ = event_tx.send(AppEvent::Notice(notice));
            }
            Some(UiCommand::Quit) | None => running = false,
        }
    }

    if let Some(h) = in_flight.take() {
        h.abort();
    }
    Ok(())
}

/// Drive a timeline request while still watching for quit.
///
/// Other commands are queued and handled once the request settles. Returns false when the
/// UI quit or went away, dropping the request.
async fn until_quit<F: Future>(
    request: F,
    cmd_rx: &mut UnboundedReceiver<UiCommand>,
    deferred: &mut VecDeque<UiCommand>,
) -> bool {
    tokio::pin!(request);
    loop {
        tokio::select! {
            biased;
            _ = &mut request => return true,
            cmd = cmd_rx.recv() => match cmd {
                Some(UiCommand::Quit) | None => {
                    debug!("session ended with a timeline request pending");
                    return false;
                }
                Some(cmd) => deferred.push_back(cmd),
            },
        }
    }
}

fn submission_pending<A: MemoryApi>(
    in_flight: &Option<JoinHandle<SubmitOutcome>>,
    submission: &SubmissionController<A>,
) -> bool {
    submission.is_submitting() || in_flight.as_ref().is_some_and(|h| !h.is_finished())
}
