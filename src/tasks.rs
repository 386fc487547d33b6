use crate::{events::AppEvent, panel::PendingCall};
use tokio::sync::mpsc;

pub type EventSender = mpsc::Sender<AppEvent>;

/// Resolves a started call in the background and hands the completion back
/// to the main loop. If the loop is gone the completion is dropped, which
/// still releases its busy slot.
pub fn spawn_call(call: PendingCall, tx: EventSender) {
    tokio::spawn(async move {
        let completion = call.resolve().await;
        let _ = tx.send(AppEvent::CallCompleted(completion)).await;
    });
}
