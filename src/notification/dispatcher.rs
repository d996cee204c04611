//! Notification dispatcher task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::NotificationSink;
use crate::types::TransitionNotice;

/// Spawns the task that forwards notices from `rx` to `sink`.
///
/// Each notice is delivered on the blocking pool and never awaited. The task
/// ends when every sender has been dropped.
pub fn spawn_dispatcher(
    mut rx: mpsc::UnboundedReceiver<TransitionNotice>,
    sink: Arc<dyn NotificationSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = rx.recv().await {
            debug!(
                request_id = %notice.id,
                kind = notice.kind.as_str(),
                "Dispatching notification"
            );
            let sink = Arc::clone(&sink);
            // Detached: dropping the handle does not cancel the delivery
            drop(tokio::task::spawn_blocking(move || deliver(sink.as_ref(), &notice)));
        }
        debug!("Notification dispatcher stopped");
    })
}

fn deliver(sink: &dyn NotificationSink, notice: &TransitionNotice) {
    match sink.notify(notice) {
        Ok(()) => debug!(request_id = %notice.id, "Notification delivered"),
        Err(e) => warn!(
            request_id = %notice.id,
            kind = notice.kind.as_str(),
            "Notification failed: {} ({})",
            e,
            e.suggestion()
        ),
    }
}
