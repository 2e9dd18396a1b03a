use crate::{ScanCommand, ScanUpdate};
use scan_library::{CaptureSession, Catalog, GestureEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Start [`worker_task`] on the current runtime and hand back its channels
pub fn spawn_worker(
    session: CaptureSession,
    catalog: Arc<Catalog>,
) -> (
    mpsc::UnboundedSender<ScanCommand>,
    mpsc::UnboundedReceiver<ScanUpdate>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(worker_task(command_rx, update_tx, session, catalog));
    (command_tx, update_rx, handle)
}

/// Async worker task that processes scan commands and sends updates
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<ScanCommand>,
    update_tx: mpsc::UnboundedSender<ScanUpdate>,
    mut session: CaptureSession,
    catalog: Arc<Catalog>,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut session, &catalog, &mut command_rx, &update_tx).await;
    }
    log::debug!("Command channel closed, scan worker exiting");
}

async fn process_command(
    cmd: ScanCommand,
    session: &mut CaptureSession,
    catalog: &Catalog,
    command_rx: &mut mpsc::UnboundedReceiver<ScanCommand>,
    update_tx: &mpsc::UnboundedSender<ScanUpdate>,
) {
    match cmd {
        ScanCommand::StartCapture => {
            let result = session.start_capture();
            report_session(result, session, update_tx);
        }
        ScanCommand::Deliver { image } => {
            let result = session.deliver(image);
            report_session(result, session, update_tx);
        }
        ScanCommand::CancelCapture => {
            let result = session.cancel_capture();
            report_session(result, session, update_tx);
        }
        ScanCommand::Discard => {
            let result = session.discard();
            report_session(result, session, update_tx);
        }
        ScanCommand::Gesture(event) => {
            let mut applied = apply_gesture(session, event, update_tx);

            // Fold in gestures that queued up meanwhile so the preview is
            // re-rendered once per batch
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let ScanCommand::Gesture(event) = next_cmd {
                    log::debug!("Coalescing queued gesture into current batch");
                    applied |= apply_gesture(session, event, update_tx);
                } else {
                    // Publish the batch before handling what came after it
                    if applied {
                        send_session(session, update_tx);
                    }
                    Box::pin(process_command(
                        next_cmd, session, catalog, command_rx, update_tx,
                    ))
                    .await;
                    return;
                }
            }

            if applied {
                send_session(session, update_tx);
            }
        }
        ScanCommand::Save => {
            match session.save(catalog).await {
                Ok(entry) => {
                    let _ = update_tx.send(ScanUpdate::Saved { entry });
                }
                Err(e) => send_error(format!("Failed to save document: {}", e), update_tx),
            }
            send_session(session, update_tx);
        }
        ScanCommand::Rename { id, new_name } => match catalog.rename(&id, &new_name).await {
            Ok(entry) => {
                let _ = update_tx.send(ScanUpdate::Renamed { old_id: id, entry });
            }
            Err(e) => send_error(format!("Failed to rename {}: {}", id, e), update_tx),
        },
        ScanCommand::Delete { id } => match catalog.delete(&id).await {
            Ok(outcome) => {
                let _ = update_tx.send(ScanUpdate::Deleted { id, outcome });
            }
            Err(e) => send_error(format!("Failed to delete {}: {}", id, e), update_tx),
        },
        ScanCommand::Refresh => match catalog.refresh().await {
            Ok(entries) => {
                let _ = update_tx.send(ScanUpdate::CatalogRefreshed { entries });
            }
            Err(e) => send_error(format!("Failed to refresh catalog: {}", e), update_tx),
        },
        ScanCommand::PageCount { id } => match catalog.page_count(&id).await {
            Ok(count) => {
                let _ = update_tx.send(ScanUpdate::PageCount { id, count });
            }
            Err(e) => send_error(format!("Failed to read {}: {}", id, e), update_tx),
        },
        ScanCommand::Thumbnail { id, max_edge } => {
            match catalog.thumbnail(&id, max_edge).await {
                Ok(image) => {
                    let _ = update_tx.send(ScanUpdate::Thumbnail { id, image });
                }
                Err(e) => send_error(
                    format!("Failed to render thumbnail for {}: {}", id, e),
                    update_tx,
                ),
            }
        }
    }
}

fn apply_gesture(
    session: &mut CaptureSession,
    event: GestureEvent,
    update_tx: &mpsc::UnboundedSender<ScanUpdate>,
) -> bool {
    match session.apply(event) {
        Ok(()) => true,
        Err(e) => {
            send_error(e.to_string(), update_tx);
            false
        }
    }
}

fn report_session(
    result: scan_library::Result<()>,
    session: &CaptureSession,
    update_tx: &mpsc::UnboundedSender<ScanUpdate>,
) {
    match result {
        Ok(()) => send_session(session, update_tx),
        Err(e) => send_error(e.to_string(), update_tx),
    }
}

fn send_session(session: &CaptureSession, update_tx: &mpsc::UnboundedSender<ScanUpdate>) {
    let _ = update_tx.send(ScanUpdate::SessionChanged {
        phase: session.phase(),
        transform: session.transform_state().cloned(),
        preview: session.current_preview().cloned(),
    });
}

fn send_error(message: String, update_tx: &mpsc::UnboundedSender<ScanUpdate>) {
    log::warn!("{}", message);
    let _ = update_tx.send(ScanUpdate::Error { message });
}
