//! Trailing-edge debounce between builder edits and mapping evaluation.
//!
//! Every edit pushes the latest field list. Removals are purged right away;
//! evaluation only runs once no edit has arrived for `settle_delay`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::service::SuggestionService;
use super::MappingError;
use crate::models::{FormField, Mapping};

#[derive(Debug)]
enum Command {
    Snapshot {
        fields: Vec<FormField>,
        confirmed: Vec<Mapping>,
    },
    Flush,
}

/// Handle for the background settle task. Dropping it stops the task.
pub struct SettleScheduler {
    service: SuggestionService,
    tx: mpsc::UnboundedSender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl SettleScheduler {
    /// Spawn the settle loop on the current tokio runtime.
    pub fn spawn(service: SuggestionService, settle_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let loop_service = service.clone();
        let handle = tokio::spawn(async move {
            tracing::debug!(settle_ms = settle_delay.as_millis() as u64, "Settle scheduler started");
            settle_loop(loop_service, rx, settle_delay).await;
            tracing::debug!("Settle scheduler stopped");
        });

        Self {
            service,
            tx,
            handle: Some(handle),
        }
    }

    /// Record an edit. Restarts the quiet period.
    pub fn notify(&self, fields: Vec<FormField>, confirmed: Vec<Mapping>) -> Result<(), MappingError> {
        self.service.observe_fields(&fields)?;
        self.send(Command::Snapshot { fields, confirmed })
    }

    /// Settle the pending snapshot now (explicit commit from the UI).
    pub fn flush(&self) -> Result<(), MappingError> {
        self.send(Command::Flush)
    }

    pub fn service(&self) -> &SuggestionService {
        &self.service
    }

    /// Stop accepting edits; a pending snapshot is settled before the task exits.
    pub async fn shutdown(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Closing the channel ends the loop once queued commands are drained
        let (closed_tx, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.tx, closed_tx));
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Settle scheduler task ended abnormally");
        }
    }

    fn send(&self, command: Command) -> Result<(), MappingError> {
        self.tx
            .send(command)
            .map_err(|_| MappingError::Config("Settle scheduler is not running".into()))
    }
}

impl Drop for SettleScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn settle_loop(
    service: SuggestionService,
    mut rx: mpsc::UnboundedReceiver<Command>,
    settle_delay: Duration,
) {
    let mut pending: Option<(Vec<FormField>, Vec<Mapping>)> = None;

    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(settle_delay, rx.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(_) => {
                    if let Some((fields, confirmed)) = pending.take() {
                        service.on_fields_settled(fields, confirmed);
                    }
                    continue;
                }
            }
        } else {
            match rx.recv().await {
                Some(command) => command,
                None => break,
            }
        };

        match command {
            Command::Snapshot { fields, confirmed } => pending = Some((fields, confirmed)),
            Command::Flush => {
                if let Some((fields, confirmed)) = pending.take() {
                    service.on_fields_settled(fields, confirmed);
                }
            }
        }
    }

    if let Some((fields, confirmed)) = pending.take() {
        if let Err(e) = service.evaluate(&fields, &confirmed).await {
            tracing::error!(error = %e, "Final mapping evaluation failed");
        }
    }
}
