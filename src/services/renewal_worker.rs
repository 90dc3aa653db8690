//! Background execution of confirmation-code renewals.
//!
//! Resend requests are turned into [`RenewalCommand`]s and pushed onto a
//! bounded channel. The caller never waits on the renewal itself; the
//! [`RenewalWorker`] drains the channel and logs every outcome so failures
//! stay visible to operators.

use crate::services::confirmation_service::{ConfirmationService, RenewalOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalCommand {
    pub user_id: i64,
}

/// Cloneable handle for enqueueing renewals.
#[derive(Clone)]
pub struct RenewalQueue {
    sender: mpsc::Sender<RenewalCommand>,
}

impl RenewalQueue {
    /// Start a worker bound to `service` and return the queue feeding it.
    ///
    /// The worker exits once every queue handle has been dropped.
    pub fn spawn(service: Arc<ConfirmationService>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(RenewalWorker::new(service).run(receiver));
        (Self { sender }, handle)
    }

    /// Enqueue a renewal without waiting for it to run.
    ///
    /// Returns `false` when the queue is full or the worker has stopped; the
    /// request is dropped in that case.
    pub fn request(&self, user_id: i64) -> bool {
        match self.sender.try_send(RenewalCommand { user_id }) {
            Ok(()) => {
                tracing::debug!(user_id, "Renewal queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id, "Renewal queue full, request dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!(user_id, "Renewal worker stopped, request dropped");
                false
            }
        }
    }
}

pub struct RenewalWorker {
    service: Arc<ConfirmationService>,
}

impl RenewalWorker {
    pub fn new(service: Arc<ConfirmationService>) -> Self {
        Self { service }
    }

    pub async fn run(self, mut receiver: mpsc::Receiver<RenewalCommand>) {
        while let Some(command) = receiver.recv().await {
            self.handle(command).await;
        }
        tracing::info!("Renewal queue closed, worker shutting down");
    }

    async fn handle(&self, command: RenewalCommand) -> RenewalOutcome {
        let outcome = self.service.renew_confirmation_code(command.user_id).await;
        match &outcome {
            RenewalOutcome::Renewed(code) => {
                tracing::info!(user_id = command.user_id, expires_at = %code.expires_at, "Renewal completed");
            }
            RenewalOutcome::Failed => {
                tracing::warn!(user_id = command.user_id, "Renewal failed, not retried");
            }
            other => {
                tracing::debug!(user_id = command.user_id, outcome = ?other, "Renewal skipped");
            }
        }
        outcome
    }
}
