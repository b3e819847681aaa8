//! Long-poll loop over the Bot API `getUpdates` call.
//!
//! The offset always moves past the last update seen, so a message whose
//! handling fails is not redelivered. Poll errors back off and retry.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tinkerscout_core::RecipientId;
use tinkerscout_infra::notify::telegram::{TelegramChannel, TelegramError, Update};

use crate::registration::RegistrationHandler;

/// Where updates come from (the Bot API in production).
#[async_trait::async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    async fn poll(&self, offset: i64, long_poll: Duration) -> Result<Vec<Update>, TelegramError>;
}

#[async_trait::async_trait]
impl UpdateSource for TelegramChannel {
    async fn poll(&self, offset: i64, long_poll: Duration) -> Result<Vec<Update>, TelegramError> {
        self.get_updates(offset, long_poll).await
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePoller {
    pub long_poll: Duration,
    pub retry_delay: Duration,
}

impl Default for UpdatePoller {
    fn default() -> Self {
        Self {
            long_poll: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Handle for the running poller.
#[derive(Debug)]
pub struct UpdatePollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl UpdatePollerHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl UpdatePoller {
    pub fn spawn<S: UpdateSource>(&self, source: S, handler: RegistrationHandler) -> UpdatePollerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(poll_loop(self.clone(), source, handler, shutdown_rx));
        UpdatePollerHandle {
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }
}

async fn poll_loop<S: UpdateSource>(
    cfg: UpdatePoller,
    source: S,
    handler: RegistrationHandler,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    info!("update poller started");
    let mut offset = 0_i64;

    loop {
        let polled = tokio::select! {
            _ = &mut shutdown_rx => break,
            polled = source.poll(offset, cfg.long_poll) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatch(&handler, update).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed; retrying");
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = tokio::time::sleep(cfg.retry_delay) => {}
                }
            }
        }
    }

    info!("update poller stopped");
}

async fn dispatch(handler: &RegistrationHandler, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text else {
        return;
    };
    let chat = RecipientId::from(message.chat.id);
    let outcome = handler.handle(&chat, &text).await;
    debug!(update_id = update.update_id, ?outcome, "update handled");
}
