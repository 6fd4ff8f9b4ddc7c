//! Long-polling update loop.
//!
//! Runs until cancelled, confirming updates by advancing the offset to
//! the last seen update id plus one. Transport failures back off for a
//! fixed delay and reconnect.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::dispatch::UpdateDispatcher;

use super::TelegramApi;

/// Server-side hold time for one `getUpdates` call.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Delay before re-polling after a transport failure.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll for updates and dispatch them until `cancel` is triggered.
pub async fn run(
    api: Arc<TelegramApi>,
    dispatcher: Arc<UpdateDispatcher>,
    cancel: CancellationToken,
) {
    let mut offset: Option<i64> = None;
    tracing::info!("Telegram long polling started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Telegram polling stopping");
                break;
            }
            result = api.get_updates(offset, POLL_TIMEOUT_SECS) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        dispatcher.dispatch(update).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }
    }
}
