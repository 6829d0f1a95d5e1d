use std::sync::Arc;
use std::time::Duration;

use driftscan_core::{AppError, AppResult};
use driftscan_domain::ChangeSetState;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{ChangeSetHandle, ChangeSetProvider};

/// Poll cadence and ceiling while a change set is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Maximum number of polls before giving up.
    pub max_polls: u32,
}

impl WaitPolicy {
    /// Returns the longest time the waiter sleeps before giving up.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.poll_interval
            .saturating_mul(self.max_polls.saturating_sub(1))
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_polls: 50,
        }
    }
}

/// Blocks until a change set leaves its pending state.
#[derive(Clone)]
pub struct ChangeSetWaiter {
    provider: Arc<dyn ChangeSetProvider>,
    policy: WaitPolicy,
}

impl ChangeSetWaiter {
    /// Creates a waiter polling the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn ChangeSetProvider>, policy: WaitPolicy) -> Self {
        Self { provider, policy }
    }

    /// Polls until the change set is complete.
    ///
    /// Fails with `AppError::Provider` when the change set fails or the poll
    /// ceiling is reached, and with `AppError::Cancelled` as soon as `cancel`
    /// flips to `true`.
    pub async fn wait_until_complete(
        &self,
        handle: &ChangeSetHandle,
        cancel: &mut watch::Receiver<bool>,
    ) -> AppResult<ChangeSetState> {
        let max_polls = self.policy.max_polls.max(1);
        info!(
            change_set = %handle.change_set_name,
            max_polls,
            poll_interval_secs = self.policy.poll_interval.as_secs(),
            ceiling_secs = self.policy.ceiling().as_secs(),
            "waiting for change set"
        );

        for poll in 1..=max_polls {
            if *cancel.borrow() {
                return Err(cancelled(handle));
            }

            let state = self.provider.change_set_state(handle).await?;
            debug!(
                change_set = %handle.change_set_name,
                poll,
                status = state.status.as_str(),
                "polled change set"
            );

            if state.status.is_complete() {
                info!(
                    change_set = %handle.change_set_name,
                    polls = poll,
                    "change set created"
                );
                return Ok(state);
            }

            if !state.status.is_pending() {
                return Err(AppError::Provider(format!(
                    "change set '{}' ended in status {}: {}",
                    handle.change_set_name,
                    state.status.as_str(),
                    state.status_reason.as_deref().unwrap_or("no reason given")
                )));
            }

            if poll == max_polls {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.policy.poll_interval) => {}
                () = wait_for_cancellation(cancel) => return Err(cancelled(handle)),
            }
        }

        Err(AppError::Provider(format!(
            "change set '{}' was still pending after {max_polls} polls",
            handle.change_set_name
        )))
    }
}

async fn wait_for_cancellation(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        // Sender dropped: nobody can cancel anymore.
        std::future::pending::<()>().await;
    }
}

fn cancelled(handle: &ChangeSetHandle) -> AppError {
    AppError::Cancelled(format!(
        "stopped waiting for change set '{}'",
        handle.change_set_name
    ))
}
