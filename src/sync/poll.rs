use std::future::Future;
use std::time::Duration;

use crate::error::SyncError;
use crate::sync::api::BatchStatus;

/// How often, and for how long, to keep checking a running refresh batch.
///
/// `max_attempts: None` polls until the batch reaches a terminal state, which
/// matches the endpoint's own behavior of never expiring a batch; bound it
/// when a hung batch must not hang the caller too.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Waits until the batch leaves `inProgress` and returns the first terminal
/// status document.
///
/// Always sleeps one interval and performs at least one status read, even
/// when the submission response already reported a terminal state: the batch
/// document is the authoritative snapshot, the submission response is not.
/// Transport failures of a status read propagate immediately.
pub async fn poll_until_terminal<F, Fut>(
    policy: PollPolicy,
    mut fetch_status: F,
) -> Result<BatchStatus, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<BatchStatus, SyncError>>,
{
    let mut attempts = 0u32;
    loop {
        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                return Err(SyncError::Timeout { attempts });
            }
        }
        tokio::time::sleep(policy.interval).await;
        attempts += 1;

        let status = fetch_status().await?;
        if status.progress_state.is_terminal() {
            return Ok(status);
        }
    }
}
