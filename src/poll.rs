use std::time::Instant;

use crate::{CancelToken, ExchangeError, PollConfig, Result};

/// Call `attempt` until it yields a value.
///
/// `Ok(None)` means "not there yet" and is retried after a sleep. An error
/// from `attempt` ends the loop at once and is returned unchanged.
pub(crate) fn poll_until<T>(
    config: &PollConfig,
    cancel: &CancelToken,
    mut attempt: impl FnMut() -> Result<Option<T>>,
) -> Result<T> {
    let started = Instant::now();
    let deadline = config.timeout.map(|timeout| started + timeout);
    let mut interval = config.interval;
    let mut polls: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ExchangeError::Cancelled);
        }

        polls += 1;
        if let Some(value) = attempt()? {
            log::debug!(
                "poll succeeded after {} attempts ({:?})",
                polls,
                started.elapsed()
            );
            return Ok(value);
        }
        log::trace!("nothing yet, poll #{polls}");

        let mut sleep = interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Err(ExchangeError::Timeout {
                    waited: started.elapsed(),
                });
            }
            sleep = sleep.min(deadline - now);
        }

        if cancel.wait(sleep) {
            return Err(ExchangeError::Cancelled);
        }
        interval = config.next_interval(interval);
    }
}
