use std::time::Duration;

/// Only rate limiting and server-side failures are worth another attempt. A 4xx means the request itself is wrong,
/// and replaying it cannot help.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Linear backoff: the wait after the `attempt`-th failure (1-based) is `attempt * unit`.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit * attempt.max(1)
}
