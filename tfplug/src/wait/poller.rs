use super::{classify, Probe, Refresh, WaitError};
use crate::context::Context;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// What to do when the observed status is neither the target nor pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnexpectedStatePolicy {
    /// Treat it like a pending status and keep polling until the deadline.
    #[default]
    KeepPolling,
    /// Stop immediately with [`WaitError::UnexpectedState`].
    Fail,
}

/// Configuration of one wait. Built per mutating operation and dropped with
/// its outcome.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub attribute: String,
    pub target: String,
    pub pending: Vec<String>,
    pub timeout: Duration,
    /// Sleep before the first refresh.
    pub delay: Duration,
    pub min_poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub unexpected: UnexpectedStatePolicy,
}

impl StateChangeConf {
    pub fn new<I, S>(attribute: &str, target: &str, pending: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.to_string(),
            target: target.to_string(),
            pending: pending.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            min_poll_interval: Duration::ZERO,
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
            unexpected: UnexpectedStatePolicy::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    pub fn max_poll_interval(mut self, interval: Duration) -> Self {
        self.max_poll_interval = interval;
        self
    }

    pub fn unexpected_state(mut self, policy: UnexpectedStatePolicy) -> Self {
        self.unexpected = policy;
        self
    }

    /// Polls `refresh` until the probed attribute classifies as the target.
    ///
    /// Returns the snapshot that converged. Refresh failures, unsupported
    /// attribute types, cancellation and the deadline end the wait early.
    pub async fn wait_for_state<R>(
        &self,
        ctx: &Context,
        mut refresh: R,
    ) -> Result<R::Snapshot, WaitError>
    where
        R: Refresh,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;

        if self.pending.iter().any(|p| p == &self.target) {
            warn!(
                attribute = %self.attribute,
                target = %self.target,
                "Target status is also listed as pending"
            );
        }

        if ctx.is_cancelled() {
            return Err(self.cancelled());
        }

        if !self.delay.is_zero() {
            let wake = (start + self.delay).min(deadline);
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(self.cancelled()),
                _ = time::sleep_until(wake) => {}
            }
        }

        let mut next_wait = INITIAL_POLL_INTERVAL;
        let mut last_status: Option<String> = None;
        let mut attempt: u32 = 0;

        loop {
            if ctx.is_cancelled() {
                return Err(self.cancelled());
            }
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(self.cancelled()),
                result = refresh.refresh() => Some(result),
                _ = time::sleep_until(deadline) => None,
            };

            if let Some(result) = outcome {
                let snapshot = result.map_err(|e| WaitError::Refresh { source: e.into() })?;

                match snapshot.probe(&self.attribute) {
                    None => {
                        trace!(attempt, attribute = %self.attribute, "Attribute not present yet");
                    }
                    Some(value) => {
                        let status = classify(&self.attribute, &value)?;
                        debug!(
                            attempt,
                            attribute = %self.attribute,
                            status = %status,
                            target = %self.target,
                            "Refreshed state"
                        );

                        if status == self.target {
                            return Ok(snapshot);
                        }

                        if !self.pending.contains(&status) {
                            if self.unexpected == UnexpectedStatePolicy::Fail {
                                return Err(WaitError::UnexpectedState {
                                    attribute: self.attribute.clone(),
                                    status,
                                    target: self.target.clone(),
                                    pending: self.pending.clone(),
                                });
                            }
                            debug!(
                                status = %status,
                                "Status is neither target nor pending, still waiting"
                            );
                        }
                        last_status = Some(status);
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    attribute: self.attribute.clone(),
                    target: self.target.clone(),
                    last_status,
                    timeout: self.timeout,
                });
            }

            let interval = next_wait
                .min(self.max_poll_interval)
                .max(self.min_poll_interval);
            let sleep_for = interval.min(deadline - now);
            trace!(?sleep_for, "Waiting before next refresh");

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(self.cancelled()),
                _ = time::sleep(sleep_for) => {}
            }

            next_wait = next_wait.saturating_mul(2).min(self.max_poll_interval);
        }
    }

    fn cancelled(&self) -> WaitError {
        WaitError::Cancelled {
            attribute: self.attribute.clone(),
            target: self.target.clone(),
        }
    }
}
