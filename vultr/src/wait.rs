//! Waiting for Vultr objects to settle after a mutation
//!
//! The API acknowledges creates and updates immediately while the object
//! keeps changing for a while. Resources wait on one attribute by re-running
//! their own `read` against the same [`ResourceData`] until it reports the
//! target value.

use async_trait::async_trait;
use std::time::Duration;
use tfplug::wait::Refresh;
use tfplug::{
    Context, Resource, ResourceData, StateChangeConf, TfplugError, TimeoutKind, WaitError,
};
use tracing::info;

/// Poll pacing for resource waits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitSettings {
    /// Sleep before the first refresh.
    pub delay: Duration,
    pub min_poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            min_poll_interval: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Error waiting for {resource} ({id}) to have {attribute} {target:?}: {source}")]
pub struct ResourceWaitError {
    pub resource: String,
    pub id: String,
    pub attribute: String,
    pub target: String,
    #[source]
    pub source: WaitError,
}

impl From<ResourceWaitError> for TfplugError {
    fn from(err: ResourceWaitError) -> Self {
        TfplugError::Custom(err.to_string())
    }
}

/// One wait request: which attribute of which resource must reach `target`.
pub struct ResourceWait<'a> {
    pub kind: &'a str,
    pub attribute: &'a str,
    pub target: &'a str,
    pub pending: &'a [&'a str],
    pub timeout: TimeoutKind,
}

/// Re-runs `read` until `wait.attribute` on `data` equals `wait.target`.
///
/// Reads keep writing into `data`, so on success it holds the converged
/// state. The timeout comes from the resource's configured timeouts.
pub async fn wait_for_resource_state<R>(
    ctx: &Context,
    settings: &WaitSettings,
    resource: &R,
    data: &mut ResourceData,
    wait: ResourceWait<'_>,
) -> Result<(), ResourceWaitError>
where
    R: Resource + ?Sized,
{
    let id = data.id().to_string();
    info!(
        "Waiting for {} ({}) to have {} of {}",
        wait.kind, id, wait.attribute, wait.target
    );

    let conf = StateChangeConf::new(wait.attribute, wait.target, wait.pending.iter().copied())
        .timeout(data.timeout(wait.timeout))
        .delay(settings.delay)
        .min_poll_interval(settings.min_poll_interval);

    let refresh = ReadRefresh {
        resource,
        ctx,
        id: id.clone(),
        data,
    };

    conf.wait_for_state(ctx, refresh)
        .await
        .map(|_| ())
        .map_err(|source| ResourceWaitError {
            resource: wait.kind.to_string(),
            id,
            attribute: wait.attribute.to_string(),
            target: wait.target.to_string(),
            source,
        })
}

struct ReadRefresh<'a, R: ?Sized> {
    resource: &'a R,
    ctx: &'a Context,
    id: String,
    data: &'a mut ResourceData,
}

#[async_trait]
impl<R> Refresh for ReadRefresh<'_, R>
where
    R: Resource + ?Sized,
{
    type Snapshot = ResourceData;
    type Error = TfplugError;

    /// A read that finds the object gone clears the id; only the snapshot
    /// keeps that, so the next read still targets the same object.
    async fn refresh(&mut self) -> Result<ResourceData, TfplugError> {
        self.data.set_id(&self.id);
        let read = self.resource.read(self.ctx, self.data).await;
        let snapshot = self.data.clone();
        self.data.set_id(&self.id);
        read.map(|_| snapshot)
    }
}
