//! Polling until a remote object converges
//!
//! Cloud APIs usually acknowledge a mutation long before the object reaches
//! its final state. Resources call [`StateChangeConf::wait_for_state`] after
//! such a mutation: it repeatedly refreshes a snapshot, probes one attribute
//! off it, classifies the value into a status string and compares that status
//! with a target and a set of pending statuses.
//!
//! ```ignore
//! let conf = StateChangeConf::new("status", "active", ["pending"])
//!     .timeout(Duration::from_secs(600))
//!     .delay(Duration::from_secs(10))
//!     .min_poll_interval(Duration::from_secs(3));
//! let server = conf.wait_for_state(&ctx, || client.get_server(&id)).await?;
//! ```

mod classify;
mod error;
mod poller;

pub use classify::classify;
pub use error::WaitError;
pub use poller::{StateChangeConf, UnexpectedStatePolicy};

use crate::types::{Dynamic, ResourceData};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;

/// Reads a single attribute off a refreshed snapshot.
///
/// `None` means "no meaningful value yet" and keeps the poller going. Zero
/// values such as `""`, `0` and `false` are real values and must be returned.
pub trait Probe {
    fn probe(&self, attribute: &str) -> Option<Dynamic>;
}

impl Probe for ResourceData {
    fn probe(&self, attribute: &str) -> Option<Dynamic> {
        // An empty id means the last read found the object gone.
        if self.id().is_empty() {
            return None;
        }
        self.get(attribute).filter(|v| is_present(v)).cloned()
    }
}

impl Probe for HashMap<String, Dynamic> {
    fn probe(&self, attribute: &str) -> Option<Dynamic> {
        self.get(attribute).filter(|v| is_present(v)).cloned()
    }
}

fn is_present(value: &Dynamic) -> bool {
    !value.is_null() && !value.is_unknown()
}

/// Produces a fresh snapshot of the object being waited on.
///
/// An `Err` is terminal for the wait. A snapshot that no longer describes an
/// existing object is not an error; its probe simply reports nothing.
#[async_trait]
pub trait Refresh: Send {
    type Snapshot: Probe + Send;
    type Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send;

    async fn refresh(&mut self) -> Result<Self::Snapshot, Self::Error>;
}

#[async_trait]
impl<F, Fut, S, E> Refresh for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<S, E>> + Send,
    S: Probe + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
{
    type Snapshot = S;
    type Error = E;

    async fn refresh(&mut self) -> Result<S, E> {
        (self)().await
    }
}
