//! Provider trait
//!
//! The fixed interface a plugin host drives: configure once, then ask for
//! resource and data source instances by type name.

use crate::context::Context;
use crate::data_source::DataSource;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::types::{Diagnostics, Dynamic};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name used as the resource type prefix (e.g., "vultr")
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Called once with the provider block. Errors go into the returned
    /// diagnostics; resources cannot be created until this succeeds.
    async fn configure(
        &mut self,
        ctx: &Context,
        config: HashMap<String, Dynamic>,
    ) -> Diagnostics;

    /// Factory for a configured resource instance
    async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>>;

    /// Factory for a configured data source instance
    async fn create_data_source(&self, name: &str) -> Result<Box<dyn DataSource>>;

    /// Cache these - they are requested often and must not change
    fn resource_schemas(&self) -> HashMap<String, Schema>;

    fn data_source_schemas(&self) -> HashMap<String, Schema>;
}
