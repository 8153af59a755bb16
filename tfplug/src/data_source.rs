//! DataSource trait
//!
//! This module defines the DataSource trait that data sources must implement.

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{Diagnostics, Dynamic, ResourceData};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Base trait for data sources - implement read operations
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name should be constant (e.g., "vultr_region")
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    fn validate(&self, config: &HashMap<String, Dynamic>) -> Diagnostics {
        self.schema().validate(config)
    }

    /// Called to read data - this is the only operation for data sources
    /// MUST set an id and populate all computed attributes
    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;
}
