//! Resource trait
//!
//! Every managed resource implements CRUD against a [`ResourceData`] handle.
//! Handlers follow read/normalize/set: call the API, convert the response into
//! attribute values and write them with [`ResourceData::set`].

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{Diagnostics, Dynamic, ResourceData};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Base trait for resources - implement CRUD operations
/// Type name should be constant and match the key in Provider::resource_schemas()
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name should be constant (e.g., "vultr_instance")
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Called during plan to validate configuration. The default checks the
    /// schema's required attributes and validators.
    fn validate(&self, config: &HashMap<String, Dynamic>) -> Diagnostics {
        self.schema().validate(config)
    }

    /// MUST set the id once the remote object exists, even if a later step
    /// fails, so the object is tracked and can be destroyed
    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    /// MUST clear the id (set it to "") when the remote object is gone
    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    /// Called during "terraform import". The default treats the import string
    /// as the id; the host follows up with a read.
    async fn import(&self, _ctx: &Context, id: &str) -> Result<ResourceData> {
        import_state_passthrough_id(id)
    }
}

/// Builds a handle whose id is the import string and nothing else.
pub fn import_state_passthrough_id(id: &str) -> Result<ResourceData> {
    if id.is_empty() {
        return Err(crate::TfplugError::ImportFailed(
            "import id must not be empty".to_string(),
        ));
    }
    Ok(ResourceData::from_state(id, HashMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

    struct NamedThing;

    #[async_trait]
    impl Resource for NamedThing {
        fn type_name(&self) -> &str {
            "test_named_thing"
        }

        fn schema(&self) -> Schema {
            SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("name", AttributeType::String)
                        .required()
                        .build(),
                )
                .build()
        }

        async fn create(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
            data.set_id("1");
            Ok(())
        }

        async fn read(&self, _ctx: &Context, _data: &mut ResourceData) -> Result<()> {
            Ok(())
        }

        async fn update(&self, _ctx: &Context, _data: &mut ResourceData) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
            data.set_id("");
            Ok(())
        }
    }

    #[test]
    fn default_validate_uses_schema() {
        let diags = NamedThing.validate(&HashMap::new());
        assert!(diags.has_errors());
    }

    #[tokio::test]
    async fn default_import_passes_id_through() {
        let data = NamedThing.import(&Context::new(), "576965").await.unwrap();
        assert_eq!(data.id(), "576965");

        assert!(NamedThing.import(&Context::new(), "").await.is_err());
    }
}
