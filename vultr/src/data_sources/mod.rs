//! Data source implementations
//!
//! Every data source lists one collection, narrows it with `filter` blocks
//! and/or a regex attribute, and requires exactly one match.

pub mod application;
pub mod firewall_group;
pub mod network;
pub mod os;
pub mod plan;
pub mod region;
pub mod snapshot;
pub mod ssh_key;
pub mod startup_script;

pub use application::ApplicationDataSource;
pub use firewall_group::FirewallGroupDataSource;
pub use network::NetworkDataSource;
pub use os::OsDataSource;
pub use plan::PlanDataSource;
pub use region::RegionDataSource;
pub use snapshot::SnapshotDataSource;
pub use ssh_key::SshKeyDataSource;
pub use startup_script::StartupScriptDataSource;

use tfplug::schema::filter_block;
use tfplug::validator::RegexSyntax;
use tfplug::{AttributeBuilder, AttributeType, SchemaBuilder};

/// Schema shared by all data sources: the `filter` block and the regex
/// attribute. Callers add their computed attributes.
pub(crate) fn selection_schema(description: &str, regex_attribute: &str) -> SchemaBuilder {
    SchemaBuilder::new()
        .version(0)
        .description(description)
        .attribute(
            AttributeBuilder::new(regex_attribute, AttributeType::String)
                .description("Regular expression the item must match")
                .optional()
                .validator(RegexSyntax)
                .build(),
        )
        .block(filter_block())
}

/// A computed attribute of the given type.
pub(crate) fn computed(name: &str, attribute_type: AttributeType) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, attribute_type).computed().build()
}
