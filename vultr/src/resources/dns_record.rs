//! DNS record resource
//!
//! The API does not return the id of a created record, so create looks the
//! record up again by data, name and type. Ids are `<domain>/<record-id>`.

use crate::api::dns::DnsRecordInput;
use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::parse_string_int_id;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct DnsRecordResource {
    provider_data: VultrProviderData,
}

impl DnsRecordResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a record in a Vultr DNS domain")
                    .attribute(
                        AttributeBuilder::new("data", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("domain", AttributeType::String)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("priority", AttributeType::Number)
                            .description("Required for MX and SRV records")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .description("Record type, e.g. A, AAAA, CNAME, MX, SRV, TXT")
                            .optional()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("ttl", AttributeType::Number)
                            .optional()
                            .computed()
                            .build(),
                    )
                    .build()
            })
            .clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    fn input(data: &ResourceData) -> Result<DnsRecordInput> {
        let record_type = data.get_string("type")?;
        let priority = if requires_priority(&record_type) {
            if data.get_ok("priority").is_none() {
                return Err(TfplugError::InvalidConfiguration(format!(
                    "Records of type {} and {} require a priority",
                    "MX", "SRV"
                )));
            }
            data.get_int("priority")?
        } else {
            0
        };

        Ok(DnsRecordInput {
            name: data.get_string("name")?,
            record_type,
            data: data.get_string("data")?,
            ttl: data.get_int("ttl")?,
            priority,
        })
    }
}

fn requires_priority(record_type: &str) -> bool {
    matches!(record_type, "MX" | "SRV")
}

fn parse_record_id(id: &str) -> Result<(String, i64)> {
    parse_string_int_id(id).map_err(|_| {
        TfplugError::InvalidState(format!(
            "DNS record ID must conform to <domain>/<record-ID>, where <record-ID> is an integer; got {:?}",
            id
        ))
    })
}

#[async_trait]
impl Resource for DnsRecordResource {
    fn type_name(&self) -> &str {
        "vultr_dns_record"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_string("domain")?;
        let record = Self::input(data)?;

        info!("Creating new DNS record");
        self.client()
            .dns()
            .create_record(&domain, &record)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating DNS record: {}", e)))?;

        let records = self
            .client()
            .dns()
            .list_records(&domain)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting DNS record: {}", e)))?;

        let created = records
            .iter()
            .find(|r| {
                r.data == record.data && r.name == record.name && r.record_type == record.record_type
            })
            .ok_or_else(|| {
                TfplugError::Custom(format!(
                    "Error finding DNS record: no {} record {:?} with data {:?} in {}",
                    record.record_type, record.name, record.data, domain
                ))
            })?;
        data.set_id(format!("{}/{}", domain, created.id));

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (domain, record_id) = parse_record_id(&id)?;

        let records = match self.client().dns().list_records(&domain).await {
            Ok(records) => records,
            Err(e) if e.message_starts_with("Invalid domain.") => {
                warn!("Removing DNS record ({}) because the domain is gone", id);
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting DNS records: {}",
                    e
                )))
            }
        };

        let Some(record) = records.into_iter().find(|r| r.id == record_id) else {
            warn!("Removing DNS record ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("data", record.data);
        data.set("domain", domain);
        data.set("name", record.name);
        data.set("priority", record.priority);
        data.set("ttl", record.ttl);
        data.set("type", record.record_type);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (domain, record_id) = parse_record_id(&id)?;
        let record = Self::input(data)?;

        info!("Updating DNS record ({})", id);
        self.client()
            .dns()
            .update_record(&domain, record_id, &record)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error updating DNS record ({}): {}", id, e))
            })?;

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (domain, record_id) = parse_record_id(&id)?;
        info!("Destroying DNS record ({})", id);

        self.client()
            .dns()
            .delete_record(&domain, record_id)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error destroying DNS record ({}): {}", id, e))
            })?;

        data.set_id("");
        Ok(())
    }
}
