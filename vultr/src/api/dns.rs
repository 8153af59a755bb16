//! DNS domain and record endpoints

use super::common::{string_or_i64, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsDomain {
    pub domain: String,
    #[serde(default)]
    pub date_created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(rename = "RECORDID", deserialize_with = "string_or_i64::deserialize")]
    pub id: i64,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub priority: i64,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub ttl: i64,
}

/// Fields of a record that can be written.
#[derive(Debug, Clone, Default)]
pub struct DnsRecordInput {
    pub name: String,
    pub record_type: String,
    pub data: String,
    pub ttl: i64,
    pub priority: i64,
}

pub struct DnsApi<'a> {
    client: &'a Client,
}

impl<'a> DnsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_domains(&self) -> Result<Vec<DnsDomain>, ApiError> {
        self.client
            .get_list("/v1/dns/list", &ApiQueryParams::new())
            .await
    }

    /// Creates the domain with a default `A` record pointing at `server_ip`.
    pub async fn create_domain(&self, domain: &str, server_ip: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/dns/create_domain",
                &FormParams::new()
                    .add("domain", domain)
                    .add("serverip", server_ip),
            )
            .await
    }

    pub async fn delete_domain(&self, domain: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/dns/delete_domain",
                &FormParams::new().add("domain", domain),
            )
            .await
    }

    pub async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, ApiError> {
        self.client
            .get_list(
                "/v1/dns/records",
                &ApiQueryParams::new().add("domain", domain),
            )
            .await
    }

    pub async fn create_record(&self, domain: &str, record: &DnsRecordInput) -> Result<(), ApiError> {
        let mut form = FormParams::new()
            .add("domain", domain)
            .add("name", &record.name)
            .add("type", &record.record_type)
            .add("data", &record.data)
            .add_non_zero("ttl", record.ttl);
        if matches!(record.record_type.as_str(), "MX" | "SRV") {
            form = form.add("priority", record.priority);
        }
        self.client.post_empty("/v1/dns/create_record", &form).await
    }

    pub async fn update_record(
        &self,
        domain: &str,
        record_id: i64,
        record: &DnsRecordInput,
    ) -> Result<(), ApiError> {
        let mut form = FormParams::new()
            .add("domain", domain)
            .add("RECORDID", record_id)
            .add("name", &record.name)
            .add("data", &record.data)
            .add_non_zero("ttl", record.ttl);
        if matches!(record.record_type.as_str(), "MX" | "SRV") {
            form = form.add("priority", record.priority);
        }
        self.client.post_empty("/v1/dns/update_record", &form).await
    }

    pub async fn delete_record(&self, domain: &str, record_id: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/dns/delete_record",
                &FormParams::new()
                    .add("domain", domain)
                    .add("RECORDID", record_id),
            )
            .await
    }
}
