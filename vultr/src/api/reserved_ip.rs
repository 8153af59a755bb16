//! Reserved IP endpoints

use super::common::{optional_id, string_or_i64, string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservedIp {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(rename = "DCID", default, deserialize_with = "string_or_i64::deserialize")]
    pub region_id: i64,
    #[serde(default)]
    pub ip_type: String,
    #[serde(default)]
    pub subnet: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub subnet_size: i64,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "attached_SUBID", default, deserialize_with = "optional_id::deserialize")]
    pub attached_to: String,
}

impl ReservedIp {
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.subnet, self.subnet_size)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedReservedIp {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct ReservedIpApi<'a> {
    client: &'a Client,
}

impl<'a> ReservedIpApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ReservedIp>, ApiError> {
        self.client
            .get_list("/v1/reservedip/list", &ApiQueryParams::new())
            .await
    }

    /// Returns `None` when no reserved IP has this id.
    pub async fn get(&self, id: &str) -> Result<Option<ReservedIp>, ApiError> {
        Ok(self.list().await?.into_iter().find(|ip| ip.id == id))
    }

    pub async fn create(&self, region_id: i64, ip_type: &str, label: &str) -> Result<String, ApiError> {
        let form = FormParams::new()
            .add("DCID", region_id)
            .add("ip_type", ip_type)
            .add_non_empty("label", label);
        let created: CreatedReservedIp = self.client.post("/v1/reservedip/create", &form).await?;
        Ok(created.id)
    }

    pub async fn attach(&self, cidr: &str, instance_id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/reservedip/attach",
                &FormParams::new()
                    .add("ip_address", cidr)
                    .add("attach_SUBID", instance_id),
            )
            .await
    }

    pub async fn detach(&self, instance_id: &str, cidr: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/reservedip/detach",
                &FormParams::new()
                    .add("ip_address", cidr)
                    .add("detach_SUBID", instance_id),
            )
            .await
    }

    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/reservedip/destroy",
                &FormParams::new().add("ip_address", id),
            )
            .await
    }
}
