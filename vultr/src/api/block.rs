//! Block storage endpoints

use super::common::{optional_id, string_or_i64, string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStorage {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub cost_per_month: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "size_gb", default, deserialize_with = "string_or_i64::deserialize")]
    pub size: i64,
    #[serde(rename = "DCID", default, deserialize_with = "string_or_i64::deserialize")]
    pub region_id: i64,
    #[serde(rename = "attached_to_SUBID", default, deserialize_with = "optional_id::deserialize")]
    pub attached_to: String,
    #[serde(rename = "label", default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedBlockStorage {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct BlockStorageApi<'a> {
    client: &'a Client,
}

impl<'a> BlockStorageApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<BlockStorage, ApiError> {
        self.client
            .get("/v1/block/list", &ApiQueryParams::new().add("SUBID", id))
            .await
    }

    pub async fn create(&self, region_id: i64, size: i64, name: &str) -> Result<String, ApiError> {
        let form = FormParams::new()
            .add("DCID", region_id)
            .add("size_gb", size)
            .add_non_empty("label", name);
        let created: CreatedBlockStorage = self.client.post("/v1/block/create", &form).await?;
        Ok(created.id)
    }

    pub async fn attach(&self, id: &str, instance_id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/block/attach",
                &FormParams::new()
                    .add("SUBID", id)
                    .add("attach_to_SUBID", instance_id),
            )
            .await
    }

    pub async fn detach(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty("/v1/block/detach", &FormParams::new().add("SUBID", id))
            .await
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/block/label_set",
                &FormParams::new().add("SUBID", id).add("label", name),
            )
            .await
    }

    pub async fn resize(&self, id: &str, size: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/block/resize",
                &FormParams::new().add("SUBID", id).add("size_gb", size),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty("/v1/block/delete", &FormParams::new().add("SUBID", id))
            .await
    }
}
