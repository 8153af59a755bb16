//! SSH key endpoints

use super::common::{string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshKey {
    #[serde(rename = "SSHKEYID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ssh_key", default)]
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct CreatedKey {
    #[serde(rename = "SSHKEYID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct SshKeyApi<'a> {
    client: &'a Client,
}

impl<'a> SshKeyApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<SshKey>, ApiError> {
        self.client
            .get_list("/v1/sshkey/list", &ApiQueryParams::new())
            .await
    }

    pub async fn create(&self, name: &str, key: &str) -> Result<String, ApiError> {
        let created: CreatedKey = self
            .client
            .post(
                "/v1/sshkey/create",
                &FormParams::new().add("name", name).add("ssh_key", key),
            )
            .await?;
        Ok(created.id)
    }

    pub async fn update(&self, id: &str, name: &str, key: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/sshkey/update",
                &FormParams::new()
                    .add("SSHKEYID", id)
                    .add("name", name)
                    .add("ssh_key", key),
            )
            .await
    }

    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/sshkey/destroy",
                &FormParams::new().add("SSHKEYID", id),
            )
            .await
    }
}
