//! Private network endpoints

use super::common::{string_or_i64, string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "NETWORKID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(rename = "DCID", default, deserialize_with = "string_or_i64::deserialize")]
    pub region_id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub v4_subnet: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub v4_subnet_mask: i64,
    #[serde(default)]
    pub date_created: String,
}

impl Network {
    /// `v4_subnet/v4_subnet_mask`, or "" when the network has no subnet.
    pub fn cidr_block(&self) -> String {
        if self.v4_subnet.is_empty() {
            String::new()
        } else {
            format!("{}/{}", self.v4_subnet, self.v4_subnet_mask)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedNetwork {
    #[serde(rename = "NETWORKID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct NetworkApi<'a> {
    client: &'a Client,
}

impl<'a> NetworkApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Network>, ApiError> {
        self.client
            .get_list("/v1/network/list", &ApiQueryParams::new())
            .await
    }

    /// Creates a network; `subnet` is the network address and prefix length
    /// when the caller picked one.
    pub async fn create(
        &self,
        region_id: i64,
        description: &str,
        subnet: Option<(IpAddr, u8)>,
    ) -> Result<String, ApiError> {
        let mut form = FormParams::new()
            .add("DCID", region_id)
            .add_non_empty("description", description);
        if let Some((address, prefix)) = subnet {
            form = form.add("v4_subnet", address).add("v4_subnet_mask", prefix);
        }
        let created: CreatedNetwork = self.client.post("/v1/network/create", &form).await?;
        Ok(created.id)
    }

    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/network/destroy",
                &FormParams::new().add("NETWORKID", id),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::test_client;
    use mockito::{Matcher, Server};

    #[test]
    fn cidr_block_joins_subnet_and_mask() {
        let network: Network = serde_json::from_str(
            r#"{"DCID":"1","NETWORKID":"net539626f0798d7","date_created":"2017-08-25 12:23:45","description":"test1","v4_subnet":"10.99.0.0","v4_subnet_mask":24}"#,
        )
        .unwrap();

        assert_eq!(network.cidr_block(), "10.99.0.0/24");
        assert_eq!(network.region_id, 1);
    }

    #[tokio::test]
    async fn create_sends_subnet_when_given() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/network/create")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("v4_subnet".into(), "10.99.0.0".into()),
                Matcher::UrlEncoded("v4_subnet_mask".into(), "24".into()),
            ]))
            .with_body(r#"{"NETWORKID":"net59a0526477dd3"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let id = client
            .networks()
            .create(1, "test", Some(("10.99.0.0".parse().unwrap(), 24)))
            .await
            .unwrap();

        assert_eq!(id, "net59a0526477dd3");
        mock.assert_async().await;
    }
}
