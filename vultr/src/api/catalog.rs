//! Read-only catalog endpoints: regions, plans, operating systems,
//! applications and snapshots.
//!
//! Models serialize back to the API's own field names so data source
//! filters can address them by those names.

use super::common::{string_or_f64, string_or_i64, string_or_number, yes_no_bool, ApiQueryParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "DCID", deserialize_with = "string_or_i64::deserialize")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "ddos_protection", default, deserialize_with = "yes_no_bool::deserialize")]
    pub ddos: bool,
    #[serde(default, deserialize_with = "yes_no_bool::deserialize")]
    pub block_storage: bool,
    #[serde(rename = "regioncode", default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "VPSPLANID", deserialize_with = "string_or_i64::deserialize")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "vcpu_count", default, deserialize_with = "string_or_i64::deserialize")]
    pub vcpus: i64,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub ram: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub disk: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub bandwidth: String,
    #[serde(rename = "price_per_month", default, deserialize_with = "string_or_number::deserialize")]
    pub price: String,
    #[serde(default)]
    pub plan_type: String,
    #[serde(rename = "available_locations", default)]
    pub regions: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Os {
    #[serde(rename = "OSID", deserialize_with = "string_or_i64::deserialize")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub family: String,
    #[serde(default, deserialize_with = "yes_no_bool::deserialize")]
    pub windows: bool,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub surcharge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "APPID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub deploy_name: String,
    #[serde(default, deserialize_with = "string_or_f64::deserialize")]
    pub surcharge: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "SNAPSHOTID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(rename = "date_created", default)]
    pub created: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub size: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "OSID", default, deserialize_with = "string_or_number::deserialize")]
    pub os_id: String,
    #[serde(rename = "APPID", default, deserialize_with = "string_or_number::deserialize")]
    pub app_id: String,
}

pub struct CatalogApi<'a> {
    client: &'a Client,
}

impl<'a> CatalogApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn regions(&self) -> Result<Vec<Region>, ApiError> {
        self.client
            .get_list("/v1/regions/list", &ApiQueryParams::new())
            .await
    }

    pub async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.client
            .get_list("/v1/plans/list", &ApiQueryParams::new())
            .await
    }

    pub async fn operating_systems(&self) -> Result<Vec<Os>, ApiError> {
        self.client
            .get_list("/v1/os/list", &ApiQueryParams::new())
            .await
    }

    pub async fn applications(&self) -> Result<Vec<Application>, ApiError> {
        self.client
            .get_list("/v1/app/list", &ApiQueryParams::new())
            .await
    }

    pub async fn snapshots(&self) -> Result<Vec<Snapshot>, ApiError> {
        self.client
            .get_list("/v1/snapshot/list", &ApiQueryParams::new())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::test_client;
    use mockito::Server;

    #[tokio::test]
    async fn regions_decode_from_keyed_object() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/regions/list")
            .match_header("API-Key", "test-api-key")
            .with_body(
                r#"{"1":{"DCID":"1","name":"New Jersey","country":"US","continent":"North America","state":"NJ","ddos_protection":true,"block_storage":true,"regioncode":"EWR"}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let regions = client.catalog().regions().await.unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, 1);
        assert_eq!(regions[0].code, "EWR");
        assert!(regions[0].ddos);
        mock.assert_async().await;
    }

    #[test]
    fn plan_serializes_with_api_names() {
        let plan: Plan = serde_json::from_str(
            r#"{"VPSPLANID":"201","name":"1024 MB RAM,25 GB SSD,1.00 TB BW","vcpu_count":"1","ram":"1024","disk":"25","bandwidth":"1.00","price_per_month":"5.00","plan_type":"SSD","available_locations":[1,2,3]}"#,
        )
        .unwrap();

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["VPSPLANID"], 201);
        assert_eq!(value["price_per_month"], "5.00");
        assert_eq!(value["vcpu_count"], 1);
        assert_eq!(plan.regions, vec![1, 2, 3]);
    }

    #[test]
    fn os_and_application_decode() {
        let os: Os = serde_json::from_str(
            r#"{"OSID":127,"name":"CentOS 6 x64","arch":"x64","family":"centos","windows":false}"#,
        )
        .unwrap();
        assert_eq!(os.id, 127);
        assert!(!os.windows);
        assert_eq!(os.surcharge, "");

        let app: Application = serde_json::from_str(
            r#"{"APPID":"1","name":"LEMP","short_name":"lemp","deploy_name":"LEMP on CentOS 6 x64","surcharge":0}"#,
        )
        .unwrap();
        assert_eq!(app.id, "1");
        assert_eq!(app.surcharge, 0.0);
    }
}
