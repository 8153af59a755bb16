//! Virtual machine (server) endpoints

use super::catalog::{Application, Os};
use super::common::{
    optional_id, string_or_i64, string_or_number, yes_no_bool, ApiQueryParams, FormParams,
};
use super::error::ApiError;
use super::Client;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(rename = "label", default)]
    pub name: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub ram: String,
    #[serde(default)]
    pub disk: String,
    #[serde(default)]
    pub main_ip: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub vcpu_count: i64,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "DCID", default, deserialize_with = "string_or_i64::deserialize")]
    pub region_id: i64,
    #[serde(default)]
    pub default_password: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub cost_per_month: String,
    #[serde(default)]
    pub power_status: String,
    #[serde(default)]
    pub server_state: String,
    #[serde(rename = "VPSPLANID", default, deserialize_with = "string_or_i64::deserialize")]
    pub plan_id: i64,
    #[serde(default)]
    pub v6_networks: Vec<V6Network>,
    #[serde(default)]
    pub internal_ip: String,
    #[serde(default, deserialize_with = "yes_no_bool::deserialize")]
    pub auto_backups: bool,
    #[serde(default)]
    pub tag: String,
    #[serde(rename = "OSID", default, deserialize_with = "string_or_number::deserialize")]
    pub os_id: String,
    #[serde(rename = "APPID", default, deserialize_with = "optional_id::deserialize")]
    pub app_id: String,
    #[serde(rename = "FIREWALLGROUPID", default, deserialize_with = "optional_id::deserialize")]
    pub firewall_group_id: String,
    #[serde(default)]
    pub gateway_v4: String,
    #[serde(default)]
    pub netmask_v4: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct V6Network {
    #[serde(rename = "v6_network", default)]
    pub network: String,
    #[serde(rename = "v6_main_ip", default)]
    pub main_ip: String,
    #[serde(rename = "v6_network_size", default, deserialize_with = "string_or_i64::deserialize")]
    pub network_size: i64,
}

/// A private network attachment of a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateNetwork {
    #[serde(rename = "NETWORKID")]
    pub id: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4 {
    pub ip: String,
    #[serde(default)]
    pub netmask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(rename = "type", default)]
    pub ip_type: String,
    #[serde(rename = "reverse", default)]
    pub reverse_dns: String,
}

/// Optional settings for [`ServerApi::create`].
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub app_id: String,
    pub auto_backups: bool,
    pub dont_notify_on_activate: bool,
    pub firewall_group_id: String,
    pub hostname: String,
    pub ipv6: bool,
    pub networks: Vec<String>,
    pub private_networking: bool,
    pub script_id: i64,
    pub snapshot_id: String,
    pub ssh_key: String,
    pub tag: String,
    pub user_data: String,
}

#[derive(Debug, Deserialize)]
struct CreatedServer {
    #[serde(rename = "SUBID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct ServerApi<'a> {
    client: &'a Client,
}

impl<'a> ServerApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<Server, ApiError> {
        self.client
            .get("/v1/server/list", &ApiQueryParams::new().add("SUBID", id))
            .await
    }

    pub async fn create(
        &self,
        name: &str,
        region_id: i64,
        plan_id: i64,
        os_id: i64,
        options: &ServerOptions,
    ) -> Result<String, ApiError> {
        let mut form = FormParams::new()
            .add("DCID", region_id)
            .add("VPSPLANID", plan_id)
            .add("OSID", os_id)
            .add_non_empty("label", name)
            .add_non_empty("APPID", &options.app_id)
            .add_flag("auto_backups", options.auto_backups)
            .add_non_empty("FIREWALLGROUPID", &options.firewall_group_id)
            .add_non_empty("hostname", &options.hostname)
            .add_flag("enable_ipv6", options.ipv6)
            .add_flag("enable_private_network", options.private_networking)
            .add_non_zero("SCRIPTID", options.script_id)
            .add_non_empty("SNAPSHOTID", &options.snapshot_id)
            .add_non_empty("SSHKEYID", &options.ssh_key)
            .add_non_empty("tag", &options.tag);

        if options.dont_notify_on_activate {
            form = form.add("notify_activate", "no");
        }
        if !options.user_data.is_empty() {
            form = form.add("userdata", STANDARD.encode(options.user_data.as_bytes()));
        }
        for network in &options.networks {
            form = form.add("NETWORKID[]", network);
        }

        let created: CreatedServer = self.client.post("/v1/server/create", &form).await?;
        Ok(created.id)
    }

    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty("/v1/server/destroy", &FormParams::new().add("SUBID", id))
            .await
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/label_set",
                &FormParams::new().add("SUBID", id).add("label", name),
            )
            .await
    }

    pub async fn tag(&self, id: &str, tag: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/tag_set",
                &FormParams::new().add("SUBID", id).add("tag", tag),
            )
            .await
    }

    pub async fn set_firewall_group(&self, id: &str, group_id: &str) -> Result<(), ApiError> {
        // "0" detaches the server from any group.
        let group_id = if group_id.is_empty() { "0" } else { group_id };
        self.client
            .post_empty(
                "/v1/server/firewall_group_set",
                &FormParams::new()
                    .add("SUBID", id)
                    .add("FIREWALLGROUPID", group_id),
            )
            .await
    }

    pub async fn change_os(&self, id: &str, os_id: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/os_change",
                &FormParams::new().add("SUBID", id).add("OSID", os_id),
            )
            .await
    }

    pub async fn list_os_changes(&self, id: &str) -> Result<Vec<Os>, ApiError> {
        self.client
            .get_list(
                "/v1/server/os_change_list",
                &ApiQueryParams::new().add("SUBID", id),
            )
            .await
    }

    pub async fn change_application(&self, id: &str, app_id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/app_change",
                &FormParams::new().add("SUBID", id).add("APPID", app_id),
            )
            .await
    }

    pub async fn list_application_changes(&self, id: &str) -> Result<Vec<Application>, ApiError> {
        self.client
            .get_list(
                "/v1/server/app_change_list",
                &ApiQueryParams::new().add("SUBID", id),
            )
            .await
    }

    pub async fn list_private_networks(&self, id: &str) -> Result<Vec<PrivateNetwork>, ApiError> {
        self.client
            .get_list(
                "/v1/server/private_networks",
                &ApiQueryParams::new().add("SUBID", id),
            )
            .await
    }

    pub async fn enable_private_network(&self, id: &str, network_id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/private_network_enable",
                &FormParams::new()
                    .add("SUBID", id)
                    .add("NETWORKID", network_id),
            )
            .await
    }

    pub async fn disable_private_network(
        &self,
        id: &str,
        network_id: &str,
    ) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/private_network_disable",
                &FormParams::new()
                    .add("SUBID", id)
                    .add("NETWORKID", network_id),
            )
            .await
    }

    /// Public and private IPv4 addresses of a server, keyed in the response
    /// by the server id.
    pub async fn list_ipv4(&self, id: &str) -> Result<Vec<Ipv4>, ApiError> {
        let mut by_server: HashMap<String, Vec<Ipv4>> = self
            .client
            .get(
                "/v1/server/list_ipv4",
                &ApiQueryParams::new()
                    .add("SUBID", id)
                    .add("public_network", "yes"),
            )
            .await?;
        Ok(by_server.remove(id).unwrap_or_default())
    }

    pub async fn create_ipv4(&self, id: &str, reboot: bool) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/create_ipv4",
                &FormParams::new()
                    .add("SUBID", id)
                    .add("reboot", if reboot { "yes" } else { "no" }),
            )
            .await
    }

    pub async fn destroy_ipv4(&self, id: &str, ip: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/server/destroy_ipv4",
                &FormParams::new().add("SUBID", id).add("ip", ip),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::test_client;
    use mockito::{Matcher, Server as MockServer};

    const SERVER_JSON: &str = r#"{
        "SUBID": "576965",
        "os": "CentOS 6 x64",
        "ram": "4096 MB",
        "disk": "Virtual 60 GB",
        "main_ip": "123.123.123.123",
        "vcpu_count": "2",
        "location": "New Jersey",
        "DCID": "1",
        "default_password": "nreqnusibni",
        "date_created": "2013-12-19 14:45:41",
        "pending_charges": "46.67",
        "status": "active",
        "cost_per_month": "10.05",
        "current_bandwidth_gb": 131.512,
        "allowed_bandwidth_gb": "1000",
        "netmask_v4": "255.255.255.248",
        "gateway_v4": "123.123.123.1",
        "power_status": "running",
        "server_state": "ok",
        "VPSPLANID": "28",
        "v6_networks": [
            {"v6_network": "2001:DB8:1000::", "v6_main_ip": "2001:DB8:1000::100", "v6_network_size": "64"}
        ],
        "label": "my new server",
        "internal_ip": "10.99.0.10",
        "kvm_url": "https://my.vultr.com/subs/novnc/api.php?data=abc",
        "auto_backups": "yes",
        "tag": "mytag",
        "OSID": "127",
        "APPID": "0",
        "FIREWALLGROUPID": "0"
    }"#;

    #[test]
    fn server_decodes_stringly_typed_fields() {
        let server: Server = serde_json::from_str(SERVER_JSON).unwrap();

        assert_eq!(server.id, "576965");
        assert_eq!(server.name, "my new server");
        assert_eq!(server.vcpu_count, 2);
        assert_eq!(server.region_id, 1);
        assert_eq!(server.plan_id, 28);
        assert_eq!(server.os_id, "127");
        assert_eq!(server.app_id, "");
        assert_eq!(server.firewall_group_id, "");
        assert!(server.auto_backups);
        assert_eq!(server.v6_networks[0].main_ip, "2001:DB8:1000::100");
        assert_eq!(server.v6_networks[0].network_size, 64);
    }

    #[tokio::test]
    async fn create_posts_options() {
        let mut server = MockServer::new_async().await;
        let mock = server
            .mock("POST", "/v1/server/create")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("DCID".into(), "1".into()),
                Matcher::UrlEncoded("VPSPLANID".into(), "201".into()),
                Matcher::UrlEncoded("OSID".into(), "164".into()),
                Matcher::UrlEncoded("SNAPSHOTID".into(), "5359435d28b9a".into()),
                Matcher::UrlEncoded("SSHKEYID".into(), "a,b".into()),
                Matcher::UrlEncoded("notify_activate".into(), "no".into()),
                Matcher::UrlEncoded("userdata".into(), "aGVsbG8=".into()),
                Matcher::UrlEncoded("NETWORKID[]".into(), "net1".into()),
            ]))
            .with_body(r#"{"SUBID":"1312965"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let options = ServerOptions {
            dont_notify_on_activate: true,
            snapshot_id: "5359435d28b9a".to_string(),
            ssh_key: "a,b".to_string(),
            user_data: "hello".to_string(),
            networks: vec!["net1".to_string()],
            ..Default::default()
        };
        let id = client
            .servers()
            .create("web", 1, 201, 164, &options)
            .await
            .unwrap();

        assert_eq!(id, "1312965");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_ipv4_picks_server_entry() {
        let mut server = MockServer::new_async().await;
        let _mock = server
            .mock("GET", "/v1/server/list_ipv4")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("SUBID".into(), "576965".into()),
                Matcher::UrlEncoded("public_network".into(), "yes".into()),
            ]))
            .with_body(
                r#"{"576965":[
                    {"ip":"123.123.123.123","netmask":"255.255.255.248","gateway":"123.123.123.1","type":"main_ip","reverse":"host.example.com"},
                    {"ip":"10.99.0.10","netmask":"255.255.0.0","gateway":"","type":"private","reverse":""}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let ips = client.servers().list_ipv4("576965").await.unwrap();

        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0].reverse_dns, "host.example.com");
        assert_eq!(ips[1].ip_type, "private");
    }

    #[tokio::test]
    async fn set_firewall_group_sends_zero_to_detach() {
        let mut server = MockServer::new_async().await;
        let mock = server
            .mock("POST", "/v1/server/firewall_group_set")
            .match_body(Matcher::UrlEncoded("FIREWALLGROUPID".into(), "0".into()))
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.servers().set_firewall_group("1", "").await.unwrap();

        mock.assert_async().await;
    }
}
