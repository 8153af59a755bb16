//! Firewall group and rule endpoints

use super::common::{string_or_i64, string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallGroup {
    #[serde(rename = "FIREWALLGROUPID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub instance_count: i64,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub rule_count: i64,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub max_rule_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(rename = "rulenumber", deserialize_with = "string_or_i64::deserialize")]
    pub rule_number: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub port: String,
    #[serde(default)]
    pub subnet: String,
    #[serde(default, deserialize_with = "string_or_i64::deserialize")]
    pub subnet_size: i64,
    #[serde(default)]
    pub notes: String,
}

impl FirewallRule {
    /// The rule's source network in CIDR notation.
    pub fn cidr_block(&self) -> String {
        format!("{}/{}", self.subnet, self.subnet_size)
    }
}

/// Fields needed to create a rule.
#[derive(Debug, Clone)]
pub struct FirewallRuleInput {
    pub protocol: String,
    /// Empty, a single port, or `from:to`.
    pub port: String,
    pub network: IpAddr,
    pub prefix: u8,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
struct CreatedGroup {
    #[serde(rename = "FIREWALLGROUPID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRule {
    #[serde(rename = "rulenumber", deserialize_with = "string_or_i64::deserialize")]
    rule_number: i64,
}

pub struct FirewallApi<'a> {
    client: &'a Client,
}

impl<'a> FirewallApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_groups(&self) -> Result<Vec<FirewallGroup>, ApiError> {
        self.client
            .get_list("/v1/firewall/group_list", &ApiQueryParams::new())
            .await
    }

    /// Returns `None` when no group has this id.
    pub async fn get_group(&self, id: &str) -> Result<Option<FirewallGroup>, ApiError> {
        let groups: Vec<FirewallGroup> = self
            .client
            .get_list(
                "/v1/firewall/group_list",
                &ApiQueryParams::new().add("FIREWALLGROUPID", id),
            )
            .await?;
        Ok(groups.into_iter().find(|g| g.id == id))
    }

    pub async fn create_group(&self, description: &str) -> Result<String, ApiError> {
        let created: CreatedGroup = self
            .client
            .post(
                "/v1/firewall/group_create",
                &FormParams::new().add_non_empty("description", description),
            )
            .await?;
        Ok(created.id)
    }

    pub async fn set_group_description(&self, id: &str, description: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/firewall/group_set_description",
                &FormParams::new()
                    .add("FIREWALLGROUPID", id)
                    .add("description", description),
            )
            .await
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/firewall/group_delete",
                &FormParams::new().add("FIREWALLGROUPID", id),
            )
            .await
    }

    /// Inbound rules of a group, IPv4 followed by IPv6.
    pub async fn list_rules(&self, group_id: &str) -> Result<Vec<FirewallRule>, ApiError> {
        let mut rules = Vec::new();
        for ip_type in ["v4", "v6"] {
            let mut batch: Vec<FirewallRule> = self
                .client
                .get_list(
                    "/v1/firewall/rule_list",
                    &ApiQueryParams::new()
                        .add("FIREWALLGROUPID", group_id)
                        .add("direction", "in")
                        .add("ip_type", ip_type),
                )
                .await?;
            batch.sort_by_key(|r| r.rule_number);
            rules.extend(batch);
        }
        Ok(rules)
    }

    pub async fn create_rule(
        &self,
        group_id: &str,
        rule: &FirewallRuleInput,
    ) -> Result<i64, ApiError> {
        let ip_type = if rule.network.is_ipv4() { "v4" } else { "v6" };
        let form = FormParams::new()
            .add("FIREWALLGROUPID", group_id)
            .add("direction", "in")
            .add("ip_type", ip_type)
            .add("protocol", &rule.protocol)
            .add("subnet", rule.network)
            .add("subnet_size", rule.prefix)
            .add_non_empty("port", &rule.port)
            .add_non_empty("notes", &rule.notes);
        let created: CreatedRule = self.client.post("/v1/firewall/rule_create", &form).await?;
        Ok(created.rule_number)
    }

    pub async fn delete_rule(&self, group_id: &str, rule_number: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/firewall/rule_delete",
                &FormParams::new()
                    .add("FIREWALLGROUPID", group_id)
                    .add("rulenumber", rule_number),
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

    #[tokio::test]
    async fn get_group_returns_none_for_unknown_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/firewall/group_list")
            .match_query(Matcher::UrlEncoded("FIREWALLGROUPID".into(), "1234abcd".into()))
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let group = client.firewall().get_group("1234abcd").await.unwrap();

        assert!(group.is_none());
    }

    #[tokio::test]
    async fn list_rules_merges_ipv4_and_ipv6() {
        let mut server = Server::new_async().await;
        let v4 = server
            .mock("GET", "/v1/firewall/rule_list")
            .match_query(Matcher::UrlEncoded("ip_type".into(), "v4".into()))
            .with_body(
                r#"{"1":{"rulenumber":1,"action":"accept","protocol":"tcp","port":"22","subnet":"0.0.0.0","subnet_size":0,"notes":"ssh"}}"#,
            )
            .create_async()
            .await;
        let v6 = server
            .mock("GET", "/v1/firewall/rule_list")
            .match_query(Matcher::UrlEncoded("ip_type".into(), "v6".into()))
            .with_body(
                r#"{"2":{"rulenumber":2,"action":"accept","protocol":"tcp","port":"8000 - 9000","subnet":"::","subnet_size":0,"notes":""}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let rules = client.firewall().list_rules("1234abcd").await.unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].cidr_block(), "0.0.0.0/0");
        assert_eq!(rules[1].port, "8000 - 9000");
        v4.assert_async().await;
        v6.assert_async().await;
    }

    #[tokio::test]
    async fn create_rule_derives_ip_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/firewall/rule_create")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ip_type".into(), "v6".into()),
                Matcher::UrlEncoded("subnet".into(), "2001:db8::".into()),
                Matcher::UrlEncoded("subnet_size".into(), "32".into()),
                Matcher::UrlEncoded("port".into(), "80:81".into()),
            ]))
            .with_body(r#"{"rulenumber":2}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let number = client
            .firewall()
            .create_rule(
                "1234abcd",
                &FirewallRuleInput {
                    protocol: "tcp".to_string(),
                    port: "80:81".to_string(),
                    network: "2001:db8::".parse().unwrap(),
                    prefix: 32,
                    notes: String::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(number, 2);
        mock.assert_async().await;
    }
}
