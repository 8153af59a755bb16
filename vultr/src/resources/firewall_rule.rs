//! Firewall rule resource
//!
//! Rules cannot be edited; every configurable attribute forces a new rule.
//! Ids are `<firewall-group-id>/<rule-number>`.

use crate::api::firewall::FirewallRuleInput;
use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::{parse_cidr_network, parse_string_int_id, CidrNetwork, StringOneOf};
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct FirewallRuleResource {
    provider_data: VultrProviderData,
}

impl FirewallRuleResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages an inbound rule of a Vultr firewall group")
                    .attribute(
                        AttributeBuilder::new("action", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("cidr_block", AttributeType::String)
                            .description("Source network, e.g. 0.0.0.0/0")
                            .required()
                            .force_new()
                            .validator(CidrNetwork)
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("direction", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("firewall_group_id", AttributeType::String)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("from_port", AttributeType::Number)
                            .optional()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("notes", AttributeType::String)
                            .optional()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("protocol", AttributeType::String)
                            .required()
                            .force_new()
                            .validator(StringOneOf::new(&["gre", "icmp", "tcp", "udp"]))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("to_port", AttributeType::Number)
                            .optional()
                            .force_new()
                            .build(),
                    )
                    .build()
            })
            .clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

/// Port argument for rule creation: "" for no ports, `a` or `a:b`.
fn port_argument(data: &ResourceData, protocol: &str) -> Result<String> {
    let has_from = data.get_ok("from_port").is_some();
    let has_to = data.get_ok("to_port").is_some();

    if has_from != has_to {
        return Err(TfplugError::InvalidConfiguration(format!(
            "Expected {:?} and {:?} to both be provided or both be empty",
            "from_port", "to_port"
        )));
    }
    if matches!(protocol, "tcp" | "udp") && !has_from {
        return Err(TfplugError::InvalidConfiguration(format!(
            "{:?} and {:?} are required for protocol of type {:?}",
            "from_port", "to_port", protocol
        )));
    }
    if !has_from {
        return Ok(String::new());
    }

    let from = data.get_int("from_port")?;
    let to = data.get_int("to_port")?;
    Ok(if from == to {
        from.to_string()
    } else {
        format!("{}:{}", from, to)
    })
}

/// Parses the port column of a listed rule: "", "-", `a` or `a - b`.
fn split_port_range(port: &str) -> std::result::Result<(i64, i64), std::num::ParseIntError> {
    let port = port.trim();
    if port.is_empty() || port == "-" {
        return Ok((0, 0));
    }
    match port.split_once('-') {
        None => {
            let single = port.parse()?;
            Ok((single, single))
        }
        Some((from, to)) => Ok((from.trim().parse()?, to.trim().parse()?)),
    }
}

fn parse_rule_id(id: &str) -> Result<(String, i64)> {
    parse_string_int_id(id).map_err(|_| {
        TfplugError::InvalidState(format!(
            "firewall rule ID must be of the form <firewall-group-id>/<firewall-rule-number>; got {:?}",
            id
        ))
    })
}

#[async_trait]
impl Resource for FirewallRuleResource {
    fn type_name(&self) -> &str {
        "vultr_firewall_rule"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let cidr_block = data.get_string("cidr_block")?;
        let (network, prefix) = parse_cidr_network(&cidr_block).map_err(|e| {
            TfplugError::InvalidConfiguration(format!(
                "Error parsing {:?} for firewall rule: {}",
                "cidr_block", e
            ))
        })?;
        let group_id = data.get_string("firewall_group_id")?;
        let protocol = data.get_string("protocol")?;
        let port = port_argument(data, &protocol)?;

        let rule = FirewallRuleInput {
            protocol,
            port,
            network,
            prefix,
            notes: data.get_string("notes")?,
        };

        info!("Creating new firewall rule");
        let rule_number = self
            .client()
            .firewall()
            .create_rule(&group_id, &rule)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating firewall rule: {}", e)))?;
        data.set_id(format!("{}/{}", group_id, rule_number));

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (group_id, rule_number) = parse_rule_id(&id)?;

        let rules = match self.client().firewall().list_rules(&group_id).await {
            Ok(rules) => rules,
            Err(e) if e.message_starts_with("Invalid firewall group") => {
                warn!("Removing firewall rule ({}) because the group is gone", id);
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting firewall rule ({}): {}",
                    id, e
                )))
            }
        };

        let Some(rule) = rules.into_iter().find(|r| r.rule_number == rule_number) else {
            warn!("Removing firewall rule ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        let (from, to) = split_port_range(&rule.port).map_err(|e| {
            TfplugError::Custom(format!(
                "Error parsing port range for firewall rule ({}): {}",
                id, e
            ))
        })?;

        let cidr_block = rule.cidr_block();
        data.set("action", rule.action);
        data.set("cidr_block", cidr_block);
        data.set("direction", "in");
        data.set("firewall_group_id", group_id);
        data.set("notes", rule.notes);
        data.set("protocol", rule.protocol);
        data.set("from_port", from);
        data.set("to_port", to);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (group_id, rule_number) = parse_rule_id(&id)?;
        info!("Destroying firewall rule ({})", id);

        self.client()
            .firewall()
            .delete_rule(&group_id, rule_number)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error destroying firewall rule ({}): {}", id, e))
            })?;

        data.set_id("");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::collections::HashMap;
    use tfplug::Dynamic;

    fn rule_config(pairs: &[(&str, Dynamic)]) -> ResourceData {
        ResourceData::from_config(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_split_port_range() {
        assert_eq!(split_port_range("").unwrap(), (0, 0));
        assert_eq!(split_port_range(" - ").unwrap(), (0, 0));
        assert_eq!(split_port_range("22").unwrap(), (22, 22));
        assert_eq!(split_port_range("8000 - 9000").unwrap(), (8000, 9000));
        assert!(split_port_range("ssh").is_err());
    }

    #[test]
    fn test_port_argument() {
        let single = rule_config(&[("from_port", Dynamic::Int(22)), ("to_port", Dynamic::Int(22))]);
        assert_eq!(port_argument(&single, "tcp").unwrap(), "22");

        let range = rule_config(&[
            ("from_port", Dynamic::Int(8000)),
            ("to_port", Dynamic::Int(9000)),
        ]);
        assert_eq!(port_argument(&range, "udp").unwrap(), "8000:9000");

        let none = rule_config(&[]);
        assert_eq!(port_argument(&none, "icmp").unwrap(), "");
    }

    #[test]
    fn test_port_argument_rejects_half_ranges() {
        let half = rule_config(&[("from_port", Dynamic::Int(22))]);
        let err = port_argument(&half, "tcp").unwrap_err();
        assert!(err
            .to_string()
            .contains(r#"Expected "from_port" and "to_port" to both be provided or both be empty"#));

        let err = port_argument(&rule_config(&[]), "tcp").unwrap_err();
        assert!(err
            .to_string()
            .contains(r#""from_port" and "to_port" are required for protocol of type "tcp""#));
    }

    #[test]
    fn test_schema_validates_protocol_and_cidr() {
        let resource = FirewallRuleResource::new(VultrProviderData::for_tests("http://127.0.0.1:1"));
        let diags = resource.validate(&HashMap::from([
            ("firewall_group_id".to_string(), Dynamic::from("1234abcd")),
            ("protocol".to_string(), Dynamic::from("sctp")),
            ("cidr_block".to_string(), Dynamic::from("10.0.0.1/24")),
        ]));

        assert_eq!(diags.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_create_and_read_rule() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/firewall/rule_create")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("protocol".into(), "tcp".into()),
                Matcher::UrlEncoded("subnet".into(), "10.0.0.0".into()),
                Matcher::UrlEncoded("subnet_size".into(), "24".into()),
                Matcher::UrlEncoded("port".into(), "8000:9000".into()),
                Matcher::UrlEncoded("ip_type".into(), "v4".into()),
            ]))
            .with_body(r#"{"rulenumber":2}"#)
            .create_async()
            .await;
        let _v4 = server
            .mock("GET", "/v1/firewall/rule_list")
            .match_query(Matcher::UrlEncoded("ip_type".into(), "v4".into()))
            .with_body(
                r#"{"1":{"rulenumber":1,"action":"accept","protocol":"icmp","port":"","subnet":"0.0.0.0","subnet_size":0,"notes":""},
                    "2":{"rulenumber":2,"action":"accept","protocol":"tcp","port":"8000 - 9000","subnet":"10.0.0.0","subnet_size":24,"notes":"app"}}"#,
            )
            .create_async()
            .await;
        let _v6 = server
            .mock("GET", "/v1/firewall/rule_list")
            .match_query(Matcher::UrlEncoded("ip_type".into(), "v6".into()))
            .with_body("[]")
            .create_async()
            .await;

        let resource = FirewallRuleResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = rule_config(&[
            ("firewall_group_id", Dynamic::from("1234abcd")),
            ("protocol", Dynamic::from("tcp")),
            ("cidr_block", Dynamic::from("10.0.0.0/24")),
            ("from_port", Dynamic::Int(8000)),
            ("to_port", Dynamic::Int(9000)),
            ("notes", Dynamic::from("app")),
        ]);

        resource.create(&Context::new(), &mut data).await.unwrap();

        create.assert_async().await;
        assert_eq!(data.id(), "1234abcd/2");
        assert_eq!(data.get_string("direction").unwrap(), "in");
        assert_eq!(data.get_string("action").unwrap(), "accept");
        assert_eq!(data.get_int("from_port").unwrap(), 8000);
        assert_eq!(data.get_int("to_port").unwrap(), 9000);
    }

    #[tokio::test]
    async fn test_read_with_deleted_group_is_gone() {
        let mut server = Server::new_async().await;
        let _rules = server
            .mock("GET", "/v1/firewall/rule_list")
            .match_query(Matcher::Any)
            .with_status(412)
            .with_body("Invalid firewall group.  Check FIREWALLGROUPID and try again.")
            .create_async()
            .await;

        let resource = FirewallRuleResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state("1234abcd/2", HashMap::new());

        resource.read(&Context::new(), &mut data).await.unwrap();

        assert_eq!(data.id(), "");
    }
}
