#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::super::*;
    use mockito::{Matcher, Server};
    use std::collections::HashMap;
    use tfplug::Dynamic;

    const ID: &str = "576965";

    fn server_json(status: &str, power_status: &str, tag: &str, internal_ip: &str) -> String {
        format!(
            r#"{{
                "SUBID": "{ID}",
                "os": "CentOS 7 x64",
                "ram": "1024 MB",
                "disk": "Virtual 25 GB",
                "main_ip": "203.0.113.10",
                "vcpu_count": "1",
                "location": "New Jersey",
                "DCID": "1",
                "default_password": "secret",
                "date_created": "2018-01-01 00:00:00",
                "status": "{status}",
                "cost_per_month": "5.00",
                "netmask_v4": "255.255.254.0",
                "gateway_v4": "203.0.113.1",
                "power_status": "{power_status}",
                "server_state": "ok",
                "VPSPLANID": "201",
                "v6_networks": [],
                "label": "web",
                "internal_ip": "{internal_ip}",
                "auto_backups": "no",
                "tag": "{tag}",
                "OSID": "167",
                "APPID": "0",
                "FIREWALLGROUPID": "0"
            }}"#
        )
    }

    fn config(pairs: Vec<(&str, Dynamic)>) -> HashMap<String, Dynamic> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    async fn mock_private_networks(server: &mut Server) -> mockito::Mock {
        server
            .mock("GET", "/v1/server/private_networks")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body("[]")
            .expect_at_least(1)
            .create_async()
            .await
    }

    #[test]
    fn test_resource_type_name() {
        let resource = InstanceResource::new(VultrProviderData::for_tests("http://127.0.0.1:1"));
        assert_eq!(resource.type_name(), "vultr_instance");
    }

    #[test]
    fn test_resource_schema() {
        let schema = InstanceResource::schema_static();
        let attrs = &schema.block.attributes;

        assert!(attrs
            .iter()
            .any(|a| a.name == "plan_id" && a.required && a.force_new));
        assert!(attrs
            .iter()
            .any(|a| a.name == "region_id" && a.required && a.force_new));
        assert!(attrs
            .iter()
            .any(|a| a.name == "default_password" && a.computed && a.sensitive));
        assert!(attrs
            .iter()
            .any(|a| a.name == "os_id" && a.optional && a.computed));
        assert!(attrs.iter().any(|a| a.name == "tag" && !a.force_new));
    }

    #[test]
    fn test_netmask_prefix() {
        assert_eq!(netmask_prefix("255.255.255.0"), 24);
        assert_eq!(netmask_prefix("255.255.240.0"), 20);
        assert_eq!(netmask_prefix("255.255.255.255"), 32);
        assert_eq!(netmask_prefix("0.0.0.0"), 0);
        assert_eq!(netmask_prefix("255.0.255.0"), 0);
        assert_eq!(netmask_prefix("not-a-mask"), 0);
    }

    #[tokio::test]
    async fn test_create_requires_os_or_snapshot() {
        let resource = InstanceResource::new(VultrProviderData::for_tests("http://127.0.0.1:1"));
        let mut data = ResourceData::from_config(config(vec![
            ("plan_id", Dynamic::Int(201)),
            ("region_id", Dynamic::Int(1)),
        ]));

        let err = resource.create(&Context::new(), &mut data).await.unwrap_err();

        assert!(err
            .to_string()
            .contains(r#"One of "os_id" and "snapshot_id" must be provided but not both"#));
        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn test_create_rejects_application_with_snapshot() {
        let resource = InstanceResource::new(VultrProviderData::for_tests("http://127.0.0.1:1"));
        let mut data = ResourceData::from_config(config(vec![
            ("plan_id", Dynamic::Int(201)),
            ("region_id", Dynamic::Int(1)),
            ("application_id", Dynamic::from("1")),
            ("snapshot_id", Dynamic::from("5359435d28b9a")),
        ]));

        let err = resource.create(&Context::new(), &mut data).await.unwrap_err();

        assert!(err.to_string().contains(
            r#"Only one of "application_id" and "snapshot_id" may be provided but not both"#
        ));
    }

    #[tokio::test]
    async fn test_create_waits_for_active_and_running() {
        let mut server = Server::new_async().await;

        let create = server
            .mock("POST", "/v1/server/create")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("OSID".into(), "167".into()),
                Matcher::UrlEncoded("label".into(), "web".into()),
                Matcher::UrlEncoded("notify_activate".into(), "no".into()),
            ]))
            .with_body(format!(r#"{{"SUBID":"{ID}"}}"#))
            .create_async()
            .await;
        let pending = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("pending", "stopped", "", ""))
            .expect(2)
            .create_async()
            .await;
        let _active = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "", ""))
            .expect_at_least(1)
            .create_async()
            .await;
        let _networks = mock_private_networks(&mut server).await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_config(config(vec![
            ("name", Dynamic::from("web")),
            ("os_id", Dynamic::Int(167)),
            ("plan_id", Dynamic::Int(201)),
            ("region_id", Dynamic::Int(1)),
        ]));

        resource.create(&Context::new(), &mut data).await.unwrap();

        create.assert_async().await;
        pending.assert_async().await;
        assert_eq!(data.id(), ID);
        assert_eq!(data.get_string("status").unwrap(), "active");
        assert_eq!(data.get_string("power_status").unwrap(), "running");
        assert_eq!(data.get_int("os_id").unwrap(), 167);
        assert_eq!(data.get_string("ipv4_private_cidr").unwrap(), "");
    }

    #[tokio::test]
    async fn test_create_keeps_id_when_wait_fails() {
        let mut server = Server::new_async().await;

        let _create = server
            .mock("POST", "/v1/server/create")
            .with_body(format!(r#"{{"SUBID":"{ID}"}}"#))
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_status(412)
            .with_body("Internal error")
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_config(config(vec![
            ("os_id", Dynamic::Int(167)),
            ("plan_id", Dynamic::Int(201)),
            ("region_id", Dynamic::Int(1)),
        ]));

        let err = resource.create(&Context::new(), &mut data).await.unwrap_err();

        assert_eq!(data.id(), ID);
        assert!(err
            .to_string()
            .starts_with(r#"Error waiting for instance (576965) to have status "active""#));
    }

    #[tokio::test]
    async fn test_create_keeps_polling_same_id_while_instance_is_missing() {
        let mut server = Server::new_async().await;

        let _create = server
            .mock("POST", "/v1/server/create")
            .with_body(format!(r#"{{"SUBID":"{ID}"}}"#))
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_status(412)
            .with_body("Invalid server.")
            .expect_at_least(2)
            .create_async()
            .await;
        let blank = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), "".into()))
            .with_body("{}")
            .expect(0)
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_config(config(vec![
            ("os_id", Dynamic::Int(167)),
            ("plan_id", Dynamic::Int(201)),
            ("region_id", Dynamic::Int(1)),
        ]))
        .with_timeouts(tfplug::Timeouts::uniform(std::time::Duration::from_millis(300)));

        let err = resource.create(&Context::new(), &mut data).await.unwrap_err();

        missing.assert_async().await;
        blank.assert_async().await;
        assert_eq!(data.id(), ID);
        assert!(err.to_string().contains("timeout while waiting for status"));
    }

    #[tokio::test]
    async fn test_read_clears_id_when_gone() {
        let mut server = Server::new_async().await;
        let _gone = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_status(412)
            .with_body("Invalid server.")
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state(ID, HashMap::new());

        resource.read(&Context::new(), &mut data).await.unwrap();

        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn test_read_sets_private_cidr_and_networks() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "web", "10.99.0.10"))
            .create_async()
            .await;
        let _networks = server
            .mock("GET", "/v1/server/private_networks")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(
                r#"[{"NETWORKID":"net539626f0798d7","mac_address":"5a:02:00:00:24:e9","ip_address":"10.99.0.10"}]"#,
            )
            .create_async()
            .await;
        let _ipv4 = server
            .mock("GET", "/v1/server/list_ipv4")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(
                r#"{"576965":[
                    {"ip":"203.0.113.10","netmask":"255.255.254.0","gateway":"203.0.113.1","type":"main_ip","reverse":""},
                    {"ip":"10.99.0.10","netmask":"255.255.0.0","gateway":"","type":"private","reverse":""}
                ]}"#,
            )
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state(ID, HashMap::new());

        resource.read(&Context::new(), &mut data).await.unwrap();

        assert_eq!(data.get_string("ipv4_private_cidr").unwrap(), "10.99.0.10/16");
        assert_eq!(
            data.get_strings("network_ids").unwrap(),
            vec!["net539626f0798d7".to_string()]
        );
        assert_eq!(
            data.get("networks")
                .and_then(Dynamic::as_map)
                .and_then(|m| m.get("net539626f0798d7"))
                .and_then(Dynamic::as_string),
            Some("10.99.0.10")
        );
        assert_eq!(data.get_string("tag").unwrap(), "web");
        assert_eq!(data.get_string("application_id").unwrap(), "");
        assert_eq!(data.get_int("vcpus").unwrap(), 1);
        assert!(!data.get_bool("auto_backups").unwrap());
    }

    #[tokio::test]
    async fn test_read_fails_without_matching_private_address() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "", "10.99.0.10"))
            .create_async()
            .await;
        let _networks = mock_private_networks(&mut server).await;
        let _ipv4 = server
            .mock("GET", "/v1/server/list_ipv4")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(r#"{"576965":[]}"#)
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state(ID, HashMap::new());

        let err = resource.read(&Context::new(), &mut data).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            r#"Error finding private IPv4 subnet mask for instance (576965): no matching address for "10.99.0.10" in IPv4 list"#
        );
    }

    #[tokio::test]
    async fn test_update_tag_waits_for_new_value() {
        let mut server = Server::new_async().await;
        let tag = server
            .mock("POST", "/v1/server/tag_set")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("SUBID".into(), ID.into()),
                Matcher::UrlEncoded("tag".into(), "blue".into()),
            ]))
            .create_async()
            .await;
        let stale = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "green", ""))
            .expect(1)
            .create_async()
            .await;
        let _fresh = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "blue", ""))
            .expect_at_least(1)
            .create_async()
            .await;
        let _networks = mock_private_networks(&mut server).await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::for_update(
            ID,
            config(vec![("tag", Dynamic::from("green"))]),
            config(vec![("tag", Dynamic::from("blue"))]),
        );

        resource.update(&Context::new(), &mut data).await.unwrap();

        tag.assert_async().await;
        stale.assert_async().await;
        assert_eq!(data.get_string("tag").unwrap(), "blue");
    }

    #[tokio::test]
    async fn test_update_os_reports_valid_choices() {
        let mut server = Server::new_async().await;
        let _change = server
            .mock("POST", "/v1/server/os_change")
            .with_status(412)
            .with_body("Invalid OS")
            .create_async()
            .await;
        let _choices = server
            .mock("GET", "/v1/server/os_change_list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(
                r#"{"127":{"OSID":127,"name":"CentOS 6 x64","arch":"x64","family":"centos","windows":false,"surcharge":"0.00"},
                    "215":{"OSID":215,"name":"Ubuntu 16.04 x64","arch":"x64","family":"ubuntu","windows":false,"surcharge":"0.00"}}"#,
            )
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::for_update(
            ID,
            config(vec![("os_id", Dynamic::Int(127))]),
            config(vec![("os_id", Dynamic::Int(999))]),
        );

        let err = resource.update(&Context::new(), &mut data).await.unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("Error changing OS of instance (576965) to 999: Invalid OS"));
        assert!(message.contains("Valid OSs are "));
        assert!(message.contains("127"));
        assert!(message.contains("215"));
    }

    #[tokio::test]
    async fn test_update_network_ids_attaches_and_detaches() {
        let mut server = Server::new_async().await;
        let enable = server
            .mock("POST", "/v1/server/private_network_enable")
            .match_body(Matcher::UrlEncoded("NETWORKID".into(), "net-c".into()))
            .create_async()
            .await;
        let disable = server
            .mock("POST", "/v1/server/private_network_disable")
            .match_body(Matcher::UrlEncoded("NETWORKID".into(), "net-a".into()))
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .with_body(server_json("active", "running", "", ""))
            .create_async()
            .await;
        let _networks = mock_private_networks(&mut server).await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::for_update(
            ID,
            config(vec![("network_ids", Dynamic::from(vec!["net-a", "net-b"]))]),
            config(vec![("network_ids", Dynamic::from(vec!["net-b", "net-c"]))]),
        );

        resource.update(&Context::new(), &mut data).await.unwrap();

        enable.assert_async().await;
        disable.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_retries_until_gone() {
        let mut server = Server::new_async().await;
        let accepted = server
            .mock("POST", "/v1/server/destroy")
            .match_body(Matcher::UrlEncoded("SUBID".into(), ID.into()))
            .expect(1)
            .create_async()
            .await;
        let pending = server
            .mock("POST", "/v1/server/destroy")
            .with_status(412)
            .with_body("Unable to destroy server: Server is already pending destruction.")
            .expect(1)
            .create_async()
            .await;
        let gone = server
            .mock("POST", "/v1/server/destroy")
            .with_status(412)
            .with_body("Invalid server.")
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state(ID, HashMap::new());

        resource.delete(&Context::new(), &mut data).await.unwrap();

        accepted.assert_async().await;
        pending.assert_async().await;
        gone.assert_async().await;
        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn test_delete_returns_unexpected_errors() {
        let mut server = Server::new_async().await;
        let _destroy = server
            .mock("POST", "/v1/server/destroy")
            .with_status(412)
            .with_body("Unable to destroy server: subscription is locked by billing")
            .create_async()
            .await;

        let resource = InstanceResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state(ID, HashMap::new());

        let err = resource.delete(&Context::new(), &mut data).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error destroying instance (576965): Unable to destroy server: subscription is locked by billing"
        );
    }
}
