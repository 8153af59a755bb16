//! Instance (virtual machine) resource
//!
//! Creation returns as soon as the API accepts the order; the instance then
//! goes through `pending` and a stopped/starting power cycle before it is
//! usable. Create and most in-place updates therefore block on
//! [`wait_for_resource_state`] before handing state back.

use crate::api::server::ServerOptions;
use crate::api::{ApiError, Client};
use crate::provider_data::VultrProviderData;
use crate::resources::{int_change, string_change, strings_change, strings_diff};
use crate::wait::{wait_for_resource_state, ResourceWait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError, TimeoutKind,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// OS id Vultr expects when an instance is restored from a snapshot.
const SNAPSHOT_OS_ID: i64 = 164;

const GONE_PREFIX: &str = "Invalid server";
const DESTROY_LOCKED: &str = "Unable to destroy server: Unable to remove VM: Server is currently locked";
const DESTROY_PENDING: &str = "Unable to destroy server: Server is already pending destruction.";

pub struct InstanceResource {
    provider_data: VultrProviderData,
}

impl InstanceResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(build_schema).clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    async fn wait_for(
        &self,
        ctx: &Context,
        data: &mut ResourceData,
        attribute: &str,
        target: &str,
        pending: &[&str],
        timeout: TimeoutKind,
    ) -> Result<()> {
        wait_for_resource_state(
            ctx,
            &self.provider_data.wait,
            self,
            data,
            ResourceWait {
                kind: "instance",
                attribute,
                target,
                pending,
                timeout,
            },
        )
        .await?;
        Ok(())
    }

    async fn change_application(&self, id: &str, app_id: &str) -> Result<()> {
        let Err(err) = self.client().servers().change_application(id, app_id).await else {
            return Ok(());
        };
        let valid = match self.client().servers().list_application_changes(id).await {
            Ok(apps) => format!(
                " Valid applications are {}",
                apps.iter().map(|a| a.id.as_str()).collect::<Vec<_>>().join(", ")
            ),
            Err(list_err) => {
                error!(
                    "Failed to get available applications for instance ({}): {}",
                    id, list_err
                );
                String::new()
            }
        };
        Err(TfplugError::Custom(format!(
            "Error changing application of instance ({}) to {}: {}{}",
            id, app_id, err, valid
        )))
    }

    async fn change_os(&self, id: &str, os_id: i64) -> Result<()> {
        let Err(err) = self.client().servers().change_os(id, os_id).await else {
            return Ok(());
        };
        let valid = match self.client().servers().list_os_changes(id).await {
            Ok(oses) => format!(
                " Valid OSs are {}",
                oses.iter()
                    .map(|os| os.id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Err(list_err) => {
                error!("Failed to get available OSs for instance ({}): {}", id, list_err);
                String::new()
            }
        };
        Err(TfplugError::Custom(format!(
            "Error changing OS of instance ({}) to {}: {}{}",
            id, os_id, err, valid
        )))
    }

    /// `<internal-ip>/<prefix>` of the private interface, or "" without one.
    async fn private_cidr(&self, id: &str, internal_ip: &str) -> Result<String> {
        if internal_ip.is_empty() {
            return Ok(String::new());
        }

        let addresses = self.client().servers().list_ipv4(id).await.map_err(|e| {
            TfplugError::Custom(format!(
                "Error getting IPv4 networks for instance ({}): {}",
                id, e
            ))
        })?;

        let address = addresses
            .iter()
            .find(|a| a.ip == internal_ip)
            .ok_or_else(|| {
                TfplugError::Custom(format!(
                    "Error finding private IPv4 subnet mask for instance ({}): no matching address for {:?} in IPv4 list",
                    id, internal_ip
                ))
            })?;

        Ok(format!("{}/{}", internal_ip, netmask_prefix(&address.netmask)))
    }
}

#[async_trait]
impl Resource for InstanceResource {
    fn type_name(&self) -> &str {
        "vultr_instance"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let has_app = data.get_ok("application_id").is_some();
        let has_os = data.get_ok("os_id").is_some();
        let has_snapshot = data.get_ok("snapshot_id").is_some();

        if has_app && has_snapshot {
            return Err(TfplugError::InvalidConfiguration(format!(
                "Only one of {:?} and {:?} may be provided but not both",
                "application_id", "snapshot_id"
            )));
        }
        if has_os == has_snapshot {
            return Err(TfplugError::InvalidConfiguration(format!(
                "One of {:?} and {:?} must be provided but not both",
                "os_id", "snapshot_id"
            )));
        }

        let os_id = if has_snapshot {
            SNAPSHOT_OS_ID
        } else {
            data.get_int("os_id")?
        };

        let options = ServerOptions {
            app_id: data.get_string("application_id")?,
            auto_backups: data.get_bool("auto_backups")?,
            dont_notify_on_activate: !data.get_bool("notify_activate")?,
            firewall_group_id: data.get_string("firewall_group_id")?,
            hostname: data.get_string("hostname")?,
            ipv6: data.get_bool("ipv6")?,
            networks: data.get_strings("network_ids")?,
            private_networking: data.get_bool("private_networking")?,
            script_id: data.get_int("startup_script_id")?,
            snapshot_id: data.get_string("snapshot_id")?,
            ssh_key: data.get_strings("ssh_key_ids")?.join(","),
            tag: data.get_string("tag")?,
            user_data: data.get_string("user_data")?,
        };
        let name = data.get_string("name")?;
        let region_id = data.get_int("region_id")?;
        let plan_id = data.get_int("plan_id")?;

        info!("Creating new instance");
        let id = self
            .client()
            .servers()
            .create(&name, region_id, plan_id, os_id, &options)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating instance: {}", e)))?;
        data.set_id(&id);
        info!("Created instance ({})", id);

        self.wait_for(ctx, data, "status", "active", &["pending"], TimeoutKind::Create)
            .await?;
        self.wait_for(
            ctx,
            data,
            "power_status",
            "running",
            &["starting", "stopped"],
            TimeoutKind::Create,
        )
        .await?;

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let server = match self.client().servers().get(&id).await {
            Ok(server) => server,
            Err(e) if e.message_starts_with(GONE_PREFIX) => {
                warn!("Removing instance ({}) because it is gone", id);
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting instance ({}): {}",
                    id, e
                )))
            }
        };

        let private_networks = self
            .client()
            .servers()
            .list_private_networks(&id)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!(
                    "Error getting private networks for instance ({}): {}",
                    id, e
                ))
            })?;
        let mut networks = HashMap::new();
        let mut network_ids = Vec::new();
        for network in private_networks {
            network_ids.push(network.id.clone());
            networks.insert(network.id, network.ip_address);
        }

        let os_id = server
            .os_id
            .parse::<i64>()
            .map_err(|e| TfplugError::Custom(format!("OS ID must be an integer: {}", e)))?;

        let private_cidr = self.private_cidr(&id, &server.internal_ip).await?;

        data.set("application_id", server.app_id);
        data.set("auto_backups", server.auto_backups);
        data.set("cost_per_month", server.cost_per_month);
        data.set("default_password", server.default_password);
        data.set("disk", server.disk);
        data.set("firewall_group_id", server.firewall_group_id);
        data.set("ipv4_address", server.main_ip);
        data.set("ipv4_gateway", server.gateway_v4);
        data.set("ipv4_mask", server.netmask_v4);
        data.set("ipv4_private_cidr", private_cidr);
        data.set("name", server.name);
        data.set("networks", networks);
        data.set("network_ids", network_ids);
        data.set("os_id", os_id);
        data.set("plan_id", server.plan_id);
        data.set("power_status", server.power_status);
        data.set("ram", server.ram);
        data.set("region_id", server.region_id);
        data.set("status", server.status);
        data.set("server_state", server.server_state);
        data.set("tag", server.tag);
        data.set("vcpus", server.vcpu_count);
        data.set(
            "ipv6_addresses",
            server
                .v6_networks
                .into_iter()
                .map(|n| n.main_ip)
                .collect::<Vec<_>>(),
        );

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if data.has_change("application_id") {
            info!("Updating instance ({}) application", id);
            let (old, new) = string_change(data, "application_id");
            self.change_application(&id, &new).await?;
            self.wait_for(
                ctx,
                data,
                "application_id",
                &new,
                &["", old.as_str()],
                TimeoutKind::Update,
            )
            .await?;
        }

        if data.has_change("firewall_group_id") {
            info!("Updating instance ({}) firewall group", id);
            let (old, new) = string_change(data, "firewall_group_id");
            self.client()
                .servers()
                .set_firewall_group(&id, &new)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error changing instance ({}) firewall group to {:?}: {}",
                        id, new, e
                    ))
                })?;
            self.wait_for(
                ctx,
                data,
                "firewall_group_id",
                &new,
                &[old.as_str()],
                TimeoutKind::Update,
            )
            .await?;
        }

        if data.has_change("name") {
            info!("Updating instance ({}) name", id);
            let (old, new) = string_change(data, "name");
            self.client()
                .servers()
                .rename(&id, &new)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error renaming instance ({}) to {:?}: {}",
                        id, new, e
                    ))
                })?;
            self.wait_for(ctx, data, "name", &new, &["", old.as_str()], TimeoutKind::Update)
                .await?;
        }

        if data.has_change("network_ids") {
            info!("Updating instance ({}) networks", id);
            let (old, new) = strings_change(data, "network_ids");
            for network in strings_diff(&old, &new) {
                self.client()
                    .servers()
                    .enable_private_network(&id, &network)
                    .await
                    .map_err(|e| {
                        TfplugError::Custom(format!(
                            "Error attaching instance ({}) to private network {:?}: {}",
                            id, network, e
                        ))
                    })?;
            }
            for network in strings_diff(&new, &old) {
                self.client()
                    .servers()
                    .disable_private_network(&id, &network)
                    .await
                    .map_err(|e| {
                        TfplugError::Custom(format!(
                            "Error detaching instance ({}) from private network {:?}: {}",
                            id, network, e
                        ))
                    })?;
            }
        }

        if data.has_change("os_id") {
            info!("Updating instance ({}) OS", id);
            let (old, new) = int_change(data, "os_id");
            self.change_os(&id, new).await?;
            let (old, new) = (old.to_string(), new.to_string());
            self.wait_for(ctx, data, "os_id", &new, &["", old.as_str()], TimeoutKind::Update)
                .await?;
        }

        if data.has_change("tag") {
            info!("Updating instance ({}) tag", id);
            let (old, new) = string_change(data, "tag");
            self.client().servers().tag(&id, &new).await.map_err(|e| {
                TfplugError::Custom(format!(
                    "Error tagging instance ({}) with {:?}: {}",
                    id, new, e
                ))
            })?;
            self.wait_for(ctx, data, "tag", &new, &["", old.as_str()], TimeoutKind::Update)
                .await?;
        }

        self.read(ctx, data).await
    }

    /// Destroy is repeated until the API reports the server unknown: a
    /// successful call only schedules destruction.
    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying instance ({})", id);

        let deadline = Instant::now() + data.timeout(TimeoutKind::Delete);
        let interval = self.provider_data.wait.min_poll_interval;

        loop {
            match self.client().servers().destroy(&id).await {
                Ok(()) => debug!("Destroy of instance ({}) accepted", id),
                Err(e) if is_destroy_in_progress(&e) => {
                    debug!("Instance ({}) is still being destroyed: {}", id, e)
                }
                Err(e) if e.message_starts_with(GONE_PREFIX) => break,
                Err(e) => {
                    return Err(TfplugError::Custom(format!(
                        "Error destroying instance ({}): {}",
                        id, e
                    )))
                }
            }

            if Instant::now() >= deadline {
                return Err(TfplugError::Custom(format!(
                    "Error destroying instance ({}): still present after {:?}",
                    id,
                    data.timeout(TimeoutKind::Delete)
                )));
            }

            tokio::select! {
                _ = ctx.cancelled() => {
                    return Err(TfplugError::Custom(format!(
                        "Error destroying instance ({}): cancelled",
                        id
                    )));
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        data.set_id("");
        Ok(())
    }
}

fn is_destroy_in_progress(err: &ApiError) -> bool {
    matches!(err.message(), Some(DESTROY_LOCKED) | Some(DESTROY_PENDING))
}

/// Prefix length of a dotted IPv4 netmask; 0 for anything that is not a
/// contiguous mask.
fn netmask_prefix(mask: &str) -> u32 {
    let Ok(mask) = mask.parse::<Ipv4Addr>() else {
        return 0;
    };
    let bits = u32::from(mask);
    let ones = bits.leading_ones();
    if bits.checked_shl(ones).unwrap_or(0) == 0 {
        ones
    } else {
        0
    }
}

fn build_schema() -> Schema {
    let string_list = || AttributeType::List(Box::new(AttributeType::String));

    SchemaBuilder::new()
        .version(0)
        .description("Manages a Vultr virtual machine instance")
        .attribute(
            AttributeBuilder::new("application_id", AttributeType::String)
                .description("One-click application to install")
                .optional()
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("auto_backups", AttributeType::Bool)
                .description("Enable automatic backups")
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("cost_per_month", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("default_password", AttributeType::String)
                .description("Root password set at creation")
                .computed()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("disk", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("firewall_group_id", AttributeType::String)
                .description("Firewall group the instance belongs to")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("hostname", AttributeType::String)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv4_address", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv4_gateway", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv4_mask", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv4_private_cidr", AttributeType::String)
                .description("Private address with prefix length, empty without private networking")
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv6", AttributeType::Bool)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ipv6_addresses", string_list())
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .description("Label of the instance")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new(
                "networks",
                AttributeType::Map(Box::new(AttributeType::String)),
            )
            .description("Private network id to private address")
            .computed()
            .build(),
        )
        .attribute(
            AttributeBuilder::new("network_ids", string_list())
                .description("Private networks to attach")
                .optional()
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("notify_activate", AttributeType::Bool)
                .description("Send an activation email")
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("os_id", AttributeType::Number)
                .description("Operating system to install; conflicts with snapshot_id")
                .optional()
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("plan_id", AttributeType::Number)
                .required()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("power_status", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("private_networking", AttributeType::Bool)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ram", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("region_id", AttributeType::Number)
                .required()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("server_state", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("snapshot_id", AttributeType::String)
                .description("Snapshot to restore; conflicts with os_id and application_id")
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("startup_script_id", AttributeType::Number)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ssh_key_ids", string_list())
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("status", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("tag", AttributeType::String)
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("user_data", AttributeType::String)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("vcpus", AttributeType::Number)
                .computed()
                .build(),
        )
        .build()
}

#[cfg(test)]
#[path = "./instance_test.rs"]
mod instance_test;
