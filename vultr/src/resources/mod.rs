//! Resource implementations

pub mod block_storage;
pub mod dns_domain;
pub mod dns_record;
pub mod firewall_group;
pub mod firewall_rule;
pub mod instance;
pub mod ipv4;
pub mod network;
pub mod reserved_ip;
pub mod ssh_key;
pub mod startup_script;

pub use block_storage::BlockStorageResource;
pub use dns_domain::DnsDomainResource;
pub use dns_record::DnsRecordResource;
pub use firewall_group::FirewallGroupResource;
pub use firewall_rule::FirewallRuleResource;
pub use instance::InstanceResource;
pub use ipv4::Ipv4Resource;
pub use network::NetworkResource;
pub use reserved_ip::ReservedIpResource;
pub use ssh_key::SshKeyResource;
pub use startup_script::StartupScriptResource;

use tfplug::{Dynamic, ResourceData};

/// `(old, new)` of a string attribute; unset reads as "".
pub(crate) fn string_change(data: &ResourceData, key: &str) -> (String, String) {
    let (old, new) = data.get_change(key);
    (as_string(&old), as_string(&new))
}

/// `(old, new)` of an integer attribute; unset reads as 0.
pub(crate) fn int_change(data: &ResourceData, key: &str) -> (i64, i64) {
    let (old, new) = data.get_change(key);
    (old.as_int().unwrap_or(0), new.as_int().unwrap_or(0))
}

/// `(old, new)` of a list-of-strings attribute.
pub(crate) fn strings_change(data: &ResourceData, key: &str) -> (Vec<String>, Vec<String>) {
    let (old, new) = data.get_change(key);
    (as_strings(&old), as_strings(&new))
}

fn as_string(value: &Dynamic) -> String {
    value.as_string().unwrap_or_default().to_string()
}

fn as_strings(value: &Dynamic) -> Vec<String> {
    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_string().map(str::to_string))
        .collect()
}

/// Items of `b` that are not in `a`.
pub(crate) fn strings_diff(a: &[String], b: &[String]) -> Vec<String> {
    b.iter().filter(|s| !a.contains(s)).cloned().collect()
}
