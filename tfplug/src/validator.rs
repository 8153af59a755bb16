use crate::error::{Result, TfplugError};
use crate::types::{Diagnostics, Dynamic};
use std::net::IpAddr;

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics);
}

/// Accepts only one of a fixed set of strings.
pub struct StringOneOf {
    pub allowed: Vec<String>,
}

impl StringOneOf {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Validator for StringOneOf {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.add_attribute_error(
                    attribute_path,
                    format!(
                        "{} must be one of {}",
                        attribute_path,
                        self.allowed.join(", ")
                    ),
                    Some(format!("Got {:?}", s)),
                );
            }
        }
    }
}

/// Accepts an IPv4 or IPv6 address.
pub struct IpAddress;

impl Validator for IpAddress {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if s.parse::<IpAddr>().is_err() {
                diagnostics.add_attribute_error(
                    attribute_path,
                    format!("{} must be a valid IP address", attribute_path),
                    Some(format!("Got {:?}", s)),
                );
            }
        }
    }
}

/// Accepts a CIDR whose address is the network address, e.g. `10.0.0.0/24`
/// but not `10.0.0.1/24`.
pub struct CidrNetwork;

impl Validator for CidrNetwork {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Err(err) = parse_cidr_network(s) {
                diagnostics.add_attribute_error(
                    attribute_path,
                    format!("{} must be a network CIDR", attribute_path),
                    Some(err.to_string()),
                );
            }
        }
    }
}

/// Accepts any string that compiles as a regular expression.
pub struct RegexSyntax;

impl Validator for RegexSyntax {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Err(err) = regex::Regex::new(s) {
                diagnostics.add_attribute_error(
                    attribute_path,
                    format!("{} must be a valid regular expression", attribute_path),
                    Some(err.to_string()),
                );
            }
        }
    }
}

/// Parses `address/prefix` and checks that the address is the network
/// address for that prefix. Returns the address and prefix length.
pub fn parse_cidr_network(cidr: &str) -> Result<(IpAddr, u8)> {
    let invalid = |reason: &str| {
        TfplugError::ValidationFailed(format!("invalid CIDR {:?}: {}", cidr, reason))
    };

    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid("missing prefix length"))?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid("bad address"))?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid("bad prefix length"))?;

    let network = match addr {
        IpAddr::V4(v4) => {
            if prefix > 32 {
                return Err(invalid("prefix length out of range"));
            }
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            IpAddr::from((u32::from(v4) & mask).to_be_bytes())
        }
        IpAddr::V6(v6) => {
            if prefix > 128 {
                return Err(invalid("prefix length out of range"));
            }
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            IpAddr::from((u128::from(v6) & mask).to_be_bytes())
        }
    };

    if network != addr {
        return Err(invalid(&format!("expected network address {}", network)));
    }

    Ok((addr, prefix))
}

/// Splits `<string>/<int>` ids such as `<firewall-group>/<rule-number>`.
pub fn parse_string_int_id(id: &str) -> Result<(String, i64)> {
    let (left, right) = split_id(id)?;
    let number = right.parse::<i64>().map_err(|_| {
        TfplugError::InvalidState(format!(
            "expected id of the form <string>/<int>, got {:?}",
            id
        ))
    })?;
    Ok((left.to_string(), number))
}

/// Splits `<string>/<string>` ids such as `<domain>/<record-id>`.
pub fn parse_string_string_id(id: &str) -> Result<(String, String)> {
    let (left, right) = split_id(id)?;
    Ok((left.to_string(), right.to_string()))
}

fn split_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() && !right.contains('/') => {
            Ok((left, right))
        }
        _ => Err(TfplugError::InvalidState(format!(
            "expected id with exactly two parts separated by '/', got {:?}",
            id
        ))),
    }
}
