//! Common types and utilities for the Vultr API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// `application/x-www-form-urlencoded` body of a POST request.
#[derive(Debug, Clone, Default)]
pub struct FormParams {
    params: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Empty strings are left out; the API treats a present-but-empty field
    /// differently from a missing one.
    pub fn add_non_empty<K: Into<String>>(self, key: K, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.add(key, value)
        }
    }

    /// Zero is left out, for ids where 0 means "none".
    pub fn add_non_zero<K: Into<String>>(self, key: K, value: i64) -> Self {
        if value == 0 {
            self
        } else {
            self.add(key, value)
        }
    }

    /// Vultr encodes booleans as `yes`/`no`; only `yes` is sent.
    pub fn add_flag<K: Into<String>>(self, key: K, value: bool) -> Self {
        if value {
            self.add(key, "yes")
        } else {
            self
        }
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// List endpoints answer with an object keyed by id, or with `[]` when
/// there is nothing to list.
pub(crate) fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrMap<T> {
        List(Vec<T>),
        Map(BTreeMap<String, T>),
    }

    match Option::<ListOrMap<T>>::deserialize(deserializer)? {
        Some(ListOrMap::List(items)) => Ok(items),
        Some(ListOrMap::Map(items)) => Ok(items.into_values().collect()),
        None => Ok(Vec::new()),
    }
}

/// Wrapper so client methods can decode any list endpoint.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ListResponse<T: DeserializeOwned> {
    #[serde(deserialize_with = "deserialize_list")]
    pub items: Vec<T>,
}

/// Accepts strings, numbers and null for fields the API is inconsistent about.
pub mod string_or_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::String(s)) => s,
            Some(Raw::Int(i)) => i.to_string(),
            Some(Raw::Float(f)) => f.to_string(),
            Some(Raw::Bool(b)) => b.to_string(),
            None => String::new(),
        })
    }
}

/// References to other objects (`attached_SUBID`, `FIREWALLGROUPID`, ...).
/// The API marks "none" with null, `false`, `0` or `"0"`; all read as "".
pub mod optional_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Int(i64),
        Bool(bool),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::String(s)) if s == "0" => String::new(),
            Some(Raw::String(s)) => s,
            Some(Raw::Int(0)) => String::new(),
            Some(Raw::Int(i)) => i.to_string(),
            Some(Raw::Bool(false)) | None => String::new(),
            Some(Raw::Bool(true)) => {
                return Err(serde::de::Error::custom("expected an object id, got true"))
            }
        })
    }
}

/// Integers that may arrive as JSON strings. Empty strings and null read as 0.
pub mod string_or_i64 {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrI64 {
        String(String),
        I64(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrI64>::deserialize(deserializer)? {
            Some(StringOrI64::String(s)) if s.trim().is_empty() => Ok(0),
            Some(StringOrI64::String(s)) => {
                s.trim().parse::<i64>().map_err(serde::de::Error::custom)
            }
            Some(StringOrI64::I64(i)) => Ok(i),
            None => Ok(0),
        }
    }
}

/// Prices and surcharges, sent as `"5.00"` or `5`.
pub mod string_or_f64 {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrF64 {
        String(String),
        F64(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrF64>::deserialize(deserializer)? {
            Some(StringOrF64::String(s)) if s.trim().is_empty() => Ok(0.0),
            Some(StringOrF64::String(s)) => {
                s.trim().parse::<f64>().map_err(serde::de::Error::custom)
            }
            Some(StringOrF64::F64(f)) => Ok(f),
            None => Ok(0.0),
        }
    }
}

/// Booleans sent as `true`, `"yes"`, `"1"` or `1`.
pub mod yes_no_bool {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        String(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolLike>::deserialize(deserializer)? {
            Some(BoolLike::Bool(b)) => Ok(b),
            Some(BoolLike::Int(i)) => Ok(i != 0),
            Some(BoolLike::String(s)) => match s.to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" => Ok(true),
                "no" | "false" | "0" | "" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "expected yes or no, got {other:?}"
                ))),
            },
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Item {
        #[serde(rename = "ID", with = "string_or_i64")]
        id: i64,
        #[serde(default, with = "yes_no_bool")]
        enabled: bool,
        #[serde(default, with = "string_or_number")]
        label: String,
    }

    #[test]
    fn query_string_encodes_values() {
        let params = ApiQueryParams::new()
            .add("SUBID", "576965")
            .add("domain", "a b.com");

        assert_eq!(params.to_query_string(), "?SUBID=576965&domain=a%20b.com");
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
    }

    #[test]
    fn form_skips_empty_zero_and_false() {
        let form = FormParams::new()
            .add("DCID", 1)
            .add_non_empty("label", "")
            .add_non_empty("tag", "web")
            .add_non_zero("SCRIPTID", 0)
            .add_flag("enable_ipv6", true)
            .add_flag("auto_backups", false);

        assert_eq!(form.as_pairs().len(), 3);
        assert_eq!(form.get("tag"), Some("web"));
        assert_eq!(form.get("enable_ipv6"), Some("yes"));
        assert_eq!(form.get("auto_backups"), None);
    }

    #[test]
    fn list_accepts_map_array_and_null() {
        let map: ListResponse<Item> =
            serde_json::from_str(r#"{"2":{"ID":"2"},"1":{"ID":1,"enabled":"yes"}}"#).unwrap();
        assert_eq!(map.items.len(), 2);
        assert_eq!(map.items[0].id, 1);
        assert!(map.items[0].enabled);

        let empty: ListResponse<Item> = serde_json::from_str("[]").unwrap();
        assert!(empty.items.is_empty());

        let null: ListResponse<Item> = serde_json::from_str("null").unwrap();
        assert!(null.items.is_empty());
    }

    #[test]
    fn numbers_and_strings_are_interchangeable() {
        let item: Item = serde_json::from_str(r#"{"ID":"", "label": 42}"#).unwrap();
        assert_eq!(item.id, 0);
        assert_eq!(item.label, "42");

        let err = serde_json::from_str::<Item>(r#"{"ID":"abc"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn optional_id_normalizes_none_markers() {
        #[derive(Deserialize)]
        struct Attached {
            #[serde(default, with = "optional_id")]
            attached: String,
        }

        for (raw, expected) in [
            (r#"{"attached":null}"#, ""),
            (r#"{"attached":false}"#, ""),
            (r#"{"attached":0}"#, ""),
            (r#"{"attached":"0"}"#, ""),
            (r#"{}"#, ""),
            (r#"{"attached":576965}"#, "576965"),
            (r#"{"attached":"576965"}"#, "576965"),
        ] {
            let parsed: Attached = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed.attached, expected, "input {raw}");
        }
    }

    #[test]
    fn optional_id_rejects_true() {
        #[derive(Debug, Deserialize)]
        struct Attached {
            #[serde(default, with = "optional_id")]
            #[allow(dead_code)]
            attached: String,
        }

        assert!(serde_json::from_str::<Attached>(r#"{"attached":true}"#).is_err());
    }
}
