//! Filter predicates for data sources
//!
//! Every data source accepts `filter { name = ..., values = [...] }` blocks
//! and/or a regular expression on one field. Items are compared through a
//! flat `field -> string` view built from their API field names.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use tfplug::{Dynamic, ResourceData, Result, TfplugError};

/// One `filter` block: the item matches when `name` is present and its value
/// equals any of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn matches(&self, item: &HashMap<String, String>) -> bool {
        item.get(&self.name)
            .is_some_and(|value| self.values.iter().any(|v| v == value))
    }

    fn from_block(block: &HashMap<String, Dynamic>) -> Result<Self> {
        let name = block
            .get("name")
            .and_then(Dynamic::as_string)
            .ok_or_else(|| TfplugError::InvalidConfiguration("filter.name must be a string".into()))?
            .to_string();
        let values = match block.get("values") {
            Some(Dynamic::List(items)) => items
                .iter()
                .map(|v| {
                    v.as_string().map(str::to_string).ok_or_else(|| {
                        TfplugError::InvalidConfiguration(
                            "filter.values must be a list of strings".into(),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None | Some(Dynamic::Null) => Vec::new(),
            Some(_) => {
                return Err(TfplugError::InvalidConfiguration(
                    "filter.values must be a list of strings".into(),
                ))
            }
        };
        Ok(Self { name, values })
    }
}

/// All filters must match. An empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiFilter {
    pub filters: Vec<Filter>,
}

impl MultiFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, item: &HashMap<String, String>) -> bool {
        self.filters.iter().all(|f| f.matches(item))
    }

    /// Reads the `filter` blocks of a data source configuration.
    pub fn from_data(data: &ResourceData) -> Result<Self> {
        let filters = data
            .get_blocks("filter")?
            .iter()
            .map(Filter::from_block)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters })
    }
}

/// Flattens an API object to its scalar fields. Booleans render as
/// `true`/`false`, integers in decimal; floats, nulls and nested values are
/// dropped.
pub fn flatten<T: Serialize>(item: &T) -> Result<HashMap<String, String>> {
    let value = serde_json::to_value(item)
        .map_err(|e| TfplugError::Custom(format!("Error flattening item for filtering: {}", e)))?;

    let serde_json::Value::Object(fields) = value else {
        return Ok(HashMap::new());
    };

    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| {
            let flat = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
                _ => return None,
            };
            Some((key, flat))
        })
        .collect())
}

/// The selection a data source was configured with.
#[derive(Debug, Clone)]
pub struct Selection {
    pub filters: MultiFilter,
    pub regex: Option<Regex>,
}

impl Selection {
    /// Reads `filter` blocks plus the regex attribute; at least one is required.
    pub fn from_data(data: &ResourceData, regex_attribute: &str) -> Result<Self> {
        let filters = MultiFilter::from_data(data)?;
        let pattern = data.get_string(regex_attribute)?;

        if filters.is_empty() && pattern.is_empty() {
            return Err(TfplugError::InvalidConfiguration(format!(
                "One of {:?} and {:?} must be provided",
                "filter", regex_attribute
            )));
        }

        let regex = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&pattern).map_err(|e| {
                TfplugError::InvalidConfiguration(format!(
                    "{:?}: {:?}: {}",
                    regex_attribute, pattern, e
                ))
            })?)
        };

        Ok(Self { filters, regex })
    }

    /// Keeps the items passing both the filters and the regex on `field`.
    pub fn apply<T, F>(&self, items: Vec<T>, field: F) -> Result<Vec<T>>
    where
        T: Serialize,
        F: Fn(&T) -> &str,
    {
        let mut selected = Vec::with_capacity(items.len());
        for item in items {
            if !self.filters.is_empty() && !self.filters.matches(&flatten(&item)?) {
                continue;
            }
            if let Some(regex) = &self.regex {
                if !regex.is_match(field(&item)) {
                    continue;
                }
            }
            selected.push(item);
        }
        Ok(selected)
    }
}

/// Requires exactly one result; `what` names the queried collection
/// (e.g. "regions").
pub fn exactly_one<T>(mut items: Vec<T>, what: &str) -> Result<T> {
    match items.len() {
        1 => Ok(items.remove(0)),
        0 => Err(TfplugError::Custom(format!(
            "The query for {} returned no results. Please modify the search criteria and try again",
            what
        ))),
        n => Err(TfplugError::Custom(format!(
            "The query for {} returned {} results. Please make the search criteria more specific and try again",
            what, n
        ))),
    }
}
