//! Core type system for tfplug
//!
//! This module provides the values exchanged between the host and a provider:
//! [`Dynamic`] attribute values, [`Diagnostics`], and the mutable
//! [`ResourceData`] handle every CRUD operation works against.

use crate::error::{Result, TfplugError};
use std::collections::HashMap;
use std::time::Duration;

/// Dynamic represents Terraform values that can be of any type
/// IMPORTANT: Prefer the typed accessors on ResourceData over matching directly
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null value
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// List of values (ordered, allows duplicates)
    List(Vec<Dynamic>),
    /// Map of string keys to values (objects are represented as Maps)
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Dynamic::Int(i) => Some(*i),
            // Whole floats are what JSON-decoded configs produce for integers.
            Dynamic::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// Zero values are what an unset attribute reads as: null, `false`, `0`,
    /// `""` and empty collections.
    pub fn is_zero(&self) -> bool {
        match self {
            Dynamic::Null | Dynamic::Unknown => true,
            Dynamic::Bool(b) => !b,
            Dynamic::Int(i) => *i == 0,
            Dynamic::Float(f) => *f == 0.0,
            Dynamic::String(s) => s.is_empty(),
            Dynamic::List(l) => l.is_empty(),
            Dynamic::Map(m) => m.is_empty(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }

    /// Equality that treats every zero value as equivalent to "unset".
    pub fn same_as(&self, other: &Dynamic) -> bool {
        self == other || (self.is_zero() && other.is_zero())
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Int(value)
    }
}

impl From<i32> for Dynamic {
    fn from(value: i32) -> Self {
        Dynamic::Int(value.into())
    }
}

impl From<u32> for Dynamic {
    fn from(value: u32) -> Self {
        Dynamic::Int(value.into())
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Float(value)
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl<T: Into<Dynamic>> From<Vec<T>> for Dynamic {
    fn from(value: Vec<T>) -> Self {
        Dynamic::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Dynamic>> From<HashMap<String, T>> for Dynamic {
    fn from(value: HashMap<String, T>) -> Self {
        Dynamic::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Dynamic::Null)
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Dynamic::Null,
            Value::Bool(b) => Dynamic::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Dynamic::Int(i),
                None => Dynamic::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Dynamic::String(s),
            Value::Array(items) => Dynamic::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Dynamic::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: Option<String>,
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: Option<impl Into<String>>) {
        self.errors.push(Diagnostic {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.map(Into::into),
            attribute: None,
        });
    }

    pub fn add_attribute_error(
        &mut self,
        attribute: &str,
        summary: impl Into<String>,
        detail: Option<impl Into<String>>,
    ) {
        self.errors.push(Diagnostic {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.map(Into::into),
            attribute: Some(attribute.to_string()),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: Option<impl Into<String>>) {
        self.warnings.push(Diagnostic {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.map(Into::into),
            attribute: None,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Which operation a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Create,
    Read,
    Update,
    Delete,
}

/// Per-operation timeouts configured on a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const DEFAULT: Duration = Duration::from_secs(20 * 60);

    pub fn get(&self, kind: TimeoutKind) -> Duration {
        match kind {
            TimeoutKind::Create => self.create,
            TimeoutKind::Read => self.read,
            TimeoutKind::Update => self.update,
            TimeoutKind::Delete => self.delete,
        }
    }

    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            update: timeout,
            delete: timeout,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT)
    }
}

/// ResourceData is the mutable handle a resource operation reads its
/// configuration from and writes its observed state to.
///
/// Values are layered: anything written with [`ResourceData::set`] wins over
/// the planned configuration, which wins over the prior state. Change
/// detection only compares prior state with configuration, so refreshing
/// the handle mid-update does not hide pending changes.
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,
    state: HashMap<String, Dynamic>,
    config: HashMap<String, Dynamic>,
    set: HashMap<String, Dynamic>,
    timeouts: Timeouts,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a create or data source read: configuration only.
    pub fn from_config(config: HashMap<String, Dynamic>) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Handle for read, delete and import: prior state only.
    pub fn from_state(id: impl Into<String>, state: HashMap<String, Dynamic>) -> Self {
        Self {
            id: id.into(),
            state,
            ..Self::default()
        }
    }

    /// Handle for update: prior state plus the planned configuration.
    pub fn for_update(
        id: impl Into<String>,
        state: HashMap<String, Dynamic>,
        config: HashMap<String, Dynamic>,
    ) -> Self {
        Self {
            id: id.into(),
            state,
            config,
            ..Self::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Setting an empty id marks the remote object as gone.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn timeout(&self, kind: TimeoutKind) -> Duration {
        self.timeouts.get(kind)
    }

    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.set
            .get(key)
            .or_else(|| self.config.get(key))
            .or_else(|| self.state.get(key))
    }

    /// Returns the value only when it is set to something other than its
    /// zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Dynamic> {
        self.get(key).filter(|v| !v.is_zero())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Dynamic>) {
        self.set.insert(key.to_string(), value.into());
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.get(key) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(String::new()),
            Some(Dynamic::String(s)) => Ok(s.clone()),
            Some(other) => Err(mismatch(key, "string", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(0),
            Some(value) => value.as_int().ok_or_else(|| mismatch(key, "int", value)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(false),
            Some(Dynamic::Bool(b)) => Ok(*b),
            Some(other) => Err(mismatch(key, "bool", other)),
        }
    }

    /// Reads a list of strings, e.g. `ssh_key_ids`.
    pub fn get_strings(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(Vec::new()),
            Some(Dynamic::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_string()
                        .map(str::to_string)
                        .ok_or_else(|| mismatch(key, "list of string", item))
                })
                .collect(),
            Some(other) => Err(mismatch(key, "list", other)),
        }
    }

    /// Reads a list of nested blocks, e.g. data source `filter` blocks.
    pub fn get_blocks(&self, key: &str) -> Result<Vec<HashMap<String, Dynamic>>> {
        match self.get(key) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(Vec::new()),
            Some(Dynamic::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_map()
                        .cloned()
                        .ok_or_else(|| mismatch(key, "list of object", item))
                })
                .collect(),
            Some(other) => Err(mismatch(key, "list", other)),
        }
    }

    /// Whether the configuration changes `key` relative to the prior state.
    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        !old.same_as(&new)
    }

    /// Returns `(old, new)` for `key`: prior state and planned configuration.
    pub fn get_change(&self, key: &str) -> (Dynamic, Dynamic) {
        let old = self.state.get(key).cloned().unwrap_or(Dynamic::Null);
        let new = self
            .config
            .get(key)
            .cloned()
            .unwrap_or_else(|| old.clone());
        (old, new)
    }

    /// Flattens the layers into the state that is handed back to the host.
    pub fn to_state(&self) -> HashMap<String, Dynamic> {
        let mut merged = self.state.clone();
        merged.extend(self.config.clone());
        merged.extend(self.set.clone());
        merged.insert("id".to_string(), Dynamic::String(self.id.clone()));
        merged
    }
}

fn mismatch(key: &str, expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        attribute: key.to_string(),
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    }
}
