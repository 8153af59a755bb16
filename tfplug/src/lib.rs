//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of a Terraform plugin: the value model, schemas,
//! the Provider/Resource/DataSource traits, and helpers resources need while
//! talking to eventually-consistent cloud APIs (waiting for convergence and
//! per-key locking).

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod mutex;
pub mod validator;
pub mod wait;

// Re-exports for convenience
pub use context::Context;
pub use data_source::DataSource;
pub use error::{Result, TfplugError};
pub use mutex::KeyedMutex;
pub use provider::Provider;
pub use resource::{import_state_passthrough_id, Resource};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{Diagnostic, Diagnostics, Dynamic, ResourceData, TimeoutKind, Timeouts};
pub use wait::{StateChangeConf, UnexpectedStatePolicy, WaitError};
