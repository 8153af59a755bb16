//! Schema types and builders for tfplug
//!
//! This module provides the schema system for defining provider, resource and
//! data source schemas: attribute types, nested blocks, defaults and
//! validation.

use crate::types::{Diagnostics, Dynamic};
use crate::validator::Validator;
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>), // Ordered, allows duplicates
    Set(Box<AttributeType>),  // Unordered, no duplicates
    Map(Box<AttributeType>),  // String keys only
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value destroys and recreates the resource.
    pub force_new: bool,
    pub default: Option<Dynamic>,
    pub validators: Vec<Arc<dyn Validator>>,
}

// Manual Debug implementation since validators don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("default", &self.default)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

/// NestedBlock represents a nested configuration block such as `filter`
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Single,
    List,
    Set,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Checks required attributes and runs attribute validators against a
    /// configuration. Unknown values are skipped; they are validated again
    /// once known.
    pub fn validate(&self, config: &HashMap<String, Dynamic>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_block(&self.block, config, "", &mut diags);
        diags
    }

    /// Fills in static defaults for optional attributes missing from `config`.
    pub fn apply_defaults(&self, config: &mut HashMap<String, Dynamic>) {
        for attr in &self.block.attributes {
            if let Some(default) = &attr.default {
                let unset = config.get(&attr.name).map_or(true, Dynamic::is_null);
                if unset {
                    config.insert(attr.name.clone(), default.clone());
                }
            }
        }
    }
}

fn validate_block(
    block: &Block,
    config: &HashMap<String, Dynamic>,
    prefix: &str,
    diags: &mut Diagnostics,
) {
    for attr in &block.attributes {
        let path = format!("{}{}", prefix, attr.name);
        match config.get(&attr.name) {
            None | Some(Dynamic::Null) => {
                if attr.required {
                    diags.add_attribute_error(
                        &path,
                        format!("Missing required argument \"{}\"", path),
                        None::<String>,
                    );
                }
            }
            Some(Dynamic::Unknown) => {}
            Some(value) => {
                for validator in &attr.validators {
                    validator.validate(value, &path, diags);
                }
            }
        }
    }

    for nested in &block.block_types {
        let items: Vec<&HashMap<String, Dynamic>> = match config.get(&nested.type_name) {
            Some(Dynamic::List(items)) => items.iter().filter_map(Dynamic::as_map).collect(),
            Some(Dynamic::Map(item)) => vec![item],
            _ => Vec::new(),
        };

        let count = items.len() as i64;
        if count < nested.min_items {
            diags.add_error(
                format!(
                    "At least {} \"{}\" blocks are required",
                    nested.min_items, nested.type_name
                ),
                None::<String>,
            );
        }
        if nested.max_items > 0 && count > nested.max_items {
            diags.add_error(
                format!(
                    "No more than {} \"{}\" blocks are allowed",
                    nested.max_items, nested.type_name
                ),
                None::<String>,
            );
        }

        for (index, item) in items.into_iter().enumerate() {
            let prefix = format!("{}{}.{}.", prefix, nested.type_name, index);
            validate_block(&nested.block, item, &prefix, diags);
        }
    }
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                default: None,
                validators: Vec::new(),
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    /// Static default, applied when the attribute is not configured
    pub fn default(mut self, value: impl Into<Dynamic>) -> Self {
        self.attribute.default = Some(value.into());
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
#[derive(Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    /// Add nested block
    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

/// The `filter { name = ..., values = [...] }` block shared by data sources
pub fn filter_block() -> NestedBlock {
    NestedBlock {
        type_name: "filter".to_string(),
        block: Block {
            attributes: vec![
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Attribute to filter on")
                    .required()
                    .build(),
                AttributeBuilder::new(
                    "values",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Accepted values; any match is enough")
                .required()
                .build(),
            ],
            block_types: Vec::new(),
            description: String::new(),
        },
        nesting: NestingMode::Set,
        min_items: 0,
        max_items: 0,
    }
}
