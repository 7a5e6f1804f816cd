//! Field tables for the schema model
//!
//! Every mergeable entity has a fixed set of native fields. These tables are
//! what the validator checks override keys against, and they carry the value
//! shape each field accepts so that a validated override never fails to merge.

use serde_json::Value;

use super::property::PropertyType;

/// Shape of the value a native field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    String,
    StringList,
    Integer,
    /// One of the HTTP verbs in [`super::Verb`]
    Verb,
    /// A property variant name, see [`PropertyType`]
    TypeName,
    /// Any JSON value
    Any,
}

impl FieldType {
    /// Check that `value` has this shape
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let ok = match self {
            FieldType::Bool => value.is_boolean(),
            FieldType::String => value.is_string(),
            FieldType::StringList => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Verb => {
                return match value.as_str() {
                    Some(s) if s.parse::<super::Verb>().is_ok() => Ok(()),
                    _ => Err(format!(
                        "expected one of {}, got {}",
                        super::Verb::NAMES.join("/"),
                        value
                    )),
                };
            }
            FieldType::TypeName => {
                return match value.as_str() {
                    Some(s) => s.parse::<PropertyType>().map(|_| ()),
                    None => Err(format!("expected a type name, got {}", value)),
                };
            }
            FieldType::Any => true,
        };

        if ok {
            Ok(())
        } else {
            Err(format!("expected {}, got {}", self.describe(), value))
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldType::Bool => "a boolean",
            FieldType::String => "a string",
            FieldType::StringList => "a list of strings",
            FieldType::Integer => "an integer",
            FieldType::Verb => "an HTTP verb",
            FieldType::TypeName => "a type name",
            FieldType::Any => "any value",
        }
    }
}

/// A native field on a schema entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
    /// The node stores the field as an `Option`, so an explicit `null`
    /// clears it
    pub nullable: bool,
}

impl FieldDef {
    /// Check an override value for this field
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() && self.nullable {
            return Ok(());
        }
        self.ty.check(value)
    }
}

/// A field every node carries
const fn field(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef { name, ty, nullable: false }
}

const fn optional(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef { name, ty, nullable: true }
}

/// Override key requesting a variant substitution
pub const TYPE_KEY: &str = "type";

/// Override key holding nested property specs on a resource
pub const PROPERTIES_KEY: &str = "properties";

pub const PRODUCT_FIELDS: &[FieldDef] = &[
    field("name", FieldType::String),
    optional("display_name", FieldType::String),
    optional("base_url", FieldType::String),
    optional("scopes", FieldType::StringList),
];

pub const RESOURCE_FIELDS: &[FieldDef] = &[
    field("name", FieldType::String),
    optional("description", FieldType::String),
    optional("base_url", FieldType::String),
    optional("self_link", FieldType::String),
    optional("create_url", FieldType::String),
    optional("update_url", FieldType::String),
    optional("delete_url", FieldType::String),
    optional("create_verb", FieldType::Verb),
    optional("read_verb", FieldType::Verb),
    optional("update_verb", FieldType::Verb),
    optional("delete_verb", FieldType::Verb),
    optional("collection_url_key", FieldType::String),
    optional("identity", FieldType::StringList),
    optional("kind", FieldType::String),
    optional("min_version", FieldType::String),
    field("exclude", FieldType::Bool),
    optional("input", FieldType::Bool),
    optional("readonly", FieldType::Bool),
    optional("update_mask", FieldType::Bool),
    optional("has_self_link", FieldType::Bool),
];

/// Fields shared by every property variant. `api_name` is deliberately absent:
/// the wire name always comes from the base property.
pub const PROPERTY_FIELDS: &[FieldDef] = &[
    field(TYPE_KEY, FieldType::TypeName),
    field("name", FieldType::String),
    optional("description", FieldType::String),
    optional("required", FieldType::Bool),
    optional("output", FieldType::Bool),
    optional("input", FieldType::Bool),
    field("exclude", FieldType::Bool),
    optional("update_verb", FieldType::Verb),
    optional("update_url", FieldType::String),
    optional("default_value", FieldType::Any),
    optional("send_empty_value", FieldType::Bool),
    optional("min_version", FieldType::String),
];

const CONSTANT_FIELDS: &[FieldDef] = &[field("value", FieldType::Any)];
const ENUM_FIELDS: &[FieldDef] = &[field("values", FieldType::StringList)];
const ARRAY_FIELDS: &[FieldDef] = &[
    field("item_type", FieldType::TypeName),
    optional("min_size", FieldType::Integer),
    optional("max_size", FieldType::Integer),
];
const RESOURCE_REF_FIELDS: &[FieldDef] = &[
    field("resource", FieldType::String),
    field("imports", FieldType::String),
];

/// Scalar fields specific to one property variant. Structural slots
/// (`properties`, `key_type`, `value_type`) are never overridable.
pub fn variant_fields(ty: PropertyType) -> &'static [FieldDef] {
    match ty {
        PropertyType::Constant => CONSTANT_FIELDS,
        PropertyType::Enum => ENUM_FIELDS,
        PropertyType::Array => ARRAY_FIELDS,
        PropertyType::ResourceRef => RESOURCE_REF_FIELDS,
        _ => &[],
    }
}

/// Look up a field by name
pub fn find(fields: &'static [FieldDef], name: &str) -> Option<&'static FieldDef> {
    fields.iter().find(|f| f.name == name)
}

/// Look up a field that is legal on a property of the given variant
pub fn find_property_field(ty: PropertyType, name: &str) -> Option<&'static FieldDef> {
    find(PROPERTY_FIELDS, name).or_else(|| find(variant_fields(ty), name))
}
