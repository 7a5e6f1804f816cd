//! Property variants
//!
//! A property is a closed tagged union over primitive leaves, composite nodes
//! (nested objects, arrays, maps), resource references and fetched-external
//! values. Common attributes live on [`Property`], variant data on
//! [`PropertyKind`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Verb;

/// Non-owning back-reference from a property to where it lives
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyOwner {
    /// Name of the owning resource
    pub resource: String,
    /// Dotted path of the immediate parent property, if nested
    pub parent: Option<String>,
}

/// A property node in the schema graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    /// Externally-facing field name. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Output-only: never sent to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
    /// Only used on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_empty_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(flatten)]
    pub kind: PropertyKind,
    /// Provider-only extension data attached by overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_attributes: BTreeMap<String, Value>,
    #[serde(skip)]
    pub(crate) owner: Option<PropertyOwner>,
}

/// Variant data of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropertyKind {
    String,
    Integer,
    Double,
    Boolean,
    Time,
    Constant {
        value: Value,
    },
    Enum {
        values: Vec<String>,
    },
    NestedObject {
        #[serde(default)]
        properties: Vec<Property>,
    },
    Array {
        item_type: Box<Property>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_size: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_size: Option<i64>,
    },
    Map {
        key_type: Box<Property>,
        value_type: Box<Property>,
    },
    ResourceRef {
        resource: String,
        imports: String,
    },
    FetchedExternal,
}

/// Discriminant of [`PropertyKind`], used for type substitution requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Integer,
    Double,
    Boolean,
    Time,
    Constant,
    Enum,
    NestedObject,
    Array,
    Map,
    ResourceRef,
    FetchedExternal,
}

impl PropertyType {
    pub const ALL: [PropertyType; 12] = [
        PropertyType::String,
        PropertyType::Integer,
        PropertyType::Double,
        PropertyType::Boolean,
        PropertyType::Time,
        PropertyType::Constant,
        PropertyType::Enum,
        PropertyType::NestedObject,
        PropertyType::Array,
        PropertyType::Map,
        PropertyType::ResourceRef,
        PropertyType::FetchedExternal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "String",
            PropertyType::Integer => "Integer",
            PropertyType::Double => "Double",
            PropertyType::Boolean => "Boolean",
            PropertyType::Time => "Time",
            PropertyType::Constant => "Constant",
            PropertyType::Enum => "Enum",
            PropertyType::NestedObject => "NestedObject",
            PropertyType::Array => "Array",
            PropertyType::Map => "Map",
            PropertyType::ResourceRef => "ResourceRef",
            PropertyType::FetchedExternal => "FetchedExternal",
        }
    }

    /// Leaf variants that carry no variant data at all
    pub fn is_plain(&self) -> bool {
        matches!(
            self,
            PropertyType::String
                | PropertyType::Integer
                | PropertyType::Double
                | PropertyType::Boolean
                | PropertyType::Time
                | PropertyType::FetchedExternal
        )
    }

    /// Build the kind for a plain leaf variant
    pub fn plain_kind(&self) -> Option<PropertyKind> {
        match self {
            PropertyType::String => Some(PropertyKind::String),
            PropertyType::Integer => Some(PropertyKind::Integer),
            PropertyType::Double => Some(PropertyKind::Double),
            PropertyType::Boolean => Some(PropertyKind::Boolean),
            PropertyType::Time => Some(PropertyKind::Time),
            PropertyType::FetchedExternal => Some(PropertyKind::FetchedExternal),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    /// Accepts bare variant names (`Integer`) as well as the namespaced form
    /// used by older override files (`Api::Type::Integer`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("Api::Type::").unwrap_or(s);
        PropertyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == bare)
            .ok_or_else(|| format!("unknown property type '{}'", s))
    }
}

impl PropertyKind {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyKind::String => PropertyType::String,
            PropertyKind::Integer => PropertyType::Integer,
            PropertyKind::Double => PropertyType::Double,
            PropertyKind::Boolean => PropertyType::Boolean,
            PropertyKind::Time => PropertyType::Time,
            PropertyKind::Constant { .. } => PropertyType::Constant,
            PropertyKind::Enum { .. } => PropertyType::Enum,
            PropertyKind::NestedObject { .. } => PropertyType::NestedObject,
            PropertyKind::Array { .. } => PropertyType::Array,
            PropertyKind::Map { .. } => PropertyType::Map,
            PropertyKind::ResourceRef { .. } => PropertyType::ResourceRef,
            PropertyKind::FetchedExternal => PropertyType::FetchedExternal,
        }
    }

    fn object_properties(&self) -> Option<&[Property]> {
        match self {
            PropertyKind::NestedObject { properties } => Some(properties),
            _ => None,
        }
    }

    fn object_properties_mut(&mut self) -> Option<&mut Vec<Property>> {
        match self {
            PropertyKind::NestedObject { properties } => Some(properties),
            _ => None,
        }
    }
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            api_name: None,
            description: None,
            required: None,
            output: None,
            input: None,
            exclude: false,
            update_verb: None,
            update_url: None,
            default_value: None,
            send_empty_value: None,
            min_version: None,
            kind,
            additional_attributes: BTreeMap::new(),
            owner: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Boolean)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, PropertyKind::Enum { values: values.into_iter().map(Into::into).collect() })
    }

    pub fn nested(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self::new(name, PropertyKind::NestedObject { properties })
    }

    pub fn array(name: impl Into<String>, item_type: Property) -> Self {
        Self::new(
            name,
            PropertyKind::Array { item_type: Box::new(item_type), min_size: None, max_size: None },
        )
    }

    pub fn map(name: impl Into<String>, key_type: Property, value_type: Property) -> Self {
        Self::new(
            name,
            PropertyKind::Map { key_type: Box::new(key_type), value_type: Box::new(value_type) },
        )
    }

    pub fn resource_ref(
        name: impl Into<String>,
        resource: impl Into<String>,
        imports: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            PropertyKind::ResourceRef { resource: resource.into(), imports: imports.into() },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = Some(api_name.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.additional_attributes.insert(name.into(), value);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Externally-facing field name
    pub fn api_name(&self) -> &str {
        self.api_name.as_deref().unwrap_or(&self.name)
    }

    pub fn property_type(&self) -> PropertyType {
        self.kind.property_type()
    }

    /// Provider-only attribute attached to this node
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.additional_attributes.get(name)
    }

    /// Name of the owning resource, once linked
    pub fn resource_name(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.resource.as_str())
    }

    /// Dotted path of the immediate parent property, once linked
    pub fn parent_path(&self) -> Option<&str> {
        self.owner.as_ref().and_then(|o| o.parent.as_deref())
    }

    /// Child properties including excluded ones: the properties of a nested
    /// object, or of the nested-object element type of an array or map.
    pub fn nested_properties(&self) -> Option<&[Property]> {
        match &self.kind {
            PropertyKind::NestedObject { properties } => Some(properties),
            PropertyKind::Array { item_type, .. } => item_type.kind.object_properties(),
            PropertyKind::Map { value_type, .. } => value_type.kind.object_properties(),
            _ => None,
        }
    }

    pub fn nested_properties_mut(&mut self) -> Option<&mut Vec<Property>> {
        match &mut self.kind {
            PropertyKind::NestedObject { properties } => Some(properties),
            PropertyKind::Array { item_type, .. } => item_type.kind.object_properties_mut(),
            PropertyKind::Map { value_type, .. } => value_type.kind.object_properties_mut(),
            _ => None,
        }
    }

    pub fn has_nested_properties(&self) -> bool {
        self.nested_properties().is_some()
    }

    /// Child properties that are not excluded
    pub fn properties(&self) -> Vec<&Property> {
        self.nested_properties()
            .map(|props| props.iter().filter(|p| !p.exclude).collect())
            .unwrap_or_default()
    }

    pub fn child(&self, name: &str) -> Option<&Property> {
        self.nested_properties()?.iter().find(|p| p.name == name)
    }

    /// Current value of a native or provider-only field, if defined
    pub fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "description" => self.description.as_ref().map(|v| json!(v)),
            "required" => self.required.map(Value::Bool),
            "output" => self.output.map(Value::Bool),
            "input" => self.input.map(Value::Bool),
            "exclude" => self.exclude.then_some(Value::Bool(true)),
            "update_verb" => self.update_verb.map(|v| json!(v)),
            "update_url" => self.update_url.as_ref().map(|v| json!(v)),
            "default_value" => self.default_value.clone(),
            "send_empty_value" => self.send_empty_value.map(Value::Bool),
            "min_version" => self.min_version.as_ref().map(|v| json!(v)),
            other => self.additional_attributes.get(other).cloned(),
        }
    }

    /// Set back-references on this node and everything below it
    pub(crate) fn link(&mut self, resource: &str, parent: Option<&str>, path: &str) {
        self.owner = Some(PropertyOwner {
            resource: resource.to_string(),
            parent: parent.map(str::to_string),
        });

        match &mut self.kind {
            PropertyKind::NestedObject { properties } => {
                link_children(properties, resource, path);
            }
            PropertyKind::Array { item_type, .. } => {
                link_element(item_type, resource, path);
            }
            PropertyKind::Map { key_type, value_type } => {
                link_element(key_type, resource, path);
                link_element(value_type, resource, path);
            }
            _ => {}
        }
    }
}

/// Element types of arrays and maps share their container's path. Their own
/// name is left as written so linking never changes serialized content.
fn link_element(element: &mut Property, resource: &str, path: &str) {
    element.owner = Some(PropertyOwner {
        resource: resource.to_string(),
        parent: Some(path.to_string()),
    });
    if let PropertyKind::NestedObject { properties } = &mut element.kind {
        link_children(properties, resource, path);
    }
}

fn link_children(properties: &mut [Property], resource: &str, parent: &str) {
    for child in properties {
        let path = format!("{}.{}", parent, child.name);
        child.link(resource, Some(parent), &path);
    }
}
