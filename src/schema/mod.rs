//! Schema model
//!
//! The graph the override engine works on: a [`Product`] owns an ordered list
//! of [`Resource`]s, each of which owns ordered `properties` and `parameters`
//! lists of [`Property`] nodes. Back-references (resource → product,
//! property → resource / parent) are names, set by [`Product::link`].

pub mod fields;
pub mod property;

pub use fields::{FieldDef, FieldType};
pub use property::{Property, PropertyKind, PropertyOwner, PropertyType};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verb used by a resource operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Updates are not supported
    None,
}

impl Verb {
    pub const NAMES: [&'static str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "NONE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::None => "NONE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            "NONE" => Ok(Verb::None),
            other => Err(format!("unknown verb '{}'", other)),
        }
    }
}

/// Resource operation, for verb lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

/// An API resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL fragment relative to the product base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_url_key: Option<String>,
    /// Names of the parameters that uniquely identify the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_self_link: Option<bool>,
    #[serde(default, rename = "properties")]
    pub(crate) property_list: Vec<Property>,
    #[serde(default, rename = "parameters", skip_serializing_if = "Vec::is_empty")]
    pub(crate) parameter_list: Vec<Property>,
    /// Provider-only extension data attached by overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_attributes: BTreeMap<String, Value>,
    #[serde(skip)]
    pub(crate) product: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            base_url: None,
            self_link: None,
            create_url: None,
            update_url: None,
            delete_url: None,
            create_verb: None,
            read_verb: None,
            update_verb: None,
            delete_verb: None,
            collection_url_key: None,
            identity: None,
            kind: None,
            min_version: None,
            exclude: false,
            input: None,
            readonly: None,
            update_mask: None,
            has_self_link: None,
            property_list: Vec::new(),
            parameter_list: Vec::new(),
            additional_attributes: BTreeMap::new(),
            product: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.property_list.push(property);
        self
    }

    pub fn with_parameter(mut self, parameter: Property) -> Self {
        self.parameter_list.push(parameter);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.additional_attributes.insert(name.into(), value);
        self
    }

    /// Properties that are not excluded
    pub fn properties(&self) -> Vec<&Property> {
        self.property_list.iter().filter(|p| !p.exclude).collect()
    }

    /// Parameters that are not excluded
    pub fn parameters(&self) -> Vec<&Property> {
        self.parameter_list.iter().filter(|p| !p.exclude).collect()
    }

    /// Every property, excluded ones included
    pub fn property_list(&self) -> &[Property] {
        &self.property_list
    }

    /// Every parameter, excluded ones included
    pub fn parameter_list(&self) -> &[Property] {
        &self.parameter_list
    }

    /// Properties and parameters including excluded ones. This is the list
    /// override paths are resolved against.
    pub fn all_properties(&self) -> Vec<&Property> {
        self.property_list.iter().chain(self.parameter_list.iter()).collect()
    }

    /// Provider-only attribute attached to this node
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.additional_attributes.get(name)
    }

    /// Name of the owning product, once linked
    pub fn product_name(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Verb used for an operation, falling back to the API defaults
    pub fn verb(&self, op: Operation) -> Verb {
        match op {
            Operation::Create => self.create_verb.unwrap_or(Verb::Post),
            Operation::Read => self.read_verb.unwrap_or(Verb::Get),
            Operation::Update => self.update_verb.unwrap_or(Verb::Put),
            Operation::Delete => self.delete_verb.unwrap_or(Verb::Delete),
        }
    }

    /// Current value of a native or provider-only field, if defined
    pub fn field_value(&self, name: &str) -> Option<Value> {
        fn text(v: &Option<String>) -> Option<Value> {
            v.as_ref().map(|s| Value::String(s.clone()))
        }
        fn verb(v: &Option<Verb>) -> Option<Value> {
            v.map(|verb| Value::String(verb.as_str().to_string()))
        }

        match name {
            "name" => Some(Value::String(self.name.clone())),
            "description" => text(&self.description),
            "base_url" => text(&self.base_url),
            "self_link" => text(&self.self_link),
            "create_url" => text(&self.create_url),
            "update_url" => text(&self.update_url),
            "delete_url" => text(&self.delete_url),
            "create_verb" => verb(&self.create_verb),
            "read_verb" => verb(&self.read_verb),
            "update_verb" => verb(&self.update_verb),
            "delete_verb" => verb(&self.delete_verb),
            "collection_url_key" => text(&self.collection_url_key),
            "identity" => self.identity.as_ref().map(|ids| json!(ids)),
            "kind" => text(&self.kind),
            "min_version" => text(&self.min_version),
            "exclude" => self.exclude.then_some(Value::Bool(true)),
            "input" => self.input.map(Value::Bool),
            "readonly" => self.readonly.map(Value::Bool),
            "update_mask" => self.update_mask.map(Value::Bool),
            "has_self_link" => self.has_self_link.map(Value::Bool),
            other => self.additional_attributes.get(other).cloned(),
        }
    }

    pub(crate) fn link(&mut self, product: &str) {
        self.product = Some(product.to_string());
        let name = self.name.clone();
        for prop in self.property_list.iter_mut().chain(self.parameter_list.iter_mut()) {
            let path = prop.name.clone();
            prop.link(&name, None, &path);
        }
    }
}

/// A product: the root of one compilation unit's schema graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Base URL template, e.g. `https://www.googleapis.com/compute/v1/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, alias = "objects")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_attributes: BTreeMap<String, Value>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            base_url: None,
            scopes: None,
            resources: Vec::new(),
            additional_attributes: BTreeMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Get a resource by name
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// Set every back-reference in the graph. Returns `self` for chaining.
    pub fn link(mut self) -> Self {
        let name = self.name.clone();
        for resource in &mut self.resources {
            resource.link(&name);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product::new("Storage")
            .with_resource(
                Resource::new("Bucket")
                    .with_property(Property::string("name"))
                    .with_property(Property::string("legacy").excluded())
                    .with_parameter(Property::string("project")),
            )
            .link()
    }

    #[test]
    fn test_exclusion_views() {
        let product = sample();
        let bucket = product.resource("Bucket").unwrap();
        assert_eq!(bucket.properties().len(), 1);
        assert_eq!(bucket.property_list().len(), 2);
        assert_eq!(bucket.all_properties().len(), 3);
    }

    #[test]
    fn test_link_back_references() {
        let product = sample();
        let bucket = product.resource("Bucket").unwrap();
        assert_eq!(bucket.product_name(), Some("Storage"));
        assert_eq!(bucket.parameter_list()[0].resource_name(), Some("Bucket"));
    }

    #[test]
    fn test_verb_defaults() {
        let mut res = Resource::new("Disk");
        assert_eq!(res.verb(Operation::Create), Verb::Post);
        assert_eq!(res.verb(Operation::Update), Verb::Put);
        res.update_verb = Some(Verb::Patch);
        assert_eq!(res.verb(Operation::Update), Verb::Patch);
    }

    #[test]
    fn test_deserialize_objects_alias() {
        let product: Product = serde_json::from_value(json!({
            "name": "Compute",
            "objects": [{ "name": "Disk", "update_verb": "PATCH", "properties": [] }]
        }))
        .unwrap();
        assert_eq!(product.resource("Disk").and_then(|r| r.update_verb), Some(Verb::Patch));
    }
}
