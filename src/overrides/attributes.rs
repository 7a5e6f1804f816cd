//! Attribute whitelists
//!
//! The provider-only attributes an override may set depend on the active
//! output target and are supplied by the caller. An attribute may carry a
//! type-level default, be restricted to certain property variants, and
//! conflict with other attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::PropertyType;

/// One provider-only attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    /// Type-level default, used only when the base node does not define the
    /// field and the override does not set it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Property variants this attribute is legal on (empty: all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<PropertyType>,
    /// Attributes that cannot be set alongside this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            applies_to: Vec::new(),
            conflicts_with: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn applies_to(mut self, types: &[PropertyType]) -> Self {
        self.applies_to = types.to_vec();
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.conflicts_with = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Whether this attribute is legal on a property of variant `ty`
    pub fn applies(&self, ty: PropertyType) -> bool {
        self.applies_to.is_empty() || self.applies_to.contains(&ty)
    }
}

/// The whitelist for one override class (resource or property)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    attributes: Vec<AttributeDef>,
}

impl AttributeSet {
    pub fn new(attributes: Vec<AttributeDef>) -> Self {
        Self { attributes }
    }

    /// Shorthand for a whitelist of plain names without defaults
    pub fn names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| AttributeDef::new(*n)).collect())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.iter()
    }

    /// Attributes legal on a property of variant `ty`
    pub fn applicable(&self, ty: PropertyType) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.iter().filter(move |a| a.applies(ty))
    }

    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|a| a.default.as_ref())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Whitelists in effect for one output target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideTarget {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resource: AttributeSet,
    #[serde(default)]
    pub property: AttributeSet,
}

impl OverrideTarget {
    pub fn new(name: impl Into<String>, resource: AttributeSet, property: AttributeSet) -> Self {
        Self { name: name.into(), resource, property }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_applicability() {
        let is_set = AttributeDef::new("is_set")
            .with_default(json!(false))
            .applies_to(&[PropertyType::Array, PropertyType::Map]);
        assert!(is_set.applies(PropertyType::Array));
        assert!(!is_set.applies(PropertyType::String));

        let set = AttributeSet::new(vec![is_set, AttributeDef::new("sensitive")]);
        assert_eq!(set.applicable(PropertyType::String).count(), 1);
        assert_eq!(set.applicable(PropertyType::Map).count(), 2);
        assert_eq!(set.default_for("is_set"), Some(&json!(false)));
        assert_eq!(set.default_for("sensitive"), None);
    }
}
