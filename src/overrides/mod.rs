//! Override specifications
//!
//! An [`OverrideMap`] is keyed by target identifier: a resource name, or the
//! reserved [`PRODUCT_TARGET`]. Each entry is a sparse attribute bag
//! ([`OverrideSpec`]); resource entries additionally carry property specs
//! keyed by dotted path.
//!
//! ## Example override file (overrides.toml):
//! ```toml
//! [product]
//! display_name = "Cloud Box Service"
//!
//! [Box]
//! description = "{{description}} Managed by the provider."
//! custom_code = "templates/box_custom.go.erb"
//!
//! [Box.properties."dimensions.width"]
//! type = "Integer"
//! ```
//!
//! Only keys that appear in a spec are explicit. Everything else is
//! [`Setting::Inherited`], which is what lets base values win over the
//! type-level defaults of an override class.

pub mod attributes;

pub use attributes::{AttributeDef, AttributeSet, OverrideTarget};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::fields::TYPE_KEY;
use crate::schema::PropertyType;

/// Reserved target identifier addressing product-level fields
pub const PRODUCT_TARGET: &str = "product";

/// Whether an override attribute was deliberately provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<T> {
    /// Not set by the override author; the base value (or a type-level
    /// default) applies
    Inherited,
    /// Set by the override author
    Explicit(T),
}

impl<T> Setting<T> {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Setting::Explicit(_))
    }

    pub fn explicit(self) -> Option<T> {
        match self {
            Setting::Explicit(v) => Some(v),
            Setting::Inherited => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Setting<U> {
        match self {
            Setting::Explicit(v) => Setting::Explicit(f(v)),
            Setting::Inherited => Setting::Inherited,
        }
    }
}

/// Sparse attribute bag for one override target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSpec {
    attributes: BTreeMap<String, Value>,
}

/// Overrides for a single property
pub type PropertySpec = OverrideSpec;

impl OverrideSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute explicitly
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn setting(&self, name: &str) -> Setting<&Value> {
        match self.attributes.get(name) {
            Some(v) => Setting::Explicit(v),
            None => Setting::Inherited,
        }
    }

    pub fn is_explicit(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names in deterministic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Requested variant substitution, if any. `Err` carries the raw
    /// request when it names no known variant.
    pub fn type_substitution(&self) -> Option<Result<PropertyType, String>> {
        self.attributes.get(TYPE_KEY).map(|v| match v.as_str() {
            Some(s) => s.parse::<PropertyType>().map_err(|_| s.to_string()),
            None => Err(v.to_string()),
        })
    }
}

/// Overrides for one resource: its own attributes plus path-keyed property
/// specs applied to the combined properties + parameters list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOverride {
    #[serde(flatten)]
    pub spec: OverrideSpec,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,
}

impl ResourceOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.spec.insert(name, value);
        self
    }

    pub fn with_property(mut self, path: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(path.into(), spec);
        self
    }

    /// Spec for a property path, if one was given
    pub fn property(&self, path: &str) -> Option<&PropertySpec> {
        self.properties.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.spec.is_empty() && self.properties.is_empty()
    }
}

/// All overrides for one compilation unit, keyed by target identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap {
    targets: BTreeMap<String, ResourceOverride>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, spec: OverrideSpec) -> Self {
        self.targets.insert(
            PRODUCT_TARGET.to_string(),
            ResourceOverride { spec, properties: BTreeMap::new() },
        );
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, over: ResourceOverride) -> Self {
        self.targets.insert(name.into(), over);
        self
    }

    /// The reserved product-level entry
    pub fn product(&self) -> Option<&ResourceOverride> {
        self.targets.get(PRODUCT_TARGET)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceOverride> {
        if name == PRODUCT_TARGET {
            return None;
        }
        self.targets.get(name)
    }

    /// Resource-level entries in deterministic order
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceOverride)> {
        self.targets
            .iter()
            .filter(|(name, _)| name.as_str() != PRODUCT_TARGET)
            .map(|(name, over)| (name.as_str(), over))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
