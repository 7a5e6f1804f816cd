//! Override validation
//!
//! Confirms that every override targets something real before any merge work
//! starts: resources exist, attribute names are legal for the node (and for
//! the new variant when a type substitution is requested), dotted paths
//! resolve, and override values have the shape their field expects.
//!
//! Validation is fail-fast: the first violation aborts with a descriptive
//! error. Targets and paths are visited in sorted order so the reported error
//! is deterministic.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::error::{FieldOwner, OverrideError, Result};
use crate::overrides::{
    AttributeDef, AttributeSet, OverrideMap, OverrideSpec, OverrideTarget, ResourceOverride,
};
use crate::path;
use crate::schema::fields::{self, FieldDef, PRODUCT_FIELDS, RESOURCE_FIELDS};
use crate::schema::{Product, Property, PropertyType, Resource};
use crate::suggest;

/// Validates an [`OverrideMap`] against a base [`Product`]
pub struct Validator<'a> {
    api: &'a Product,
    overrides: &'a OverrideMap,
    target: &'a OverrideTarget,
}

impl<'a> Validator<'a> {
    pub fn new(api: &'a Product, overrides: &'a OverrideMap, target: &'a OverrideTarget) -> Self {
        Self { api, overrides, target }
    }

    /// Run every check, stopping at the first violation
    pub fn run(&self) -> Result<()> {
        debug!(
            product = %self.api.name,
            targets = self.overrides.len(),
            output_target = %self.target.name,
            "Validating overrides"
        );

        if let Some(product) = self.overrides.product() {
            self.validate_product(product)?;
        }

        for (name, over) in self.overrides.resources() {
            let resource = self.api.resource(name).ok_or_else(|| OverrideError::UnknownResource {
                name: name.to_string(),
                suggestion: suggest::closest(name, self.api.resource_names()),
            })?;

            debug!(
                resource = %name,
                properties = over.properties.len(),
                "Validating resource override"
            );
            self.validate_resource(resource, over)?;
        }

        self.check_resource_names()
    }

    /// Renamed resources must not collide with another resource's merged name
    fn check_resource_names(&self) -> Result<()> {
        let siblings = self.api.resources.iter().map(|resource| {
            let spec = self.overrides.resource(&resource.name).map(|over| &over.spec);
            (resource.name.as_str(), spec.and_then(renamed_to))
        });
        check_unique_names(siblings).map_err(|clash| OverrideError::InvalidFieldValue {
            owner: FieldOwner::resource(clash.renamed),
            field: "name".to_string(),
            reason: clash.reason(),
        })
    }

    fn validate_product(&self, over: &ResourceOverride) -> Result<()> {
        if !over.properties.is_empty() {
            return Err(OverrideError::UnknownField {
                owner: FieldOwner::Product,
                field: fields::PROPERTIES_KEY.to_string(),
            });
        }

        for (key, value) in over.spec.iter() {
            match fields::find(PRODUCT_FIELDS, key) {
                Some(def) => check_value(def, value, &FieldOwner::Product)?,
                None => {
                    return Err(OverrideError::UnknownField {
                        owner: FieldOwner::Product,
                        field: key.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn validate_resource(&self, resource: &Resource, over: &ResourceOverride) -> Result<()> {
        let owner = FieldOwner::resource(&resource.name);

        for (key, value) in over.spec.iter() {
            if let Some(def) = fields::find(RESOURCE_FIELDS, key) {
                check_value(def, value, &owner)?;
            } else if !self.target.resource.contains(key) {
                return Err(OverrideError::UnknownField { owner, field: key.to_string() });
            }
        }
        check_conflicts(&owner, &over.spec, self.target.resource.iter(), |name| {
            resource.field_value(name)
        })?;

        let roots = resource.all_properties();
        for (prop_path, spec) in &over.properties {
            trace!(resource = %resource.name, path = %prop_path, "Validating property override");
            let prop = locate_property(&resource.name, &roots, prop_path)?;
            validate_property(&resource.name, prop_path, prop, spec, &self.target.property)?;
        }

        check_property_names(resource, over)
    }
}

/// Renamed properties must not collide with a sibling's merged name. Only
/// levels holding a rename are checked, and every path is already known to
/// resolve.
fn check_property_names(resource: &Resource, over: &ResourceOverride) -> Result<()> {
    let parents: BTreeSet<&str> = over
        .properties
        .iter()
        .filter(|(_, spec)| renamed_to(spec).is_some())
        .map(|(prop_path, _)| {
            prop_path.rsplit_once(path::SEPARATOR).map_or("", |(parent, _)| parent)
        })
        .collect();

    let roots = resource.all_properties();
    for parent in parents {
        let level: Vec<&Property> = if parent.is_empty() {
            roots.clone()
        } else {
            locate_property(&resource.name, &roots, parent)?
                .nested_properties()
                .map(|children| children.iter().collect())
                .unwrap_or_default()
        };

        let siblings = level.iter().map(|prop| {
            let prop_path = path::join(parent, &prop.name);
            let spec = over.properties.get(&prop_path);
            (prop.name.as_str(), spec.and_then(renamed_to))
        });
        check_unique_names(siblings).map_err(|clash| OverrideError::InvalidFieldValue {
            owner: FieldOwner::property(&resource.name, path::join(parent, clash.renamed)),
            field: "name".to_string(),
            reason: clash.reason(),
        })?;
    }
    Ok(())
}

/// New name requested by an explicit `name` override
fn renamed_to(spec: &OverrideSpec) -> Option<&str> {
    spec.setting("name").explicit().and_then(Value::as_str)
}

/// Two siblings that end up sharing a merged name
struct NameClash<'n> {
    /// Base name of the sibling whose rename caused the clash
    renamed: &'n str,
    /// Base name of the sibling it collides with
    other: &'n str,
    name: &'n str,
}

impl NameClash<'_> {
    fn reason(&self) -> String {
        format!("'{}' is already the name of sibling '{}'", self.name, self.other)
    }
}

/// Check that `(base name, rename)` pairs of one level stay unique once merged
fn check_unique_names<'n>(
    siblings: impl Iterator<Item = (&'n str, Option<&'n str>)>,
) -> std::result::Result<(), NameClash<'n>> {
    let mut seen: BTreeMap<&str, (&str, bool)> = BTreeMap::new();
    for (base, rename) in siblings {
        let merged = rename.unwrap_or(base);
        if let Some(&(other, other_renamed)) = seen.get(merged) {
            // blame the side that was renamed
            let (renamed, other) = if rename.is_some() || !other_renamed {
                (base, other)
            } else {
                (other, base)
            };
            return Err(NameClash { renamed, other, name: merged });
        }
        seen.insert(merged, (base, rename.is_some()));
    }
    Ok(())
}

/// Resolve `prop_path` against a resource's combined property list
pub(crate) fn locate_property<'p>(
    resource: &str,
    roots: &[&'p Property],
    prop_path: &str,
) -> Result<&'p Property> {
    let segments = path::resolve(prop_path)?;
    path::locate(roots, &segments).map_err(|failure| {
        let missing = &segments[failure.segment];
        OverrideError::UnknownPropertyPath {
            path: prop_path.to_string(),
            resource: resource.to_string(),
            suggestion: suggest::closest(missing, failure.available.iter().map(String::as_str)),
            available: failure.available,
        }
    })
}

/// Check one property spec against the property it resolved to
pub(crate) fn validate_property(
    resource: &str,
    prop_path: &str,
    prop: &Property,
    spec: &OverrideSpec,
    whitelist: &AttributeSet,
) -> Result<()> {
    let owner = FieldOwner::property(resource, prop_path);

    let variant = match spec.type_substitution() {
        None => prop.property_type(),
        Some(Ok(requested)) => requested,
        Some(Err(raw)) => {
            return Err(OverrideError::InvalidTypeSubstitution {
                resource: resource.to_string(),
                path: prop_path.to_string(),
                requested: raw,
                reason: "no such property type".to_string(),
            })
        }
    };

    check_variant(prop, variant, spec).map_err(|reason| OverrideError::InvalidTypeSubstitution {
        resource: resource.to_string(),
        path: prop_path.to_string(),
        requested: variant.to_string(),
        reason,
    })?;

    for (key, value) in spec.iter() {
        if let Some(def) = fields::find_property_field(variant, key) {
            check_value(def, value, &owner)?;
            continue;
        }
        match whitelist.get(key) {
            Some(attr) if attr.applies(variant) => {}
            _ => return Err(OverrideError::UnknownField { owner, field: key.to_string() }),
        }
    }

    check_conflicts(&owner, spec, whitelist.applicable(variant), |name| prop.field_value(name))
}

/// Check that `base` can become (or stay) a `target` property under `spec`.
///
/// Nested children can only be carried by the same structural kind, and a
/// substituted variant must get every required slot from the override.
pub(crate) fn check_variant(
    base: &Property,
    target: PropertyType,
    spec: &OverrideSpec,
) -> std::result::Result<(), String> {
    let item_type = spec.setting("item_type").explicit();

    if target == base.property_type() {
        if target == PropertyType::Array {
            if let Some(item) = item_type {
                if base.has_nested_properties() {
                    return Err(
                        "item_type would drop the nested properties of the array element"
                            .to_string(),
                    );
                }
                check_item_type(item)?;
            }
        }
        return Ok(());
    }

    if base.has_nested_properties() {
        return Err(format!(
            "{} '{}' has nested properties that {} cannot hold",
            base.property_type(),
            base.name,
            target
        ));
    }

    let require = |slot: &str| -> std::result::Result<(), String> {
        if spec.is_explicit(slot) {
            Ok(())
        } else {
            Err(format!("missing required slot '{}'", slot))
        }
    };

    match target {
        t if t.is_plain() => Ok(()),
        PropertyType::Constant => require("value"),
        PropertyType::Enum => require("values"),
        PropertyType::ResourceRef => {
            require("resource")?;
            require("imports")
        }
        PropertyType::Array => match item_type {
            Some(item) => check_item_type(item),
            None => Err("missing required slot 'item_type'".to_string()),
        },
        PropertyType::NestedObject => Err("missing required slot 'properties'".to_string()),
        PropertyType::Map => Err("missing required slots 'key_type' and 'value_type'".to_string()),
        _ => Ok(()),
    }
}

fn check_item_type(item: &Value) -> std::result::Result<(), String> {
    let parsed = item
        .as_str()
        .ok_or_else(|| format!("item_type must be a type name, got {}", item))?
        .parse::<PropertyType>()?;
    if parsed.is_plain() {
        Ok(())
    } else {
        Err(format!("item_type must be a primitive type, got {}", parsed))
    }
}

fn check_value(def: &FieldDef, value: &Value, owner: &FieldOwner) -> Result<()> {
    def.check(value).map_err(|reason| OverrideError::InvalidFieldValue {
        owner: owner.clone(),
        field: def.name.to_string(),
        reason,
    })
}

/// A value counts as set unless it is null or `false`
fn is_set(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

/// Reject conflicting attribute pairs that the override touches. A pair
/// conflicts when both sides end up set, counting values already on the base
/// node.
fn check_conflicts<'d, F>(
    owner: &FieldOwner,
    spec: &OverrideSpec,
    attributes: impl Iterator<Item = &'d AttributeDef>,
    base_value: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<Value>,
{
    let effective = |name: &str| match spec.setting(name).explicit() {
        Some(v) => is_set(Some(v)),
        None => is_set(base_value(name).as_ref()),
    };

    for attr in attributes {
        for other in &attr.conflicts_with {
            let touched = spec.is_explicit(&attr.name) || spec.is_explicit(other);
            if touched && effective(&attr.name) && effective(other) {
                return Err(OverrideError::ConflictingAttributes {
                    owner: owner.clone(),
                    first: attr.name.clone(),
                    second: other.clone(),
                });
            }
        }
    }
    Ok(())
}
