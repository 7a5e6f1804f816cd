//! Property merge
//!
//! Builds the merged node for one property, then recurses into its children
//! with the path prefix extended by the property's name. Children are
//! reattached to the structural slot they came from: the properties of a
//! nested object, or those of the nested-object element of an array or map.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

use super::field::{decode, merge_description, merge_extensions, merge_field, merge_value};
use crate::error::{FieldOwner, OverrideError, Result};
use crate::overrides::{AttributeSet, OverrideSpec, PropertySpec, Setting};
use crate::path;
use crate::schema::{Property, PropertyKind, PropertyType};
use crate::validator::check_variant;

/// Merges the properties of one resource against its path-keyed specs
pub(crate) struct PropertyMerge<'a> {
    resource: &'a str,
    specs: &'a BTreeMap<String, PropertySpec>,
    whitelist: &'a AttributeSet,
    empty: OverrideSpec,
}

impl<'a> PropertyMerge<'a> {
    pub(crate) fn new(
        resource: &'a str,
        specs: &'a BTreeMap<String, PropertySpec>,
        whitelist: &'a AttributeSet,
    ) -> Self {
        Self { resource, specs, whitelist, empty: OverrideSpec::new() }
    }

    /// Merge every entry of a property list, excluded ones included
    pub(crate) fn build_all(&self, properties: &[Property], prefix: &str) -> Result<Vec<Property>> {
        properties.iter().map(|p| self.build(p, prefix)).collect()
    }

    /// Merge `base`, found under `prefix`, and everything below it
    pub(crate) fn build(&self, base: &Property, prefix: &str) -> Result<Property> {
        let prop_path = path::join(prefix, &base.name);
        let spec = self.specs.get(&prop_path).unwrap_or(&self.empty);
        if !spec.is_empty() {
            trace!(resource = %self.resource, path = %prop_path, "Applying property override");
        }

        let mut merged = merge_node(self.resource, &prop_path, base, spec, self.whitelist)?;

        if let Some(children) = base.nested_properties() {
            let children = self.build_all(children, &prop_path)?;
            if let Some(slot) = merged.nested_properties_mut() {
                *slot = children;
            }
        }

        Ok(merged)
    }
}

/// Build the merged node for one property, children untouched
pub(crate) fn merge_node(
    resource: &str,
    prop_path: &str,
    base: &Property,
    spec: &OverrideSpec,
    whitelist: &AttributeSet,
) -> Result<Property> {
    let owner = FieldOwner::property(resource, prop_path);
    let kind = build_kind(resource, prop_path, base, spec)?;
    let variant = kind.property_type();

    let name: String = merge_value(&owner, "name", base.name.clone(), spec)?;
    // The wire name never follows a rename
    let api_name = match &base.api_name {
        Some(api_name) => Some(api_name.clone()),
        None if name != base.name => Some(base.name.clone()),
        None => None,
    };

    Ok(Property {
        name,
        api_name,
        description: merge_description(&owner, base.description.as_deref(), spec)?,
        required: merge_field(&owner, "required", base.required, spec)?,
        output: merge_field(&owner, "output", base.output, spec)?,
        input: merge_field(&owner, "input", base.input, spec)?,
        exclude: merge_value(&owner, "exclude", base.exclude, spec)?,
        update_verb: merge_field(&owner, "update_verb", base.update_verb, spec)?,
        update_url: merge_field(&owner, "update_url", base.update_url.clone(), spec)?,
        default_value: merge_field(&owner, "default_value", base.default_value.clone(), spec)?,
        send_empty_value: merge_field(&owner, "send_empty_value", base.send_empty_value, spec)?,
        min_version: merge_field(&owner, "min_version", base.min_version.clone(), spec)?,
        kind,
        additional_attributes: merge_extensions(
            &base.additional_attributes,
            spec,
            whitelist.applicable(variant),
        ),
        owner: None,
    })
}

/// Variant data of the merged node: the base variant with its scalar fields
/// merged, or a fresh variant when a substitution is requested.
fn build_kind(
    resource: &str,
    prop_path: &str,
    base: &Property,
    spec: &OverrideSpec,
) -> Result<PropertyKind> {
    let substitution_error = |requested: String, reason: String| {
        OverrideError::InvalidTypeSubstitution {
            resource: resource.to_string(),
            path: prop_path.to_string(),
            requested,
            reason,
        }
    };

    let requested = match spec.type_substitution() {
        None => base.property_type(),
        Some(Ok(requested)) => requested,
        Some(Err(raw)) => return Err(substitution_error(raw, "no such property type".to_string())),
    };
    check_variant(base, requested, spec)
        .map_err(|reason| substitution_error(requested.to_string(), reason))?;

    let owner = FieldOwner::property(resource, prop_path);
    if requested == base.property_type() {
        return merge_variant_fields(&owner, base, spec);
    }

    let slot = |name: &str| match spec.setting(name) {
        Setting::Explicit(value) => Ok(value),
        Setting::Inherited => Err(substitution_error(
            requested.to_string(),
            format!("missing required slot '{}'", name),
        )),
    };

    let kind = match requested {
        PropertyType::Constant => PropertyKind::Constant { value: slot("value")?.clone() },
        PropertyType::Enum => {
            PropertyKind::Enum { values: decode(&owner, "values", slot("values")?)? }
        }
        PropertyType::ResourceRef => PropertyKind::ResourceRef {
            resource: decode(&owner, "resource", slot("resource")?)?,
            imports: decode(&owner, "imports", slot("imports")?)?,
        },
        PropertyType::Array => PropertyKind::Array {
            item_type: Box::new(Property::new("", element_kind(&owner, slot("item_type")?)?)),
            min_size: merge_field(&owner, "min_size", None, spec)?,
            max_size: merge_field(&owner, "max_size", None, spec)?,
        },
        other => match other.plain_kind() {
            Some(kind) => kind,
            None => {
                return Err(substitution_error(
                    other.to_string(),
                    "structural variants cannot be substituted in".to_string(),
                ))
            }
        },
    };
    Ok(kind)
}

fn merge_variant_fields(
    owner: &FieldOwner,
    base: &Property,
    spec: &OverrideSpec,
) -> Result<PropertyKind> {
    let mut kind = base.kind.clone();

    match &mut kind {
        PropertyKind::Constant { value } => {
            if let Setting::Explicit(v) = spec.setting("value") {
                *value = v.clone();
            }
        }
        PropertyKind::Enum { values } => {
            *values = merge_value(owner, "values", std::mem::take(values), spec)?;
        }
        PropertyKind::Array { item_type, min_size, max_size } => {
            *min_size = merge_field(owner, "min_size", *min_size, spec)?;
            *max_size = merge_field(owner, "max_size", *max_size, spec)?;
            if let Setting::Explicit(requested) = spec.setting("item_type") {
                item_type.kind = element_kind(owner, requested)?;
            }
        }
        PropertyKind::ResourceRef { resource, imports } => {
            *resource = merge_value(owner, "resource", std::mem::take(resource), spec)?;
            *imports = merge_value(owner, "imports", std::mem::take(imports), spec)?;
        }
        _ => {}
    }

    Ok(kind)
}

/// Plain element kind named by an `item_type` override
fn element_kind(owner: &FieldOwner, requested: &Value) -> Result<PropertyKind> {
    let invalid = |reason: String| OverrideError::InvalidFieldValue {
        owner: owner.clone(),
        field: "item_type".to_string(),
        reason,
    };

    let ty = requested
        .as_str()
        .ok_or_else(|| invalid(format!("expected a type name, got {}", requested)))?
        .parse::<PropertyType>()
        .map_err(invalid)?;
    ty.plain_kind()
        .ok_or_else(|| invalid(format!("item_type must be a primitive type, got {}", ty)))
}
