//! Merge engine
//!
//! [`Runner::build`] validates an [`OverrideMap`] against a base [`Product`]
//! and, when it is clean, produces a new, linked product graph. The base graph
//! is never mutated.
//!
//! ## Precedence
//!
//! For every field of every node:
//! 1. an explicit override value wins
//! 2. otherwise a value defined on the base node is kept
//! 3. otherwise the whitelist's type-level default applies, if any
//!
//! The wire-facing `api_name` of a property is the one exception: it always
//! comes from the base property.

pub mod field;
mod property;

pub use field::{expand_description, resolve};

use tracing::debug;

use crate::error::{FieldOwner, Result};
use crate::overrides::{AttributeSet, OverrideMap, OverrideTarget, PropertySpec, ResourceOverride};
use crate::schema::{Product, Property, Resource};
use crate::validator::{validate_property, Validator};

use field::{merge_description, merge_extensions, merge_field, merge_value};
use property::PropertyMerge;

/// Applies overrides to schema graphs
pub struct Runner;

impl Runner {
    /// Validate `overrides` and merge them onto `api`
    pub fn build(
        api: &Product,
        overrides: &OverrideMap,
        target: &OverrideTarget,
    ) -> Result<Product> {
        Validator::new(api, overrides, target).run()?;
        let merged = Self::build_product(api, overrides, target)?;
        Ok(merged.link())
    }

    /// Apply a single spec to a property that lives outside any resource.
    /// Its children are copied unchanged.
    pub fn build_single_property(
        property: &Property,
        spec: &PropertySpec,
        whitelist: &AttributeSet,
    ) -> Result<Property> {
        validate_property("", &property.name, property, spec, whitelist)?;

        let specs = [(property.name.clone(), spec.clone())].into_iter().collect();
        PropertyMerge::new("", &specs, whitelist).build(property, "")
    }

    fn build_product(
        api: &Product,
        overrides: &OverrideMap,
        target: &OverrideTarget,
    ) -> Result<Product> {
        let empty = ResourceOverride::default();
        let spec = &overrides.product().unwrap_or(&empty).spec;
        let owner = FieldOwner::Product;

        let resources = api
            .resources
            .iter()
            .map(|resource| {
                let over = overrides.resource(&resource.name).unwrap_or(&empty);
                Self::build_resource(resource, over, target)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Product {
            name: merge_value(&owner, "name", api.name.clone(), spec)?,
            display_name: merge_field(&owner, "display_name", api.display_name.clone(), spec)?,
            base_url: merge_field(&owner, "base_url", api.base_url.clone(), spec)?,
            scopes: merge_field(&owner, "scopes", api.scopes.clone(), spec)?,
            resources,
            additional_attributes: api.additional_attributes.clone(),
        })
    }

    fn build_resource(
        base: &Resource,
        over: &ResourceOverride,
        target: &OverrideTarget,
    ) -> Result<Resource> {
        debug!(
            resource = %base.name,
            fields = over.spec.keys().count(),
            properties = over.properties.len(),
            "Merging resource"
        );

        let owner = FieldOwner::resource(&base.name);
        let spec = &over.spec;
        let properties = PropertyMerge::new(&base.name, &over.properties, &target.property);

        Ok(Resource {
            name: merge_value(&owner, "name", base.name.clone(), spec)?,
            description: merge_description(&owner, base.description.as_deref(), spec)?,
            base_url: merge_field(&owner, "base_url", base.base_url.clone(), spec)?,
            self_link: merge_field(&owner, "self_link", base.self_link.clone(), spec)?,
            create_url: merge_field(&owner, "create_url", base.create_url.clone(), spec)?,
            update_url: merge_field(&owner, "update_url", base.update_url.clone(), spec)?,
            delete_url: merge_field(&owner, "delete_url", base.delete_url.clone(), spec)?,
            create_verb: merge_field(&owner, "create_verb", base.create_verb, spec)?,
            read_verb: merge_field(&owner, "read_verb", base.read_verb, spec)?,
            update_verb: merge_field(&owner, "update_verb", base.update_verb, spec)?,
            delete_verb: merge_field(&owner, "delete_verb", base.delete_verb, spec)?,
            collection_url_key: merge_field(
                &owner,
                "collection_url_key",
                base.collection_url_key.clone(),
                spec,
            )?,
            identity: merge_field(&owner, "identity", base.identity.clone(), spec)?,
            kind: merge_field(&owner, "kind", base.kind.clone(), spec)?,
            min_version: merge_field(&owner, "min_version", base.min_version.clone(), spec)?,
            exclude: merge_value(&owner, "exclude", base.exclude, spec)?,
            input: merge_field(&owner, "input", base.input, spec)?,
            readonly: merge_field(&owner, "readonly", base.readonly, spec)?,
            update_mask: merge_field(&owner, "update_mask", base.update_mask, spec)?,
            has_self_link: merge_field(&owner, "has_self_link", base.has_self_link, spec)?,
            property_list: properties.build_all(&base.property_list, "")?,
            parameter_list: properties.build_all(&base.parameter_list, "")?,
            additional_attributes: merge_extensions(
                &base.additional_attributes,
                spec,
                target.resource.iter(),
            ),
            product: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::{AttributeDef, OverrideSpec};
    use serde_json::json;

    fn target() -> OverrideTarget {
        OverrideTarget::new(
            "test",
            AttributeSet::new(vec![AttributeDef::new("custom_code")]),
            AttributeSet::new(vec![AttributeDef::new("sensitive").with_default(json!(false))]),
        )
    }

    fn product() -> Product {
        Product::new("Storage").with_resource(
            Resource::new("Bucket")
                .with_description("A bucket.")
                .with_property(Property::string("name"))
                .with_property(Property::string("legacy").excluded())
                .with_parameter(Property::string("project")),
        )
    }

    #[test]
    fn test_no_overrides_is_identity_plus_defaults() {
        let merged = Runner::build(&product(), &OverrideMap::new(), &target()).unwrap();
        let bucket = merged.resource("Bucket").unwrap();
        assert_eq!(bucket.description.as_deref(), Some("A bucket."));
        assert_eq!(bucket.property_list().len(), 2);
        assert_eq!(bucket.properties().len(), 1);
        assert_eq!(bucket.parameters()[0].attribute("sensitive"), Some(&json!(false)));
    }

    #[test]
    fn test_product_and_resource_fields() {
        let overrides = OverrideMap::new()
            .with_product(OverrideSpec::new().with("display_name", json!("Cloud Storage")))
            .with_resource(
                "Bucket",
                ResourceOverride::new()
                    .with("description", json!("{{description}} Managed."))
                    .with("custom_code", json!("bucket.erb")),
            );

        let merged = Runner::build(&product(), &overrides, &target()).unwrap();
        assert_eq!(merged.display_name.as_deref(), Some("Cloud Storage"));
        assert_eq!(merged.name, "Storage");
        let bucket = merged.resource("Bucket").unwrap();
        assert_eq!(bucket.description.as_deref(), Some("A bucket. Managed."));
        assert_eq!(bucket.attribute("custom_code"), Some(&json!("bucket.erb")));
        assert_eq!(bucket.product_name(), Some("Storage"));
    }

    #[test]
    fn test_parameters_take_property_specs() {
        let overrides = OverrideMap::new().with_resource(
            "Bucket",
            ResourceOverride::new()
                .with_property("project", OverrideSpec::new().with("required", json!(true))),
        );
        let merged = Runner::build(&product(), &overrides, &target()).unwrap();
        assert_eq!(merged.resource("Bucket").unwrap().parameters()[0].required, Some(true));
    }

    #[test]
    fn test_single_property() {
        let base = Property::nested("filter", vec![Property::string("expr")]);
        let spec = OverrideSpec::new().with("description", json!("Filter."));
        let merged = Runner::build_single_property(&base, &spec, &target().property).unwrap();
        assert_eq!(merged.description.as_deref(), Some("Filter."));
        assert_eq!(merged.child("expr").map(|p| p.name.as_str()), Some("expr"));
    }
}
