//! Merge engine tests against the Boxes fixture

use schema_overrides::{
    diff, AttributeDef, AttributeSet, Checksum, OverrideMap, OverrideSpec, OverrideTarget, Product,
    Property, PropertyKind, PropertyType, ResourceOverride, Runner, Verb,
};
use serde_json::json;

fn fixture() -> Product {
    serde_json::from_str(include_str!("fixtures/boxes.json")).unwrap()
}

fn target() -> OverrideTarget {
    OverrideTarget::new(
        "test",
        AttributeSet::new(vec![AttributeDef::new("custom_code"), AttributeDef::new("mutex")]),
        AttributeSet::new(vec![
            AttributeDef::new("width").with_default(json!(0)),
            AttributeDef::new("sensitive").with_default(json!(false)),
            AttributeDef::new("is_set").applies_to(&[PropertyType::Array, PropertyType::Map]),
        ]),
    )
}

fn box_override(path: &str, spec: OverrideSpec) -> OverrideMap {
    OverrideMap::new().with_resource("Box", ResourceOverride::new().with_property(path, spec))
}

fn find<'a>(product: &'a Product, resource: &str, name: &str) -> &'a Property {
    product
        .resource(resource)
        .unwrap()
        .all_properties()
        .into_iter()
        .find(|p| p.name == name)
        .unwrap()
}

// =============================================================================
// Product and resource fields
// =============================================================================

#[test]
fn test_product_field_override() {
    let overrides = OverrideMap::new()
        .with_product(OverrideSpec::new().with("display_name", json!("Boxes API")));
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();

    assert_eq!(merged.display_name.as_deref(), Some("Boxes API"));
    assert_eq!(merged.base_url.as_deref(), Some("https://boxes.example.com/v1/"));
    assert_eq!(merged.resources.len(), 2);
}

#[test]
fn test_resource_field_override() {
    let overrides = OverrideMap::new().with_resource(
        "Box",
        ResourceOverride::new()
            .with("update_verb", json!("PUT"))
            .with("description", json!("{{description}} Now waterproof."))
            .with("mutex", json!("boxes/{{project}}")),
    );
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();
    let boxed = merged.resource("Box").unwrap();

    assert_eq!(boxed.update_verb, Some(Verb::Put));
    assert_eq!(boxed.description.as_deref(), Some("A cardboard box. Now waterproof."));
    assert_eq!(boxed.attribute("mutex"), Some(&json!("boxes/{{project}}")));
    assert_eq!(boxed.field_value("mutex"), Some(json!("boxes/{{project}}")));
    assert_eq!(boxed.base_url.as_deref(), Some("projects/{{project}}/boxes"));
    // untouched resources come through unchanged
    let shelf = merged.resource("Shelf").unwrap();
    assert_eq!(shelf.description.as_deref(), Some("A shelf holding boxes."));
}

// =============================================================================
// Property merge
// =============================================================================

#[test]
fn test_property_field_override() {
    let merged = Runner::build(
        &fixture(),
        &box_override("name", OverrideSpec::new().with("description", json!("Box name."))),
        &target(),
    )
    .unwrap();

    let name = find(&merged, "Box", "name");
    assert_eq!(name.description.as_deref(), Some("Box name."));
    assert_eq!(name.required, Some(true));
}

#[test]
fn test_type_substitution_keeps_api_name() {
    let merged = Runner::build(
        &fixture(),
        &box_override("name", OverrideSpec::new().with("type", json!("Integer"))),
        &target(),
    )
    .unwrap();

    let name = find(&merged, "Box", "name");
    assert_eq!(name.property_type(), PropertyType::Integer);
    assert_eq!(name.api_name(), "name");
    assert_eq!(name.description.as_deref(), Some("Name of the box."));
}

#[test]
fn test_nested_path_override() {
    let merged = Runner::build(
        &fixture(),
        &box_override("dimensions.width", OverrideSpec::new().with("type", json!("Integer"))),
        &target(),
    )
    .unwrap();

    let dimensions = find(&merged, "Box", "dimensions");
    let width = dimensions.child("width").unwrap();
    assert_eq!(width.property_type(), PropertyType::Integer);
    assert_eq!(width.description.as_deref(), Some("Width in cm."));

    let base = fixture();
    let base_height = find(&base, "Box", "dimensions").child("height").unwrap();
    let height = dimensions.child("height").unwrap();
    assert_eq!(height.kind, base_height.kind);
    assert_eq!(height.description, base_height.description);
    assert_eq!(dimensions.description.as_deref(), Some("Outer dimensions."));
}

#[test]
fn test_array_of_objects_override() {
    let overrides = OverrideMap::new().with_resource(
        "Shelf",
        ResourceOverride::new().with_property(
            "slots.label",
            OverrideSpec::new().with("description", json!("Printed label.")),
        ),
    );
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();

    let slots = find(&merged, "Shelf", "slots");
    match &slots.kind {
        PropertyKind::Array { item_type, .. } => {
            let label = item_type.child("label").unwrap();
            assert_eq!(label.description.as_deref(), Some("Printed label."));
            assert!(item_type.child("position").unwrap().description.is_none());
        }
        other => panic!("Expected Array, got {:?}", other),
    }
}

#[test]
fn test_map_value_override() {
    let overrides = OverrideMap::new().with_resource(
        "Shelf",
        ResourceOverride::new()
            .with_property("labels", OverrideSpec::new().with("is_set", json!(true)))
            .with_property("labels.color", OverrideSpec::new().with("required", json!(true))),
    );
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();

    let labels = find(&merged, "Shelf", "labels");
    assert_eq!(labels.attribute("is_set"), Some(&json!(true)));
    let color = labels.child("color").unwrap();
    assert_eq!(color.required, Some(true));
    assert_eq!(color.resource_name(), Some("Shelf"));
    assert_eq!(color.parent_path(), Some("labels"));
}

#[test]
fn test_precedence_base_over_default() {
    let merged = Runner::build(&fixture(), &OverrideMap::new(), &target()).unwrap();
    // base defines width = 5, class default is 0
    assert_eq!(find(&merged, "Box", "lid").attribute("width"), Some(&json!(5)));
    // nothing on the base: the class default applies
    assert_eq!(find(&merged, "Box", "name").attribute("width"), Some(&json!(0)));

    let merged = Runner::build(
        &fixture(),
        &box_override("lid", OverrideSpec::new().with("width", json!(7))),
        &target(),
    )
    .unwrap();
    assert_eq!(find(&merged, "Box", "lid").attribute("width"), Some(&json!(7)));
}

#[test]
fn test_excluded_entries_carried_forward() {
    let merged = Runner::build(
        &fixture(),
        &box_override("legacyCode", OverrideSpec::new().with("description", json!("Old code."))),
        &target(),
    )
    .unwrap();

    let boxed = merged.resource("Box").unwrap();
    assert_eq!(boxed.property_list().len(), 4);
    assert_eq!(boxed.properties().len(), 3);
    let legacy = find(&merged, "Box", "legacyCode");
    assert!(legacy.exclude);
    assert_eq!(legacy.description.as_deref(), Some("Old code."));
}

#[test]
fn test_parameter_override() {
    let merged = Runner::build(
        &fixture(),
        &box_override("project", OverrideSpec::new().with("sensitive", json!(true))),
        &target(),
    )
    .unwrap();

    let project = &merged.resource("Box").unwrap().parameters()[0];
    assert_eq!(project.attribute("sensitive"), Some(&json!(true)));
}

#[test]
fn test_resource_ref_retarget() {
    let overrides = OverrideMap::new().with_resource(
        "Shelf",
        ResourceOverride::new()
            .with_property("box", OverrideSpec::new().with("imports", json!("selfLink"))),
    );
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();

    assert_eq!(
        find(&merged, "Shelf", "box").kind,
        PropertyKind::ResourceRef { resource: "Box".to_string(), imports: "selfLink".to_string() }
    );
}

#[test]
fn test_explicit_null_clears_optional_fields() {
    let overrides = OverrideMap::new()
        .with_product(OverrideSpec::new().with("scopes", json!(null)))
        .with_resource(
            "Box",
            ResourceOverride::new()
                .with("base_url", json!(null))
                .with("update_verb", json!(null))
                .with_property("name", OverrideSpec::new().with("required", json!(null))),
        );
    let merged = Runner::build(&fixture(), &overrides, &target()).unwrap();

    assert_eq!(merged.scopes, None);
    let boxed = merged.resource("Box").unwrap();
    assert_eq!(boxed.base_url, None);
    assert_eq!(boxed.update_verb, None);
    assert_eq!(boxed.description.as_deref(), Some("A cardboard box."));
    let name = find(&merged, "Box", "name");
    assert_eq!(name.required, None);
    assert_eq!(name.description.as_deref(), Some("Name of the box."));
}

#[test]
fn test_rename_onto_sibling_is_rejected() {
    let result = Runner::build(
        &fixture(),
        &box_override("lid", OverrideSpec::new().with("name", json!("name"))),
        &target(),
    );
    assert!(result.is_err());

    let overrides = OverrideMap::new()
        .with_resource("Shelf", ResourceOverride::new().with("name", json!("Box")));
    assert!(Runner::build(&fixture(), &overrides, &target()).is_err());
}

// =============================================================================
// Whole-graph properties
// =============================================================================

#[test]
fn test_empty_overrides_change_nothing() {
    let plain = OverrideTarget::new("plain", AttributeSet::default(), AttributeSet::default());
    let base = fixture();
    let merged = Runner::build(&base, &OverrideMap::new(), &plain).unwrap();

    assert!(diff::changed_paths(&base, &merged).unwrap().is_empty());
    assert_eq!(Checksum::of_product(&base).unwrap(), Checksum::of_product(&merged).unwrap());
}

#[test]
fn test_merge_is_deterministic() {
    let overrides =
        box_override("dimensions.width", OverrideSpec::new().with("type", json!("Integer")));
    let first = Runner::build(&fixture(), &overrides, &target()).unwrap();
    let second = Runner::build(&fixture(), &overrides, &target()).unwrap();

    assert_eq!(first, second);
    assert_eq!(Checksum::of_product(&first).unwrap(), Checksum::of_product(&second).unwrap());
}

#[test]
fn test_base_graph_untouched() {
    let base = fixture();
    let before = base.clone();
    let overrides = box_override("name", OverrideSpec::new().with("type", json!("Integer")));

    Runner::build(&base, &overrides, &target()).unwrap();
    assert_eq!(base, before);
}

#[test]
fn test_merged_graph_can_be_merged_again() {
    let once = Runner::build(
        &fixture(),
        &box_override("lid", OverrideSpec::new().with("width", json!(7))),
        &target(),
    )
    .unwrap();
    let twice = Runner::build(&once, &OverrideMap::new(), &target()).unwrap();

    assert_eq!(find(&twice, "Box", "lid").attribute("width"), Some(&json!(7)));
}

#[test]
fn test_failed_validation_produces_nothing() {
    let result = Runner::build(
        &fixture(),
        &box_override("dimensions.depth", OverrideSpec::new().with("type", json!("Integer"))),
        &target(),
    );
    assert!(result.is_err());
}
