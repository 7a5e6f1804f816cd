//! Base vs merged comparison

use similar::{ChangeTag, TextDiff};

use crate::error::Result;
use crate::path;
use crate::schema::{Product, Property, Resource};

/// Unified diff of the pretty JSON of two product graphs
pub fn render(base: &Product, merged: &Product) -> Result<String> {
    let old_text = serde_json::to_string_pretty(base)?;
    let new_text = serde_json::to_string_pretty(merged)?;

    let diff = TextDiff::from_lines(&old_text, &new_text);
    Ok(diff
        .unified_diff()
        .context_radius(3)
        .header(&base.name, &merged.name)
        .to_string())
}

/// Number of inserted and deleted lines between two graphs
pub fn line_stats(base: &Product, merged: &Product) -> Result<(usize, usize)> {
    let old_text = serde_json::to_string_pretty(base)?;
    let new_text = serde_json::to_string_pretty(merged)?;

    let diff = TextDiff::from_lines(&old_text, &new_text);
    let mut inserted = 0;
    let mut deleted = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => inserted += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    Ok((inserted, deleted))
}

/// Nodes whose own fields differ between a base graph and its merge.
///
/// Entries are `product`, a resource name, or `Resource/dotted.path`, named
/// after the base graph. The merged graph must come from `base`, so resources
/// and properties line up by position.
pub fn changed_paths(base: &Product, merged: &Product) -> Result<Vec<String>> {
    let mut changed = Vec::new();

    let product_fields = |p: &Product| {
        let mut shallow = p.clone();
        shallow.resources.clear();
        serde_json::to_value(shallow)
    };
    if product_fields(base)? != product_fields(merged)? {
        changed.push("product".to_string());
    }

    for (old, new) in base.resources.iter().zip(&merged.resources) {
        if shallow_resource(old)? != shallow_resource(new)? {
            changed.push(old.name.clone());
        }
        let old_props = old.property_list.iter().chain(&old.parameter_list);
        let new_props = new.property_list.iter().chain(&new.parameter_list);
        for (a, b) in old_props.zip(new_props) {
            collect_properties(&old.name, "", a, b, &mut changed)?;
        }
    }

    Ok(changed)
}

fn collect_properties(
    resource: &str,
    prefix: &str,
    old: &Property,
    new: &Property,
    changed: &mut Vec<String>,
) -> Result<()> {
    let prop_path = path::join(prefix, &old.name);
    if shallow_property(old)? != shallow_property(new)? {
        changed.push(format!("{}/{}", resource, prop_path));
    }

    if let (Some(a), Some(b)) = (old.nested_properties(), new.nested_properties()) {
        for (a, b) in a.iter().zip(b) {
            collect_properties(resource, &prop_path, a, b, changed)?;
        }
    }
    Ok(())
}

fn shallow_resource(resource: &Resource) -> Result<serde_json::Value> {
    let mut shallow = resource.clone();
    shallow.property_list.clear();
    shallow.parameter_list.clear();
    Ok(serde_json::to_value(shallow)?)
}

fn shallow_property(property: &Property) -> Result<serde_json::Value> {
    let mut shallow = property.clone();
    if let Some(children) = shallow.nested_properties_mut() {
        children.clear();
    }
    Ok(serde_json::to_value(shallow)?)
}
