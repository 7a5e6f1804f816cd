//! Field precedence
//!
//! Every merged field goes through [`resolve`]: an explicit override wins, a
//! value the base node defines is kept, and only when neither exists does a
//! type-level default apply.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{FieldOwner, OverrideError, Result};
use crate::overrides::{AttributeDef, OverrideSpec, Setting};

/// Pick the effective value of one field
pub fn resolve<'v>(
    setting: Setting<&'v Value>,
    base: Option<&'v Value>,
    default: Option<&'v Value>,
) -> Option<&'v Value> {
    match (setting, base) {
        (Setting::Explicit(value), _) => Some(value),
        (Setting::Inherited, Some(value)) => Some(value),
        (Setting::Inherited, None) => default,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    owner: &FieldOwner,
    field: &str,
    value: &Value,
) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| OverrideError::InvalidFieldValue {
        owner: owner.clone(),
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Merge a field that is always present on the node
pub(crate) fn merge_value<T: DeserializeOwned>(
    owner: &FieldOwner,
    field: &str,
    base: T,
    spec: &OverrideSpec,
) -> Result<T> {
    match spec.setting(field) {
        Setting::Explicit(value) => decode(owner, field, value),
        Setting::Inherited => Ok(base),
    }
}

/// Merge an optional native field. An explicit `null` clears it.
pub(crate) fn merge_field<T: DeserializeOwned>(
    owner: &FieldOwner,
    field: &str,
    base: Option<T>,
    spec: &OverrideSpec,
) -> Result<Option<T>> {
    match spec.setting(field) {
        Setting::Explicit(Value::Null) => Ok(None),
        Setting::Explicit(value) => decode(owner, field, value).map(Some),
        Setting::Inherited => Ok(base),
    }
}

/// Merge `description`, expanding `{{description}}` in an explicit value to
/// the base description
pub(crate) fn merge_description(
    owner: &FieldOwner,
    base: Option<&str>,
    spec: &OverrideSpec,
) -> Result<Option<String>> {
    let merged: Option<String> = merge_field(owner, "description", base.map(str::to_string), spec)?;
    if !spec.is_explicit("description") {
        return Ok(merged);
    }
    Ok(merged.map(|text| expand_description(&text, base)))
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*description\s*\}\}").unwrap())
}

/// Replace every `{{description}}` placeholder with `base` (or nothing)
pub fn expand_description(text: &str, base: Option<&str>) -> String {
    let base = base.unwrap_or("");
    placeholder().replace_all(text, regex::NoExpand(base)).into_owned()
}

/// Merge provider-only extension data. Whitelisted attributes follow
/// [`resolve`]; anything else already on the base node is carried forward.
pub(crate) fn merge_extensions<'d>(
    base: &BTreeMap<String, Value>,
    spec: &OverrideSpec,
    attributes: impl Iterator<Item = &'d AttributeDef>,
) -> BTreeMap<String, Value> {
    let mut merged = base.clone();

    for attr in attributes {
        let value = resolve(spec.setting(&attr.name), base.get(&attr.name), attr.default.as_ref());
        match value {
            Some(Value::Null) | None => {
                merged.remove(&attr.name);
            }
            Some(value) => {
                merged.insert(attr.name.clone(), value.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_precedence() {
        let base = json!(5);
        let default = json!(0);
        let explicit = json!(7);

        // base wins over the type-level default
        assert_eq!(resolve(Setting::Inherited, Some(&base), Some(&default)), Some(&base));
        // explicit wins over everything
        assert_eq!(
            resolve(Setting::Explicit(&explicit), Some(&base), Some(&default)),
            Some(&explicit)
        );
        // default only when nothing else
        assert_eq!(resolve(Setting::Inherited, None, Some(&default)), Some(&default));
        assert_eq!(resolve(Setting::Inherited, None, None), None);
    }

    #[test]
    fn test_merge_field_explicit_null_clears() {
        let owner = FieldOwner::resource("Box");
        let spec = OverrideSpec::new().with("kind", Value::Null);
        let base = Some("box#kind".to_string());
        let merged: Option<String> = merge_field(&owner, "kind", base.clone(), &spec).unwrap();
        assert_eq!(merged, None);

        let merged: Option<String> =
            merge_field(&owner, "kind", base, &OverrideSpec::new()).unwrap();
        assert_eq!(merged.as_deref(), Some("box#kind"));
    }

    #[test]
    fn test_decode_failure_is_field_error() {
        let owner = FieldOwner::resource("Box");
        let spec = OverrideSpec::new().with("readonly", json!("no"));
        let err = merge_field::<bool>(&owner, "readonly", None, &spec).unwrap_err();
        assert!(matches!(err, OverrideError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_description_template() {
        let owner = FieldOwner::resource("Box");
        let spec = OverrideSpec::new()
            .with("description", json!("{{description}} Managed by Terraform."));
        let merged = merge_description(&owner, Some("A box."), &spec).unwrap();
        assert_eq!(merged.as_deref(), Some("A box. Managed by Terraform."));

        assert_eq!(expand_description("{{ description }}!", None), "!");
        assert_eq!(expand_description("$1 {{description}}", Some("$0")), "$1 $0");
    }

    #[test]
    fn test_extensions_carry_forward() {
        let attrs = vec![
            AttributeDef::new("width").with_default(json!(0)),
            AttributeDef::new("sensitive").with_default(json!(false)),
            AttributeDef::new("docs"),
        ];
        let mut base = BTreeMap::new();
        base.insert("width".to_string(), json!(5));
        base.insert("legacy".to_string(), json!("kept"));

        let merged = merge_extensions(&base, &OverrideSpec::new(), attrs.iter());
        assert_eq!(merged.get("width"), Some(&json!(5)));
        assert_eq!(merged.get("sensitive"), Some(&json!(false)));
        assert_eq!(merged.get("legacy"), Some(&json!("kept")));
        assert!(!merged.contains_key("docs"));

        let spec = OverrideSpec::new().with("width", json!(7));
        let merged = merge_extensions(&base, &spec, attrs.iter());
        assert_eq!(merged.get("width"), Some(&json!(7)));
    }
}
