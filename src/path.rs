//! Dotted property paths
//!
//! `dimensions.width` addresses the `width` child of the `dimensions`
//! property. The element type of an array or the value type of a map has no
//! segment of its own: `slots.label` reaches `label` inside the nested-object
//! element of the `slots` array, for every element alike.

use crate::error::{OverrideError, Result};
use crate::schema::Property;

pub const SEPARATOR: char = '.';

/// Split a dotted path into its segments
pub fn resolve(path: &str) -> Result<Vec<String>> {
    if path.is_empty() {
        return Err(OverrideError::InvalidPath {
            path: path.to_string(),
            reason: "path is empty".to_string(),
        });
    }

    let segments: Vec<String> = path.split(SEPARATOR).map(str::to_string).collect();
    if let Some(pos) = segments.iter().position(|s| s.is_empty()) {
        return Err(OverrideError::InvalidPath {
            path: path.to_string(),
            reason: format!("segment {} is empty", pos + 1),
        });
    }

    Ok(segments)
}

/// Extend a path prefix with one more segment
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, name)
    }
}

/// Where a lookup stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    /// Index of the segment that did not resolve
    pub segment: usize,
    /// Names available at that level
    pub available: Vec<String>,
}

/// Walk `segments` down from `roots`, descending into nested objects and the
/// nested-object element types of arrays and maps.
pub fn locate<'a>(
    roots: &[&'a Property],
    segments: &[String],
) -> std::result::Result<&'a Property, LookupFailure> {
    let mut level: Vec<&'a Property> = roots.to_vec();
    let mut found: Option<&'a Property> = None;

    for (idx, segment) in segments.iter().enumerate() {
        let Some(prop) = level.iter().copied().find(|p| &p.name == segment) else {
            return Err(LookupFailure {
                segment: idx,
                available: level.iter().map(|p| p.name.clone()).collect(),
            });
        };
        found = Some(prop);
        level = prop
            .nested_properties()
            .map(|children| children.iter().collect())
            .unwrap_or_default();
    }

    found.ok_or(LookupFailure { segment: 0, available: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_resolve_segments() {
        assert_eq!(resolve("a.b.c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(resolve("a").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_resolve_rejects_empty() {
        assert_eq!(resolve("").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(resolve("a..b").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(resolve(".a").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(resolve("a.").unwrap_err().kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a.b", "c"), "a.b.c");
    }

    #[test]
    fn test_locate_through_array_and_map() {
        let slots = Property::array("slots", Property::nested("", vec![Property::string("label")]));
        let labels = Property::map(
            "labels",
            Property::string(""),
            Property::nested("", vec![Property::string("color")]),
        );
        let roots = vec![&slots, &labels];

        let label = locate(&roots, &resolve("slots.label").unwrap()).unwrap();
        assert_eq!(label.name, "label");
        let color = locate(&roots, &resolve("labels.color").unwrap()).unwrap();
        assert_eq!(color.name, "color");
    }

    #[test]
    fn test_locate_reports_siblings() {
        let dims = Property::nested(
            "dimensions",
            vec![Property::string("width"), Property::string("height")],
        );
        let roots = vec![&dims];

        let failure = locate(&roots, &resolve("dimensions.depth").unwrap()).unwrap_err();
        assert_eq!(failure.segment, 1);
        assert_eq!(failure.available, vec!["width", "height"]);

        let failure = locate(&roots, &resolve("dimensions.width.inner").unwrap()).unwrap_err();
        assert_eq!(failure.segment, 2);
        assert!(failure.available.is_empty());
    }
}
