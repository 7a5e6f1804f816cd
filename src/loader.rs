//! Reading schema and override files
//!
//! Base schemas and override maps are read from JSON (`.json`) or TOML
//! (`.toml`). A directory tree can hold many compilation units, one per
//! directory containing an `api` file and an optional `overrides` file:
//!
//! ```text
//! products/
//!   compute/api.json
//!   compute/overrides.toml
//!   storage/api.toml
//! ```

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{OverrideError, Result};
use crate::overrides::OverrideMap;
use crate::schema::Product;

const API_STEM: &str = "api";
const OVERRIDES_STEM: &str = "overrides";
const EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Directories never searched for units
const SKIP_DIRS: [&str; 4] = ["target", ".git", "node_modules", ".cargo"];

/// One product's base schema plus its overrides
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Unit name, the directory the files were found in
    pub name: String,
    pub api: Product,
    pub overrides: OverrideMap,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, api: Product, overrides: OverrideMap) -> Self {
        Self { name: name.into(), api, overrides }
    }
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(OverrideError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read a base product schema
pub fn load_product(path: &Path) -> Result<Product> {
    debug!(path = %path.display(), "Loading product");
    load_file(path)
}

/// Read an override map
pub fn load_overrides(path: &Path) -> Result<OverrideMap> {
    debug!(path = %path.display(), "Loading overrides");
    load_file(path)
}

/// First existing `<stem>.json` or `<stem>.toml` in `dir`
fn find_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
}

/// Load the unit held by `dir`, if it has an api file
pub fn load_unit(dir: &Path) -> Result<Option<CompilationUnit>> {
    let Some(api_path) = find_file(dir, API_STEM) else {
        return Ok(None);
    };

    let api = load_product(&api_path)?;
    let overrides = match find_file(dir, OVERRIDES_STEM) {
        Some(path) => load_overrides(&path)?,
        None => OverrideMap::new(),
    };

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| api.name.clone());
    Ok(Some(CompilationUnit::new(name, api, overrides)))
}

/// Find and load every unit below `root`, in path order
pub fn discover_units(root: &Path) -> Result<Vec<CompilationUnit>> {
    let mut units = Vec::new();

    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
        !(e.file_type().is_dir() && SKIP_DIRS.iter().any(|s| e.file_name() == *s))
    });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(unit) = load_unit(entry.path())? {
            debug!(unit = %unit.name, dir = %entry.path().display(), "Discovered unit");
            units.push(unit);
        }
    }

    Ok(units)
}
