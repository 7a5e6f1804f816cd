//! Schema Overrides
//!
//! Override resolution and schema merge for API code generation. A base
//! schema graph (products, resources, typed properties) is combined with a
//! sparse, path-addressed set of provider overrides to produce a new, fully
//! resolved graph for the code emitters.
//!
//! ## Features
//!
//! - **Validation first**: every override must target a real resource,
//!   property path and attribute before any merge work starts
//! - **Explicit-wins precedence**: base values survive type-level defaults;
//!   only deliberately set override values replace them
//! - **Variant substitution**: a property can change kind (String → Integer)
//!   without changing its wire name
//! - **Batch compilation**: independent products compile concurrently
//!
//! ## Example
//!
//! ```
//! use schema_overrides::{
//!     OverrideMap, OverrideSpec, OverrideTarget, Product, Property, Resource, ResourceOverride,
//!     Runner,
//! };
//! use serde_json::json;
//!
//! let api = Product::new("Boxes").with_resource(
//!     Resource::new("Box")
//!         .with_property(Property::nested("dimensions", vec![Property::string("width")])),
//! );
//! let overrides = OverrideMap::new().with_resource(
//!     "Box",
//!     ResourceOverride::new().with_property(
//!         "dimensions.width",
//!         OverrideSpec::new().with("type", json!("Integer")),
//!     ),
//! );
//!
//! let merged = Runner::build(&api, &overrides, &OverrideTarget::default()).unwrap();
//! let width = merged.resource("Box").unwrap().property_list()[0].child("width").unwrap();
//! assert_eq!(width.property_type().as_str(), "Integer");
//! ```

pub mod checksum;
pub mod config;
pub mod diff;
pub mod driver;
pub mod error;
pub mod loader;
pub mod merge;
pub mod overrides;
pub mod path;
pub mod schema;
pub mod suggest;
pub mod validator;

pub use checksum::Checksum;
pub use config::{OutputFormat, OverridesConfig};
pub use driver::{compile_all, DriverSettings, UnitOutcome};
pub use error::{ErrorKind, FieldOwner, OverrideError, Result};
pub use loader::CompilationUnit;
pub use merge::Runner;
pub use overrides::{
    AttributeDef, AttributeSet, OverrideMap, OverrideSpec, OverrideTarget, PropertySpec,
    ResourceOverride, Setting,
};
pub use schema::{Product, Property, PropertyKind, PropertyType, Resource, Verb};
pub use validator::Validator;
