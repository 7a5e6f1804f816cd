//! Error types for override resolution

use std::fmt;
use thiserror::Error;

/// Result type for override operations
pub type Result<T> = std::result::Result<T, OverrideError>;

/// The node an overridden attribute belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOwner {
    /// The reserved product-level target
    Product,
    /// A resource, by name
    Resource(String),
    /// A property addressed by its dotted path inside a resource
    Property { resource: String, path: String },
}

impl FieldOwner {
    pub fn resource(name: impl Into<String>) -> Self {
        FieldOwner::Resource(name.into())
    }

    pub fn property(resource: impl Into<String>, path: impl Into<String>) -> Self {
        FieldOwner::Property { resource: resource.into(), path: path.into() }
    }
}

impl fmt::Display for FieldOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldOwner::Product => write!(f, "product"),
            FieldOwner::Resource(name) => write!(f, "resource '{}'", name),
            FieldOwner::Property { resource, path } if resource.is_empty() => {
                write!(f, "property '{}'", path)
            }
            FieldOwner::Property { resource, path } => {
                write!(f, "property '{}' on resource '{}'", path, resource)
            }
        }
    }
}

/// Override resolution errors
///
/// All of these abort the compilation unit they were raised for.
#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Unknown resource '{name}' in overrides{}", hint(.suggestion))]
    UnknownResource { name: String, suggestion: Option<String> },

    #[error("Unknown field '{field}' on {owner}")]
    UnknownField { owner: FieldOwner, field: String },

    #[error(
        "Unknown property path '{path}' on resource '{resource}' (available: [{}]){}",
        .available.join(", "),
        hint(.suggestion)
    )]
    UnknownPropertyPath {
        path: String,
        resource: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("Invalid property path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid type substitution to '{requested}' for '{path}' on resource '{resource}': {reason}")]
    InvalidTypeSubstitution {
        resource: String,
        path: String,
        requested: String,
        reason: String,
    },

    #[error("Invalid value for field '{field}' on {owner}: {reason}")]
    InvalidFieldValue { owner: FieldOwner, field: String, reason: String },

    #[error("Fields '{first}' and '{second}' cannot both be set on {owner}")]
    ConflictingAttributes { owner: FieldOwner, first: String, second: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" - did you mean '{}'?", s),
        None => String::new(),
    }
}

/// Coarse classification of an [`OverrideError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownResource,
    UnknownField,
    UnknownPropertyPath,
    InvalidPath,
    InvalidTypeSubstitution,
    InvalidFieldValue,
    ConflictingAttributes,
    Io,
    Parse,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownResource => "O001",
            Self::UnknownField => "O002",
            Self::UnknownPropertyPath => "O003",
            Self::InvalidTypeSubstitution => "O004",
            Self::InvalidPath => "O005",
            Self::InvalidFieldValue => "O006",
            Self::ConflictingAttributes => "O007",
            Self::Io => "L001",
            Self::Parse => "L002",
            Self::Config => "L003",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl OverrideError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownResource { .. } => ErrorKind::UnknownResource,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::UnknownPropertyPath { .. } => ErrorKind::UnknownPropertyPath,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::InvalidTypeSubstitution { .. } => ErrorKind::InvalidTypeSubstitution,
            Self::InvalidFieldValue { .. } => ErrorKind::InvalidFieldValue,
            Self::ConflictingAttributes { .. } => ErrorKind::ConflictingAttributes,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) | Self::Toml(_) | Self::UnsupportedFormat(_) => ErrorKind::Parse,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_display() {
        assert_eq!(FieldOwner::Product.to_string(), "product");
        assert_eq!(FieldOwner::resource("Box").to_string(), "resource 'Box'");
        assert_eq!(
            FieldOwner::property("Box", "dimensions.width").to_string(),
            "property 'dimensions.width' on resource 'Box'"
        );
    }

    #[test]
    fn test_unknown_path_message_lists_siblings() {
        let err = OverrideError::UnknownPropertyPath {
            path: "dimensions.depth".to_string(),
            resource: "Box".to_string(),
            available: vec!["width".to_string(), "height".to_string()],
            suggestion: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("[width, height]"));
        assert_eq!(err.kind(), ErrorKind::UnknownPropertyPath);
    }

    #[test]
    fn test_suggestion_hint() {
        let err = OverrideError::UnknownResource {
            name: "Boxx".to_string(),
            suggestion: Some("Box".to_string()),
        };
        assert!(err.to_string().ends_with("did you mean 'Box'?"));
    }
}
