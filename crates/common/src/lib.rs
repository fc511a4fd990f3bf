//! Common types and utilities for the Hemmer Config Generator
//!
//! This crate contains the entity catalog model, parsed path templates, the
//! tagged attribute value type, the discovered resource collection, the
//! management API boundary and the error types shared by the client,
//! discovery, generator and CLI components.

mod api;
mod catalog;
mod path_template;
mod resource;
mod value;

pub use api::{FetchError, ManagementApi, Record};
pub use catalog::{
    to_snake_case, ApiInfo, AttributeDescriptor, AttributeKind, Catalog, LinkTable,
    ObjectTypeDescriptor, ProviderInfo, DEFAULT_SYSTEM_MARKER, DEFAULT_SYSTEM_MARKER_ALLOWLIST,
};
pub use path_template::{Binding, Bindings, PathSegment, PathTemplate};
pub use resource::{AttributeEntry, HclValue, Resource, ResourceCollection};
pub use value::AttributeValue;

use thiserror::Error;

/// Errors that can occur during config generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Path resolution error: {0}")]
    PathResolution(String),

    #[error("Object not found at {0}")]
    NotFound(String),

    #[error("Request to {path} failed: {message}")]
    Transport { path: String, message: String },

    #[error("Cannot format attribute {attribute}: {reason}")]
    Format { attribute: String, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

impl GeneratorError {
    /// Map a client failure for `path` into the engine's taxonomy
    pub fn from_fetch(path: &str, err: FetchError) -> Self {
        match err {
            FetchError::NotFound => GeneratorError::NotFound(path.to_string()),
            FetchError::Other(message) => GeneratorError::Transport {
                path: path.to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fetch_keeps_not_found_distinct() {
        let err = GeneratorError::from_fetch("/containers/alpha", FetchError::NotFound);
        assert!(matches!(err, GeneratorError::NotFound(ref p) if p == "/containers/alpha"));

        let err = GeneratorError::from_fetch("/containers", FetchError::Other("boom".into()));
        assert_eq!(err.to_string(), "Request to /containers failed: boom");
    }
}
