//! Entity catalog loading from YAML or JSON files
//!
//! The catalog describes every object type the management API exposes: its
//! path template, its attributes and their defaults, plus provider metadata
//! and the cross-object link table used when rewriting references. It is
//! loaded once per run and is read-only afterwards.

use crate::{AttributeValue, GeneratorError, PathTemplate, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Marker prefix on identifiers of objects the API provisions by itself
pub const DEFAULT_SYSTEM_MARKER: &str = "#";

/// Marked identifiers that still belong in generated configuration
pub const DEFAULT_SYSTEM_MARKER_ALLOWLIST: &[&str] = &["#DEAD_MSG_QUEUE"];

/// Value kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Integer,
    Boolean,
    Object,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Object => "object",
        }
    }
}

/// Provider identification used in the generated preamble
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderInfo {
    /// Provider local name (e.g., "solacebroker")
    pub name: String,
    /// Registry source without the host (e.g., "solaceproducts/solacebroker")
    pub source: String,
    /// Prepended to entity names to form output type names
    #[serde(default)]
    pub resource_prefix: String,
}

/// Management API layout
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiInfo {
    /// Appended to the connection URL (e.g., "/SEMP/v2/config")
    #[serde(default)]
    pub base_path: String,
    /// Path probed before discovery, relative to the connection URL
    #[serde(default)]
    pub about_path: Option<String>,
    /// Field of the probe response carrying the API version
    #[serde(default)]
    pub version_field: Option<String>,
}

/// Cross-object reference table
///
/// Both maps are keyed by output type name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkTable {
    /// Dependent type → the types it may reference
    #[serde(default)]
    pub dependencies: IndexMap<String, Vec<String>>,
    /// Dependency type → configuration name of its name attribute
    #[serde(default)]
    pub name_attributes: IndexMap<String, String>,
}

/// Describes one attribute of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    /// Field name in API records
    pub api_name: String,
    /// Attribute name in generated configuration
    pub name: String,
    pub kind: AttributeKind,
    pub default: Option<AttributeValue>,
    pub identifying: bool,
    pub sensitive: bool,
    pub read_only: bool,
    pub deprecated: bool,
    /// Nested attributes of an object-kind attribute
    pub attributes: Vec<AttributeDescriptor>,
}

/// Describes one object type
#[derive(Debug, Clone)]
pub struct ObjectTypeDescriptor {
    /// Catalog name (e.g., "msg_vpn_queue")
    pub name: String,
    /// Type name in generated configuration (provider prefix + name)
    pub output_type: String,
    pub description: Option<String>,
    pub path: PathTemplate,
    pub attributes: Vec<AttributeDescriptor>,
}

impl ObjectTypeDescriptor {
    /// The identifying subset of the attributes, in declaration order
    pub fn identifying(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.identifying)
    }

    /// Look up an attribute by API field name
    pub fn attribute(&self, api_name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.api_name == api_name)
    }
}

/// The loaded entity catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    pub provider: ProviderInfo,
    pub api: ApiInfo,
    pub system_marker: String,
    pub system_marker_allowlist: Vec<String>,
    pub links: LinkTable,
    entities: Vec<ObjectTypeDescriptor>,
}

#[derive(Debug, Deserialize)]
struct CatalogSpec {
    provider: ProviderInfo,
    #[serde(default)]
    api: ApiInfo,
    #[serde(default = "default_system_marker")]
    system_marker: String,
    #[serde(default = "default_allowlist")]
    system_marker_allowlist: Vec<String>,
    entities: Vec<EntitySpec>,
    #[serde(default)]
    links: LinkTable,
}

#[derive(Debug, Deserialize)]
struct EntitySpec {
    name: String,
    path_template: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeSpec>,
}

#[derive(Debug, Deserialize)]
struct AttributeSpec {
    api_name: String,
    #[serde(default)]
    name: Option<String>,
    kind: AttributeKind,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    identifying: bool,
    #[serde(default)]
    sensitive: bool,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    attributes: Vec<AttributeSpec>,
}

fn default_system_marker() -> String {
    DEFAULT_SYSTEM_MARKER.to_string()
}

fn default_allowlist() -> Vec<String> {
    DEFAULT_SYSTEM_MARKER_ALLOWLIST
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Catalog {
    /// Load a catalog file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Catalog(format!("Failed to read catalog file {:?}: {}", path, e))
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let spec: CatalogSpec = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                GeneratorError::Catalog(format!("Failed to parse catalog JSON from {:?}: {}", path, e))
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                GeneratorError::Catalog(format!("Failed to parse catalog YAML from {:?}: {}", path, e))
            })?
        };

        Self::from_spec(spec)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::from_spec(serde_yaml::from_str(content)?)
    }

    fn from_spec(spec: CatalogSpec) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut entities = Vec::with_capacity(spec.entities.len());

        for entity in spec.entities {
            if !seen.insert(entity.name.clone()) {
                return Err(GeneratorError::Catalog(format!(
                    "Duplicate entity name: {}",
                    entity.name
                )));
            }

            let path = PathTemplate::parse(&entity.path_template).map_err(|e| {
                GeneratorError::Catalog(format!("Entity {}: {}", entity.name, e))
            })?;
            let attributes = convert_attributes(&entity.name, entity.attributes)?;

            entities.push(ObjectTypeDescriptor {
                output_type: format!("{}{}", spec.provider.resource_prefix, entity.name),
                name: entity.name,
                description: entity.description,
                path,
                attributes,
            });
        }

        let catalog = Self {
            provider: spec.provider,
            api: spec.api,
            system_marker: spec.system_marker,
            system_marker_allowlist: spec.system_marker_allowlist,
            links: spec.links,
            entities,
        };
        catalog.check_links();
        Ok(catalog)
    }

    fn check_links(&self) {
        let known = |t: &str| self.entity_by_output_type(t).is_some();

        for (dependent, dependencies) in &self.links.dependencies {
            if !known(dependent) {
                tracing::warn!("Link table names unknown dependent type {}", dependent);
            }
            for dependency in dependencies {
                if !known(dependency) {
                    tracing::warn!("Link table names unknown dependency type {}", dependency);
                }
                if !self.links.name_attributes.contains_key(dependency) {
                    tracing::warn!(
                        "Dependency type {} has no name attribute; references to it are never linked",
                        dependency
                    );
                }
            }
        }
        for dependency in self.links.name_attributes.keys() {
            if !known(dependency) {
                tracing::warn!("Link table names unknown dependency type {}", dependency);
            }
        }
    }

    /// All object types in catalog order
    pub fn entities(&self) -> &[ObjectTypeDescriptor] {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&ObjectTypeDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity_by_output_type(&self, output_type: &str) -> Option<&ObjectTypeDescriptor> {
        self.entities.iter().find(|e| e.output_type == output_type)
    }

    /// Whether an identifier value marks an API-provisioned object
    pub fn is_system_provisioned(&self, value: &str) -> bool {
        !self.system_marker.is_empty()
            && value.starts_with(&self.system_marker)
            && !self.system_marker_allowlist.iter().any(|a| a == value)
    }
}

fn convert_attributes(entity: &str, specs: Vec<AttributeSpec>) -> Result<Vec<AttributeDescriptor>> {
    let mut names = HashSet::new();
    let mut attributes = Vec::with_capacity(specs.len());

    for spec in specs {
        let name = spec.name.unwrap_or_else(|| to_snake_case(&spec.api_name));
        if !names.insert(name.clone()) {
            return Err(GeneratorError::Catalog(format!(
                "Entity {}: duplicate attribute name {}",
                entity, name
            )));
        }

        let nested = convert_attributes(entity, spec.attributes)?;
        if spec.kind != AttributeKind::Object && !nested.is_empty() {
            return Err(GeneratorError::Catalog(format!(
                "Entity {}: attribute {} has nested attributes but kind {}",
                entity,
                spec.api_name,
                spec.kind.as_str()
            )));
        }

        let default = spec.default.as_ref().map(AttributeValue::from_json);
        if let Some(value) = &default {
            if value.kind() != Some(spec.kind) {
                return Err(GeneratorError::Catalog(format!(
                    "Entity {}: default of {} is a {}, expected {}",
                    entity,
                    spec.api_name,
                    value.type_name(),
                    spec.kind.as_str()
                )));
            }
        }

        attributes.push(AttributeDescriptor {
            api_name: spec.api_name,
            name,
            kind: spec.kind,
            default,
            identifying: spec.identifying,
            sensitive: spec.sensitive,
            read_only: spec.read_only,
            deprecated: spec.deprecated,
            attributes: nested,
        });
    }

    Ok(attributes)
}

/// Convert a camelCase API name to snake_case
///
/// # Examples
///
/// ```
/// use hemmer_config_generator_common::to_snake_case;
///
/// assert_eq!(to_snake_case("msgVpnName"), "msg_vpn_name");
/// assert_eq!(to_snake_case("clearPercent"), "clear_percent");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
provider:
  name: example
  source: example/example
  resource_prefix: example_
entities:
  - name: container
    path_template: /containers/{containerName}
    attributes:
      - api_name: containerName
        kind: string
        identifying: true
      - api_name: enabled
        kind: boolean
        default: false
      - api_name: threshold
        kind: object
        attributes:
          - api_name: setPercent
            kind: integer
            default: 25.0
  - name: container_item
    path_template: /containers/{containerName}/items/{itemName}
    attributes:
      - api_name: itemName
        kind: string
        identifying: true
links:
  dependencies:
    example_container_item: [example_container]
  name_attributes:
    example_container: container_name
"#;

    #[test]
    fn test_load_yaml_catalog() {
        let catalog = Catalog::from_yaml_str(CATALOG).unwrap();
        assert_eq!(catalog.entities().len(), 2);
        assert_eq!(catalog.system_marker, "#");
        assert_eq!(catalog.system_marker_allowlist, vec!["#DEAD_MSG_QUEUE"]);

        let container = catalog.entity("container").unwrap();
        assert_eq!(container.output_type, "example_container");
        assert_eq!(container.identifying().count(), 1);
        assert_eq!(container.attribute("containerName").unwrap().name, "container_name");

        let threshold = container.attribute("threshold").unwrap();
        assert_eq!(
            threshold.attributes[0].default,
            Some(AttributeValue::Integer(25))
        );
        assert!(catalog.entity_by_output_type("example_container_item").is_some());
    }

    #[test]
    fn test_rejects_duplicate_entities() {
        let yaml = r#"
provider: { name: p, source: p/p }
entities:
  - { name: a, path_template: "/a/{x}" }
  - { name: a, path_template: "/b/{y}" }
"#;
        let err = Catalog::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate entity name"));
    }

    #[test]
    fn test_rejects_mistyped_default() {
        let yaml = r#"
provider: { name: p, source: p/p }
entities:
  - name: a
    path_template: "/a/{x}"
    attributes:
      - { api_name: enabled, kind: boolean, default: "no" }
"#;
        let err = Catalog::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("default of enabled"));
    }

    #[test]
    fn test_system_marker() {
        let catalog = Catalog::from_yaml_str(CATALOG).unwrap();
        assert!(catalog.is_system_provisioned("#client-profile"));
        assert!(!catalog.is_system_provisioned("#DEAD_MSG_QUEUE"));
        assert!(!catalog.is_system_provisioned("default"));
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("msgVpnName"), "msg_vpn_name");
        assert_eq!(to_snake_case("enabled"), "enabled");
        assert_eq!(to_snake_case("eventThreshold"), "event_threshold");
    }
}
