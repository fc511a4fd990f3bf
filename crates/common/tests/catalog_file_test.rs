//! Loading catalogs from disk

use hemmer_config_generator_common::{AttributeKind, Catalog, GeneratorError};
use std::io::Write;
use tempfile::Builder;

#[test]
fn test_load_json_catalog_by_extension() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
  "provider": {{ "name": "example", "source": "example/example", "resource_prefix": "example_" }},
  "api": {{ "base_path": "/api/v2/config", "about_path": "/api/v2/about", "version_field": "apiVersion" }},
  "system_marker": "~",
  "entities": [
    {{
      "name": "container",
      "path_template": "/containers/{{containerName}}",
      "attributes": [
        {{ "api_name": "containerName", "kind": "string", "identifying": true }},
        {{ "api_name": "maxItems", "kind": "integer", "default": 100 }}
      ]
    }}
  ]
}}"#
    )
    .unwrap();

    let catalog = Catalog::load(file.path()).unwrap();
    assert_eq!(catalog.system_marker, "~");
    assert_eq!(catalog.api.base_path, "/api/v2/config");
    assert_eq!(catalog.api.version_field.as_deref(), Some("apiVersion"));

    let container = catalog.entity("container").unwrap();
    assert_eq!(container.path.as_str(), "/containers/{containerName}");
    assert_eq!(container.attributes[1].kind, AttributeKind::Integer);
    assert_eq!(container.attributes[1].name, "max_items");
}

#[test]
fn test_load_yaml_catalog_with_bad_template() {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
provider: {{ name: p, source: p/p }}
entities:
  - name: broken
    path_template: "containers/{{containerName}}"
"#
    )
    .unwrap();

    let err = Catalog::load(file.path()).unwrap_err();
    assert!(matches!(err, GeneratorError::Catalog(ref m) if m.contains("broken")));
}

#[test]
fn test_load_missing_file() {
    let err = Catalog::load(std::path::Path::new("/nonexistent/catalog.yaml")).unwrap_err();
    assert!(matches!(err, GeneratorError::Catalog(_)));
}

#[test]
fn test_load_bundled_solacebroker_catalog() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../catalogs/solacebroker.yaml");
    let catalog = Catalog::load(&path).unwrap();

    assert_eq!(catalog.provider.name, "solacebroker");
    assert_eq!(catalog.api.about_path.as_deref(), Some("/SEMP/v2/config/about/api"));
    assert!(catalog.is_system_provisioned("#client-profile"));
    assert!(!catalog.is_system_provisioned("#DEAD_MSG_QUEUE"));

    let vpn = catalog
        .entity_by_output_type("solacebroker_msg_vpn")
        .unwrap();
    assert_eq!(vpn.path.placeholders().count(), 1);

    let exception = catalog
        .entity("msg_vpn_acl_profile_publish_topic_exception")
        .unwrap();
    let (collection, introduced) = exception.path.collection().unwrap();
    assert_eq!(
        collection.as_str(),
        "/msgVpns/{msgVpnName}/aclProfiles/{aclProfileName}/publishTopicExceptions"
    );
    assert_eq!(
        introduced,
        vec!["publishTopicExceptionSyntax", "publishTopicException"]
    );

    assert_eq!(
        catalog.links.name_attributes["solacebroker_msg_vpn_acl_profile"],
        "acl_profile_name"
    );
}
