//! Catalog, HTTP client, discovery and writer wired together against a mock broker

use hemmer_config_generator_client::{ApiClient, Auth, ClientConfig};
use hemmer_config_generator_common::Catalog;
use hemmer_config_generator_discovery::{discover, RootSelector};
use hemmer_config_generator_generator::{ConfigWriter, DEFAULT_REGISTRY};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

const BASE: &str = "/SEMP/v2/config";

fn catalog() -> Catalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../catalogs/solacebroker.yaml");
    Catalog::load(&path).unwrap()
}

fn client(server: &MockServer) -> ApiClient {
    let mut config = ClientConfig::new(
        server.base_url(),
        BASE,
        Auth::Basic {
            username: "admin".into(),
            password: "secret".into(),
        },
    );
    config.retries = 0;
    config.request_min_interval = Duration::ZERO;
    ApiClient::new(config).unwrap()
}

fn serve(server: &MockServer, path: &str, data: Value) {
    let full = format!("{}{}", BASE, path);
    server.mock(|when, then| {
        when.method(GET).path(full);
        then.status(200)
            .json_body(json!({"data": data, "meta": {"responseCode": 200}}));
    });
}

/// Anything not served here answers 404, which reads as an empty collection
fn broker(server: &MockServer) {
    serve(
        server,
        "/msgVpns/default",
        json!({
            "msgVpnName": "default",
            "enabled": true,
            "maxConnectionCount": 100,
            "authenticationBasicType": "internal"
        }),
    );
    serve(
        server,
        "/msgVpns/default/queues",
        json!([
            {"msgVpnName": "default", "queueName": "q1", "ingressEnabled": true},
            {"msgVpnName": "default", "queueName": "#P2P/QUE/v:host/abc"}
        ]),
    );
    serve(
        server,
        "/msgVpns/default/clientProfiles",
        json!([
            {"msgVpnName": "default", "clientProfileName": "standard"},
            {"msgVpnName": "default", "clientProfileName": "#client-profile"}
        ]),
    );
    serve(
        server,
        "/msgVpns/default/aclProfiles",
        json!([{"msgVpnName": "default", "aclProfileName": "restricted", "clientConnectDefaultAction": "allow"}]),
    );
    serve(
        server,
        "/msgVpns/default/clientUsernames",
        json!([{
            "msgVpnName": "default",
            "clientUsername": "app",
            "aclProfileName": "restricted",
            "clientProfileName": "standard",
            "enabled": true,
            "password": "hunter2"
        }]),
    );
}

#[test]
fn test_discovers_and_links_a_message_vpn() {
    let server = MockServer::start();
    broker(&server);
    let catalog = catalog();
    let api = client(&server);

    let resources = discover(
        &catalog,
        &api,
        &RootSelector::parse("solacebroker_msg_vpn.mq", "default"),
    )
    .unwrap();

    let addresses: Vec<String> = resources.iter().map(|r| r.address()).collect();
    assert_eq!(
        addresses,
        vec![
            "solacebroker_msg_vpn.mq",
            "solacebroker_msg_vpn_queue.mq_q1",
            "solacebroker_msg_vpn_client_profile.mq_standard",
            "solacebroker_msg_vpn_acl_profile.mq_restricted",
            "solacebroker_msg_vpn_client_username.mq_app",
        ]
    );

    let dir = tempfile::tempdir().unwrap();
    let writer = ConfigWriter::new(catalog.provider.clone(), DEFAULT_REGISTRY).unwrap();
    let path = writer
        .write(
            &resources,
            "solacebroker_msg_vpn.mq",
            &server.base_url(),
            &dir.path().join("mq"),
        )
        .unwrap();
    let text = std::fs::read_to_string(path).unwrap();

    assert!(text.contains("source = \"registry.terraform.io/solaceproducts/solacebroker\""));
    assert!(text.contains(
        "resource \"solacebroker_msg_vpn_queue\" \"mq_q1\" {\n  \
         ingress_enabled  = true\n  \
         msg_vpn_name     = solacebroker_msg_vpn.mq.msg_vpn_name\n  \
         queue_name       = \"q1\"\n}\n"
    ));
    assert!(text.contains(
        "  acl_profile_name     = solacebroker_msg_vpn_acl_profile.mq_restricted.acl_profile_name\n"
    ));
    assert!(text.contains(
        "  client_profile_name  = solacebroker_msg_vpn_client_profile.mq_standard.client_profile_name\n"
    ));
    assert!(text.contains("  authentication_basic_type  = \"internal\"\n"));
    assert!(!text.contains("max_connection_count"));
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("secret"));
    assert!(!text.contains("#client-profile"));
    assert!(!text.contains("P2P"));
}

#[test]
fn test_missing_root_is_an_error() {
    let server = MockServer::start();
    let catalog = catalog();
    let api = client(&server);

    let result = discover(
        &catalog,
        &api,
        &RootSelector::parse("solacebroker_msg_vpn", "absent"),
    );
    assert!(result.is_err());
}
