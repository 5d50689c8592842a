// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the Avi-on cloud client using wiremock.

#![cfg(feature = "http")]

use avion_mesh::cloud::{AvionCloudClient, LocationLookup};
use avion_mesh::error::LookupError;
use avion_mesh::types::Avid;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-123";

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(body_json(json!({"email": "me@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": {"auth_token": TOKEN}
        })))
        .mount(server)
        .await;
}

async fn mount_location(server: &MockServer, pid: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/locations/{pid}/abstract_devices")))
        .and(header("Authorization", format!("Token {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "abstract_devices": [
                {
                    "type": "device",
                    "pid": format!("{pid}-d1"),
                    "avid": 32781,
                    "product_id": 134,
                    "name": "Kitchen",
                    "friendly_mac_address": "AA:BB:CC:DD:EE:01"
                },
                {
                    "type": "device",
                    "pid": format!("{pid}-d2"),
                    "avid": 32782,
                    "product_id": 167,
                    "name": "Porch"
                },
                {
                    "type": "controller",
                    "pid": format!("{pid}-c1"),
                    "name": "Remote"
                }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/locations/{pid}/groups")))
        .and(header("Authorization", format!("Token {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [
                {"pid": format!("{pid}-g1"), "avid": 40001, "name": "Downstairs", "devices": [format!("{pid}-d1")]}
            ]
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Location lookup
// ============================================================================

mod lookup {
    use super::*;

    #[tokio::test]
    async fn resolves_single_location() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/user/locations"))
            .and(header("Authorization", format!("Token {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "locations": [{"pid": "loc1", "passphrase": "mesh-secret"}]
            })))
            .mount(&server)
            .await;
        mount_location(&server, "loc1").await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let locations = client.lookup_locations("me@example.com", "pw").await.unwrap();

        assert_eq!(locations.len(), 1);
        let location = &locations[0];
        assert_eq!(location.passphrase, "mesh-secret");

        // The controller entry is not a device
        assert_eq!(location.devices.len(), 2);
        assert_eq!(location.devices[0].avid, Avid::new("32781"));
        assert_eq!(location.devices[0].product_id, 134);
        assert_eq!(
            location.devices[0].mac_address.as_deref(),
            Some("AA:BB:CC:DD:EE:01")
        );
        assert_eq!(location.devices[1].mac_address, None);

        assert_eq!(location.groups.len(), 1);
        assert_eq!(location.groups[0].avid, Avid::new("40001"));
        assert!(location.groups[0].contains("loc1-d1"));

        assert_eq!(
            location.device_avids(),
            vec![Avid::new("32781"), Avid::new("32782")]
        );
    }

    #[tokio::test]
    async fn resolves_every_location_in_order() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/user/locations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "locations": [
                    {"pid": "home", "passphrase": "first"},
                    {"pid": "cabin", "passphrase": "second"}
                ]
            })))
            .mount(&server)
            .await;
        mount_location(&server, "home").await;
        mount_location(&server, "cabin").await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let locations = client.lookup_locations("me@example.com", "pw").await.unwrap();

        let passphrases: Vec<&str> = locations.iter().map(|l| l.passphrase.as_str()).collect();
        assert_eq!(passphrases, ["first", "second"]);
        assert_eq!(locations[1].devices[0].pid, "cabin-d1");
    }

    #[tokio::test]
    async fn account_without_locations() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/user/locations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"locations": []})))
            .mount(&server)
            .await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let locations = client.lookup_locations("me@example.com", "pw").await.unwrap();
        assert!(locations.is_empty());
    }
}

// ============================================================================
// Error handling
// ============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let err = client
            .lookup_locations("me@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn server_error_is_unexpected_response() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/user/locations"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let err = client
            .lookup_locations("me@example.com", "pw")
            .await
            .unwrap_err();
        match err {
            LookupError::UnexpectedResponse(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = AvionCloudClient::with_base_url(server.uri()).unwrap();
        let err = client
            .lookup_locations("me@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Http(_)));
    }
}
