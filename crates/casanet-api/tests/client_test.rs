#![allow(clippy::unwrap_used)]
// Integration tests for `HubClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use casanet_api::models::{MinionStatus, MinionTypes, SwitchOptions, Timing, TimingProperties, TimingTypes};
use casanet_api::{Error, HubClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HubClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = HubClient::with_client(reqwest::Client::new(), base_url).unwrap();
    (server, client)
}

fn sample_timing(id: &str) -> Timing {
    Timing {
        timing_id: id.into(),
        timing_name: "Evening".into(),
        minion_id: "m1".into(),
        is_active: true,
        timing_type: TimingTypes::Once,
        timing_properties: TimingProperties::once(1_700_000_000_000),
        trigger_direct_action: None,
    }
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_profile_and_header_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/API/auth/login"))
        .and(body_json(json!({ "email": "me@home.local", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("api-key", "sess-123")
                .set_body_json(json!({
                    "email": "me@home.local",
                    "displayName": "Me",
                    "ignoreTfa": false,
                    "scope": "admin"
                })),
        )
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "pw".to_string().into();
    let login = client.login("me@home.local", &secret).await.unwrap();

    assert_eq!(login.profile.display_name, "Me");
    assert_eq!(login.profile.scope, "admin");
    let token = login.token.unwrap();
    assert_eq!(secrecy::ExposeSecret::expose_secret(&token), "sess-123");
}

#[tokio::test]
async fn test_login_failure_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/API/auth/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("me@home.local", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_token_is_sent_as_api_key_header() {
    let server = MockServer::start().await;
    let transport =
        TransportConfig::default().with_token(secrecy::SecretString::from("tok".to_owned()));
    let client = HubClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/API/minions"))
        .and(header("api-key", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_minions().await.unwrap().is_empty());
}

// ── Timings ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_timings() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/API/timings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "timingId": "t1",
            "timingName": "Wake up",
            "minionId": "m1",
            "isActive": true,
            "timingType": "dailyTimeTrigger",
            "timingProperties": { "dailyTimeTrigger": { "hour": 6, "minutes": 45, "days": ["monday"] } }
        }])))
        .mount(&server)
        .await;

    let timings = client.list_timings().await.unwrap();
    assert_eq!(timings.len(), 1);
    assert_eq!(timings[0].timing_name, "Wake up");
    assert_eq!(timings[0].timing_type, TimingTypes::DailyTimeTrigger);
}

#[tokio::test]
async fn test_create_update_delete_timing_routes() {
    let (server, client) = setup().await;
    let timing = sample_timing("t7");

    Mock::given(method("POST"))
        .and(path("/API/timings"))
        .and(body_json(serde_json::to_value(&timing).unwrap()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/API/timings/t7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/API/timings/t7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.create_timing(&timing).await.unwrap();
    client.update_timing(&timing).await.unwrap();
    client.delete_timing("t7").await.unwrap();
}

#[tokio::test]
async fn test_server_error_carries_hub_message() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/API/timings/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "responseCode": 4404, "message": "timing not exist" })),
        )
        .mount(&server)
        .await;

    let err = client.delete_timing("missing").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "timing not exist");
        }
        other => panic!("expected Server error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/API/timings"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let result = client.list_timings().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("nope")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_and_rename_bluetooth_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/API/devices/bluetooth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "uuid": "aa:01", "name": "Keys", "rssi": -70 },
            { "uuid": "aa:02" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/API/devices/bluetooth/aa:02"))
        .and(body_json(json!({ "name": "Wallet" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_bluetooth_devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].rssi, Some(-70));
    assert!(devices[1].name.is_none());

    client.set_bluetooth_device_name("aa:02", "Wallet").await.unwrap();
}

#[tokio::test]
async fn test_rescan_bluetooth_devices() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/API/devices/bluetooth/rescan"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.rescan_bluetooth_devices().await.unwrap();
}

#[tokio::test]
async fn test_list_and_rename_network_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/API/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "mac": "11:22:33:44:55:66", "ip": "192.168.1.20", "vendor": "Espressif" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/API/devices/11:22:33:44:55:66"))
        .and(body_json(json!({ "name": "Boiler" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices[0].vendor.as_deref(), Some("Espressif"));
    client.set_device_name("11:22:33:44:55:66", "Boiler").await.unwrap();
}

// ── Minions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_minion_status() {
    let (server, client) = setup().await;

    let mut status = MinionStatus::default();
    status.set_switch_state(MinionTypes::Switch, SwitchOptions::On);

    Mock::given(method("PUT"))
        .and(path("/API/minions/m9"))
        .and(body_json(json!({ "switch": { "status": "on" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.set_minion_status("m9", &status).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/API/minions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_minions().await.unwrap_err();
    assert!(err.is_auth_expired());
}
