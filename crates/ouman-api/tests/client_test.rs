#![allow(clippy::unwrap_used)]
// Integration tests for `OumanClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use ouman_api::registry::builtin;
use ouman_api::{
    Circuit, CommunicationError, Error, HomeAwayControl, OperationMode, OumanClient,
    RegistrySet, SecretString, SessionState, TransportConfig, ValidationError, Value,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Matches when the raw (`;`-separated) query contains a fragment.
struct QueryContains(&'static str);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_some_and(|q| q.contains(self.0))
    }
}

async fn setup() -> (MockServer, OumanClient) {
    setup_with(TransportConfig::default()).await
}

async fn setup_with(transport: TransportConfig) -> (MockServer, OumanClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = OumanClient::new(
        base_url,
        "user",
        SecretString::from("password"),
        &transport,
    )
    .unwrap();
    (server, client)
}

fn body(raw: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(raw)
}

async fn mount_login_ok(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?result=ok;\0"))
        .expect(times)
        .mount(server)
        .await;
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .and(QueryContains("uid=user;pwd=password;"))
        .and(QueryContains("GMT="))
        .respond_with(body("login?result=ok;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.login().await.unwrap();
    assert_eq!(response.result(), Some("ok"));
    assert_eq!(client.session_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_wrong_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?result=error;\0"))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert_eq!(client.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_unexpected_shape() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?status=maybe;\0"))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Protocol { .. })),
        "expected Protocol error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_timeout() {
    let (server, client) =
        setup_with(TransportConfig::default().with_timeout(Duration::from_millis(200))).await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?result=ok;\0").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(
            result,
            Err(Error::Communication(CommunicationError::Timeout { .. }))
        ),
        "expected Timeout, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.login().await.unwrap_err();
    assert!(err.is_communication());
    assert!(err.to_string().contains("HTTP Error: 500"), "{err}");
}

#[tokio::test]
async fn test_logout() {
    let (server, client) = setup().await;
    mount_login_ok(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(body("logout?result=ok;\0"))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    client.logout().await.unwrap();
    assert_eq!(client.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_logout_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(body("logout?result=error;\0"))
        .mount(&server)
        .await;

    let result = client.logout().await;
    assert!(matches!(result, Err(Error::Protocol { .. })), "{result:?}");
}

#[tokio::test]
async fn test_login_network_error_hides_password() {
    // Nothing listens on port 1.
    let client = OumanClient::new(
        Url::parse("http://127.0.0.1:1").unwrap(),
        "user",
        SecretString::from("hunter2secret"),
        &TransportConfig::default().with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.login().await.unwrap_err();
    assert!(
        matches!(err, Error::Communication(CommunicationError::Network(_))),
        "{err:?}"
    );
    let rendered = format!("{err} {err:?}");
    assert!(!rendered.contains("hunter2secret"), "{rendered}");
    assert!(!rendered.contains("pwd="), "{rendered}");
    assert_eq!(client.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_request_network_error() {
    let client = OumanClient::new(
        Url::parse("http://127.0.0.1:1").unwrap(),
        "user",
        SecretString::from("password"),
        &TransportConfig::default().with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.get_alarms().await.unwrap_err();
    assert!(err.is_communication(), "{err:?}");
    assert!(
        matches!(err, Error::Communication(CommunicationError::Network(_))),
        "{err:?}"
    );
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_values_reports_missing_and_unexpected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .and(QueryContains("S_227_85;"))
        .respond_with(body(
            "request?S_227_85=-13.3;S_135_85=1;S_26_85=600;S_1002_85=Relay;\
             S_1004_85=Off;S_9999_0=42;\0",
        ))
        .mount(&server)
        .await;

    let registries = RegistrySet::new([builtin::system().clone()]).unwrap();
    let readings = client.get_values(&registries).await.unwrap();

    assert_eq!(readings.len(), 5);
    assert_eq!(readings.get("outside_temperature"), Some(&Value::Number(-13.3)));
    assert_eq!(
        readings.get("home_away_mode"),
        Some(&Value::HomeAway(HomeAwayControl::Away))
    );
    assert_eq!(
        readings.get("relay_status_text"),
        Some(&Value::Text("Off".into()))
    );
    assert_eq!(readings.missing, vec!["S_140_85"]);
    assert_eq!(readings.unexpected, vec!["S_9999_0".to_owned()]);
}

#[tokio::test]
async fn test_get_values_unparsable_number() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .respond_with(body("request?S_227_85=sensor fault;\0"))
        .mount(&server)
        .await;

    let registries = RegistrySet::new([builtin::system().clone()]).unwrap();
    let result = client.get_values(&registries).await;
    assert!(matches!(result, Err(Error::Protocol { .. })), "{result:?}");
}

#[tokio::test]
async fn test_reads_are_not_retried_on_404() {
    let (server, client) = setup().await;
    mount_login_ok(&server, 0).await;

    Mock::given(method("GET"))
        .and(path("/alarms"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_alarms().await.unwrap_err();
    assert!(err.is_session_expired());
}

#[tokio::test]
async fn test_get_alarms_verbatim() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/alarms"))
        .respond_with(body("alarms?alarm_count=1;alarm_1=Sensor fault L1;\0"))
        .mount(&server)
        .await;

    let alarms = client.get_alarms().await.unwrap();
    assert_eq!(alarms.len(), 2);
    assert_eq!(alarms.get("alarm_1").map(String::as_str), Some("Sensor fault L1"));
}

// ── Device detection ────────────────────────────────────────────────

#[tokio::test]
async fn test_detects_l1_room_sensor_without_l2() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .and(QueryContains("S_140_85;S_261_111;S_295_111;"))
        .respond_with(body(
            "request?S_140_85=off;S_261_111=on;S_295_111=off;\0",
        ))
        .mount(&server)
        .await;

    let set = client.get_active_registries().await.unwrap();
    let names: Vec<_> = set.registries().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["system", "l1_with_room_sensor"]);
}

#[tokio::test]
async fn test_detects_full_installation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .respond_with(body(
            "request?S_140_85=on;S_261_111=off;S_295_111=on;\0",
        ))
        .mount(&server)
        .await;

    let set = client.get_active_registries().await.unwrap();
    let names: Vec<_> = set.registries().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["system", "l1", "l2_with_room_sensor"]);
}

#[tokio::test]
async fn test_missing_probe_means_not_installed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .respond_with(body("request?S_261_111=off;\0"))
        .mount(&server)
        .await;

    let set = client.get_active_registries().await.unwrap();
    assert!(set.contains("l1"));
    assert!(!set.contains("l2"));
    assert!(!set.contains("l2_with_room_sensor"));
}

#[tokio::test]
async fn test_get_all_values() {
    let (server, client) = setup().await;

    // The full read also carries S_140_85, so it must win over the probe.
    Mock::given(method("GET"))
        .and(path("/request"))
        .and(QueryContains("S_227_85;"))
        .respond_with(body(
            "request?S_227_85=-2.5;S_59_85=0;S_92_85=40;S_134_85=0.5;S_140_85=off;\0",
        ))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .respond_with(body(
            "request?S_140_85=off;S_261_111=off;S_295_111=off;\0",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let readings = client.get_all_values().await.unwrap();
    assert_eq!(
        readings.get("l1_operation_mode"),
        Some(&Value::OperationMode(OperationMode::Automatic))
    );
    assert_eq!(readings.get("l1_valve_position_setpoint"), Some(&Value::Number(40.0)));
    assert_eq!(
        readings.get("l1_room_temperature_fine_tuning"),
        Some(&Value::Number(0.5))
    );
    assert!(!readings.missing.is_empty());
    assert!(readings.unexpected.is_empty());
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_int_endpoint() {
    let (server, client) = setup().await;
    let endpoint = builtin::l1().get("curve_minus_20_temperature").unwrap();

    Mock::given(method("GET"))
        .and(path("/update"))
        .and(QueryContains("@_S_61_85=40;"))
        .respond_with(body("update?S_61_85=40;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client.set_endpoint_value(endpoint, 40).await.unwrap();
    assert_eq!(confirmed, Value::Integer(40));
}

#[tokio::test]
async fn test_set_int_endpoint_mismatch() {
    let (server, client) = setup().await;
    let endpoint = builtin::l1().get("valve_position_setpoint").unwrap();

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_92_85=35;\0"))
        .mount(&server)
        .await;

    let err = client.set_endpoint_value(endpoint, 40).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
    assert!(err.to_string().contains("does not match"), "{err}");
}

#[tokio::test]
async fn test_set_int_out_of_range_sends_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_26_85=10;\0"))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.set_trend_sample_interval(10).await.unwrap_err();
    assert!(
        matches!(err, Error::Validation(ValidationError::OutOfRange { .. })),
        "{err:?}"
    );
    assert!(err.to_string().contains("out of bounds [30,21600]"), "{err}");
}

#[tokio::test]
async fn test_set_int_rejects_fraction() {
    let (server, client) = setup().await;
    let endpoint = builtin::l1().get("temperature_drop").unwrap();

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_89_85=3;\0"))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.set_endpoint_value(endpoint, 2.5).await.unwrap_err();
    assert!(
        matches!(err, Error::Validation(ValidationError::NotInteger { .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_set_float_rounds_before_confirming() {
    let (server, client) = setup().await;
    let endpoint = builtin::l1().get("room_temperature_fine_tuning").unwrap();

    Mock::given(method("GET"))
        .and(path("/update"))
        .and(QueryContains("@_S_134_85=1.6;"))
        .respond_with(body("update?S_134_85=1.6;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client.set_endpoint_value(endpoint, 1.55).await.unwrap();
    assert_eq!(confirmed, Value::Number(1.6));
}

#[tokio::test]
async fn test_set_enum_writes_all_control_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .and(QueryContains("S_135_85=1;S_222_85=1;"))
        .respond_with(body("update?S_222_85=1;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client.set_home_away(HomeAwayControl::Away).await.unwrap();
    assert_eq!(confirmed, Value::HomeAway(HomeAwayControl::Away));
    assert_eq!(serde_json::to_value(&confirmed).unwrap(), json!("away"));
}

#[tokio::test]
async fn test_set_enum_missing_response_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_135_85=1;\0"))
        .mount(&server)
        .await;

    let err = client.set_home_away(HomeAwayControl::Away).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
    assert!(err.to_string().contains("missing"), "{err}");
}

#[tokio::test]
async fn test_set_enum_value_mismatch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_222_85=0;\0"))
        .mount(&server)
        .await;

    let err = client.set_home_away(HomeAwayControl::Away).await.unwrap_err();
    assert!(err.to_string().contains("does not match"), "{err}");
}

#[tokio::test]
async fn test_set_enum_echo_outside_enumeration() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_222_85=7;\0"))
        .mount(&server)
        .await;

    let err = client.set_home_away(HomeAwayControl::Away).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
    assert!(err.to_string().contains("does not match"), "{err}");
}

#[tokio::test]
async fn test_set_operation_mode_on_l2() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .and(QueryContains("S_146_85=5;"))
        .respond_with(body("update?S_146_85=5;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client
        .set_operation_mode(Circuit::L2, OperationMode::Shutdown)
        .await
        .unwrap();
    assert_eq!(confirmed, Value::OperationMode(OperationMode::Shutdown));
}

#[tokio::test]
async fn test_set_read_only_endpoint_is_type_error() {
    let (_server, client) = setup().await;
    let endpoint = builtin::system().get("outside_temperature").unwrap();

    let err = client.set_endpoint_value(endpoint, 1.0).await.unwrap_err();
    let Error::Validation(validation) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(validation.is_type_error());
}

// ── Session expiry ──────────────────────────────────────────────────

#[tokio::test]
async fn test_update_relogs_once_on_404() {
    let (server, client) = setup().await;
    mount_login_ok(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_26_85=600;\0"))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client.set_trend_sample_interval(600).await.unwrap();
    assert_eq!(confirmed, Value::Integer(600));
    assert_eq!(client.session_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_second_404_propagates() {
    let (server, client) = setup().await;
    mount_login_ok(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let err = client.set_trend_sample_interval(600).await.unwrap_err();
    assert!(
        matches!(
            err,
            Error::Communication(CommunicationError::Status { status: 404 })
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_other_update_failures_do_not_relogin() {
    let (server, client) = setup().await;
    mount_login_ok(&server, 0).await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.update_values(&[("S_26_85", "600")]).await.unwrap_err();
    assert!(err.is_communication());
    assert!(!err.is_session_expired());
}

#[tokio::test]
async fn test_failed_relogin_propagates() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?result=error;\0"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.update_values(&[("S_26_85", "600")]).await;
    assert!(matches!(result, Err(Error::Authentication { .. })), "{result:?}");
}
