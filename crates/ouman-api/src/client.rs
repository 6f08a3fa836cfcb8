// Session/protocol engine for the EH-800 controller
//
// Owns the login session, dispatches encoded requests over reqwest, and
// ties the codec and the endpoint registries together for typed reads and
// confirmed writes. Calls are sequential round-trips; the device keeps the
// session and any pending write state server-side, so one client must not
// be driven concurrently without external serialisation.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::codec::{self, Response};
use crate::endpoint::{Endpoint, HomeAwayControl, OperationMode, Value};
use crate::error::{CommunicationError, Error};
use crate::registry::builtin::{self, Circuit};
use crate::registry::RegistrySet;
use crate::transport::TransportConfig;

const LOGIN_PATH: &str = "login";
const LOGOUT_PATH: &str = "logout";
const REQUEST_PATH: &str = "request";
const UPDATE_PATH: &str = "update";
const ALARMS_PATH: &str = "alarms";

/// Probe value meaning "not installed".
const NOT_INSTALLED: &str = "off";

/// Tolerance when comparing a confirmed value with the written one.
const CONFIRM_EPSILON: f64 = 1e-6;

/// Authentication state of the device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Result of a batched read.
///
/// Keys the device omitted and keys it returned without being asked are
/// reported here as well as logged; neither fails the read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    pub values: IndexMap<Endpoint, Value>,
    pub missing: Vec<&'static str>,
    pub unexpected: Vec<String>,
}

impl Readings {
    /// Look up a value by endpoint name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find_map(|(endpoint, value)| (endpoint.name == name).then_some(value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Client for one EH-800 controller.
pub struct OumanClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl OumanClient {
    /// Create a client, building a cookie-aware `reqwest::Client` from `transport`.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            base_url,
            username,
            password,
            transport.timeout,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The client must keep cookies; `timeout` is only used for error
    /// reporting and should match the one the client was built with.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
            username: username.into(),
            password,
            timeout,
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn session_state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Authenticate with the configured credentials.
    pub async fn login(&self) -> Result<Response, Error> {
        let params = [
            codec::write_param("uid", &self.username),
            codec::write_param("pwd", self.password.expose_secret()),
        ];
        let response = self.request(LOGIN_PATH, &params).await?;

        match response.result() {
            Some("ok") => {}
            Some("error") => {
                self.set_state(SessionState::Unauthenticated);
                return Err(Error::Authentication {
                    message: "Wrong username or password".into(),
                });
            }
            _ => {
                return Err(Error::protocol(format!(
                    "Unexpected response from login request: {response}"
                )));
            }
        }
        debug!(username = %self.username, "login successful");
        self.set_state(SessionState::Authenticated);
        Ok(response)
    }

    /// End the device session.
    pub async fn logout(&self) -> Result<Response, Error> {
        let response = self.request(LOGOUT_PATH, Vec::<String>::new()).await?;
        if response.result() != Some("ok") {
            return Err(Error::protocol(format!(
                "Unexpected response from logout request: {response}"
            )));
        }
        debug!("logged out");
        self.set_state(SessionState::Unauthenticated);
        Ok(response)
    }

    // ── Raw requests ─────────────────────────────────────────────────

    /// Send `GET <base>/<path>?<params>;<timestamp>=` and decode the body.
    pub async fn request<I, S>(&self, path: &str, params: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.join(path)?;
        url.set_query(Some(&codec::encode_query(params, Utc::now())));

        if path == LOGIN_PATH {
            debug!(path, "GET (credentials redacted)");
        } else {
            debug!("GET {}", url);
        }

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CommunicationError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let body = resp.text().await.map_err(|e| self.map_transport_error(path, e))?;
        debug!(path, body = %body, "raw response from device");
        codec::decode(&body)
    }

    /// Write raw `key=value` pairs, re-authenticating once on session expiry.
    ///
    /// An HTTP 404 on `update` means the session is gone: log in and retry
    /// exactly once. Any other failure, or a second failure, propagates.
    pub async fn update_values<K, V>(&self, pairs: &[(K, V)]) -> Result<Response, Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params: Vec<String> = pairs
            .iter()
            .map(|(key, value)| codec::write_param(key.as_ref(), value.as_ref()))
            .collect();

        match self.request(UPDATE_PATH, &params).await {
            Err(e) if e.is_session_expired() => {
                debug!("404 response from update request, logging in again");
                self.set_state(SessionState::Unauthenticated);
                self.login().await?;
                self.request(UPDATE_PATH, &params).await
            }
            other => other,
        }
    }

    /// Login URLs carry the credentials, so they are stripped from the error.
    fn map_transport_error(&self, path: &str, e: reqwest::Error) -> Error {
        let e = if path == LOGIN_PATH { e.without_url() } else { e };
        if e.is_timeout() {
            CommunicationError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
            .into()
        } else if let Some(status) = e.status() {
            CommunicationError::Status {
                status: status.as_u16(),
            }
            .into()
        } else {
            CommunicationError::Network(e).into()
        }
    }

    // ── Typed reads ──────────────────────────────────────────────────

    /// Read every sensor of `registries` in one batched request.
    pub async fn get_values(&self, registries: &RegistrySet) -> Result<Readings, Error> {
        let ids: Vec<&'static str> = registries.sensor_endpoint_ids().collect();
        let response = self.request(REQUEST_PATH, &ids).await?;

        let mut readings = Readings::default();
        for (key, raw) in &response.values {
            let Some(endpoint) = registries.get_endpoint_by_sensor_id(key) else {
                warn!(key = %key, "unexpected key in response");
                readings.unexpected.push(key.clone());
                continue;
            };
            let value = endpoint.parse_value(raw)?;
            readings.values.insert(*endpoint, value);
        }
        for id in ids {
            if !response.values.contains_key(id) {
                warn!(id, "requested endpoint not found in response");
                readings.missing.push(id);
            }
        }

        Ok(readings)
    }

    /// Detect the installed subsystems and read all of their sensors.
    pub async fn get_all_values(&self) -> Result<Readings, Error> {
        let registries = self.get_active_registries().await?;
        self.get_values(&registries).await
    }

    /// Probe which circuits and room sensors are installed.
    ///
    /// Always includes System and circuit 1; circuit 2 only when installed.
    /// Each circuit uses its room-sensor variant when a sensor is wired.
    pub async fn get_active_registries(&self) -> Result<RegistrySet, Error> {
        let probes = [
            builtin::L2_INSTALLED_STATUS.sensor_endpoint_id,
            builtin::L1_ROOM_SENSOR_INSTALLED.sensor_endpoint_id,
            builtin::L2_ROOM_SENSOR_INSTALLED.sensor_endpoint_id,
        ];
        let response = self.request(REQUEST_PATH, probes).await?;
        let installed = |id: &str| match response.get(id) {
            Some(value) => value != NOT_INSTALLED,
            None => {
                warn!(id, "installation probe missing from response, assuming not installed");
                false
            }
        };

        let mut registries = vec![builtin::system().clone()];
        registries.push(if installed(builtin::L1_ROOM_SENSOR_INSTALLED.sensor_endpoint_id) {
            builtin::l1_with_room_sensor().clone()
        } else {
            builtin::l1().clone()
        });
        if installed(builtin::L2_INSTALLED_STATUS.sensor_endpoint_id) {
            registries.push(
                if installed(builtin::L2_ROOM_SENSOR_INSTALLED.sensor_endpoint_id) {
                    builtin::l2_with_room_sensor().clone()
                } else {
                    builtin::l2().clone()
                },
            );
        }

        let set = RegistrySet::new(registries)?;
        debug!(
            registries = ?set.registries().iter().map(|r| r.name()).collect::<Vec<_>>(),
            "detected device configuration"
        );
        Ok(set)
    }

    /// Raw alarm map, exactly as the device reports it.
    pub async fn get_alarms(&self) -> Result<IndexMap<String, String>, Error> {
        Ok(self.request(ALARMS_PATH, Vec::<String>::new()).await?.values)
    }

    // ── Typed writes ─────────────────────────────────────────────────

    /// Validate, write and confirm a value on a controllable endpoint.
    ///
    /// Nothing is sent if validation fails. On success the value the device
    /// confirmed is returned; floats come back rounded to one decimal.
    pub async fn set_endpoint_value(
        &self,
        endpoint: &Endpoint,
        value: impl Into<Value>,
    ) -> Result<Value, Error> {
        let write = endpoint.prepare_write(&value.into())?;
        let response = self.update_values(write.params.as_slice()).await?;
        confirm_write(endpoint, &write.expected, &response)?;
        debug!(endpoint = endpoint.name, value = %write.expected, "write confirmed");
        Ok(write.expected)
    }

    pub async fn set_home_away(&self, value: HomeAwayControl) -> Result<Value, Error> {
        self.set_endpoint_value(&builtin::HOME_AWAY_MODE, value).await
    }

    /// Trend sampling interval in seconds.
    pub async fn set_trend_sample_interval(&self, seconds: i64) -> Result<Value, Error> {
        self.set_endpoint_value(&builtin::TREND_SAMPLE_INTERVAL, seconds)
            .await
    }

    pub async fn set_operation_mode(
        &self,
        circuit: Circuit,
        mode: OperationMode,
    ) -> Result<Value, Error> {
        self.set_endpoint_value(circuit.operation_mode(), mode).await
    }
}

impl std::fmt::Debug for OumanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OumanClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("session", &self.session_state())
            .finish_non_exhaustive()
    }
}

/// Check that every response ID echoes the written value.
fn confirm_write(endpoint: &Endpoint, expected: &Value, response: &Response) -> Result<(), Error> {
    for id in endpoint.response_endpoint_ids() {
        let raw = response.get(id).ok_or_else(|| {
            Error::protocol(format!(
                "Endpoint ID {id} missing from update response for {}: {response}",
                endpoint.name
            ))
        })?;
        // An echo that does not even parse is a mismatch too.
        let confirmed = endpoint
            .parse_value(raw)
            .is_ok_and(|actual| values_match(expected, &actual));
        if !confirmed {
            return Err(Error::protocol(format!(
                "Value {raw} returned for {id} does not match written value {expected} for {}",
                endpoint.name
            )));
        }
    }
    Ok(())
}

fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected.as_f64(), actual.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < CONFIRM_EPSILON,
        _ => expected == actual,
    }
}

/// Make `join` append to the base path instead of replacing its last segment.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::endpoint::Unit;

    const FINE: Endpoint =
        Endpoint::float_control("fine", Unit::Celsius, "S_134_85", "@_S_134_85", -4.0, 4.0);

    fn response(raw: &str) -> Response {
        codec::decode(raw).unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url(Url::parse("http://192.168.1.10/eh800").unwrap());
        assert_eq!(url.join("login").unwrap().as_str(), "http://192.168.1.10/eh800/login");

        let url = normalize_base_url(Url::parse("http://192.168.1.10").unwrap());
        assert_eq!(url.join("update").unwrap().as_str(), "http://192.168.1.10/update");
    }

    #[test]
    fn confirms_rounded_float() {
        let ok = response("update?S_134_85=1.6;\0");
        assert!(confirm_write(&FINE, &Value::Number(1.6), &ok).is_ok());

        let off = response("update?S_134_85=1.5;\0");
        let err = confirm_write(&FINE, &Value::Number(1.6), &off).unwrap_err();
        assert!(err.to_string().contains("does not match"), "{err}");
    }

    #[test]
    fn unparsable_echo_is_mismatch() {
        let err = confirm_write(&FINE, &Value::Number(1.0), &response("update?S_134_85=abc;\0"))
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("does not match"), "{err}");
    }

    #[test]
    fn missing_response_id_is_protocol_error() {
        let err = confirm_write(&FINE, &Value::Number(1.0), &response("update?other=1;\0"))
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("missing"), "{err}");
    }

    #[test]
    fn integer_matches_float_echo() {
        assert!(values_match(&Value::Integer(40), &Value::Number(40.0)));
        assert!(!values_match(&Value::Integer(40), &Value::Number(41.0)));
        assert!(!values_match(
            &Value::HomeAway(HomeAwayControl::Home),
            &Value::HomeAway(HomeAwayControl::Away)
        ));
    }

    #[test]
    fn readings_lookup_by_name() {
        let mut readings = Readings::default();
        readings.values.insert(FINE, Value::Number(0.5));
        assert_eq!(readings.get("fine"), Some(&Value::Number(0.5)));
        assert_eq!(readings.get("other"), None);
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn new_client_starts_unauthenticated() {
        let client = OumanClient::new(
            Url::parse("http://127.0.0.1").unwrap(),
            "user",
            SecretString::from("password"),
            &TransportConfig::default(),
        )
        .unwrap();
        assert_eq!(client.session_state(), SessionState::Unauthenticated);
        assert!(!format!("{client:?}").contains("password"));
    }
}
