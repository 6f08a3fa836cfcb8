// Typed endpoint descriptors
//
// An endpoint is one named data point on the controller, addressed by opaque
// wire IDs such as `S_59_85`. Read-only endpoints only know how to interpret
// their raw string; controllable ones also know how to validate and encode a
// write and which IDs the device echoes back to confirm it.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{Error, ValidationError};

// ── Units ────────────────────────────────────────────────────────────

/// Physical unit tag attached to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Unit {
    Celsius,
    Percent,
    Second,
    Text,
    Enum,
}

impl Unit {
    /// Short suffix for human-readable output.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Percent => "%",
            Self::Second => "s",
            Self::Text | Self::Enum => "",
        }
    }
}

// ── Enumerations ─────────────────────────────────────────────────────

/// Heating circuit operating mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationMode {
    Automatic,
    TemperatureSetback,
    GreaterTemperatureSetback,
    NormalTemperature,
    Shutdown,
    ManualValveControl,
}

impl OperationMode {
    /// The string the device uses for this mode.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Automatic => "0",
            Self::TemperatureSetback => "1",
            Self::GreaterTemperatureSetback => "2",
            Self::NormalTemperature => "3",
            Self::Shutdown => "5",
            Self::ManualValveControl => "6",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::iter().find(|mode| mode.wire_value() == raw)
    }
}

/// System-wide home/away switch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HomeAwayControl {
    Home,
    Away,
    Off,
}

impl HomeAwayControl {
    /// The string the device uses for this state.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Home => "0",
            Self::Away => "1",
            Self::Off => "2",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::iter().find(|state| state.wire_value() == raw)
    }
}

/// Which closed enumeration an enum endpoint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnumKind {
    OperationMode,
    HomeAway,
}

impl EnumKind {
    /// Map a raw wire string to a typed member.
    pub fn decode(self, raw: &str) -> Option<Value> {
        match self {
            Self::OperationMode => OperationMode::from_wire(raw).map(Value::OperationMode),
            Self::HomeAway => HomeAwayControl::from_wire(raw).map(Value::HomeAway),
        }
    }

    /// Parse a human-entered member name (`away`) or its wire form (`1`).
    pub fn parse_input(self, input: &str) -> Option<Value> {
        let input = input.trim();
        match self {
            Self::OperationMode => input
                .parse::<OperationMode>()
                .ok()
                .or_else(|| OperationMode::from_wire(input))
                .map(Value::OperationMode),
            Self::HomeAway => input
                .parse::<HomeAwayControl>()
                .ok()
                .or_else(|| HomeAwayControl::from_wire(input))
                .map(Value::HomeAway),
        }
    }

    /// Human names of every member, in declaration order.
    pub fn member_names(self) -> Vec<&'static str> {
        match self {
            Self::OperationMode => OperationMode::iter().map(Into::into).collect(),
            Self::HomeAway => HomeAwayControl::iter().map(Into::into).collect(),
        }
    }

    fn wire_value_of(self, value: &Value) -> Option<&'static str> {
        match (self, value) {
            (Self::OperationMode, Value::OperationMode(mode)) => Some(mode.wire_value()),
            (Self::HomeAway, Value::HomeAway(state)) => Some(state.wire_value()),
            _ => None,
        }
    }
}

// ── Values ───────────────────────────────────────────────────────────

/// A typed endpoint value, as read from or written to the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Integer(i64),
    OperationMode(OperationMode),
    HomeAway(HomeAwayControl),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::OperationMode(_) => "operation_mode",
            Self::HomeAway(_) => "home_away",
        }
    }

    /// Numeric view of the value, if it has one.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::OperationMode(mode) => write!(f, "{mode}"),
            Self::HomeAway(state) => write!(f, "{state}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<OperationMode> for Value {
    fn from(v: OperationMode) -> Self {
        Self::OperationMode(v)
    }
}

impl From<HomeAwayControl> for Value {
    fn from(v: HomeAwayControl) -> Self {
        Self::HomeAway(v)
    }
}

// ── Endpoint descriptors ─────────────────────────────────────────────

/// Write side of an integer setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntControl {
    pub control_endpoint_id: &'static str,
    pub response_endpoint_id: &'static str,
    pub min_val: i64,
    pub max_val: i64,
}

/// Write side of a one-decimal setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatControl {
    pub control_endpoint_id: &'static str,
    pub response_endpoint_id: &'static str,
    pub min_val: f64,
    pub max_val: f64,
}

// Bounds come from static tables and are never NaN.
impl Eq for FloatControl {}

impl Hash for FloatControl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.control_endpoint_id.hash(state);
        self.response_endpoint_id.hash(state);
        self.min_val.to_bits().hash(state);
        self.max_val.to_bits().hash(state);
    }
}

/// Write side of an enumeration, possibly mirrored across several IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumControl {
    pub control_endpoint_ids: &'static [&'static str],
    pub response_endpoint_ids: &'static [&'static str],
    pub enum_kind: EnumKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Read-only, passed through as a string.
    Text,
    /// Read-only, parsed as a float.
    Number,
    /// Read-only, mapped onto a closed enumeration.
    Enum(EnumKind),
    IntControl(IntControl),
    FloatControl(FloatControl),
    EnumControl(EnumControl),
}

impl EndpointKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Enum(_) => "enum",
            Self::IntControl(_) => "int-control",
            Self::FloatControl(_) => "float-control",
            Self::EnumControl(_) => "enum-control",
        }
    }
}

/// An immutable device data point.
///
/// Equality and hashing cover every attribute, so two endpoints that share
/// a name but differ in wiring are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub name: &'static str,
    pub unit: Unit,
    pub sensor_endpoint_id: &'static str,
    pub kind: EndpointKind,
}

/// A validated write ready to be sent: wire parameters plus the value the
/// device must echo back.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWrite {
    pub params: Vec<(&'static str, String)>,
    pub expected: Value,
}

impl Endpoint {
    pub const fn text(name: &'static str, sensor_endpoint_id: &'static str) -> Self {
        Self {
            name,
            unit: Unit::Text,
            sensor_endpoint_id,
            kind: EndpointKind::Text,
        }
    }

    pub const fn number(name: &'static str, unit: Unit, sensor_endpoint_id: &'static str) -> Self {
        Self {
            name,
            unit,
            sensor_endpoint_id,
            kind: EndpointKind::Number,
        }
    }

    /// Integer setpoint confirmed through its own sensor ID.
    pub const fn int_control(
        name: &'static str,
        unit: Unit,
        sensor_endpoint_id: &'static str,
        control_endpoint_id: &'static str,
        min_val: i64,
        max_val: i64,
    ) -> Self {
        Self {
            name,
            unit,
            sensor_endpoint_id,
            kind: EndpointKind::IntControl(IntControl {
                control_endpoint_id,
                response_endpoint_id: sensor_endpoint_id,
                min_val,
                max_val,
            }),
        }
    }

    /// One-decimal setpoint confirmed through its own sensor ID.
    pub const fn float_control(
        name: &'static str,
        unit: Unit,
        sensor_endpoint_id: &'static str,
        control_endpoint_id: &'static str,
        min_val: f64,
        max_val: f64,
    ) -> Self {
        Self {
            name,
            unit,
            sensor_endpoint_id,
            kind: EndpointKind::FloatControl(FloatControl {
                control_endpoint_id,
                response_endpoint_id: sensor_endpoint_id,
                min_val,
                max_val,
            }),
        }
    }

    pub const fn enum_control(
        name: &'static str,
        sensor_endpoint_id: &'static str,
        control_endpoint_ids: &'static [&'static str],
        response_endpoint_ids: &'static [&'static str],
        enum_kind: EnumKind,
    ) -> Self {
        Self {
            name,
            unit: Unit::Enum,
            sensor_endpoint_id,
            kind: EndpointKind::EnumControl(EnumControl {
                control_endpoint_ids,
                response_endpoint_ids,
                enum_kind,
            }),
        }
    }

    pub fn is_controllable(&self) -> bool {
        matches!(
            self.kind,
            EndpointKind::IntControl(_) | EndpointKind::FloatControl(_) | EndpointKind::EnumControl(_)
        )
    }

    /// Convert a raw wire string into a typed value.
    pub fn parse_value(&self, raw: &str) -> Result<Value, Error> {
        match self.kind {
            EndpointKind::Text => Ok(Value::Text(raw.to_owned())),
            EndpointKind::Number | EndpointKind::IntControl(_) | EndpointKind::FloatControl(_) => {
                parse_float(raw).map(Value::Number).ok_or_else(|| {
                    Error::protocol(format!(
                        "value {raw:?} for {} cannot be parsed into a float",
                        self.name
                    ))
                })
            }
            EndpointKind::Enum(kind) | EndpointKind::EnumControl(EnumControl { enum_kind: kind, .. }) => {
                kind.decode(raw).ok_or_else(|| {
                    Error::protocol(format!(
                        "value {raw:?} for {} is not a known {kind} member",
                        self.name
                    ))
                })
            }
        }
    }

    /// Validate a write value and encode it into wire parameters.
    ///
    /// Nothing is sent here; a rejected value never reaches the device.
    pub fn prepare_write(&self, value: &Value) -> Result<PreparedWrite, ValidationError> {
        match self.kind {
            EndpointKind::IntControl(control) => {
                let v = self.require_integer(value)?;
                if !(control.min_val..=control.max_val).contains(&v) {
                    return Err(ValidationError::OutOfRange {
                        endpoint: self.name.into(),
                        value: v.to_string(),
                        min: control.min_val.to_string(),
                        max: control.max_val.to_string(),
                    });
                }
                Ok(PreparedWrite {
                    params: vec![(control.control_endpoint_id, v.to_string())],
                    expected: Value::Integer(v),
                })
            }
            EndpointKind::FloatControl(control) => {
                let v = value.as_f64().ok_or_else(|| self.wrong_type("number", value))?;
                if !(control.min_val..=control.max_val).contains(&v) {
                    return Err(ValidationError::OutOfRange {
                        endpoint: self.name.into(),
                        value: v.to_string(),
                        min: control.min_val.to_string(),
                        max: control.max_val.to_string(),
                    });
                }
                let rounded = round_to_tenth(v);
                Ok(PreparedWrite {
                    params: vec![(control.control_endpoint_id, format!("{rounded:.1}"))],
                    expected: Value::Number(rounded),
                })
            }
            EndpointKind::EnumControl(control) => {
                let wire = control
                    .enum_kind
                    .wire_value_of(value)
                    .ok_or_else(|| self.wrong_type(enum_type_name(control.enum_kind), value))?;
                Ok(PreparedWrite {
                    params: control
                        .control_endpoint_ids
                        .iter()
                        .map(|id| (*id, wire.to_owned()))
                        .collect(),
                    expected: value.clone(),
                })
            }
            EndpointKind::Text | EndpointKind::Number | EndpointKind::Enum(_) => {
                Err(ValidationError::NotControllable {
                    endpoint: self.name.into(),
                })
            }
        }
    }

    /// Parse user-entered text into a value suitable for [`Self::prepare_write`].
    pub fn parse_input(&self, input: &str) -> Result<Value, ValidationError> {
        let unparsable = || ValidationError::Unparsable {
            endpoint: self.name.into(),
            input: input.into(),
        };
        match self.kind {
            EndpointKind::IntControl(_) => {
                let input = input.trim();
                input
                    .parse::<i64>()
                    .map(Value::Integer)
                    .or_else(|_| input.parse::<f64>().map(Value::Number))
                    .map_err(|_| unparsable())
            }
            EndpointKind::FloatControl(_) => input
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| unparsable()),
            EndpointKind::EnumControl(control) => {
                control.enum_kind.parse_input(input).ok_or_else(unparsable)
            }
            EndpointKind::Text | EndpointKind::Number | EndpointKind::Enum(_) => {
                Err(ValidationError::NotControllable {
                    endpoint: self.name.into(),
                })
            }
        }
    }

    /// Wire IDs the device echoes back after a write.
    pub fn response_endpoint_ids(&self) -> &[&'static str] {
        match &self.kind {
            EndpointKind::IntControl(control) => std::slice::from_ref(&control.response_endpoint_id),
            EndpointKind::FloatControl(control) => {
                std::slice::from_ref(&control.response_endpoint_id)
            }
            EndpointKind::EnumControl(control) => control.response_endpoint_ids,
            EndpointKind::Text | EndpointKind::Number | EndpointKind::Enum(_) => &[],
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::as_conversions,
        clippy::float_cmp
    )]
    fn require_integer(&self, value: &Value) -> Result<i64, ValidationError> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(*n as i64),
            Value::Number(n) => Err(ValidationError::NotInteger {
                endpoint: self.name.into(),
                value: *n,
            }),
            other => Err(self.wrong_type("integer", other)),
        }
    }

    fn wrong_type(&self, expected: &'static str, got: &Value) -> ValidationError {
        ValidationError::WrongType {
            endpoint: self.name.into(),
            expected,
            got: got.type_name(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.sensor_endpoint_id)
    }
}

fn enum_type_name(kind: EnumKind) -> &'static str {
    match kind {
        EnumKind::OperationMode => "operation_mode",
        EnumKind::HomeAway => "home_away",
    }
}

/// Parse a device number, tolerating surrounding whitespace.
pub(crate) fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Round half away from zero to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
