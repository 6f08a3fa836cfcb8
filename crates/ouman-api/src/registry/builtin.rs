// Endpoint tables for the EH-800 subsystems.
//
// Room-sensor variants wire the fine tuning control to different IDs and
// expose the sensor readings; they are derived from the plain circuit tables.

use std::sync::LazyLock;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use super::Registry;
use crate::endpoint::{Endpoint, EnumKind, Unit};

/// Heating circuit selector for circuit-scoped operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Circuit {
    L1,
    L2,
}

impl Circuit {
    /// The plain (no room sensor) table of this circuit.
    pub fn registry(self) -> &'static Registry {
        match self {
            Self::L1 => l1(),
            Self::L2 => l2(),
        }
    }

    pub fn operation_mode(self) -> &'static Endpoint {
        match self {
            Self::L1 => &L1_OPERATION_MODE,
            Self::L2 => &L2_OPERATION_MODE,
        }
    }
}

// ── System ───────────────────────────────────────────────────────────

pub const TREND_SAMPLE_INTERVAL: Endpoint = Endpoint::int_control(
    "trend_sampling_interval",
    Unit::Second,
    "S_26_85",
    "@_S_26_85",
    30,
    21600,
);

pub const HOME_AWAY_MODE: Endpoint = Endpoint::enum_control(
    "home_away_mode",
    "S_135_85",
    &["S_135_85", "S_222_85"],
    &["S_222_85"],
    EnumKind::HomeAway,
);

/// `off` when the second circuit is not installed.
pub const L2_INSTALLED_STATUS: Endpoint = Endpoint::text("l2_installed_status", "S_140_85");

static SYSTEM: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(
        "system",
        [
            ("trend_sample_interval", TREND_SAMPLE_INTERVAL),
            ("home_away_mode", HOME_AWAY_MODE),
            (
                "outside_temperature",
                Endpoint::number("outside_temperature", Unit::Celsius, "S_227_85"),
            ),
            (
                "relay_configuration_type",
                Endpoint::text("relay_configuration_type", "S_1002_85"),
            ),
            ("relay_status_text", Endpoint::text("relay_status_text", "S_1004_85")),
            ("l2_installed_status", L2_INSTALLED_STATUS),
        ],
    )
});

pub fn system() -> &'static Registry {
    &SYSTEM
}

// ── Circuit 1 ────────────────────────────────────────────────────────

pub const L1_OPERATION_MODE: Endpoint = Endpoint::enum_control(
    "l1_operation_mode",
    "S_59_85",
    &["S_59_85"],
    &["S_59_85"],
    EnumKind::OperationMode,
);

/// `off` when no room sensor is wired to circuit 1.
pub const L1_ROOM_SENSOR_INSTALLED: Endpoint =
    Endpoint::text("l1_room_sensor_installed", "S_261_111");

static L1: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(
        "l1",
        [
            ("operation_mode", L1_OPERATION_MODE),
            (
                "valve_position_setpoint",
                Endpoint::int_control(
                    "l1_valve_position_setpoint",
                    Unit::Percent,
                    "S_92_85",
                    "S_92_85",
                    0,
                    100,
                ),
            ),
            (
                "curve_minus_20_temperature",
                Endpoint::int_control(
                    "l1_curve_minus_20_temperature",
                    Unit::Celsius,
                    "S_61_85",
                    "@_S_61_85",
                    0,
                    99,
                ),
            ),
            (
                "curve_0_temperature",
                Endpoint::int_control(
                    "l1_curve_0_temperature",
                    Unit::Celsius,
                    "S_63_85",
                    "@_S_63_85",
                    0,
                    99,
                ),
            ),
            (
                "curve_20_temperature",
                Endpoint::int_control(
                    "l1_curve_20_temperature",
                    Unit::Celsius,
                    "S_65_85",
                    "@_S_65_85",
                    0,
                    99,
                ),
            ),
            (
                "temperature_drop",
                Endpoint::int_control(
                    "l1_temperature_drop",
                    Unit::Celsius,
                    "S_89_85",
                    "@_S_89_85",
                    0,
                    90,
                ),
            ),
            (
                "big_temperature_drop",
                Endpoint::int_control(
                    "l1_big_temperature_drop",
                    Unit::Celsius,
                    "S_90_85",
                    "@_S_90_85",
                    0,
                    90,
                ),
            ),
            (
                "water_out_minimum_temperature",
                Endpoint::int_control(
                    "l1_water_out_minimum_temperature",
                    Unit::Celsius,
                    "S_54_85",
                    "@_S_54_85",
                    5,
                    95,
                ),
            ),
            (
                "water_out_maximum_temperature",
                Endpoint::int_control(
                    "l1_water_out_maximum_temperature",
                    Unit::Celsius,
                    "S_55_85",
                    "@_S_55_85",
                    5,
                    95,
                ),
            ),
            (
                "room_temperature_fine_tuning",
                Endpoint::float_control(
                    "l1_room_temperature_fine_tuning",
                    Unit::Celsius,
                    "S_134_85",
                    "@_S_134_85",
                    -4.0,
                    4.0,
                ),
            ),
            (
                "heating_shutdown_status",
                Endpoint::text("l1_heating_shutdown_status", "S_0_0"),
            ),
            (
                "temperature_level_status_text",
                Endpoint::text("l1_temperature_level_status_text", "S_1000_0"),
            ),
            ("circuit_name", Endpoint::text("l1_circuit_name", "S_131_85")),
            (
                "supply_water_temperature",
                Endpoint::number("l1_supply_water_temperature", Unit::Celsius, "S_259_85"),
            ),
            (
                "valve_position",
                Endpoint::number("l1_valve_position", Unit::Percent, "S_272_85"),
            ),
            (
                "supply_water_temperature_setpoint",
                Endpoint::number(
                    "l1_supply_water_temperature_setpoint",
                    Unit::Celsius,
                    "S_275_85",
                ),
            ),
            ("room_sensor_installed", L1_ROOM_SENSOR_INSTALLED),
        ],
    )
});

static L1_WITH_ROOM_SENSOR: LazyLock<Registry> = LazyLock::new(|| {
    l1().extend(
        "l1_with_room_sensor",
        [(
            "room_temperature_fine_tuning",
            Endpoint::float_control(
                "l1_room_temperature_fine_tuning",
                Unit::Celsius,
                "S_102_85",
                "@_S_102_85",
                -4.0,
                4.0,
            ),
        )],
        [
            (
                "room_temperature",
                Endpoint::number("l1_room_temperature", Unit::Celsius, "S_261_85"),
            ),
            (
                "room_temperature_setpoint",
                Endpoint::number("l1_room_temperature_setpoint", Unit::Celsius, "S_278_85"),
            ),
            (
                "room_sensor_potentiometer",
                Endpoint::number("l1_room_sensor_potentiometer", Unit::Celsius, "S_274_85"),
            ),
        ],
    )
    .expect("built-in l1_with_room_sensor table is consistent with l1")
});

pub fn l1() -> &'static Registry {
    &L1
}

pub fn l1_with_room_sensor() -> &'static Registry {
    &L1_WITH_ROOM_SENSOR
}

// ── Circuit 2 ────────────────────────────────────────────────────────

pub const L2_OPERATION_MODE: Endpoint = Endpoint::enum_control(
    "l2_operation_mode",
    "S_146_85",
    &["S_146_85"],
    &["S_146_85"],
    EnumKind::OperationMode,
);

/// `off` when no room sensor is wired to circuit 2.
pub const L2_ROOM_SENSOR_INSTALLED: Endpoint =
    Endpoint::text("l2_room_sensor_installed", "S_295_111");

static L2: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(
        "l2",
        [
            ("operation_mode", L2_OPERATION_MODE),
            (
                "valve_position_setpoint",
                Endpoint::int_control(
                    "l2_valve_position_setpoint",
                    Unit::Percent,
                    "S_179_85",
                    "S_179_85",
                    0,
                    100,
                ),
            ),
            (
                "curve_minus_20_temperature",
                Endpoint::int_control(
                    "l2_curve_minus_20_temperature",
                    Unit::Celsius,
                    "S_148_85",
                    "@_S_148_85",
                    0,
                    99,
                ),
            ),
            (
                "curve_0_temperature",
                Endpoint::int_control(
                    "l2_curve_0_temperature",
                    Unit::Celsius,
                    "S_150_85",
                    "@_S_150_85",
                    0,
                    99,
                ),
            ),
            (
                "curve_20_temperature",
                Endpoint::int_control(
                    "l2_curve_20_temperature",
                    Unit::Celsius,
                    "S_152_85",
                    "@_S_152_85",
                    0,
                    99,
                ),
            ),
            (
                "temperature_drop",
                Endpoint::int_control(
                    "l2_temperature_drop",
                    Unit::Celsius,
                    "S_176_85",
                    "@_S_176_85",
                    0,
                    90,
                ),
            ),
            (
                "big_temperature_drop",
                Endpoint::int_control(
                    "l2_big_temperature_drop",
                    Unit::Celsius,
                    "S_177_85",
                    "@_S_177_85",
                    0,
                    90,
                ),
            ),
            (
                "water_out_minimum_temperature",
                Endpoint::int_control(
                    "l2_water_out_minimum_temperature",
                    Unit::Celsius,
                    "S_141_85",
                    "@_S_141_85",
                    5,
                    95,
                ),
            ),
            (
                "water_out_maximum_temperature",
                Endpoint::int_control(
                    "l2_water_out_maximum_temperature",
                    Unit::Celsius,
                    "S_142_85",
                    "@_S_142_85",
                    5,
                    95,
                ),
            ),
            (
                "room_temperature_fine_tuning",
                Endpoint::float_control(
                    "l2_room_temperature_fine_tuning",
                    Unit::Celsius,
                    "S_221_85",
                    "@_S_221_85",
                    -4.0,
                    4.0,
                ),
            ),
            (
                "temperature_level_status_text",
                Endpoint::text("l2_temperature_level_status_text", "S_1001_0"),
            ),
            ("circuit_name", Endpoint::text("l2_circuit_name", "S_218_85")),
            (
                "supply_water_temperature",
                Endpoint::number("l2_supply_water_temperature", Unit::Celsius, "S_293_85"),
            ),
            (
                "supply_water_temperature_setpoint",
                Endpoint::number(
                    "l2_supply_water_temperature_setpoint",
                    Unit::Celsius,
                    "S_310_85",
                ),
            ),
            ("room_sensor_installed", L2_ROOM_SENSOR_INSTALLED),
        ],
    )
});

static L2_WITH_ROOM_SENSOR: LazyLock<Registry> = LazyLock::new(|| {
    l2().extend(
        "l2_with_room_sensor",
        [(
            "room_temperature_fine_tuning",
            Endpoint::float_control(
                "l2_room_temperature_fine_tuning",
                Unit::Celsius,
                "S_189_85",
                "@_S_189_85",
                -4.0,
                4.0,
            ),
        )],
        [
            (
                "room_temperature",
                Endpoint::number("l2_room_temperature", Unit::Celsius, "S_295_85"),
            ),
            (
                "room_temperature_setpoint",
                Endpoint::number("l2_room_temperature_setpoint", Unit::Celsius, "S_313_85"),
            ),
            (
                "room_sensor_potentiometer",
                Endpoint::number("l2_room_sensor_potentiometer", Unit::Celsius, "S_307_85"),
            ),
        ],
    )
    .expect("built-in l2_with_room_sensor table is consistent with l2")
});

pub fn l2() -> &'static Registry {
    &L2
}

pub fn l2_with_room_sensor() -> &'static Registry {
    &L2_WITH_ROOM_SENSOR
}

/// Every built-in table, plain variants before room-sensor variants.
pub fn all() -> [&'static Registry; 5] {
    [
        system(),
        l1(),
        l1_with_room_sensor(),
        l2(),
        l2_with_room_sensor(),
    ]
}

/// Look up a built-in table by name.
pub fn by_name(name: &str) -> Option<&'static Registry> {
    all().into_iter().find(|registry| registry.name() == name)
}
