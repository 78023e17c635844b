//! Compile-time charger configuration: system limits and per-phase parameters.

use crate::data_types::{MilliAmps, MilliVolts, Rgb, TimeMs};

pub const SECOND_MS: TimeMs = 1_000;
pub const MINUTE_MS: TimeMs = 60 * SECOND_MS;
pub const HOUR_MS: TimeMs = 60 * MINUTE_MS;
pub const DAY_MS: TimeMs = 24 * HOUR_MS;
pub const WEEK_MS: TimeMs = 7 * DAY_MS;

/// Supervisor polling interval.
pub const LOOP_DELAY_MS: TimeMs = 100;

/// Lowest regulator set-point.
pub const VREG_VOLTAGE_MIN: MilliVolts = 5_000;
/// Highest regulator set-point.
pub const VREG_VOLTAGE_MAX: MilliVolts = 16_000;

/// Rated battery capacity in mAh.
pub const BATTERY_CAPACITY_MAH: MilliAmps = 5_500;

/// At or below this voltage the charger starts with a fast charge, above it
/// with a topping charge.
pub const BATTERY_DISCHARGED_MV: MilliVolts = 13_000;

/// Band around the target voltage in which constant-voltage phases hold the
/// set-point steady.
pub const VOLTS_HYSTERESIS: MilliVolts = 100;

/// Soft-start offset below the present battery voltage.
pub const SOFT_START_OFFSET_MV: MilliVolts = 100;

/// Regulator output must exceed the battery by this much before current can
/// flow through the output diode; below it current reads as 0.
pub const DIODE_DROP_MV: MilliVolts = 250;

/// Charging-current samples kept for the status readout.
pub const CURRENT_HISTORY_SAMPLES: usize = 10;

/// Parameters of one charging phase.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChargeParameters {
    /// Current the phase steers towards, or its completion threshold.
    pub current_target: MilliAmps,
    /// Hard current limit, enforced before any other regulation.
    pub current_max: MilliAmps,
    pub voltage_target: MilliVolts,
    /// Set-point adjustment per run tick.
    pub voltage_step: MilliVolts,
    /// Countdown after which the cycle times out.
    pub charge_period_max: TimeMs,
    /// Settling time during which completion checks are suppressed.
    pub startup_period: TimeMs,
    /// Idle time between active charges (standby only).
    pub idle_period: TimeMs,
    pub led_on_period: TimeMs,
    pub led_off_period: TimeMs,
    pub led_color: Rgb,
    /// Console status cadence.
    pub message_period: TimeMs,
    /// Display status cadence.
    pub display_period: TimeMs,
    /// Six-character title for the display (e.g. `"FAST  "`).
    pub title: &'static str,
    /// Name used in console messages (e.g. `"fast"`).
    pub name: &'static str,
}

/// Fast charge: constant current near 14% of capacity until 14.4 V.
///
/// The 60 s startup lets surface charge dissipate before the voltage target
/// is trusted; the 4 h limit catches batteries that will not take a charge.
pub const FAST_PARAMS: ChargeParameters = ChargeParameters {
    current_target: BATTERY_CAPACITY_MAH / 7,
    current_max: 1_000,
    voltage_target: 14_400,
    voltage_step: 10,
    charge_period_max: 4 * HOUR_MS,
    startup_period: 60 * SECOND_MS,
    idle_period: 0,
    led_on_period: 250,
    led_off_period: 750,
    led_color: Rgb::BLUE_DARK,
    message_period: SECOND_MS,
    display_period: SECOND_MS,
    title: "FAST  ",
    name: "fast",
};

/// Topping charge: 14.0 V (2.33 V/cell) until current tapers to 5% of capacity.
pub const TOPPING_PARAMS: ChargeParameters = ChargeParameters {
    current_target: BATTERY_CAPACITY_MAH / 20,
    current_max: 1_000,
    voltage_target: 14_000,
    voltage_step: 10,
    charge_period_max: 12 * HOUR_MS,
    startup_period: 120 * SECOND_MS,
    idle_period: 0,
    led_on_period: 250,
    led_off_period: 1_000,
    led_color: Rgb::YELLOW_DARK,
    message_period: SECOND_MS,
    display_period: SECOND_MS,
    title: "TOPPNG",
    name: "topping",
};

/// Trickle (float) charge: 13.5 V for up to a day.
pub const TRICKLE_PARAMS: ChargeParameters = ChargeParameters {
    current_target: 0,
    current_max: 1_000,
    voltage_target: 13_500,
    voltage_step: 10,
    charge_period_max: 24 * HOUR_MS,
    startup_period: 60 * SECOND_MS,
    idle_period: 0,
    led_on_period: 250,
    led_off_period: 2_750,
    led_color: Rgb::GREEN_DARK,
    message_period: SECOND_MS,
    display_period: SECOND_MS,
    title: "TRCKLE",
    name: "trickle",
};

/// Standby: regulator off for six days between maintenance charges.
pub const STANDBY_PARAMS: ChargeParameters = ChargeParameters {
    current_target: 0,
    current_max: 0,
    voltage_target: 0,
    voltage_step: 0,
    charge_period_max: 6 * DAY_MS,
    startup_period: 0,
    idle_period: 6 * DAY_MS,
    led_on_period: 100,
    led_off_period: 1_000,
    led_color: Rgb::GREEN_DARK,
    message_period: 10 * SECOND_MS,
    display_period: SECOND_MS,
    title: "STDBY ",
    name: "standby",
};
