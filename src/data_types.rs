//! Shared value types: charger and cycle states, LED colours, and the
//! configuration enums of the INA219 sensor and MCP4726 DAC.

/// Time in milliseconds.
pub type TimeMs = u32;
/// Voltage in millivolts.
pub type MilliVolts = u32;
/// Current in milliamps.
pub type MilliAmps = u32;

/// Charging cycle states.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CycleState {
    /// Configured, not yet started.
    Init,
    /// Running, completion checks suppressed while readings settle.
    Startup,
    /// Running normally.
    Running,
    /// Terminated normally.
    Done,
    /// Hardware error detected.
    Error,
    /// Maximum cycle time elapsed.
    Timeout,
}

impl CycleState {
    /// True once the cycle has stopped regulating (`Done`, `Error` or `Timeout`).
    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Done | CycleState::Error | CycleState::Timeout)
    }
}

impl core::fmt::Display for CycleState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            CycleState::Init => "init",
            CycleState::Startup => "startup",
            CycleState::Running => "running",
            CycleState::Done => "done",
            CycleState::Error => "error",
            CycleState::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Global charger states tracked by the supervisor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChargerState {
    Startup,
    /// Menu selection (not implemented).
    Menu,
    Fast,
    Topping,
    Trickle,
    Standby,
    /// Terminal, regulator off.
    Shutdown,
    /// Battery load test (not implemented).
    LoadTest,
    /// Battery conditioning (not implemented).
    Condition,
}

impl core::fmt::Display for ChargerState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ChargerState::Startup => "startup",
            ChargerState::Menu => "menu",
            ChargerState::Fast => "fast",
            ChargerState::Topping => "topping",
            ChargerState::Trickle => "trickle",
            ChargerState::Standby => "standby",
            ChargerState::Shutdown => "shutdown",
            ChargerState::LoadTest => "load test",
            ChargerState::Condition => "condition",
        };
        f.write_str(name)
    }
}

/// Output targets for status messages.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayDevice {
    None,
    /// Line-oriented serial console.
    Console,
    /// Optional character/OLED display.
    Display,
}

/// RGB LED colour.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const CYAN: Rgb = Rgb::new(3, 232, 252);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const GREEN_DARK: Rgb = Rgb::new(0, 64, 10);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const BLUE_DARK: Rgb = Rgb::new(0, 0, 128);
    pub const PURPLE: Rgb = Rgb::new(248, 3, 252);
    pub const ORANGE: Rgb = Rgb::new(252, 207, 3);
    pub const YELLOW: Rgb = Rgb::new(244, 252, 3);
    pub const YELLOW_DARK: Rgb = Rgb::new(73, 76, 1);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
}

/// INA219 bus voltage full-scale range.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BusRange {
    V16,
    V32,
}

/// INA219 shunt PGA gain and matching full-scale shunt voltage.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PgaGain {
    Gain1_40mV,
    Gain2_80mV,
    Gain4_160mV,
    Gain8_320mV,
}

/// INA219 ADC resolution or sample averaging, shared by the bus and shunt ADCs.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdcResolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
    Samples32,
    Samples64,
    Samples128,
}

/// INA219 operating mode.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    PowerDown,
    ShuntTriggered,
    BusTriggered,
    ShuntAndBusTriggered,
    AdcOff,
    ShuntContinuous,
    BusContinuous,
    ShuntAndBusContinuous,
}

/// MCP4726 output amplifier gain.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DacGain {
    X1,
    X2,
}

/// MCP4726 power-down state and output pull-down.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DacPowerDown {
    Awake,
    Pulldown1k,
    Pulldown100k,
    Pulldown500k,
}

/// MCP4726 reference voltage source.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DacReference {
    Vdd,
    VrefPin,
    VrefPinBuffered,
}

/// Decoded MCP4726 memory image (volatile and EEPROM halves).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DacMemory {
    pub config_volatile: u8,
    pub level_volatile: u16,
    pub config_nvm: u8,
    pub level_nvm: u16,
}
