//! Register maps and conversion helpers for the INA219 current sensor and the
//! MCP4726 DAC that trims the regulator feedback.

use crate::data_types::{
    AdcResolution, BusRange, DacGain, DacPowerDown, DacReference, MilliVolts, OperatingMode,
    PgaGain,
};

/// INA219 address with A0/A1 tied low.
pub const INA219_DEFAULT_ADDRESS: u8 = 0x40;
/// MCP4726A0 address.
pub const MCP4726_DEFAULT_ADDRESS: u8 = 0x60;

/// INA219 register addresses.
pub mod ina219 {
    pub const CONFIG: u8 = 0x00;
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    pub const BUS_VOLTAGE: u8 = 0x02;
    pub const POWER: u8 = 0x03;
    pub const CURRENT: u8 = 0x04;
    pub const CALIBRATION: u8 = 0x05;
}

/// Calibration for a 0.1 Ω shunt, 32 V bus, PGA /8 (40 µA current LSB).
pub const INA219_CALIBRATION: u16 = 10_240;
/// Current register LSB (µA) for [`INA219_CALIBRATION`].
pub const INA219_CURRENT_LSB_UA: u16 = 40;
/// Power register LSB (µW), fixed at 20x the current LSB.
pub const INA219_POWER_LSB_UW: u16 = 20 * INA219_CURRENT_LSB_UA;
/// Bus voltage LSB.
pub const INA219_BUS_LSB_MV: u32 = 4;
/// Shunt voltage LSB.
pub const INA219_SHUNT_LSB_UV: i32 = 10;

/// MCP4726 DAC resolution.
pub const DAC_BITS: u8 = 12;
pub const DAC_MIN: u16 = 0;
pub const DAC_MAX: u16 = (1 << DAC_BITS) - 1;

bitflags::bitflags! {
    /// INA219 CONFIG register (0x00) single-bit fields and field masks.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Ina219Config: u16 {
        /// Bit 15: soft reset.
        const RST        = 1 << 15;
        /// Bit 13: bus range (0 = 16 V, 1 = 32 V).
        const BRNG       = 1 << 13;
        /// Bits 12-11: PGA gain.
        const PG_MASK    = 0b11 << 11;
        /// Bits 10-7: bus ADC resolution/averaging.
        const BADC_MASK  = 0b1111 << 7;
        /// Bits 6-3: shunt ADC resolution/averaging.
        const SADC_MASK  = 0b1111 << 3;
        /// Bits 2-0: operating mode.
        const MODE_MASK  = 0b111;
    }

    /// INA219 BUS_VOLTAGE register (0x02) status bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct BusVoltageBits: u16 {
        /// Bit 1: conversion ready.
        const CNVR = 1 << 1;
        /// Bit 0: math overflow.
        const OVF  = 1 << 0;
    }

    /// MCP4726 configuration byte (`0bCCCVVPPG`).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct DacConfigBits: u8 {
        /// Clear while an EEPROM write is in progress (read-back only).
        const RDY_BUSY   = 1 << 7;
        const VREF1      = 1 << 4;
        const VREF0      = 1 << 3;
        const PD1        = 1 << 2;
        const PD0        = 1 << 1;
        const GAIN       = 1 << 0;
    }
}

/// MCP4726 command codes (bits 7-5 of the first byte).
pub mod dac_cmd {
    /// Write volatile DAC register (fast mode, keeps configuration).
    pub const VOLATILE_DAC: u8 = 0x00;
    /// Write all volatile memory.
    pub const VOLATILE_ALL: u8 = 0x40;
    /// Write all memory, volatile and EEPROM.
    pub const ALL: u8 = 0x60;
    /// Write volatile configuration.
    pub const VOLATILE_CONFIG: u8 = 0x80;
    /// Bits carrying configuration rather than command.
    pub const CONFIG_MASK: u8 = 0x1F;
}

/// CONFIG bits for the bus range.
pub fn bus_range_bits(range: BusRange) -> u16 {
    match range {
        BusRange::V16 => 0,
        BusRange::V32 => Ina219Config::BRNG.bits(),
    }
}

/// CONFIG bits for the PGA gain.
pub fn pga_gain_bits(gain: PgaGain) -> u16 {
    let code = match gain {
        PgaGain::Gain1_40mV => 0b00,
        PgaGain::Gain2_80mV => 0b01,
        PgaGain::Gain4_160mV => 0b10,
        PgaGain::Gain8_320mV => 0b11,
    };
    code << 11
}

/// 4-bit ADC setting shared by BADC and SADC.
fn adc_code(resolution: AdcResolution) -> u16 {
    match resolution {
        AdcResolution::Bits9 => 0b0000,
        AdcResolution::Bits10 => 0b0001,
        AdcResolution::Bits11 => 0b0010,
        AdcResolution::Bits12 => 0b0011,
        AdcResolution::Samples2 => 0b1001,
        AdcResolution::Samples4 => 0b1010,
        AdcResolution::Samples8 => 0b1011,
        AdcResolution::Samples16 => 0b1100,
        AdcResolution::Samples32 => 0b1101,
        AdcResolution::Samples64 => 0b1110,
        AdcResolution::Samples128 => 0b1111,
    }
}

/// CONFIG bits for the bus ADC.
pub fn bus_adc_bits(resolution: AdcResolution) -> u16 {
    adc_code(resolution) << 7
}

/// CONFIG bits for the shunt ADC.
pub fn shunt_adc_bits(resolution: AdcResolution) -> u16 {
    adc_code(resolution) << 3
}

/// CONFIG bits for the operating mode.
pub fn operating_mode_bits(mode: OperatingMode) -> u16 {
    match mode {
        OperatingMode::PowerDown => 0b000,
        OperatingMode::ShuntTriggered => 0b001,
        OperatingMode::BusTriggered => 0b010,
        OperatingMode::ShuntAndBusTriggered => 0b011,
        OperatingMode::AdcOff => 0b100,
        OperatingMode::ShuntContinuous => 0b101,
        OperatingMode::BusContinuous => 0b110,
        OperatingMode::ShuntAndBusContinuous => 0b111,
    }
}

/// Replace the bits selected by `mask` in `config`.
pub fn with_field(config: u16, mask: Ina219Config, bits: u16) -> u16 {
    (config & !mask.bits()) | (bits & mask.bits())
}

/// Bus voltage register to millivolts (drops CNVR/OVF, 4 mV LSB).
pub fn bus_raw_to_mv(raw: u16) -> MilliVolts {
    (raw >> 3) as u32 * INA219_BUS_LSB_MV
}

/// MCP4726 configuration bits (`VVPPG`) without command.
pub fn dac_config_bits(reference: DacReference, power: DacPowerDown, gain: DacGain) -> u8 {
    let mut bits = DacConfigBits::empty();
    bits |= match reference {
        DacReference::Vdd => DacConfigBits::empty(),
        DacReference::VrefPin => DacConfigBits::VREF1,
        DacReference::VrefPinBuffered => DacConfigBits::VREF1 | DacConfigBits::VREF0,
    };
    bits |= match power {
        DacPowerDown::Awake => DacConfigBits::empty(),
        DacPowerDown::Pulldown1k => DacConfigBits::PD0,
        DacPowerDown::Pulldown100k => DacConfigBits::PD1,
        DacPowerDown::Pulldown500k => DacConfigBits::PD1 | DacConfigBits::PD0,
    };
    if matches!(gain, DacGain::X2) {
        bits |= DacConfigBits::GAIN;
    }
    bits.bits()
}

/// DAC code producing `mv` at the regulator output.
///
/// The DAC sinks current from the feedback node, so the highest code gives the
/// lowest output voltage. `mv` is clamped to `[min_mv, max_mv]`; an empty or
/// inverted range yields the lowest output.
pub fn dac_code_for_voltage(mv: MilliVolts, min_mv: MilliVolts, max_mv: MilliVolts) -> u16 {
    if max_mv <= min_mv {
        return DAC_MAX;
    }
    let mv = mv.clamp(min_mv, max_mv);
    let span = max_mv - min_mv;
    let offset = (mv - min_mv) as u64 * DAC_MAX as u64 / span as u64;
    DAC_MAX - offset as u16
}
