//! INA219 current/bus-voltage sensor driver (blocking I2C).

use crate::data_types::{AdcResolution, BusRange, MilliAmps, MilliVolts, OperatingMode, PgaGain};
use crate::error::DeviceError;
use crate::registers::{
    self, BusVoltageBits, INA219_CALIBRATION, INA219_CURRENT_LSB_UA, INA219_DEFAULT_ADDRESS,
    INA219_POWER_LSB_UW, INA219_SHUNT_LSB_UV, Ina219Config, bus_raw_to_mv, ina219 as addr,
};

/// INA219 high-side current sensor.
pub struct Ina219<I2C> {
    i2c: I2C,
    address: u8,
    /// Cached calibration register, 0 until programmed.
    calibration: u16,
    /// Divides the current register to get mA.
    current_divider_ma: u16,
    /// Multiplies the power register to get µW.
    power_multiplier_uw: u16,
}

impl<I2C> Ina219<I2C> {
    /// Create a driver at the default address (0x40).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, INA219_DEFAULT_ADDRESS)
    }

    /// Create a driver at a custom address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            calibration: 0,
            current_divider_ma: 1,
            power_multiplier_uw: 0,
        }
    }

    /// 7-bit I2C address used by this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last calibration value written, 0 if none.
    pub fn calibration(&self) -> u16 {
        self.calibration
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Ina219<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Probe the sensor and program the default calibration.
    pub fn init(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        if !self.connected() {
            return Err(DeviceError::NotResponding);
        }
        self.set_calibration(INA219_CALIBRATION, INA219_CURRENT_LSB_UA, INA219_POWER_LSB_UW)
    }

    /// True if the sensor acknowledges a CONFIG read.
    pub fn connected(&mut self) -> bool {
        self.read_reg(addr::CONFIG).is_ok()
    }

    /// Soft reset; all registers return to power-on defaults.
    pub fn reset(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        self.write_reg(addr::CONFIG, Ina219Config::RST.bits())
    }

    pub fn set_bus_range(&mut self, range: BusRange) -> Result<(), DeviceError<I2C::Error>> {
        self.update_config(Ina219Config::BRNG, registers::bus_range_bits(range))
    }

    pub fn set_pga_gain(&mut self, gain: PgaGain) -> Result<(), DeviceError<I2C::Error>> {
        self.update_config(Ina219Config::PG_MASK, registers::pga_gain_bits(gain))
    }

    pub fn set_bus_adc_resolution(
        &mut self,
        resolution: AdcResolution,
    ) -> Result<(), DeviceError<I2C::Error>> {
        self.update_config(Ina219Config::BADC_MASK, registers::bus_adc_bits(resolution))
    }

    pub fn set_shunt_adc_resolution(
        &mut self,
        resolution: AdcResolution,
    ) -> Result<(), DeviceError<I2C::Error>> {
        self.update_config(Ina219Config::SADC_MASK, registers::shunt_adc_bits(resolution))
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), DeviceError<I2C::Error>> {
        self.update_config(Ina219Config::MODE_MASK, registers::operating_mode_bits(mode))
    }

    /// Write every CONFIG field in one transaction.
    pub fn configure(
        &mut self,
        range: BusRange,
        gain: PgaGain,
        bus_adc: AdcResolution,
        shunt_adc: AdcResolution,
        mode: OperatingMode,
    ) -> Result<(), DeviceError<I2C::Error>> {
        let config = registers::bus_range_bits(range)
            | registers::pga_gain_bits(gain)
            | registers::bus_adc_bits(bus_adc)
            | registers::shunt_adc_bits(shunt_adc)
            | registers::operating_mode_bits(mode);
        self.write_reg(addr::CONFIG, config)
    }

    /// Program the calibration register and the scale factors derived from it.
    pub fn set_calibration(
        &mut self,
        value: u16,
        current_lsb_ua: u16,
        power_lsb_uw: u16,
    ) -> Result<(), DeviceError<I2C::Error>> {
        if current_lsb_ua == 0 || current_lsb_ua > 1000 {
            return Err(DeviceError::OutOfRange);
        }
        self.write_reg(addr::CALIBRATION, value)?;
        self.calibration = value;
        self.current_divider_ma = 1000 / current_lsb_ua;
        self.power_multiplier_uw = power_lsb_uw;
        Ok(())
    }

    /// Read the calibration register back from the device.
    pub fn read_calibration(&mut self) -> Result<u16, DeviceError<I2C::Error>> {
        self.read_reg(addr::CALIBRATION)
    }

    pub fn bus_voltage_raw(&mut self) -> Result<u16, DeviceError<I2C::Error>> {
        self.read_reg(addr::BUS_VOLTAGE)
    }

    /// Bus voltage (IN- to GND).
    pub fn bus_voltage_mv(&mut self) -> Result<MilliVolts, DeviceError<I2C::Error>> {
        Ok(bus_raw_to_mv(self.bus_voltage_raw()?))
    }

    /// Math overflow flag from the last conversion.
    pub fn overflow(&mut self) -> Result<bool, DeviceError<I2C::Error>> {
        let raw = BusVoltageBits::from_bits_truncate(self.bus_voltage_raw()?);
        Ok(raw.contains(BusVoltageBits::OVF))
    }

    pub fn shunt_voltage_raw(&mut self) -> Result<i16, DeviceError<I2C::Error>> {
        Ok(self.read_reg(addr::SHUNT_VOLTAGE)? as i16)
    }

    pub fn shunt_voltage_uv(&mut self) -> Result<i32, DeviceError<I2C::Error>> {
        Ok(self.shunt_voltage_raw()? as i32 * INA219_SHUNT_LSB_UV)
    }

    /// Raw current register; 0 while uncalibrated.
    ///
    /// The calibration is rewritten before each read since the device can
    /// reset itself during sharp load transients.
    pub fn current_raw(&mut self) -> Result<i16, DeviceError<I2C::Error>> {
        if self.calibration == 0 {
            warn!("INA219 calibration not set, current reads as zero");
            return Ok(0);
        }
        self.write_reg(addr::CALIBRATION, self.calibration)?;
        Ok(self.read_reg(addr::CURRENT)? as i16)
    }

    /// Charging current, reverse current reads as 0.
    pub fn current_ma(&mut self) -> Result<MilliAmps, DeviceError<I2C::Error>> {
        let raw = self.current_raw()?.max(0) as u32;
        Ok(raw / self.current_divider_ma as u32)
    }

    /// Power; 0 while uncalibrated.
    pub fn power_mw(&mut self) -> Result<u32, DeviceError<I2C::Error>> {
        if self.calibration == 0 {
            return Ok(0);
        }
        self.write_reg(addr::CALIBRATION, self.calibration)?;
        let raw = self.read_reg(addr::POWER)? as u32;
        Ok(raw * self.power_multiplier_uw as u32 / 1000)
    }

    /// Read-modify-write of a CONFIG field.
    pub fn update_config(&mut self, mask: Ina219Config, bits: u16) -> Result<(), DeviceError<I2C::Error>> {
        let current = self.read_reg(addr::CONFIG)?;
        self.write_reg(addr::CONFIG, registers::with_field(current, mask, bits))
    }

    /// Write a 16-bit register, MSB first.
    pub fn write_reg(&mut self, reg: u8, value: u16) -> Result<(), DeviceError<I2C::Error>> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(DeviceError::I2c)
    }

    /// Read a 16-bit register, MSB first.
    pub fn read_reg(&mut self, reg: u8) -> Result<u16, DeviceError<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(DeviceError::I2c)?;
        Ok(u16::from_be_bytes(buf))
    }
}
