//! MCP4726 12-bit DAC driver (blocking I2C).

use crate::data_types::{DacGain, DacMemory, DacPowerDown, DacReference};
use crate::error::DeviceError;
use crate::registers::{DAC_MAX, DacConfigBits, MCP4726_DEFAULT_ADDRESS, dac_cmd, dac_config_bits};

/// Memory reads allowed while waiting out an EEPROM write.
const EEPROM_BUSY_POLLS: u32 = 1_000;

/// MCP4726 single-channel DAC.
pub struct Mcp4726<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Mcp4726<I2C> {
    /// Create a driver at the default address (0x60).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, MCP4726_DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Mcp4726<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// True if the device answers a memory read.
    pub fn connected(&mut self) -> bool {
        self.read_memory().is_ok()
    }

    /// Write the volatile configuration (reference, power-down, gain).
    pub fn configure(
        &mut self,
        reference: DacReference,
        power: DacPowerDown,
        gain: DacGain,
    ) -> Result<(), DeviceError<I2C::Error>> {
        self.write_config(dac_config_bits(reference, power, gain))
    }

    /// Restore the EEPROM settings into volatile memory, waking the device.
    pub fn restore(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        let mem = self.read_memory()?;
        let power_bits = (DacConfigBits::PD1 | DacConfigBits::PD0).bits();
        let config = mem.config_nvm & !power_bits & dac_cmd::CONFIG_MASK;
        self.write_all(dac_cmd::VOLATILE_ALL | config, mem.level_nvm)
    }

    /// True while an EEPROM write is in progress.
    pub fn busy(&mut self) -> Result<bool, DeviceError<I2C::Error>> {
        let mem = self.read_memory()?;
        Ok(mem.config_volatile & DacConfigBits::RDY_BUSY.bits() == 0)
    }

    /// Copy the volatile settings into EEPROM as power-on defaults.
    ///
    /// Fails with `NotResponding` if a previous EEPROM write never finishes.
    pub fn save_settings(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        let mut polls = 0;
        while self.busy()? {
            polls += 1;
            if polls >= EEPROM_BUSY_POLLS {
                return Err(DeviceError::NotResponding);
            }
        }
        let mem = self.read_memory()?;
        self.write_all(dac_cmd::ALL | (mem.config_volatile & dac_cmd::CONFIG_MASK), mem.level_volatile)
    }

    /// Set the output level (0..=4095); wakes the device from power-down.
    pub fn set_level(&mut self, level: u16) -> Result<(), DeviceError<I2C::Error>> {
        if level > DAC_MAX {
            return Err(DeviceError::OutOfRange);
        }
        let [hi, lo] = level.to_be_bytes();
        self.i2c
            .write(self.address, &[dac_cmd::VOLATILE_DAC | (hi & 0x0F), lo])
            .map_err(DeviceError::I2c)
    }

    /// Enter power-down with the selected output pull-down.
    pub fn power_down(&mut self, power: DacPowerDown) -> Result<(), DeviceError<I2C::Error>> {
        let mem = self.read_memory()?;
        let mask = (DacConfigBits::PD1 | DacConfigBits::PD0).bits();
        let bits = dac_config_bits(DacReference::Vdd, power, DacGain::X1) & mask;
        self.write_config((mem.config_volatile & !mask) | bits)
    }

    /// Read the 6-byte memory image.
    pub fn read_memory(&mut self) -> Result<DacMemory, DeviceError<I2C::Error>> {
        let mut buf = [0u8; 6];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(DeviceError::I2c)?;
        Ok(DacMemory {
            config_volatile: buf[0],
            level_volatile: u16::from_be_bytes([buf[1], buf[2]]) >> 4,
            config_nvm: buf[3] & dac_cmd::CONFIG_MASK,
            level_nvm: u16::from_be_bytes([buf[4], buf[5]]) >> 4,
        })
    }

    fn write_config(&mut self, config: u8) -> Result<(), DeviceError<I2C::Error>> {
        self.i2c
            .write(self.address, &[dac_cmd::VOLATILE_CONFIG | (config & dac_cmd::CONFIG_MASK)])
            .map_err(DeviceError::I2c)
    }

    fn write_all(&mut self, first: u8, level: u16) -> Result<(), DeviceError<I2C::Error>> {
        let level = level << 4;
        let [hi, lo] = level.to_be_bytes();
        self.i2c
            .write(self.address, &[first, hi, lo])
            .map_err(DeviceError::I2c)
    }
}
