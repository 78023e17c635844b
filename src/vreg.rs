//! Concrete charger peripherals: the DAC-trimmed regulator, the PWM status LED
//! and the ADC battery sense.

use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::config::{VREG_VOLTAGE_MAX, VREG_VOLTAGE_MIN};
use crate::data_types::{
    AdcResolution, BusRange, DacGain, DacPowerDown, DacReference, MilliAmps, MilliVolts,
    OperatingMode, PgaGain, Rgb,
};
use crate::error::DeviceError;
use crate::hal::{Battery, Regulator, StatusLed};
use crate::ina219::Ina219;
use crate::mcp4726::Mcp4726;
use crate::registers::{
    DAC_MAX, INA219_CALIBRATION, INA219_CURRENT_LSB_UA, INA219_POWER_LSB_UW, dac_code_for_voltage,
};

/// Battery divider ratio: mV per ADC count, scaled by 100.
pub const BATTERY_SCALE_X100: u32 = 395;

/// Adjustable regulator whose feedback node is trimmed by an MCP4726, with an
/// INA219 on the output and an enable pin.
pub struct Vreg<I2C, EN> {
    sensor: Ina219<I2C>,
    dac: Mcp4726<I2C>,
    enable: EN,
    enabled: bool,
    set_point: MilliVolts,
}

impl<I2C, EN> Vreg<I2C, EN> {
    pub fn new(sensor: Ina219<I2C>, dac: Mcp4726<I2C>, enable: EN) -> Self {
        Self {
            sensor,
            dac,
            enable,
            enabled: false,
            set_point: VREG_VOLTAGE_MIN,
        }
    }

    /// Last commanded output voltage.
    pub fn set_point_mv(&self) -> MilliVolts {
        self.set_point
    }

    pub fn release(self) -> (Ina219<I2C>, Mcp4726<I2C>, EN) {
        (self.sensor, self.dac, self.enable)
    }
}

impl<I2C, EN> Vreg<I2C, EN>
where
    I2C: embedded_hal::i2c::I2c,
    EN: OutputPin,
{
    /// Bring up both devices and leave the output off at its lowest voltage.
    ///
    /// `NotResponding` means the board cannot be trusted with a battery and
    /// the caller should halt.
    pub fn begin(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        self.disable()?;

        if !self.sensor.connected() {
            error!("INA219 not responding at {}", self.sensor.address());
            return Err(DeviceError::NotResponding);
        }
        self.sensor.reset()?;
        self.sensor.configure(
            BusRange::V32,
            PgaGain::Gain8_320mV,
            AdcResolution::Bits12,
            AdcResolution::Bits12,
            OperatingMode::ShuntAndBusContinuous,
        )?;
        self.sensor
            .set_calibration(INA219_CALIBRATION, INA219_CURRENT_LSB_UA, INA219_POWER_LSB_UW)?;

        if !self.dac.connected() {
            error!("MCP4726 not responding at {}", self.dac.address());
            return Err(DeviceError::NotResponding);
        }
        self.dac
            .configure(DacReference::Vdd, DacPowerDown::Awake, DacGain::X1)?;
        self.dac.set_level(DAC_MAX)?;
        self.set_point = VREG_VOLTAGE_MIN;

        info!("regulator ready");
        Ok(())
    }

    fn disable(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        self.enable
            .set_low()
            .map_err(|e| DeviceError::Pin(e.kind()))?;
        self.enabled = false;
        Ok(())
    }
}

impl<I2C, EN> Regulator for Vreg<I2C, EN>
where
    I2C: embedded_hal::i2c::I2c,
    EN: OutputPin,
{
    type Error = DeviceError<I2C::Error>;

    fn voltage_mv(&mut self) -> Result<MilliVolts, Self::Error> {
        if !self.enabled {
            return Ok(0);
        }
        self.sensor.bus_voltage_mv()
    }

    fn set_voltage_mv(&mut self, mv: MilliVolts) -> Result<(), Self::Error> {
        let clamped = mv.clamp(VREG_VOLTAGE_MIN, VREG_VOLTAGE_MAX);
        if clamped != mv {
            warn!("regulator set-point {} mV clamped to {} mV", mv, clamped);
        }
        let code = dac_code_for_voltage(clamped, VREG_VOLTAGE_MIN, VREG_VOLTAGE_MAX);
        self.dac.set_level(code)?;
        self.set_point = clamped;
        Ok(())
    }

    fn current_ma(&mut self) -> Result<MilliAmps, Self::Error> {
        self.sensor.current_ma()
    }

    fn on(&mut self) -> Result<(), Self::Error> {
        self.enable
            .set_high()
            .map_err(|e| DeviceError::Pin(e.kind()))?;
        self.enabled = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), Self::Error> {
        self.disable()
    }

    fn is_on(&self) -> bool {
        self.enabled
    }
}

/// Common-anode RGB LED on three PWM channels (a channel is lit while low).
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    /// Take the channels and switch the LED off.
    pub fn new(red: R, green: G, blue: B) -> Self {
        let mut led = Self { red, green, blue };
        led.set_color(Rgb::BLACK);
        led
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R, G, B> StatusLed for RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_color(&mut self, color: Rgb) {
        let red = self.red.set_duty_cycle_fraction(255 - color.r as u16, 255).is_ok();
        let green = self.green.set_duty_cycle_fraction(255 - color.g as u16, 255).is_ok();
        let blue = self.blue.set_duty_cycle_fraction(255 - color.b as u16, 255).is_ok();
        if !(red && green && blue) {
            warn!("status LED PWM update failed");
        }
    }
}

/// Battery voltage from a 12-bit ADC behind a resistive divider.
///
/// `read` returns one raw conversion.
pub struct AdcBattery<F> {
    read: F,
}

impl<F, E> AdcBattery<F>
where
    F: FnMut() -> Result<u16, E>,
{
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F, E> Battery for AdcBattery<F>
where
    F: FnMut() -> Result<u16, E>,
{
    type Error = E;

    fn voltage_mv(&mut self) -> Result<MilliVolts, E> {
        let raw = (self.read)()?;
        Ok(raw as u32 * BATTERY_SCALE_X100 / 100)
    }
}
