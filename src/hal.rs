//! Capability traits the charge cycles drive, and the [`Board`] container that
//! hands them to the supervisor.

use crate::alarm::AlarmPool;
use crate::data_types::{MilliAmps, MilliVolts, Rgb};

/// Samples averaged by the default `average_*` methods.
pub const AVERAGE_SAMPLES: u32 = 4;

/// Adjustable voltage regulator with output current sensing.
pub trait Regulator {
    type Error;

    /// Output voltage; 0 while the regulator is off.
    fn voltage_mv(&mut self) -> Result<MilliVolts, Self::Error>;

    /// Command a new output voltage. Implementations clamp to their safe range.
    fn set_voltage_mv(&mut self, mv: MilliVolts) -> Result<(), Self::Error>;

    /// Output current.
    fn current_ma(&mut self) -> Result<MilliAmps, Self::Error>;

    /// Mean of [`AVERAGE_SAMPLES`] current readings.
    fn average_current_ma(&mut self) -> Result<MilliAmps, Self::Error> {
        let mut sum = 0;
        for _ in 0..AVERAGE_SAMPLES {
            sum += self.current_ma()?;
        }
        Ok(sum / AVERAGE_SAMPLES)
    }

    fn on(&mut self) -> Result<(), Self::Error>;

    fn off(&mut self) -> Result<(), Self::Error>;

    fn is_on(&self) -> bool;
}

/// Battery terminal voltage sense.
pub trait Battery {
    type Error;

    fn voltage_mv(&mut self) -> Result<MilliVolts, Self::Error>;

    /// Mean of [`AVERAGE_SAMPLES`] voltage readings.
    fn average_voltage_mv(&mut self) -> Result<MilliVolts, Self::Error> {
        let mut sum = 0;
        for _ in 0..AVERAGE_SAMPLES {
            sum += self.voltage_mv()?;
        }
        Ok(sum / AVERAGE_SAMPLES)
    }
}

/// RGB status indicator.
pub trait StatusLed {
    fn set_color(&mut self, color: Rgb);
}

/// Double-buffered text display.
///
/// Text goes through [`core::fmt::Write`] at the current cursor; nothing is
/// shown until [`Display::switch_frame`].
pub trait Display: core::fmt::Write {
    fn clear(&mut self) -> core::fmt::Result;

    /// Move the cursor to pixel column `x`, text row `y`.
    fn set_cursor(&mut self, x: u8, y: u8) -> core::fmt::Result;

    fn switch_frame(&mut self) -> core::fmt::Result;
}

/// Placeholder for boards without a display.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDisplay;

impl core::fmt::Write for NoDisplay {
    fn write_str(&mut self, _s: &str) -> core::fmt::Result {
        Ok(())
    }
}

impl Display for NoDisplay {
    fn clear(&mut self) -> core::fmt::Result {
        Ok(())
    }

    fn set_cursor(&mut self, _x: u8, _y: u8) -> core::fmt::Result {
        Ok(())
    }

    fn switch_frame(&mut self) -> core::fmt::Result {
        Ok(())
    }
}

/// Everything a charge cycle touches.
///
/// Only the active phase uses the hardware, so plain `&mut` access is enough.
pub trait Hardware {
    type Regulator: Regulator;
    type Battery: Battery;
    type Led: StatusLed;
    type Display: Display;
    type Console: core::fmt::Write;

    fn regulator(&mut self) -> &mut Self::Regulator;
    fn battery(&mut self) -> &mut Self::Battery;
    fn led(&mut self) -> &mut Self::Led;
    /// The display, if one is attached.
    fn display(&mut self) -> Option<&mut Self::Display>;
    fn console(&mut self) -> &mut Self::Console;
    fn timers(&self) -> &AlarmPool;
}

/// Concrete [`Hardware`] built from individual parts.
pub struct Board<'a, R, B, L, D, C> {
    pub regulator: R,
    pub battery: B,
    pub led: L,
    pub display: Option<D>,
    pub console: C,
    pub timers: &'a AlarmPool,
}

impl<'a, R, B, L, C> Board<'a, R, B, L, NoDisplay, C> {
    /// A board without a display.
    pub fn headless(regulator: R, battery: B, led: L, console: C, timers: &'a AlarmPool) -> Self {
        Self {
            regulator,
            battery,
            led,
            display: None,
            console,
            timers,
        }
    }
}

impl<R, B, L, D, C> Hardware for Board<'_, R, B, L, D, C>
where
    R: Regulator,
    B: Battery,
    L: StatusLed,
    D: Display,
    C: core::fmt::Write,
{
    type Regulator = R;
    type Battery = B;
    type Led = L;
    type Display = D;
    type Console = C;

    fn regulator(&mut self) -> &mut R {
        &mut self.regulator
    }

    fn battery(&mut self) -> &mut B {
        &mut self.battery
    }

    fn led(&mut self) -> &mut L {
        &mut self.led
    }

    fn display(&mut self) -> Option<&mut D> {
        self.display.as_mut()
    }

    fn console(&mut self) -> &mut C {
        &mut self.console
    }

    fn timers(&self) -> &AlarmPool {
        self.timers
    }
}
