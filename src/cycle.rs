//! Charge cycle lifecycle shared by every phase: soft start, startup settling,
//! timeout tracking, LED blinking and status output.
//!
//! A phase drives one [`ChargeCycle`] through `init -> start -> run* -> stop`.
//! Each `run` tick of an active phase looks like:
//!
//! ```text
//! begin_run   latched/timeout checks, STARTUP/RUNNING, sensor readings
//! <phase>     regulation: step_up / step_down / hold_voltage, or terminate
//! apply       write the set-point to the regulator
//! end_run     LED blink, status output at its cadence
//! ```

use core::fmt::Write;

use crate::alarm::{AlarmId, AlarmPool};
use crate::config::{
    ChargeParameters, CURRENT_HISTORY_SAMPLES, DIODE_DROP_MV, SOFT_START_OFFSET_MV,
    VOLTS_HYSTERESIS, VREG_VOLTAGE_MAX, VREG_VOLTAGE_MIN,
};
use crate::data_types::{CycleState, DisplayDevice, MilliAmps, MilliVolts, Rgb, TimeMs};
use crate::error::Error;
use crate::hal::{Battery, Display, Hardware, Regulator, StatusLed};
use crate::phase::{ChargePhase, HasCycle};
use crate::ring_buffer::RingBuffer;
use crate::utility::{HmsString, MilliString, milliunits_to_string, ms_to_hms_str};

/// Sensor values for one run tick.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Readings {
    /// Charging current, 0 while the output sits within a diode drop of the
    /// battery.
    pub current_ma: MilliAmps,
    pub battery_mv: MilliVolts,
}

/// State of one charging phase.
pub struct ChargeCycle {
    params: ChargeParameters,
    state: CycleState,
    set_voltage: MilliVolts,
    start_time: TimeMs,
    message_timer: TimeMs,
    display_timer: TimeMs,
    led_timer: TimeMs,
    led_on: bool,
    charge_timer: Option<AlarmId>,
    current_history: RingBuffer<CURRENT_HISTORY_SAMPLES>,
    hms: HmsString,
    volts: MilliString,
}

impl ChargeCycle {
    pub const fn new(params: ChargeParameters) -> Self {
        Self {
            params,
            state: CycleState::Init,
            set_voltage: VREG_VOLTAGE_MIN,
            start_time: 0,
            message_timer: 0,
            display_timer: 0,
            led_timer: 0,
            led_on: false,
            charge_timer: None,
            current_history: RingBuffer::new(),
            hms: HmsString::new(),
            volts: MilliString::new(),
        }
    }

    /// Load `params`, switch the regulator off at its lowest set-point and
    /// claim this cycle's alarm slot.
    ///
    /// Safe to call again: the slot is only claimed the first time.
    pub fn init<H: Hardware>(&mut self, params: ChargeParameters, hw: &mut H) -> Result<(), Error> {
        self.params = params;
        self.state = CycleState::Init;
        self.set_voltage = VREG_VOLTAGE_MIN;
        self.led_on = false;
        self.current_history.clear();

        let regulator = hw.regulator();
        if regulator.off().is_err() || regulator.set_voltage_mv(VREG_VOLTAGE_MIN).is_err() {
            error!("{}: regulator not responding during init", params.name);
            return Err(Error::Hardware);
        }

        if self.charge_timer.is_none() {
            self.charge_timer = Some(hw.timers().add(0, None)?);
        }
        debug!("{}: initialized", params.name);
        Ok(())
    }

    /// Begin a fresh cycle: arm the timers and soft-start the regulator just
    /// below the battery voltage.
    pub fn start<H: Hardware>(&mut self, hw: &mut H) -> Result<(), Error> {
        self.arm(hw)?;

        let battery = match hw.battery().voltage_mv() {
            Ok(mv) => mv,
            Err(_) => {
                self.fail(hw);
                return Err(Error::Hardware);
            }
        };
        self.set_voltage = soft_start_voltage(battery);

        let regulator = hw.regulator();
        if regulator.set_voltage_mv(self.set_voltage).is_err() || regulator.on().is_err() {
            self.fail(hw);
            return Err(Error::Hardware);
        }
        info!("{}: soft start at {} mV", self.params.name, self.set_voltage);
        Ok(())
    }

    /// Reset timers and status output for a new cycle without touching the
    /// regulator output.
    pub fn arm<H: Hardware>(&mut self, hw: &mut H) -> Result<(), Error> {
        let timer = self.charge_timer.ok_or(Error::NotInitialized)?;
        hw.timers().set(timer, self.params.charge_period_max)?;

        let now = hw.timers().millis();
        self.state = CycleState::Startup;
        self.start_time = now;
        self.message_timer = now;
        self.display_timer = now;
        self.led_timer = now;
        self.led_on = true;
        self.current_history.clear();
        hw.led().set_color(self.params.led_color);

        if writeln!(hw.console(), "Starting {} charging cycle", self.params.name).is_err() {
            warn!("console write failed");
        }
        if let Some(display) = hw.display() {
            if display.clear().and_then(|_| display.switch_frame()).is_err() {
                warn!("display clear failed");
            }
        }
        Ok(())
    }

    /// Switch the regulator off. Timers, LED and state are left alone.
    pub fn stop<H: Hardware>(&mut self, hw: &mut H) {
        if hw.regulator().off().is_err() {
            error!("{}: regulator did not switch off", self.params.name);
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn params(&self) -> &ChargeParameters {
        &self.params
    }

    /// Commanded regulator voltage, always within the regulator range.
    pub fn set_voltage(&self) -> MilliVolts {
        self.set_voltage
    }

    /// System time at the last `start`.
    pub fn start_time(&self) -> TimeMs {
        self.start_time
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// Smoothed charging current over the recent run ticks.
    pub fn average_current_ma(&self) -> MilliAmps {
        self.current_history.average() as MilliAmps
    }

    pub fn startup_time_remaining(&self, timers: &AlarmPool) -> TimeMs {
        self.params
            .startup_period
            .saturating_sub(self.charging_time_elapsed(timers))
    }

    pub fn charging_time_remaining(&self, timers: &AlarmPool) -> TimeMs {
        self.charge_timer.map(|id| timers.get(id)).unwrap_or(0)
    }

    pub fn charging_time_elapsed(&self, timers: &AlarmPool) -> TimeMs {
        self.charge_timer.map(|id| timers.elapsed(id)).unwrap_or(0)
    }

    /// Common opening of an active phase's run tick.
    ///
    /// `Err` carries the state the tick must return: a latched terminal
    /// state, `Timeout`, or `Error` after a failed sensor read or a run
    /// before `start`.
    pub fn begin_run<H: Hardware>(&mut self, hw: &mut H) -> Result<Readings, CycleState> {
        match self.state {
            CycleState::Init => {
                warn!("{}: run before start", self.params.name);
                return Err(self.terminate(hw, CycleState::Error));
            }
            state if state.is_terminal() => {
                self.stop(hw);
                return Err(state);
            }
            _ => {}
        }

        self.update_startup_state(hw.timers());
        if self.timed_out(hw.timers()) {
            warn!("{}: charge cycle timed out", self.params.name);
            return Err(self.terminate(hw, CycleState::Timeout));
        }

        self.read_sensors(hw).map_err(|_| self.fail(hw))
    }

    /// `Startup` while the settling period runs, `Running` after.
    pub fn update_startup_state(&mut self, timers: &AlarmPool) {
        self.state = if self.startup_time_remaining(timers) > 0 {
            CycleState::Startup
        } else {
            CycleState::Running
        };
    }

    /// True once the charge alarm has counted down.
    pub fn timed_out(&self, timers: &AlarmPool) -> bool {
        self.charging_time_remaining(timers) == 0
    }

    /// Read battery voltage and filtered charging current, recording the
    /// current in the history.
    pub fn read_sensors<H: Hardware>(&mut self, hw: &mut H) -> Result<Readings, Error> {
        let current_ma = self.charging_current(hw)?;
        let battery_mv = hw.battery().voltage_mv().map_err(|_| Error::Hardware)?;
        Ok(Readings {
            current_ma,
            battery_mv,
        })
    }

    fn charging_current<H: Hardware>(&mut self, hw: &mut H) -> Result<MilliAmps, Error> {
        let output = hw.regulator().voltage_mv().map_err(|_| Error::Hardware)?;
        let battery = hw
            .battery()
            .average_voltage_mv()
            .map_err(|_| Error::Hardware)?;
        let current = if output > battery + DIODE_DROP_MV {
            hw.regulator().current_ma().map_err(|_| Error::Hardware)?
        } else {
            0
        };
        self.current_history
            .append(current.min(u16::MAX as MilliAmps) as u16);
        Ok(current)
    }

    /// Raise the set-point one step, clamping at the regulator maximum.
    pub fn step_up(&mut self) {
        let next = self.set_voltage.saturating_add(self.params.voltage_step);
        if next > VREG_VOLTAGE_MAX {
            warn!(
                "{}: set-point {} mV above limit, holding at {} mV",
                self.params.name,
                next,
                VREG_VOLTAGE_MAX
            );
            self.set_voltage = VREG_VOLTAGE_MAX;
        } else {
            self.set_voltage = next;
        }
    }

    /// Lower the set-point one step, stopping at the regulator minimum.
    pub fn step_down(&mut self) {
        self.set_voltage = self
            .set_voltage
            .saturating_sub(self.params.voltage_step)
            .max(VREG_VOLTAGE_MIN);
    }

    /// Constant-voltage regulation: keep the battery within
    /// `VOLTS_HYSTERESIS` of the target, backing off first whenever the
    /// current exceeds its limit.
    pub fn hold_voltage(&mut self, readings: Readings) {
        let target = self.params.voltage_target;
        if readings.current_ma > self.params.current_max {
            self.step_down();
        } else if readings.battery_mv > target + VOLTS_HYSTERESIS {
            self.step_down();
        } else if readings.battery_mv < target.saturating_sub(VOLTS_HYSTERESIS) {
            self.step_up();
        }
    }

    /// Write the set-point to the regulator.
    pub fn apply_set_voltage<H: Hardware>(&mut self, hw: &mut H) -> Result<(), CycleState> {
        if hw.regulator().set_voltage_mv(self.set_voltage).is_err() {
            return Err(self.fail(hw));
        }
        trace!("{}: set-point {} mV", self.params.name, self.set_voltage);
        Ok(())
    }

    /// Common close of a run tick: LED blink and periodic status output.
    pub fn end_run<H: Hardware>(&mut self, hw: &mut H) -> CycleState {
        self.status_led(hw);
        let now = hw.timers().millis();
        if self.status_due(DisplayDevice::Display, now) {
            self.status_message(DisplayDevice::Display, hw);
        }
        if self.status_due(DisplayDevice::Console, now) {
            self.status_message(DisplayDevice::Console, hw);
        }
        self.state
    }

    /// Stop the regulator and latch `state`.
    pub fn terminate<H: Hardware>(&mut self, hw: &mut H, state: CycleState) -> CycleState {
        self.stop(hw);
        self.state = state;
        info!("{}: cycle {}", self.params.name, state);
        state
    }

    fn fail<H: Hardware>(&mut self, hw: &mut H) -> CycleState {
        error!("{}: hardware access failed, stopping", self.params.name);
        self.terminate(hw, CycleState::Error)
    }

    /// Blink the LED: `led_on_period` in the phase colour, `led_off_period`
    /// dark.
    pub fn status_led<H: Hardware>(&mut self, hw: &mut H) {
        let now = hw.timers().millis();
        let since = now.wrapping_sub(self.led_timer);
        if self.led_on {
            if since >= self.params.led_on_period {
                hw.led().set_color(Rgb::BLACK);
                self.led_on = false;
                self.led_timer = now;
            }
        } else if since >= self.params.led_off_period {
            hw.led().set_color(self.params.led_color);
            self.led_on = true;
            self.led_timer = now;
        }
    }

    /// True when `device`'s update period has passed since its last update;
    /// restarts that period.
    pub fn status_due(&mut self, device: DisplayDevice, now: TimeMs) -> bool {
        let (timer, period) = match device {
            DisplayDevice::None => return false,
            DisplayDevice::Console => (&mut self.message_timer, self.params.message_period),
            DisplayDevice::Display => (&mut self.display_timer, self.params.display_period),
        };
        if now.wrapping_sub(*timer) >= period {
            *timer = now;
            true
        } else {
            false
        }
    }

    /// Refresh the elapsed-time and battery-voltage strings.
    pub fn format_status(&mut self, elapsed: TimeMs, battery_mv: MilliVolts) {
        self.hms = ms_to_hms_str(elapsed);
        self.volts = milliunits_to_string(battery_mv, 1);
    }

    /// Elapsed time as of the last [`ChargeCycle::format_status`].
    pub fn hms_str(&self) -> &str {
        &self.hms
    }

    /// Battery voltage as of the last [`ChargeCycle::format_status`].
    pub fn volts_str(&self) -> &str {
        &self.volts
    }

    /// Write the charging status while the cycle is active.
    ///
    /// ```text
    /// console:  FAST   00:12:34 Battery @ 13.2 V, 0785 mA
    /// display:  FAST   00:12:34
    ///           13.2 V  785 mA
    /// ```
    pub fn status_message<H: Hardware>(&mut self, device: DisplayDevice, hw: &mut H) {
        if !matches!(self.state, CycleState::Startup | CycleState::Running) {
            return;
        }
        let Ok(battery) = hw.battery().voltage_mv() else {
            warn!("{}: battery read failed, status skipped", self.params.name);
            return;
        };
        let elapsed = self.charging_time_elapsed(hw.timers());
        self.format_status(elapsed, battery);
        let current = self.average_current_ma();
        let title = self.params.title;

        let written = match device {
            DisplayDevice::None => Ok(()),
            DisplayDevice::Console => writeln!(
                hw.console(),
                "{} {} Battery @ {} V, {:04} mA",
                title,
                self.hms,
                self.volts,
                current
            ),
            DisplayDevice::Display => match hw.display() {
                Some(display) => display
                    .clear()
                    .and_then(|_| display.set_cursor(0, 0))
                    .and_then(|_| write!(display, "{} {}", title, self.hms))
                    .and_then(|_| display.set_cursor(0, 1))
                    .and_then(|_| write!(display, "{} V {:4} mA", self.volts, current))
                    .and_then(|_| display.switch_frame()),
                None => Ok(()),
            },
        };
        if written.is_err() {
            warn!("{}: status output failed", self.params.name);
        }
    }
}

/// Initial set-point: just under the battery so the regulator does not
/// dump current into it when switched on.
pub fn soft_start_voltage(battery_mv: MilliVolts) -> MilliVolts {
    if battery_mv > VREG_VOLTAGE_MAX {
        warn!("battery at {} mV, above regulator limit", battery_mv);
        return VREG_VOLTAGE_MAX;
    }
    battery_mv
        .saturating_sub(SOFT_START_OFFSET_MV)
        .max(VREG_VOLTAGE_MIN)
}

impl HasCycle for ChargeCycle {
    fn cycle(&self) -> &ChargeCycle {
        self
    }

    fn cycle_mut(&mut self) -> &mut ChargeCycle {
        self
    }
}

/// A bare cycle has no regulation of its own; running it stops the
/// regulator and reports `Error`.
impl<H: Hardware> ChargePhase<H> for ChargeCycle {
    fn run(&mut self, hw: &mut H) -> CycleState {
        self.terminate(hw, CycleState::Error)
    }
}
