use core::fmt::Write;

use crate::config::{ChargeParameters, STANDBY_PARAMS};
use crate::cycle::ChargeCycle;
use crate::data_types::{CycleState, DisplayDevice};
use crate::error::Error;
use crate::hal::{Battery, Display, Hardware, Regulator};
use crate::phase::{ChargePhase, HasCycle};

/// Rest between charges: regulator held off while the charge alarm counts
/// the idle period down. The alarm running out is the normal end.
pub struct StandbyCharger {
    cycle: ChargeCycle,
}

impl StandbyCharger {
    pub const fn new() -> Self {
        Self::with_params(STANDBY_PARAMS)
    }

    pub const fn with_params(params: ChargeParameters) -> Self {
        Self {
            cycle: ChargeCycle::new(params),
        }
    }

    /// Standby status.
    ///
    /// ```text
    /// console:  standby, 12:00:00, 13.1
    /// display:  STDBY    12:00:00
    ///           13.1 V
    /// ```
    pub fn status_message<H: Hardware>(&mut self, device: DisplayDevice, hw: &mut H) {
        let cycle = &mut self.cycle;
        let Ok(battery) = hw.battery().average_voltage_mv() else {
            warn!("standby: battery read failed, status skipped");
            return;
        };
        let elapsed = cycle.charging_time_elapsed(hw.timers());
        cycle.format_status(elapsed, battery);
        let params = cycle.params();

        let written = match device {
            DisplayDevice::None => Ok(()),
            DisplayDevice::Console => writeln!(
                hw.console(),
                "{}, {}, {}",
                params.name,
                cycle.hms_str(),
                cycle.volts_str()
            ),
            DisplayDevice::Display => match hw.display() {
                Some(display) => display
                    .clear()
                    .and_then(|_| display.set_cursor(0, 0))
                    .and_then(|_| display.write_str(params.title))
                    .and_then(|_| display.set_cursor(64, 0))
                    .and_then(|_| display.write_str(cycle.hms_str()))
                    .and_then(|_| display.set_cursor(0, 2))
                    .and_then(|_| write!(display, "{} V", cycle.volts_str()))
                    .and_then(|_| display.switch_frame()),
                None => {
                    warn!("standby: display status requested without a display");
                    Ok(())
                }
            },
        };
        if written.is_err() {
            warn!("standby: status output failed");
        }
    }
}

impl Default for StandbyCharger {
    fn default() -> Self {
        Self::new()
    }
}

impl HasCycle for StandbyCharger {
    fn cycle(&self) -> &ChargeCycle {
        &self.cycle
    }

    fn cycle_mut(&mut self) -> &mut ChargeCycle {
        &mut self.cycle
    }
}

impl<H: Hardware> ChargePhase<H> for StandbyCharger {
    /// Arm the idle countdown; the regulator is never switched on.
    fn start(&mut self, hw: &mut H) -> Result<(), Error> {
        self.cycle.arm(hw)?;
        if hw.regulator().off().is_err() {
            self.cycle.terminate(hw, CycleState::Error);
            return Err(Error::Hardware);
        }
        self.cycle.update_startup_state(hw.timers());
        Ok(())
    }

    fn run(&mut self, hw: &mut H) -> CycleState {
        let state = self.cycle.state();
        if state == CycleState::Init {
            warn!("standby: run before start");
            return self.cycle.terminate(hw, CycleState::Error);
        }
        if state.is_terminal() {
            self.cycle.stop(hw);
            return state;
        }

        // Standby parameters carry no settling period, so this is Running.
        self.cycle.update_startup_state(hw.timers());

        if hw.regulator().off().is_err() {
            error!("standby: regulator did not switch off");
            return self.cycle.terminate(hw, CycleState::Error);
        }

        if self.cycle.timed_out(hw.timers()) {
            info!("standby: idle period over");
            return self.cycle.terminate(hw, CycleState::Timeout);
        }

        self.cycle.status_led(hw);
        let now = hw.timers().millis();
        if hw.display().is_some() && self.cycle.status_due(DisplayDevice::Display, now) {
            self.status_message(DisplayDevice::Display, hw);
        }
        if self.cycle.status_due(DisplayDevice::Console, now) {
            self.status_message(DisplayDevice::Console, hw);
        }
        self.cycle.state()
    }
}
