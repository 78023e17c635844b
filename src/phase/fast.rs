use crate::config::{ChargeParameters, FAST_PARAMS};
use crate::cycle::ChargeCycle;
use crate::data_types::CycleState;
use crate::hal::Hardware;
use crate::phase::{ChargePhase, HasCycle};

/// Bulk charge: ramp the set-point to hold the target current until the
/// battery reaches the target voltage.
pub struct FastCharger {
    cycle: ChargeCycle,
}

impl FastCharger {
    pub const fn new() -> Self {
        Self::with_params(FAST_PARAMS)
    }

    pub const fn with_params(params: ChargeParameters) -> Self {
        Self {
            cycle: ChargeCycle::new(params),
        }
    }
}

impl Default for FastCharger {
    fn default() -> Self {
        Self::new()
    }
}

impl HasCycle for FastCharger {
    fn cycle(&self) -> &ChargeCycle {
        &self.cycle
    }

    fn cycle_mut(&mut self) -> &mut ChargeCycle {
        &mut self.cycle
    }
}

impl<H: Hardware> ChargePhase<H> for FastCharger {
    fn run(&mut self, hw: &mut H) -> CycleState {
        let cycle = &mut self.cycle;
        let readings = match cycle.begin_run(hw) {
            Ok(readings) => readings,
            Err(state) => return state,
        };
        let params = *cycle.params();

        // Surface charge reads high right after start, so the voltage target
        // only counts once settled.
        if cycle.state() != CycleState::Startup && readings.battery_mv >= params.voltage_target {
            return cycle.terminate(hw, CycleState::Done);
        }

        if readings.current_ma > params.current_max {
            cycle.step_down();
        } else if readings.current_ma < params.current_target {
            if readings.battery_mv < params.voltage_target {
                cycle.step_up();
            } else {
                cycle.step_down();
            }
        }

        if let Err(state) = cycle.apply_set_voltage(hw) {
            return state;
        }
        cycle.end_run(hw)
    }
}
