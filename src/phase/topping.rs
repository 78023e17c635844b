use crate::config::{ChargeParameters, TOPPING_PARAMS};
use crate::cycle::ChargeCycle;
use crate::data_types::CycleState;
use crate::hal::Hardware;
use crate::phase::{ChargePhase, HasCycle};

/// Absorption charge at constant voltage, done once the current tapers to
/// the target.
pub struct ToppingCharger {
    cycle: ChargeCycle,
}

impl ToppingCharger {
    pub const fn new() -> Self {
        Self::with_params(TOPPING_PARAMS)
    }

    pub const fn with_params(params: ChargeParameters) -> Self {
        Self {
            cycle: ChargeCycle::new(params),
        }
    }
}

impl Default for ToppingCharger {
    fn default() -> Self {
        Self::new()
    }
}

impl HasCycle for ToppingCharger {
    fn cycle(&self) -> &ChargeCycle {
        &self.cycle
    }

    fn cycle_mut(&mut self) -> &mut ChargeCycle {
        &mut self.cycle
    }
}

impl<H: Hardware> ChargePhase<H> for ToppingCharger {
    fn run(&mut self, hw: &mut H) -> CycleState {
        let cycle = &mut self.cycle;
        let readings = match cycle.begin_run(hw) {
            Ok(readings) => readings,
            Err(state) => return state,
        };

        if cycle.state() != CycleState::Startup
            && readings.current_ma <= cycle.params().current_target
        {
            return cycle.terminate(hw, CycleState::Done);
        }

        let previous = cycle.set_voltage();
        cycle.hold_voltage(readings);
        if cycle.set_voltage() != previous {
            if let Err(state) = cycle.apply_set_voltage(hw) {
                return state;
            }
        }
        cycle.end_run(hw)
    }
}
