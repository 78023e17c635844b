use crate::config::{ChargeParameters, TRICKLE_PARAMS};
use crate::cycle::ChargeCycle;
use crate::data_types::CycleState;
use crate::hal::Hardware;
use crate::phase::{ChargePhase, HasCycle};

/// Float charge at constant voltage. Never completes on its own; the charge
/// alarm running out is the normal end.
pub struct TrickleCharger {
    cycle: ChargeCycle,
}

impl TrickleCharger {
    pub const fn new() -> Self {
        Self::with_params(TRICKLE_PARAMS)
    }

    pub const fn with_params(params: ChargeParameters) -> Self {
        Self {
            cycle: ChargeCycle::new(params),
        }
    }
}

impl Default for TrickleCharger {
    fn default() -> Self {
        Self::new()
    }
}

impl HasCycle for TrickleCharger {
    fn cycle(&self) -> &ChargeCycle {
        &self.cycle
    }

    fn cycle_mut(&mut self) -> &mut ChargeCycle {
        &mut self.cycle
    }
}

impl<H: Hardware> ChargePhase<H> for TrickleCharger {
    fn run(&mut self, hw: &mut H) -> CycleState {
        let cycle = &mut self.cycle;
        let readings = match cycle.begin_run(hw) {
            Ok(readings) => readings,
            Err(state) => return state,
        };

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
