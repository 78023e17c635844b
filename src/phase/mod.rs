//! Charging phases and the lifecycle interface the supervisor drives them
//! through.

mod fast;
mod standby;
mod topping;
mod trickle;

pub use fast::FastCharger;
pub use standby::StandbyCharger;
pub use topping::ToppingCharger;
pub use trickle::TrickleCharger;

use crate::cycle::ChargeCycle;
use crate::data_types::CycleState;
use crate::error::Error;
use crate::hal::Hardware;

/// Access to the [`ChargeCycle`] a phase drives.
pub trait HasCycle {
    fn cycle(&self) -> &ChargeCycle;

    fn cycle_mut(&mut self) -> &mut ChargeCycle;

    fn state(&self) -> CycleState {
        self.cycle().state()
    }
}

/// Lifecycle of one charging phase.
///
/// Only `run` is phase-specific; the rest defaults to the shared
/// [`ChargeCycle`] behaviour.
pub trait ChargePhase<H: Hardware>: HasCycle {
    /// Reload the phase parameters and claim the phase's alarm slot.
    fn init(&mut self, hw: &mut H) -> Result<(), Error> {
        let params = *self.cycle().params();
        self.cycle_mut().init(params, hw)
    }

    fn start(&mut self, hw: &mut H) -> Result<(), Error> {
        self.cycle_mut().start(hw)
    }

    /// One control tick, called every `LOOP_DELAY_MS`.
    fn run(&mut self, hw: &mut H) -> CycleState;

    fn stop(&mut self, hw: &mut H) {
        self.cycle_mut().stop(hw)
    }
}
