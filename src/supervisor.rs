//! Top-level charger state machine: picks the phase to run and moves between
//! phases on their terminal states.

use core::fmt::Write;

use crate::config::{BATTERY_DISCHARGED_MV, LOOP_DELAY_MS};
use crate::data_types::{ChargerState, CycleState, TimeMs};
use crate::error::Error;
use crate::hal::{Battery, Hardware, Regulator};
use crate::phase::{ChargePhase, FastCharger, HasCycle, StandbyCharger, ToppingCharger, TrickleCharger};
use crate::utility::milliunits_to_string;

/// The four charging phases, one instance each for the program lifetime.
pub struct Phases {
    pub fast: FastCharger,
    pub topping: ToppingCharger,
    pub trickle: TrickleCharger,
    pub standby: StandbyCharger,
}

impl Phases {
    pub const fn new() -> Self {
        Self {
            fast: FastCharger::new(),
            topping: ToppingCharger::new(),
            trickle: TrickleCharger::new(),
            standby: StandbyCharger::new(),
        }
    }

    /// The phase that runs in `state`, if any.
    pub fn get_mut<H: Hardware>(&mut self, state: ChargerState) -> Option<&mut dyn ChargePhase<H>> {
        match state {
            ChargerState::Fast => Some(&mut self.fast),
            ChargerState::Topping => Some(&mut self.topping),
            ChargerState::Trickle => Some(&mut self.trickle),
            ChargerState::Standby => Some(&mut self.standby),
            _ => None,
        }
    }

    pub fn get<H: Hardware>(&self, state: ChargerState) -> Option<&dyn ChargePhase<H>> {
        match state {
            ChargerState::Fast => Some(&self.fast),
            ChargerState::Topping => Some(&self.topping),
            ChargerState::Trickle => Some(&self.trickle),
            ChargerState::Standby => Some(&self.standby),
            _ => None,
        }
    }
}

impl Default for Phases {
    fn default() -> Self {
        Self::new()
    }
}

/// Charger supervisor owning the hardware and every phase.
pub struct Charger<H: Hardware> {
    hw: H,
    phases: Phases,
    state: ChargerState,
    halted: bool,
    last_poll: Option<TimeMs>,
}

impl<H: Hardware> Charger<H> {
    /// Supervisor with the stock phase parameters.
    pub fn new(hw: H) -> Self {
        Self::with_phases(hw, Phases::new())
    }

    pub fn with_phases(hw: H, phases: Phases) -> Self {
        Self {
            hw,
            phases,
            state: ChargerState::Startup,
            halted: false,
            last_poll: None,
        }
    }

    /// Register every phase: regulator off, one alarm slot per phase.
    pub fn init(&mut self) -> Result<(), Error> {
        for state in [
            ChargerState::Fast,
            ChargerState::Topping,
            ChargerState::Trickle,
            ChargerState::Standby,
        ] {
            if let Some(phase) = self.phases.get_mut::<H>(state) {
                phase.init(&mut self.hw)?;
            }
        }
        self.state = ChargerState::Startup;
        self.halted = false;
        info!("charger initialized");
        Ok(())
    }

    pub fn state(&self) -> ChargerState {
        self.state
    }

    /// True after a fatal state; only [`Charger::init`] clears it.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn phases(&self) -> &Phases {
        &self.phases
    }

    /// Cycle state of the phase running in `state`.
    pub fn phase_state(&self, state: ChargerState) -> Option<CycleState> {
        self.phases.get::<H>(state).map(|phase| phase.state())
    }

    /// Force the supervisor into `state`, e.g. from a menu selection.
    ///
    /// Any running phase is stopped first. A charging phase is started
    /// fresh, so a failed start leaves the charger in `Shutdown`; other
    /// states take effect on the next poll.
    pub fn select(&mut self, state: ChargerState) -> ChargerState {
        if let Some(phase) = self.phases.get_mut::<H>(self.state) {
            phase.stop(&mut self.hw);
        }
        info!("charger state {} selected", state);
        self.enter(state)
    }

    /// Run [`Charger::poll`] once every `LOOP_DELAY_MS`; `None` between polls.
    pub fn poll_if_due(&mut self) -> Result<Option<ChargerState>, Error> {
        let now = self.hw.timers().millis();
        if let Some(last) = self.last_poll {
            if now.wrapping_sub(last) < LOOP_DELAY_MS {
                return Ok(None);
            }
        }
        self.last_poll = Some(now);
        self.poll().map(Some)
    }

    /// One supervisor step. Returns the state after the step.
    ///
    /// A state the charger cannot run switches the regulator off and halts
    /// the supervisor: this and every later poll return
    /// `Err(Error::InvalidState)`.
    pub fn poll(&mut self) -> Result<ChargerState, Error> {
        if self.halted {
            return Err(Error::InvalidState(self.state));
        }

        match self.state {
            ChargerState::Startup => {
                let Ok(battery) = self.hw.battery().voltage_mv() else {
                    error!("battery read failed at startup");
                    return Ok(self.shutdown());
                };
                let next = if battery <= BATTERY_DISCHARGED_MV {
                    ChargerState::Fast
                } else {
                    ChargerState::Topping
                };
                self.console(format_args!(
                    "Battery @ {} V, starting {} charge",
                    milliunits_to_string(battery, 2),
                    next
                ));
                Ok(self.enter(next))
            }
            state @ (ChargerState::Fast
            | ChargerState::Topping
            | ChargerState::Trickle
            | ChargerState::Standby) => {
                let Some(phase) = self.phases.get_mut::<H>(state) else {
                    return Err(self.fatal(state));
                };
                let result = phase.run(&mut self.hw);
                self.advance(state, result)
            }
            ChargerState::Shutdown => Ok(ChargerState::Shutdown),
            ChargerState::LoadTest => {
                debug!("load test not implemented, idling");
                Ok(ChargerState::LoadTest)
            }
            state @ (ChargerState::Menu | ChargerState::Condition) => Err(self.fatal(state)),
        }
    }

    /// Halt for good: regulator off, then spin.
    pub fn halt(&mut self) -> ! {
        if self.hw.regulator().off().is_err() {
            error!("regulator did not switch off while halting");
        }
        self.halted = true;
        loop {
            core::hint::spin_loop();
        }
    }

    fn advance(&mut self, from: ChargerState, result: CycleState) -> Result<ChargerState, Error> {
        use ChargerState::*;

        let next = match (from, result) {
            (_, CycleState::Startup | CycleState::Running) => return Ok(from),
            (Fast, CycleState::Done) => Topping,
            (Topping, CycleState::Done) => Trickle,
            (Trickle, CycleState::Done | CycleState::Timeout) => Standby,
            (Standby, CycleState::Timeout) => {
                let Ok(battery) = self.hw.battery().voltage_mv() else {
                    error!("battery read failed after standby");
                    return Ok(self.shutdown());
                };
                if battery <= BATTERY_DISCHARGED_MV {
                    Fast
                } else {
                    Trickle
                }
            }
            (Standby, CycleState::Done | CycleState::Init) => return Err(self.fatal(from)),
            (_, CycleState::Timeout) => {
                self.console(format_args!("{} charging cycle timed out", from));
                Shutdown
            }
            (_, CycleState::Error | CycleState::Init) => {
                self.console(format_args!("{} charging cycle aborted by error", from));
                Shutdown
            }
            (_, CycleState::Done) => Shutdown,
        };

        if next == Shutdown {
            return Ok(self.shutdown());
        }
        self.console(format_args!("{} charging cycle {}, starting {}", from, result, next));
        Ok(self.enter(next))
    }

    fn enter(&mut self, next: ChargerState) -> ChargerState {
        let Some(phase) = self.phases.get_mut::<H>(next) else {
            self.state = next;
            return next;
        };
        match phase.start(&mut self.hw) {
            Ok(()) => {
                info!("charger {} -> {}", self.state, next);
                self.state = next;
                next
            }
            Err(e) => {
                error!("starting {} failed: {}", next, e);
                self.shutdown()
            }
        }
    }

    fn shutdown(&mut self) -> ChargerState {
        if self.hw.regulator().off().is_err() {
            error!("regulator did not switch off at shutdown");
        }
        warn!("charger shut down");
        self.console(format_args!("Charger shut down"));
        self.state = ChargerState::Shutdown;
        ChargerState::Shutdown
    }

    fn fatal(&mut self, state: ChargerState) -> Error {
        error!("invalid charger state {}, halting", state);
        if self.hw.regulator().off().is_err() {
            error!("regulator did not switch off while halting");
        }
        self.halted = true;
        self.state = state;
        Error::InvalidState(state)
    }

    fn console(&mut self, args: core::fmt::Arguments<'_>) {
        if writeln!(self.hw.console(), "{}", args).is_err() {
            warn!("console write failed");
        }
    }
}
