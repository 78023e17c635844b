#![allow(dead_code)]

use std::fmt;

use sla_charger::alarm::AlarmPool;
use sla_charger::config::{VREG_VOLTAGE_MAX, VREG_VOLTAGE_MIN};
use sla_charger::data_types::Rgb;
use sla_charger::hal::{Battery, Board, Display, Regulator, StatusLed};
use sla_charger::phase::ChargePhase;
use sla_charger::CycleState;

/// Regulator double: records set-points, reports a scripted current.
#[derive(Debug, Default)]
pub struct FakeRegulator {
    pub set_point: u32,
    pub on: bool,
    pub current_ma: u32,
    /// Output voltage reported while on; the set-point when `None`.
    pub output_mv: Option<u32>,
    pub writes: Vec<u32>,
    pub fail: bool,
}

impl Regulator for FakeRegulator {
    type Error = ();

    fn voltage_mv(&mut self) -> Result<u32, ()> {
        if self.fail {
            return Err(());
        }
        Ok(if self.on { self.output_mv.unwrap_or(self.set_point) } else { 0 })
    }

    fn set_voltage_mv(&mut self, mv: u32) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.set_point = mv.clamp(VREG_VOLTAGE_MIN, VREG_VOLTAGE_MAX);
        self.writes.push(self.set_point);
        Ok(())
    }

    fn current_ma(&mut self) -> Result<u32, ()> {
        if self.fail {
            return Err(());
        }
        Ok(self.current_ma)
    }

    fn on(&mut self) -> Result<(), ()> {
        self.on = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), ()> {
        self.on = false;
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

#[derive(Debug, Default)]
pub struct FakeBattery {
    pub mv: u32,
    pub fail: bool,
}

impl Battery for FakeBattery {
    type Error = ();

    fn voltage_mv(&mut self) -> Result<u32, ()> {
        if self.fail { Err(()) } else { Ok(self.mv) }
    }
}

#[derive(Debug, Default)]
pub struct FakeLed {
    pub colors: Vec<Rgb>,
}

impl FakeLed {
    pub fn last(&self) -> Option<Rgb> {
        self.colors.last().copied()
    }
}

impl StatusLed for FakeLed {
    fn set_color(&mut self, color: Rgb) {
        self.colors.push(color);
    }
}

/// Display double: each shown frame is the text written since the last clear,
/// one entry per cursor position.
#[derive(Debug, Default)]
pub struct FakeDisplay {
    pub pending: Vec<((u8, u8), String)>,
    pub frames: Vec<Vec<((u8, u8), String)>>,
}

impl fmt::Write for FakeDisplay {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.pending.last_mut() {
            Some((_, text)) => text.push_str(s),
            None => self.pending.push(((0, 0), s.into())),
        }
        Ok(())
    }
}

impl Display for FakeDisplay {
    fn clear(&mut self) -> fmt::Result {
        self.pending.clear();
        Ok(())
    }

    fn set_cursor(&mut self, x: u8, y: u8) -> fmt::Result {
        self.pending.push(((x, y), String::new()));
        Ok(())
    }

    fn switch_frame(&mut self) -> fmt::Result {
        self.frames.push(self.pending.clone());
        Ok(())
    }
}

pub type TestBoard<'a> = Board<'a, FakeRegulator, FakeBattery, FakeLed, FakeDisplay, String>;

pub fn board(timers: &AlarmPool, battery_mv: u32) -> TestBoard<'_> {
    Board {
        regulator: FakeRegulator::default(),
        battery: FakeBattery {
            mv: battery_mv,
            fail: false,
        },
        led: FakeLed::default(),
        display: Some(FakeDisplay::default()),
        console: String::new(),
        timers,
    }
}

/// Let one supervisor period pass, then run the phase.
pub fn tick<'t, P: ChargePhase<TestBoard<'t>>>(phase: &mut P, hw: &mut TestBoard<'t>) -> CycleState {
    hw.timers.advance(100);
    phase.run(hw)
}
