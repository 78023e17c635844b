//! Sealed lead-acid battery charger core.
//!
//! Sequences a battery through fast, topping, trickle and standby phases by
//! stepping the set-point of a DAC-trimmed voltage regulator, with a
//! supervisor choosing the next phase from each phase's result. `no_std`,
//! blocking I2C via `embedded-hal` 1.0, optional `defmt` or `log` output.

#![no_std]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod config;
pub mod cycle;
pub mod data_types;
pub mod error;
pub mod hal;
pub mod ina219;
pub mod mcp4726;
pub mod phase;
pub mod registers;
pub mod ring_buffer;
pub mod supervisor;
pub mod utility;
pub mod vreg;

pub use alarm::{AlarmId, AlarmPool};
pub use cycle::ChargeCycle;
pub use data_types::{ChargerState, CycleState};
pub use error::{DeviceError, Error};
pub use phase::{ChargePhase, FastCharger, HasCycle, StandbyCharger, ToppingCharger, TrickleCharger};
pub use supervisor::Charger;
pub use vreg::Vreg;
