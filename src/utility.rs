//! Fixed-width formatting of elapsed times and milli-unit readings.

use core::fmt::Write;

use heapless::String;

use crate::config::{HOUR_MS, MINUTE_MS, SECOND_MS};
use crate::data_types::TimeMs;

/// Buffer for [`ms_to_hms_str`]; the longest output is `"1193:02"`.
pub type HmsString = String<9>;
/// Buffer for [`milliunits_to_string`].
pub type MilliString = String<12>;

/// A duration split into hours, minutes and seconds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Hms {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

pub fn ms_to_hms(ms: TimeMs) -> Hms {
    Hms {
        hours: ms / HOUR_MS,
        minutes: (ms % HOUR_MS) / MINUTE_MS,
        seconds: (ms % MINUTE_MS) / SECOND_MS,
    }
}

/// `HH:MM:SS`, or `HHH:MM` from 100 hours on so the field stays narrow.
pub fn ms_to_hms_str(ms: TimeMs) -> HmsString {
    let hms = ms_to_hms(ms);
    let mut out = HmsString::new();
    // Every u32 duration fits the buffer.
    let _ = if hms.hours < 100 {
        write!(out, "{:02}:{:02}:{:02}", hms.hours, hms.minutes, hms.seconds)
    } else {
        write!(out, "{:03}:{:02}", hms.hours, hms.minutes)
    };
    out
}

/// Format a milli-unit value (mV, mA) as units with `decimals` places,
/// rounding half up: `13450` with one decimal gives `"13.5"`.
///
/// `decimals` is capped at 3.
pub fn milliunits_to_string(value: u32, decimals: u8) -> MilliString {
    let decimals = decimals.min(3) as u32;
    let divisor = 10u64.pow(3 - decimals);
    let rounded = (value as u64 + divisor / 2) / divisor;
    let scale = 10u64.pow(decimals);

    let mut out = MilliString::new();
    let _ = if decimals == 0 {
        write!(out, "{}", rounded)
    } else {
        write!(
            out,
            "{}.{:0width$}",
            rounded / scale,
            rounded % scale,
            width = decimals as usize
        )
    };
    out
}
