//! Millisecond countdown alarms driven by a periodic tick.
//!
//! The pool is meant to live in a `static`: the main loop allocates and reads
//! alarms while a 1 kHz timer interrupt calls [`AlarmPool::dec`]. Countdowns are
//! plain atomic loads and stores so no compare-and-swap support is needed;
//! read-modify-write sequences run inside a critical section.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use critical_section::Mutex;

use crate::data_types::TimeMs;
use crate::error::Error;

/// Number of alarm slots in a pool.
pub const ALARM_POOL_SIZE: usize = 16;

/// What to do with an alarm after its callback ran.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlarmAction {
    /// Leave the alarm expired.
    Stop,
    /// Reload the alarm with its period.
    Restart,
}

/// Called from the tick context when an alarm reaches zero.
pub type AlarmCallback = fn(AlarmId) -> AlarmAction;

/// Handle to an allocated alarm, 1-based.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct AlarmId(u8);

impl AlarmId {
    /// Raw id in `1..=ALARM_POOL_SIZE`.
    pub const fn raw(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

struct Alarm {
    period: AtomicU32,
    timer: AtomicU32,
    callback: Mutex<Cell<Option<AlarmCallback>>>,
}

impl Alarm {
    const EMPTY: Alarm = Alarm {
        period: AtomicU32::new(0),
        timer: AtomicU32::new(0),
        callback: Mutex::new(Cell::new(None)),
    };
}

/// Fixed pool of countdown alarms.
///
/// Slots are never returned to the pool; owners keep their [`AlarmId`] and
/// re-arm it with [`AlarmPool::set`].
pub struct AlarmPool {
    alarms: [Alarm; ALARM_POOL_SIZE],
    entries: AtomicUsize,
    uptime: AtomicU32,
}

impl Default for AlarmPool {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmPool {
    pub const fn new() -> Self {
        Self {
            alarms: [Alarm::EMPTY; ALARM_POOL_SIZE],
            entries: AtomicUsize::new(0),
            uptime: AtomicU32::new(0),
        }
    }

    /// Allocate an alarm that expires after `period` ms.
    ///
    /// Call from the main context only; the tick handler never allocates.
    pub fn add(&self, period: TimeMs, callback: Option<AlarmCallback>) -> Result<AlarmId, Error> {
        let index = self.entries.load(Ordering::Acquire);
        if index >= ALARM_POOL_SIZE {
            warn!("alarm pool exhausted ({} slots)", ALARM_POOL_SIZE);
            return Err(Error::AlarmPoolExhausted);
        }
        let alarm = &self.alarms[index];
        alarm.period.store(period, Ordering::Relaxed);
        alarm.timer.store(period, Ordering::Relaxed);
        critical_section::with(|cs| alarm.callback.borrow(cs).set(callback));
        // Publish only after the slot is fully written so `dec` never sees
        // a half-initialized entry.
        self.entries.store(index + 1, Ordering::Release);
        Ok(AlarmId(index as u8 + 1))
    }

    /// Remaining time, 0 once expired or for an id this pool never issued.
    pub fn get(&self, id: AlarmId) -> TimeMs {
        self.slot(id)
            .map(|alarm| alarm.timer.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Time since the alarm was last armed.
    pub fn elapsed(&self, id: AlarmId) -> TimeMs {
        self.slot(id)
            .map(|alarm| {
                critical_section::with(|_| {
                    let period = alarm.period.load(Ordering::Relaxed);
                    period.saturating_sub(alarm.timer.load(Ordering::Relaxed))
                })
            })
            .unwrap_or(0)
    }

    /// Re-arm an alarm with a new period.
    pub fn set(&self, id: AlarmId, period: TimeMs) -> Result<(), Error> {
        let alarm = self.slot(id).ok_or(Error::NotInitialized)?;
        critical_section::with(|_| {
            alarm.timer.store(period, Ordering::Relaxed);
            alarm.period.store(period, Ordering::Relaxed);
        });
        Ok(())
    }

    /// Stop an alarm without running its callback.
    pub fn cancel(&self, id: AlarmId) -> Result<(), Error> {
        let alarm = self.slot(id).ok_or(Error::NotInitialized)?;
        alarm.timer.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// Number of allocated alarms.
    pub fn len(&self) -> usize {
        self.entries.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Milliseconds counted by [`AlarmPool::dec`] since the pool was created.
    pub fn millis(&self) -> TimeMs {
        self.uptime.load(Ordering::Relaxed)
    }

    /// One millisecond tick: advance uptime and count every armed alarm down.
    ///
    /// Intended for the timer interrupt. Callbacks run here, outside the
    /// critical section.
    pub fn dec(&self) {
        let uptime = self.uptime.load(Ordering::Relaxed);
        self.uptime.store(uptime.wrapping_add(1), Ordering::Relaxed);

        let entries = self.entries.load(Ordering::Acquire);
        for (index, alarm) in self.alarms[..entries].iter().enumerate() {
            let callback = critical_section::with(|cs| {
                let timer = alarm.timer.load(Ordering::Relaxed);
                if timer == 0 {
                    return None;
                }
                alarm.timer.store(timer - 1, Ordering::Relaxed);
                if timer == 1 { alarm.callback.borrow(cs).get() } else { None }
            });

            if let Some(callback) = callback {
                let id = AlarmId(index as u8 + 1);
                if callback(id) == AlarmAction::Restart {
                    let period = alarm.period.load(Ordering::Relaxed);
                    alarm.timer.store(period, Ordering::Relaxed);
                }
            }
        }
    }

    /// Advance `ms` ticks.
    pub fn advance(&self, ms: TimeMs) {
        for _ in 0..ms {
            self.dec();
        }
    }

    fn slot(&self, id: AlarmId) -> Option<&Alarm> {
        if id.0 == 0 || id.index() >= self.len() {
            return None;
        }
        Some(&self.alarms[id.index()])
    }
}
