use std::sync::atomic::{AtomicU32, Ordering};

use sla_charger::alarm::{ALARM_POOL_SIZE, AlarmAction, AlarmId, AlarmPool};
use sla_charger::Error;

#[test]
fn ids_are_one_based_and_pool_is_bounded() {
    let pool = AlarmPool::new();
    for expected in 1..=ALARM_POOL_SIZE {
        let id = pool.add(1_000, None).unwrap();
        assert_eq!(id.raw() as usize, expected);
    }
    assert_eq!(pool.len(), ALARM_POOL_SIZE);
    assert_eq!(pool.add(1_000, None), Err(Error::AlarmPoolExhausted));
}

#[test]
fn countdown_and_elapsed() {
    let pool = AlarmPool::new();
    let id = pool.add(250, None).unwrap();
    assert_eq!(pool.get(id), 250);
    assert_eq!(pool.elapsed(id), 0);

    pool.advance(100);
    assert_eq!(pool.get(id), 150);
    assert_eq!(pool.elapsed(id), 100);
    assert_eq!(pool.millis(), 100);

    pool.advance(500);
    assert_eq!(pool.get(id), 0);
    assert_eq!(pool.elapsed(id), 250);
    assert_eq!(pool.millis(), 600);
}

#[test]
fn set_rearms_and_cancel_stops() {
    let pool = AlarmPool::new();
    let id = pool.add(0, None).unwrap();
    assert_eq!(pool.get(id), 0);

    pool.set(id, 1_000).unwrap();
    pool.advance(10);
    assert_eq!(pool.get(id), 990);

    pool.cancel(id).unwrap();
    pool.advance(10);
    assert_eq!(pool.get(id), 0);
}

#[test]
fn foreign_id_is_rejected() {
    let other = AlarmPool::new();
    other.add(10, None).unwrap();
    let id = other.add(10, None).unwrap();

    let pool = AlarmPool::new();
    pool.add(10, None).unwrap();
    assert_eq!(pool.get(id), 0);
    assert_eq!(pool.set(id, 5), Err(Error::NotInitialized));
}

static FIRED: AtomicU32 = AtomicU32::new(0);

fn restart(_id: AlarmId) -> AlarmAction {
    FIRED.fetch_add(1, Ordering::Relaxed);
    AlarmAction::Restart
}

static ONESHOT: AtomicU32 = AtomicU32::new(0);

fn once(_id: AlarmId) -> AlarmAction {
    ONESHOT.fetch_add(1, Ordering::Relaxed);
    AlarmAction::Stop
}

#[test]
fn callbacks_fire_on_expiry() {
    let pool = AlarmPool::new();
    let periodic = pool.add(10, Some(restart)).unwrap();
    let oneshot = pool.add(15, Some(once)).unwrap();

    pool.advance(9);
    assert_eq!(FIRED.load(Ordering::Relaxed), 0);
    pool.advance(1);
    assert_eq!(FIRED.load(Ordering::Relaxed), 1);
    assert_eq!(pool.get(periodic), 10);

    pool.advance(30);
    assert_eq!(FIRED.load(Ordering::Relaxed), 4);
    assert_eq!(ONESHOT.load(Ordering::Relaxed), 1);
    assert_eq!(pool.get(oneshot), 0);
}
