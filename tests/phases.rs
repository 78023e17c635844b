mod common;

use common::{board, tick};
use sla_charger::alarm::AlarmPool;
use sla_charger::config::{
    ChargeParameters, FAST_PARAMS, SECOND_MS, STANDBY_PARAMS, TOPPING_PARAMS, TRICKLE_PARAMS,
    VREG_VOLTAGE_MAX, VREG_VOLTAGE_MIN,
};
use sla_charger::data_types::Rgb;
use sla_charger::{
    ChargeCycle, ChargePhase, CycleState, FastCharger, HasCycle, StandbyCharger, ToppingCharger,
    TrickleCharger,
};

#[test]
fn fast_ramps_one_step_per_tick_until_clamped() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    hw.regulator.current_ma = 100;
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();
    assert_eq!(fast.cycle().set_voltage(), 11_900);
    assert!(hw.regulator.on);

    let mut previous = fast.cycle().set_voltage();
    for _ in 0..500 {
        assert_eq!(tick(&mut fast, &mut hw), CycleState::Startup);
        let now = fast.cycle().set_voltage();
        assert_eq!(now, (previous + FAST_PARAMS.voltage_step).min(VREG_VOLTAGE_MAX));
        assert_eq!(hw.regulator.set_point, now);
        previous = now;
    }
    assert_eq!(previous, VREG_VOLTAGE_MAX);
}

#[test]
fn fast_done_only_after_startup() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 14_500);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();

    // Surface charge: target voltage already reached, but still settling.
    for _ in 0..10 {
        assert_eq!(tick(&mut fast, &mut hw), CycleState::Startup);
        assert!(hw.regulator.on);
    }

    timers.advance(FAST_PARAMS.startup_period);
    assert_eq!(tick(&mut fast, &mut hw), CycleState::Done);
    assert!(!hw.regulator.on);

    assert_eq!(tick(&mut fast, &mut hw), CycleState::Done);
    assert!(!hw.regulator.on);
}

#[test]
fn fast_backs_off_on_overcurrent() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    hw.regulator.output_mv = Some(13_000);
    hw.regulator.current_ma = 1_200;
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();

    tick(&mut fast, &mut hw);
    assert_eq!(fast.cycle().set_voltage(), 11_900 - FAST_PARAMS.voltage_step);
}

#[test]
fn fast_times_out() {
    let params = ChargeParameters {
        charge_period_max: 2 * SECOND_MS,
        startup_period: SECOND_MS,
        ..FAST_PARAMS
    };
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::with_params(params);
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();

    for _ in 0..19 {
        assert!(!tick(&mut fast, &mut hw).is_terminal());
    }
    assert_eq!(tick(&mut fast, &mut hw), CycleState::Timeout);
    assert!(!hw.regulator.on);
}

#[test]
fn topping_done_once_current_tapers() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 13_950);
    hw.regulator.output_mv = Some(14_500);
    hw.regulator.current_ma = 500;
    let mut topping = ToppingCharger::new();
    topping.init(&mut hw).unwrap();
    topping.start(&mut hw).unwrap();

    assert_eq!(tick(&mut topping, &mut hw), CycleState::Startup);
    timers.advance(TOPPING_PARAMS.startup_period);
    assert_eq!(tick(&mut topping, &mut hw), CycleState::Running);

    hw.regulator.current_ma = TOPPING_PARAMS.current_target;
    assert_eq!(tick(&mut topping, &mut hw), CycleState::Done);
    assert!(!hw.regulator.on);

    let writes = hw.regulator.writes.len();
    assert_eq!(tick(&mut topping, &mut hw), CycleState::Done);
    assert_eq!(tick(&mut topping, &mut hw), CycleState::Done);
    assert!(!hw.regulator.on);
    assert_eq!(hw.regulator.writes.len(), writes);
}

#[test]
fn topping_holds_inside_hysteresis_band() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 14_050);
    hw.regulator.output_mv = Some(14_500);
    hw.regulator.current_ma = 600;
    let mut topping = ToppingCharger::new();
    topping.init(&mut hw).unwrap();
    topping.start(&mut hw).unwrap();
    let writes = hw.regulator.writes.len();

    for _ in 0..5 {
        tick(&mut topping, &mut hw);
    }
    assert_eq!(topping.cycle().set_voltage(), 13_950);
    assert_eq!(hw.regulator.writes.len(), writes);

    hw.battery.mv = 13_800;
    tick(&mut topping, &mut hw);
    assert_eq!(topping.cycle().set_voltage(), 13_960);

    hw.battery.mv = 14_200;
    tick(&mut topping, &mut hw);
    assert_eq!(topping.cycle().set_voltage(), 13_950);
}

#[test]
fn topping_overcurrent_stops_at_regulator_floor() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 5_050);
    hw.regulator.output_mv = Some(6_000);
    hw.regulator.current_ma = 1_500;
    let mut topping = ToppingCharger::new();
    topping.init(&mut hw).unwrap();
    topping.start(&mut hw).unwrap();
    assert_eq!(topping.cycle().set_voltage(), VREG_VOLTAGE_MIN);

    for _ in 0..20 {
        tick(&mut topping, &mut hw);
        assert_eq!(topping.cycle().set_voltage(), VREG_VOLTAGE_MIN);
    }
}

#[test]
fn trickle_never_completes() {
    let params = ChargeParameters {
        charge_period_max: 60 * SECOND_MS,
        startup_period: 5 * SECOND_MS,
        ..TRICKLE_PARAMS
    };
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 13_000);
    hw.regulator.output_mv = Some(14_000);
    let mut trickle = TrickleCharger::with_params(params);
    trickle.init(&mut hw).unwrap();
    trickle.start(&mut hw).unwrap();

    let batteries = [12_000, 13_500, 14_000, 15_000, 13_000, 16_500];
    let currents = [0, 50, 1_500, 900];
    for i in 0..599 {
        hw.battery.mv = batteries[i % batteries.len()];
        hw.regulator.current_ma = currents[i % currents.len()];
        let state = tick(&mut trickle, &mut hw);
        assert!(matches!(state, CycleState::Startup | CycleState::Running), "tick {i}: {state:?}");
        let set = trickle.cycle().set_voltage();
        assert!((VREG_VOLTAGE_MIN..=VREG_VOLTAGE_MAX).contains(&set));
    }
    assert_eq!(trickle.state(), CycleState::Running);

    assert_eq!(tick(&mut trickle, &mut hw), CycleState::Timeout);
    assert!(!hw.regulator.on);
}

#[test]
fn standby_keeps_regulator_off() {
    let params = ChargeParameters {
        charge_period_max: 10 * SECOND_MS,
        ..STANDBY_PARAMS
    };
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_800);
    let mut standby = StandbyCharger::with_params(params);
    standby.init(&mut hw).unwrap();
    standby.start(&mut hw).unwrap();
    assert!(!hw.regulator.on);
    assert_eq!(standby.state(), CycleState::Running);

    for _ in 0..99 {
        hw.regulator.on = true;
        assert_eq!(tick(&mut standby, &mut hw), CycleState::Running);
        assert!(!hw.regulator.on);
    }
    hw.regulator.on = true;
    assert_eq!(tick(&mut standby, &mut hw), CycleState::Timeout);
    assert!(!hw.regulator.on);
}

#[test]
fn standby_status_layout() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_600);
    let mut standby = StandbyCharger::new();
    standby.init(&mut hw).unwrap();
    standby.start(&mut hw).unwrap();

    for _ in 0..10 {
        tick(&mut standby, &mut hw);
    }
    let display = hw.display.as_ref().unwrap();
    assert_eq!(
        display.frames.last().unwrap(),
        &vec![
            ((0, 0), "STDBY ".to_string()),
            ((64, 0), "00:00:01".to_string()),
            ((0, 2), "12.6 V".to_string()),
        ]
    );

    for _ in 0..90 {
        tick(&mut standby, &mut hw);
    }
    assert!(hw.console.contains("standby, 00:00:10, 12.6\n"));
}

#[test]
fn status_message_on_console_and_display() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();
    assert!(hw.console.contains("Starting fast charging cycle\n"));

    for _ in 0..10 {
        tick(&mut fast, &mut hw);
    }
    assert!(hw.console.contains("FAST   00:00:01 Battery @ 12.0 V, 0000 mA\n"));
    let display = hw.display.as_ref().unwrap();
    assert_eq!(
        display.frames.last().unwrap(),
        &vec![
            ((0, 0), "FAST   00:00:01".to_string()),
            ((0, 1), "12.0 V    0 mA".to_string()),
        ]
    );
}

#[test]
fn led_blinks_with_phase_duty_cycle() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();
    assert_eq!(hw.led.last(), Some(Rgb::BLUE_DARK));

    tick(&mut fast, &mut hw);
    tick(&mut fast, &mut hw);
    assert_eq!(hw.led.last(), Some(Rgb::BLUE_DARK));

    tick(&mut fast, &mut hw);
    assert_eq!(hw.led.last(), Some(Rgb::BLACK));
    assert!(!fast.cycle().led_on());

    for _ in 0..7 {
        tick(&mut fast, &mut hw);
        assert_eq!(hw.led.last(), Some(Rgb::BLACK));
    }
    tick(&mut fast, &mut hw);
    assert_eq!(hw.led.last(), Some(Rgb::BLUE_DARK));
}

#[test]
fn soft_start_is_clamped_to_regulator_range() {
    for (battery, expected) in [(20_000, VREG_VOLTAGE_MAX), (3_000, VREG_VOLTAGE_MIN), (5_050, VREG_VOLTAGE_MIN)] {
        let timers = AlarmPool::new();
        let mut hw = board(&timers, battery);
        let mut fast = FastCharger::new();
        fast.init(&mut hw).unwrap();
        fast.start(&mut hw).unwrap();
        assert_eq!(fast.cycle().set_voltage(), expected);
    }
}

#[test]
fn sensor_failure_stops_with_error() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.start(&mut hw).unwrap();

    hw.battery.fail = true;
    assert_eq!(tick(&mut fast, &mut hw), CycleState::Error);
    assert!(!hw.regulator.on);

    hw.battery.fail = false;
    assert_eq!(tick(&mut fast, &mut hw), CycleState::Error);
}

#[test]
fn run_before_start_is_an_error() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    hw.regulator.on = true;

    assert_eq!(tick(&mut fast, &mut hw), CycleState::Error);
    assert!(!hw.regulator.on);
}

#[test]
fn start_without_init_fails() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    assert_eq!(fast.start(&mut hw), Err(sla_charger::Error::NotInitialized));
    assert!(!hw.regulator.on);
}

#[test]
fn bare_cycle_run_reports_error() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut cycle = ChargeCycle::new(FAST_PARAMS);
    cycle.init(FAST_PARAMS, &mut hw).unwrap();
    cycle.start(&mut hw).unwrap();
    assert!(hw.regulator.on);

    assert_eq!(tick(&mut cycle, &mut hw), CycleState::Error);
    assert!(!hw.regulator.on);
}

#[test]
fn init_is_idempotent_and_claims_one_alarm() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    hw.regulator.on = true;
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    fast.init(&mut hw).unwrap();

    assert_eq!(timers.len(), 1);
    assert_eq!(fast.state(), CycleState::Init);
    assert_eq!(fast.cycle().set_voltage(), VREG_VOLTAGE_MIN);
    assert!(!hw.regulator.on);
}

#[test]
fn restart_reuses_the_alarm_slot() {
    let timers = AlarmPool::new();
    let mut hw = board(&timers, 12_000);
    let mut fast = FastCharger::new();
    fast.init(&mut hw).unwrap();
    for _ in 0..20 {
        fast.start(&mut hw).unwrap();
        tick(&mut fast, &mut hw);
    }
    assert_eq!(timers.len(), 1);
    assert_eq!(fast.cycle().charging_time_remaining(&timers), FAST_PARAMS.charge_period_max - 100);
}
