use sla_charger::config::HOUR_MS;
use sla_charger::utility::{Hms, milliunits_to_string, ms_to_hms, ms_to_hms_str};

#[test]
fn hms_split() {
    assert_eq!(
        ms_to_hms(3_661_000),
        Hms {
            hours: 1,
            minutes: 1,
            seconds: 1
        }
    );
}

#[test]
fn hms_string_switches_width_at_100_hours() {
    assert_eq!(ms_to_hms_str(3_661_000).as_str(), "01:01:01");
    assert_eq!(ms_to_hms_str(0).as_str(), "00:00:00");
    assert_eq!(ms_to_hms_str(99 * HOUR_MS + 59 * 60_000 + 59_999).as_str(), "99:59:59");
    assert_eq!(ms_to_hms_str(100 * HOUR_MS + 5 * 60_000).as_str(), "100:05");
    assert_eq!(ms_to_hms_str(u32::MAX).as_str(), "1193:02");
}

#[test]
fn milliunits_round_half_up() {
    assert_eq!(milliunits_to_string(13_450, 1).as_str(), "13.5");
    assert_eq!(milliunits_to_string(13_440, 1).as_str(), "13.4");
    assert_eq!(milliunits_to_string(12_995, 2).as_str(), "13.00");
    assert_eq!(milliunits_to_string(500, 0).as_str(), "1");
    assert_eq!(milliunits_to_string(7, 3).as_str(), "0.007");
    assert_eq!(milliunits_to_string(7, 9).as_str(), "0.007");
}
