// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::InputError;
use crate::schedule::ScheduleKind;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    seconds = { "30s", "*/30 * * * * *" },
    seconds_promoted = { "90s", "*/2 * * * *" },
    minutes = { "15m", "*/15 * * * *" },
    minutes_promoted = { "90m", "0 */2 * * *" },
    hours = { "6h", "0 */6 * * *" },
    hours_promoted = { "36h", "0 0 */2 * *" },
    one_day = { "1d", "0 0 * * *" },
    multi_day = { "3d", "0 0 */3 * *" },
    one_week = { "1w", "0 0 * * 0" },
    two_weeks = { "2w", "0 0 */14 * *" },
)]
fn every_lowers_to_expected_cron(interval: &str, expected: &str) {
    let descriptor = every(interval).unwrap();
    assert_eq!(descriptor.cron, expected);
    assert_eq!(descriptor.kind, ScheduleKind::Interval);
    assert_eq!(
        descriptor.original_params.get("interval").map(String::as_str),
        Some(interval)
    );
}

#[test]
fn every_15m_scenario() {
    let descriptor = every("15m").unwrap();
    assert_eq!(descriptor.cron, "*/15 * * * *");
    assert_eq!(descriptor.human_readable, "every 15 minutes");
    assert_eq!(descriptor.kind, ScheduleKind::Interval);
}

#[test]
fn every_singular_unit_reads_naturally() {
    assert_eq!(every("1h").unwrap().human_readable, "every hour");
    assert_eq!(every("1d").unwrap().human_readable, "every day");
}

#[parameterized(
    empty = { "" },
    no_unit = { "15" },
    zero = { "0m" },
    millis_not_allowed = { "500ms" },
    unknown_unit = { "2y" },
)]
fn every_rejects_bad_intervals(interval: &str) {
    assert!(matches!(
        every(interval),
        Err(InputError::InvalidInterval(_))
    ));
}

#[test]
fn daily_distinct_hours_same_minute() {
    let descriptor = daily(&["09:00", "17:00"]).unwrap();
    assert_eq!(descriptor.cron, "0 9,17 * * *");
    assert_eq!(descriptor.human_readable, "daily at 9:00 AM and 5:00 PM");
    assert_eq!(descriptor.kind, ScheduleKind::Daily);
}

#[test]
fn daily_same_hour_distinct_minutes() {
    let descriptor = daily(&["09:15", "09:45"]).unwrap();
    assert_eq!(descriptor.cron, "15,45 9 * * *");
}

#[test]
fn daily_single_time() {
    let descriptor = daily(&["08:30"]).unwrap();
    assert_eq!(descriptor.cron, "30 8 * * *");
    assert_eq!(descriptor.human_readable, "daily at 8:30 AM");
}

#[test]
fn daily_mixed_hours_and_minutes_is_rejected() {
    let err = daily(&["09:30", "17:45"]).unwrap_err();
    assert!(matches!(err, InputError::MixedDailyTimes(_)));
    assert!(err.to_string().contains("same hour or same minute"));
}

#[test]
fn daily_rejects_empty_and_bad_times() {
    assert!(daily(&[]).is_err());
    assert!(daily(&["25:00"]).is_err());
}

#[test]
fn weekly_sorts_and_dedupes_days() {
    let descriptor = weekly(&["fri", "mon", "wed", "mon"], "09:00").unwrap();
    assert_eq!(descriptor.cron, "0 9 * * 1,3,5");
    assert_eq!(
        descriptor.human_readable,
        "every Monday, Wednesday, and Friday at 9:00 AM"
    );
    assert_eq!(descriptor.kind, ScheduleKind::Weekly);
}

#[test]
fn weekly_single_day() {
    let descriptor = weekly(&["sun"], "23:30").unwrap();
    assert_eq!(descriptor.cron, "30 23 * * 0");
    assert_eq!(descriptor.human_readable, "every Sunday at 11:30 PM");
}

#[test]
fn weekly_rejects_unknown_day() {
    assert!(matches!(
        weekly(&["monday"], "09:00"),
        Err(InputError::InvalidWeekday(_))
    ));
}

#[test]
fn monthly_fixed_day() {
    let descriptor = monthly(15, "09:00").unwrap();
    assert_eq!(descriptor.cron, "0 9 15 * *");
    assert_eq!(
        descriptor.human_readable,
        "on the 15th of every month at 9:00 AM"
    );
    assert_eq!(descriptor.kind, ScheduleKind::Monthly);
}

#[test]
fn monthly_last_weekday() {
    let descriptor = monthly("last-fri", "17:00").unwrap();
    assert_eq!(descriptor.cron, "0 17 * * 5L");
    assert_eq!(
        descriptor.human_readable,
        "last Friday of every month at 5:00 PM"
    );
}

#[test]
fn monthly_rejects_out_of_range_day() {
    let err = monthly(32, "09:00").unwrap_err();
    assert!(matches!(err, InputError::InvalidDayOfMonth(_)));
    assert!(err.to_string().contains("32"));

    assert!(monthly(0, "09:00").is_err());
}

#[test]
fn monthly_rejects_bad_last_token() {
    assert!(monthly("first-fri", "09:00").is_err());
    assert!(monthly("last-friday", "09:00").is_err());
}

#[test]
fn cron_canonicalizes_whitespace() {
    let descriptor = cron("  */5   *  * * *  ").unwrap();
    assert_eq!(descriptor.cron, "*/5 * * * *");
    assert_eq!(descriptor.kind, ScheduleKind::Cron);
    assert_eq!(
        descriptor.original_params.get("expression").map(String::as_str),
        Some("  */5   *  * * *  ")
    );
}

#[test]
fn cron_accepts_six_fields_and_last_suffix() {
    assert!(cron("*/10 * * * * *").is_ok());
    assert!(cron("0 17 * * 5L").is_ok());
}

#[test]
fn cron_rejects_unparseable_expressions() {
    assert!(cron("not a cron").is_err());
    assert!(cron("0 8 * *").is_err());
    // Charset-valid but unsupported by the evaluator
    assert!(cron("0 0 1W * *").is_err());
}

proptest! {
    // Compiler idempotence: re-wrapping a compiled cron is a fixed point.
    #[test]
    fn compiled_cron_is_idempotent(value in 1u64..120, unit in prop::sample::select(vec!["s", "m", "h", "d", "w"])) {
        let descriptor = every(&format!("{}{}", value, unit)).unwrap();
        let rewrapped = cron(&descriptor.cron).unwrap();
        prop_assert_eq!(rewrapped.cron, descriptor.cron);
    }

    #[test]
    fn weekly_compiles_and_rewraps(day in 0u8..7, hour in 0u32..24, minute in 0u32..60) {
        let token = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"][day as usize];
        let descriptor = weekly(&[token], &format!("{:02}:{:02}", hour, minute)).unwrap();
        let rewrapped = cron(&descriptor.cron).unwrap();
        prop_assert!(descriptor.compiled().is_ok());
        prop_assert_eq!(rewrapped.cron, descriptor.cron);
    }
}
