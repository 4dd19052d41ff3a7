// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable renderings of compiled schedules

use crate::duration::weekday_name;

pub(crate) fn interval_phrase(value: u64, unit: &str) -> String {
    let name = match unit {
        "s" => "second",
        "m" => "minute",
        "h" => "hour",
        "d" => "day",
        _ => "week",
    };
    if value == 1 {
        format!("every {}", name)
    } else {
        format!("every {} {}s", value, name)
    }
}

pub(crate) fn daily_phrase(times: &[(u32, u32)]) -> String {
    let rendered: Vec<String> = times.iter().map(|&(h, m)| format_time(h, m)).collect();
    format!("daily at {}", join_with_and(&rendered))
}

pub(crate) fn weekly_phrase(days: &[u8], hour: u32, minute: u32) -> String {
    let names: Vec<String> = days
        .iter()
        .map(|&d| weekday_name(d).to_string())
        .collect();
    format!(
        "every {} at {}",
        join_with_and(&names),
        format_time(hour, minute)
    )
}

pub(crate) fn monthly_phrase(day: u8, hour: u32, minute: u32) -> String {
    format!(
        "on the {} of every month at {}",
        ordinal(day),
        format_time(hour, minute)
    )
}

pub(crate) fn last_weekday_phrase(weekday: u8, hour: u32, minute: u32) -> String {
    format!(
        "last {} of every month at {}",
        weekday_name(weekday),
        format_time(hour, minute)
    )
}

/// 12-hour clock rendering: `(9, 0)` → `"9:00 AM"`, `(17, 5)` → `"5:05 PM"`
fn format_time(hour: u32, minute: u32) -> String {
    let (display, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:{:02} {}", display, minute, meridiem)
}

fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        _ => {
            let (last, rest) = items.split_last().unwrap_or((&items[0], &[]));
            format!("{}, and {}", rest.join(", "), last)
        }
    }
}

fn ordinal(day: u8) -> String {
    let suffix = match (day % 10, day % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
