//! Resolves loose natural-language date phrases ("next week", "this
//! Friday", "in 3 days") against a reference date.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolve a date expression relative to `reference`. Rules are tried
/// in a fixed order and the first match wins; malformed input never
/// panics, it just falls through to the next rule. Returns `None`
/// when nothing matches.
pub fn resolve(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let text = text.to_lowercase();
    let text = text.trim();

    if text.contains("next week") {
        // "late" wins when both modifiers appear, matching the branch
        // order this behavior was lifted from
        let mut days_ahead = 7;
        if text.contains("late") {
            days_ahead += 3;
        } else if text.contains("early") {
            days_ahead += 1;
        }
        return Some(reference + Duration::days(days_ahead));
    }

    if text.contains("day after tomorrow") {
        return Some(reference + Duration::days(2));
    }
    if text.contains("tomorrow") {
        return Some(reference + Duration::days(1));
    }
    if text.contains("today") {
        return Some(reference);
    }

    let weekday_alt = WEEKDAYS.join("|");

    let this_weekday = Regex::new(&format!(r"this ({})", weekday_alt)).unwrap();
    if let Some(caps) = this_weekday.captures(text)
        && let Some(target) = weekday_index(&caps[1])
    {
        let mut days_ahead = target as i64 - reference.weekday().num_days_from_monday() as i64;
        // Today or earlier in the week rolls to the following week
        if days_ahead <= 0 {
            days_ahead += 7;
        }
        return Some(reference + Duration::days(days_ahead));
    }

    let next_weekday = Regex::new(&format!(r"next ({})", weekday_alt)).unwrap();
    if let Some(caps) = next_weekday.captures(text)
        && let Some(target) = weekday_index(&caps[1])
    {
        // Always the occurrence a week out, even when the nearer one
        // is still ahead
        let days_ahead = target as i64 - reference.weekday().num_days_from_monday() as i64 + 7;
        return Some(reference + Duration::days(days_ahead));
    }

    let in_n_days = Regex::new(r"in (\d+) days?").unwrap();
    if let Some(caps) = in_n_days.captures(text)
        && let Ok(n) = caps[1].parse::<i64>()
    {
        return Some(reference + Duration::days(n));
    }

    let n_days_from_now = Regex::new(r"(\d+) days? from now").unwrap();
    if let Some(caps) = n_days_from_now.captures(text)
        && let Ok(n) = caps[1].parse::<i64>()
    {
        return Some(reference + Duration::days(n));
    }

    fuzzy(text, reference)
}

fn weekday_index(name: &str) -> Option<u32> {
    WEEKDAYS.iter().position(|w| *w == name).map(|i| i as u32)
}

fn month_index(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

/// Last-resort parsing of literal date forms embedded anywhere in the
/// text: ISO dates, "July 5"/"5 July", "7/5", and bare weekday names.
fn fuzzy(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    // 2024-07-05
    let iso = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
    if let Some(caps) = iso.captures(text)
        && let (Ok(y), Ok(m), Ok(d)) = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        )
        && let Some(date) = NaiveDate::from_ymd_opt(y, m, d)
    {
        return Some(date);
    }

    let month_alt = MONTHS.join("|");

    // "july 5" or "july 5th"
    let month_day = Regex::new(&format!(r"({month_alt}) (\d{{1,2}})(?:st|nd|rd|th)?\b")).unwrap();
    if let Some(caps) = month_day.captures(text)
        && let Some(m) = month_index(&caps[1])
        && let Ok(d) = caps[2].parse::<u32>()
        && let Some(date) = NaiveDate::from_ymd_opt(reference.year(), m, d)
    {
        return Some(date);
    }

    // "5 july" or "5th of july"
    let day_month =
        Regex::new(&format!(r"(\d{{1,2}})(?:st|nd|rd|th)?(?: of)? ({month_alt})")).unwrap();
    if let Some(caps) = day_month.captures(text)
        && let Some(m) = month_index(&caps[2])
        && let Ok(d) = caps[1].parse::<u32>()
        && let Some(date) = NaiveDate::from_ymd_opt(reference.year(), m, d)
    {
        return Some(date);
    }

    // US-style 7/5 or 7/5/2024
    let slashed = Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}))?\b").unwrap();
    if let Some(caps) = slashed.captures(text)
        && let (Ok(m), Ok(d)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>())
    {
        let year = caps
            .get(3)
            .and_then(|y| y.as_str().parse::<i32>().ok())
            .unwrap_or(reference.year());
        if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
            return Some(date);
        }
    }

    // A bare weekday name means the next occurrence
    let weekday_alt = WEEKDAYS.join("|");
    let bare_weekday = Regex::new(&format!(r"\b({weekday_alt})\b")).unwrap();
    if let Some(caps) = bare_weekday.captures(text)
        && let Some(target) = weekday_index(&caps[1])
    {
        let mut days_ahead = target as i64 - reference.weekday().num_days_from_monday() as i64;
        if days_ahead <= 0 {
            days_ahead += 7;
        }
        return Some(reference + Duration::days(days_ahead));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday
    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_week_plain() {
        assert_eq!(resolve("sometime next week", reference()), Some(ymd(2024, 7, 10)));
    }

    #[test]
    fn test_next_week_early() {
        assert_eq!(resolve("early next week", reference()), Some(ymd(2024, 7, 11)));
    }

    #[test]
    fn test_next_week_late() {
        assert_eq!(resolve("late next week", reference()), Some(ymd(2024, 7, 13)));
    }

    #[test]
    fn test_next_week_both_modifiers_prefers_late() {
        assert_eq!(
            resolve("early or late next week", reference()),
            Some(ymd(2024, 7, 13))
        );
    }

    #[test]
    fn test_tomorrow() {
        assert_eq!(resolve("tomorrow morning", reference()), Some(ymd(2024, 7, 4)));
    }

    #[test]
    fn test_today() {
        assert_eq!(resolve("today", reference()), Some(reference()));
        assert_eq!(resolve("later today", reference()), Some(reference()));
    }

    #[test]
    fn test_day_after_tomorrow() {
        assert_eq!(
            resolve("the day after tomorrow", reference()),
            Some(ymd(2024, 7, 5))
        );
    }

    #[test]
    fn test_this_weekday_still_ahead() {
        // Friday is two days after the Wednesday reference
        assert_eq!(resolve("this friday", reference()), Some(ymd(2024, 7, 5)));
    }

    #[test]
    fn test_this_weekday_already_passed_rolls_forward() {
        // Monday has passed, so "this monday" is the following Monday
        assert_eq!(resolve("this monday", reference()), Some(ymd(2024, 7, 8)));
    }

    #[test]
    fn test_this_weekday_today_rolls_forward() {
        assert_eq!(resolve("this wednesday", reference()), Some(ymd(2024, 7, 10)));
    }

    #[test]
    fn test_next_weekday_skips_nearest_occurrence() {
        // Friday is still two days ahead, but "next friday" skips it
        let resolved = resolve("next friday", reference()).unwrap();
        assert_eq!(resolved, ymd(2024, 7, 12));
        assert!((resolved - reference()).num_days() >= 7);
        assert_eq!(resolved.weekday(), chrono::Weekday::Fri);
    }

    #[test]
    fn test_in_n_days() {
        assert_eq!(resolve("in 3 days", reference()), Some(ymd(2024, 7, 6)));
        assert_eq!(resolve("in 1 day", reference()), Some(ymd(2024, 7, 4)));
    }

    #[test]
    fn test_n_days_from_now() {
        assert_eq!(resolve("5 days from now", reference()), Some(ymd(2024, 7, 8)));
    }

    #[test]
    fn test_fuzzy_iso_date() {
        assert_eq!(
            resolve("how about 2024-08-15 then", reference()),
            Some(ymd(2024, 8, 15))
        );
    }

    #[test]
    fn test_fuzzy_month_day() {
        assert_eq!(resolve("july 5", reference()), Some(ymd(2024, 7, 5)));
        assert_eq!(resolve("on august 2nd", reference()), Some(ymd(2024, 8, 2)));
    }

    #[test]
    fn test_fuzzy_day_month() {
        assert_eq!(resolve("the 5th of july", reference()), Some(ymd(2024, 7, 5)));
    }

    #[test]
    fn test_fuzzy_slashed() {
        assert_eq!(resolve("7/15 works", reference()), Some(ymd(2024, 7, 15)));
        assert_eq!(resolve("7/15/2025", reference()), Some(ymd(2025, 7, 15)));
    }

    #[test]
    fn test_fuzzy_bare_weekday() {
        assert_eq!(resolve("friday works for me", reference()), Some(ymd(2024, 7, 5)));
    }

    #[test]
    fn test_unresolvable_is_none() {
        assert_eq!(resolve("whenever really", reference()), None);
        assert_eq!(resolve("", reference()), None);
    }

    #[test]
    fn test_malformed_numbers_fall_through() {
        // An impossible calendar date is skipped, not a panic
        assert_eq!(resolve("2024-13-45", reference()), None);
        assert_eq!(resolve("in 99999999999999999999 days", reference()), None);
    }

    #[test]
    fn test_rule_priority_next_week_beats_weekday() {
        // "next week" is checked before weekday rules
        assert_eq!(
            resolve("monday next week maybe", reference()),
            Some(ymd(2024, 7, 10))
        );
    }
}
