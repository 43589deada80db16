//! Public-holiday calendars.
//!
//! US federal holidays, including the observed day when a fixed-date holiday
//! falls on a weekend (Saturday → Friday, Sunday → Monday).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::config::HolidayCalendar;

/// Whether `date` is a holiday (or observed holiday) in `calendar`.
pub fn is_holiday(calendar: HolidayCalendar, date: NaiveDate) -> bool {
    match calendar {
        HolidayCalendar::None | HolidayCalendar::Auto => false,
        HolidayCalendar::UnitedStates => us_federal_holidays(date.year()).contains(&date),
    }
}

/// All holidays of `calendar` in `year`, sorted.
pub fn holidays_in_year(calendar: HolidayCalendar, year: i32) -> Vec<NaiveDate> {
    match calendar {
        HolidayCalendar::None | HolidayCalendar::Auto => Vec::new(),
        HolidayCalendar::UnitedStates => us_federal_holidays(year),
    }
}

fn us_federal_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = [(1, 1), (7, 4), (11, 11), (12, 25)];
    let floating = [
        nth_weekday(year, 1, Weekday::Mon, 3),  // Martin Luther King Jr. Day
        nth_weekday(year, 2, Weekday::Mon, 3),  // Washington's Birthday
        last_weekday(year, 5, Weekday::Mon),    // Memorial Day
        nth_weekday(year, 9, Weekday::Mon, 1),  // Labor Day
        nth_weekday(year, 10, Weekday::Mon, 2), // Columbus Day
        nth_weekday(year, 11, Weekday::Thu, 4), // Thanksgiving
    ];

    let mut days: Vec<NaiveDate> = floating.into_iter().flatten().collect();
    for (month, day) in fixed {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            days.push(date);
            if let Some(observed) = observed_day(date) {
                days.push(observed);
            }
        }
    }

    // New Year's Day falling on a Saturday is observed on Dec 31 of the prior year.
    if let Some(next_new_year) = NaiveDate::from_ymd_opt(year + 1, 1, 1) {
        if next_new_year.weekday() == Weekday::Sat {
            days.push(next_new_year - Duration::days(1));
        }
    }

    days.retain(|d| d.year() == year);
    days.sort();
    days.dedup();
    days
}

fn observed_day(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}
