use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone as _, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid YYYY-MM month")]
pub struct InvalidMonth(pub String);

/// Resolves a `YYYY-MM` month into the half-open UTC range `[start, end)`
/// covering it, where local wall-clock midnight is shifted back by
/// `tz_offset_minutes`.
pub fn month_window(month: &str, tz_offset_minutes: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), InvalidMonth> {
    let (year, month_no) = parse_month(month)?;

    let start = NaiveDate::from_ymd_opt(year, month_no, 1)
        .ok_or_else(|| InvalidMonth(month.to_owned()))?;
    let end = match month_no {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1),
        _ => NaiveDate::from_ymd_opt(year, month_no + 1, 1),
    }.ok_or_else(|| InvalidMonth(month.to_owned()))?;

    Ok((to_utc_instant(start, tz_offset_minutes), to_utc_instant(end, tz_offset_minutes)))
}

/// Half-open UTC range `[start, end)` covering one local calendar day.
pub fn day_window(date: NaiveDate, tz_offset_minutes: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.checked_add_days(Days::new(1)).unwrap();

    (to_utc_instant(date, tz_offset_minutes), to_utc_instant(next, tz_offset_minutes))
}

/// UTC instant of a local wall-clock time on a date.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz_offset_minutes: i32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time)) - Duration::minutes(tz_offset_minutes as i64)
}

fn parse_month(month: &str) -> Result<(i32, u32), InvalidMonth> {
    let invalid = || InvalidMonth(month.to_owned());

    let (year, month_no) = month.split_once('-').ok_or_else(invalid)?;

    if year.len() != 4 || month_no.len() != 2 || !month.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(invalid());
    }

    let year = year.parse().map_err(|_| invalid())?;
    let month_no: u32 = month_no.parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&month_no) {
        return Err(invalid());
    }

    Ok((year, month_no))
}

fn to_utc_instant(date: NaiveDate, tz_offset_minutes: i32) -> DateTime<Utc> {
    local_instant(date, NaiveTime::MIN, tz_offset_minutes)
}
