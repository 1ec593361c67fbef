//! `Date` support backed by chrono, always in UTC

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike,
    Utc,
};

use crate::error::{Result, TemplateError};
use crate::value::Value;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// `new Date(...)`
pub fn construct(args: &[Value]) -> Result<DateTime<Utc>> {
    let date = match args {
        [] => Some(now()),
        [Value::Date(dt)] => Some(*dt),
        [Value::String(s)] => parse(s),
        [single] => from_millis(single.to_number()),
        _ => from_components(args),
    };
    date.ok_or_else(|| TemplateError::evaluation("Invalid Date"))
}

/// Parse the date formats templates commonly receive from JSON data
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Beyond chrono's representable range
const MAX_YEAR: f64 = 262_143.0;

fn from_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64)
}

/// Year, zero-based month, day, hours, minutes, seconds, milliseconds.
/// Out-of-range fields roll over into the next larger unit.
fn from_components(args: &[Value]) -> Option<DateTime<Utc>> {
    let mut fields = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    for (slot, arg) in fields.iter_mut().zip(args) {
        let n = arg.to_number();
        if !n.is_finite() {
            return None;
        }
        *slot = n.trunc();
    }
    let [mut year, month, day, hours, minutes, seconds, millis] = fields;
    if (0.0..=99.0).contains(&year) {
        year += 1900.0;
    }

    if year.abs() > MAX_YEAR || month.abs() > MAX_YEAR * 12.0 {
        return None;
    }

    let total_months = (year as i64).checked_mul(12)?.checked_add(month as i64)?;
    let first = NaiveDate::from_ymd_opt(
        i32::try_from(total_months.div_euclid(12)).ok()?,
        total_months.rem_euclid(12) as u32 + 1,
        1,
    )?;
    let midnight = first.and_hms_opt(0, 0, 0)?;
    let offset = Duration::try_days((day as i64).checked_sub(1)?)?
        .checked_add(&Duration::try_hours(hours as i64)?)?
        .checked_add(&Duration::try_minutes(minutes as i64)?)?
        .checked_add(&Duration::try_seconds(seconds as i64)?)?
        .checked_add(&Duration::try_milliseconds(millis as i64)?)?;
    midnight
        .checked_add_signed(offset)
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Methods on a `Date` receiver
pub fn call_method(dt: &DateTime<Utc>, method: &str, _args: &[Value]) -> Option<Value> {
    let value = match method {
        "getFullYear" | "getUTCFullYear" => Value::from(dt.year() as i64),
        "getMonth" | "getUTCMonth" => Value::from(dt.month0() as i64),
        "getDate" | "getUTCDate" => Value::from(dt.day() as i64),
        "getDay" | "getUTCDay" => Value::from(dt.weekday().num_days_from_sunday() as i64),
        "getHours" | "getUTCHours" => Value::from(dt.hour() as i64),
        "getMinutes" | "getUTCMinutes" => Value::from(dt.minute() as i64),
        "getSeconds" | "getUTCSeconds" => Value::from(dt.second() as i64),
        "getMilliseconds" | "getUTCMilliseconds" => {
            Value::from(dt.timestamp_subsec_millis() as i64)
        }
        "getTime" | "valueOf" => Value::Number(dt.timestamp_millis() as f64),
        "getTimezoneOffset" => Value::from(0),
        "toISOString" | "toJSON" => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        "toDateString" => Value::String(dt.format("%a %b %d %Y").to_string()),
        "toTimeString" => Value::String(
            dt.format("%H:%M:%S GMT+0000 (Coordinated Universal Time)")
                .to_string(),
        ),
        "toLocaleDateString" => Value::String(locale_date(dt)),
        "toLocaleTimeString" => Value::String(locale_time(dt)),
        "toLocaleString" => Value::String(format!("{}, {}", locale_date(dt), locale_time(dt))),
        "toUTCString" | "toGMTString" => {
            Value::String(dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        }
        "toString" => Value::Date(*dt).to_primitive(),
        _ => return None,
    };
    Some(value)
}

/// en-US short date, e.g. `3/7/2024`
fn locale_date(dt: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", dt.month(), dt.day(), dt.year())
}

/// en-US time, e.g. `9:05:01 PM`
fn locale_time(dt: &DateTime<Utc>) -> String {
    let (pm, hour) = dt.hour12();
    format!(
        "{}:{:02}:{:02} {}",
        hour,
        dt.minute(),
        dt.second(),
        if pm { "PM" } else { "AM" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(args: &[Value]) -> DateTime<Utc> {
        construct(args).unwrap()
    }

    #[test]
    fn test_construct_from_string() {
        let dt = date(&[Value::from("2024-03-07")]);
        assert_eq!(dt.to_rfc3339_opts(SecondsFormat::Millis, true), "2024-03-07T00:00:00.000Z");

        let dt = date(&[Value::from("2024-03-07T21:05:01Z")]);
        assert_eq!(dt.hour(), 21);

        assert!(construct(&[Value::from("not a date")]).is_err());
    }

    #[test]
    fn test_construct_from_components() {
        let dt = date(&[Value::from(2024), Value::from(0), Value::from(31)]);
        assert_eq!(locale_date(&dt), "1/31/2024");

        // Month 12 rolls over into January of the next year
        let dt = date(&[Value::from(2023), Value::from(12), Value::from(1)]);
        assert_eq!(locale_date(&dt), "1/1/2024");

        let dt = date(&[Value::from(0)]);
        assert_eq!(dt.year(), 1970);
    }

    #[test]
    fn test_construct_out_of_range_components() {
        for args in [
            vec![Value::Number(1e18), Value::from(0)],
            vec![Value::from(2024), Value::Number(-1e18)],
            vec![Value::Number(300_000.0), Value::from(0)],
            vec![Value::from(2024), Value::from(0), Value::Number(1e18)],
            vec![Value::from(2024), Value::from(0), Value::Number(-1e19)],
            vec![Value::from(2024), Value::from(0), Value::from(1), Value::Number(f64::NAN)],
        ] {
            assert!(
                matches!(construct(&args), Err(TemplateError::Evaluation(msg)) if msg == "Invalid Date"),
                "expected Invalid Date for {:?}",
                args
            );
        }

        // Large but representable month counts still roll over
        let dt = date(&[Value::from(2000), Value::from(1200)]);
        assert_eq!(dt.year(), 2100);
    }

    #[test]
    fn test_methods() {
        let dt = date(&[Value::from("2024-03-07T21:05:01Z")]);
        assert_eq!(call_method(&dt, "getMonth", &[]), Some(Value::from(2)));
        assert_eq!(call_method(&dt, "getDay", &[]), Some(Value::from(4)));
        assert_eq!(
            call_method(&dt, "toLocaleDateString", &[]),
            Some(Value::from("3/7/2024"))
        );
        assert_eq!(
            call_method(&dt, "toLocaleTimeString", &[]),
            Some(Value::from("9:05:01 PM"))
        );
        assert_eq!(
            call_method(&dt, "toISOString", &[]),
            Some(Value::from("2024-03-07T21:05:01.000Z"))
        );
        assert_eq!(
            call_method(&dt, "toDateString", &[]),
            Some(Value::from("Thu Mar 07 2024"))
        );
        assert_eq!(call_method(&dt, "setFullYear", &[]), None);
    }
}
