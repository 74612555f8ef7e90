use std::fmt::Write;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

use super::{expect_arity, expect_arity_range, expect_int, expect_num, expect_str, Library};
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

const MS_PER_DAY: f64 = 86_400_000.0;

const DEFAULT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DateOp {
    /// date-now
    Now,
    /// date-year
    Year,
    /// date-month
    Month,
    /// date-day
    Day,
    /// date-hour
    Hour,
    /// date-minute
    Minute,
    /// date-second
    Second,
    /// date-weekday
    Weekday,
    /// date-make
    Make,
    /// date-parse
    Parse,
    /// date-format
    Format,
    /// date-add-days
    AddDays,
}

pub fn date_op_of_str(s: &str) -> Option<DateOp> {
    match s {
        "date-now" => Some(DateOp::Now),
        "date-year" => Some(DateOp::Year),
        "date-month" => Some(DateOp::Month),
        "date-day" => Some(DateOp::Day),
        "date-hour" => Some(DateOp::Hour),
        "date-minute" => Some(DateOp::Minute),
        "date-second" => Some(DateOp::Second),
        "date-weekday" => Some(DateOp::Weekday),
        "date-make" => Some(DateOp::Make),
        "date-parse" => Some(DateOp::Parse),
        "date-format" => Some(DateOp::Format),
        "date-add-days" => Some(DateOp::AddDays),
        _ => None,
    }
}

/// Timestamps as milliseconds since the Unix epoch, read in UTC.
pub struct Date;

fn millis(time: DateTime<Utc>) -> Value {
    Value::Num(time.timestamp_millis() as f64)
}

fn timestamp(ident: &str, value: &Value) -> Result<DateTime<Utc>, Error> {
    let ms = expect_num(ident, value)?;
    if !ms.is_finite() {
        return Err(Error::domain(ident, format!("invalid timestamp {value}")));
    }
    Utc.timestamp_millis_opt(ms.trunc() as i64)
        .single()
        .ok_or_else(|| Error::domain(ident, format!("timestamp {value} is out of range")))
}

fn component(ident: &str, value: &Value, max: u32) -> Result<u32, Error> {
    let n = expect_int(ident, value)?;
    u32::try_from(n)
        .ok()
        .filter(|n| *n <= max)
        .ok_or_else(|| Error::domain(ident, format!("component {n} out of range")))
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

impl Library for Date {
    fn name(&self) -> &'static str {
        "date"
    }

    fn owns(&self, ident: &str) -> bool {
        date_op_of_str(ident).is_some()
    }

    fn apply(&self, _interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = date_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            DateOp::Now => {
                expect_arity(ident, &args, 0)?;
                Ok(millis(Utc::now()))
            }
            DateOp::Year
            | DateOp::Month
            | DateOp::Day
            | DateOp::Hour
            | DateOp::Minute
            | DateOp::Second
            | DateOp::Weekday => {
                expect_arity(ident, &args, 1)?;
                let time = timestamp(ident, &args[0])?;
                let n = match op {
                    DateOp::Year => time.year() as f64,
                    DateOp::Month => time.month() as f64,
                    DateOp::Day => time.day() as f64,
                    DateOp::Hour => time.hour() as f64,
                    DateOp::Minute => time.minute() as f64,
                    DateOp::Second => time.second() as f64,
                    // 0 is Sunday
                    _ => time.weekday().num_days_from_sunday() as f64,
                };
                Ok(Value::Num(n))
            }
            DateOp::Make => {
                expect_arity_range(ident, &args, 3, Some(6))?;
                let year = expect_int(ident, &args[0])?;
                let year = i32::try_from(year)
                    .map_err(|_| Error::domain(ident, format!("year {year} out of range")))?;
                let mut parts = [1, 1, 0, 0, 0];
                let limits = [12, 31, 23, 59, 59];
                for (i, arg) in args[1..].iter().enumerate() {
                    parts[i] = component(ident, arg, limits[i])?;
                }
                let [month, day, hour, minute, second] = parts;
                Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
                    .single()
                    .map(millis)
                    .ok_or_else(|| {
                        Error::domain(ident, format!("no such date {year}-{month:02}-{day:02}"))
                    })
            }
            DateOp::Parse => {
                expect_arity(ident, &args, 1)?;
                let text = expect_str(ident, &args[0])?;
                parse_date(text)
                    .map(millis)
                    .ok_or_else(|| Error::domain(ident, format!("cannot read `{text}` as a date")))
            }
            DateOp::Format => {
                expect_arity_range(ident, &args, 1, Some(2))?;
                let time = timestamp(ident, &args[0])?;
                let pattern = match args.get(1) {
                    Some(pattern) => expect_str(ident, pattern)?,
                    None => DEFAULT_FORMAT,
                };
                // an invalid pattern surfaces as a fmt error instead of a panic
                let mut out = String::new();
                write!(out, "{}", time.format(pattern))
                    .map_err(|_| Error::domain(ident, format!("invalid format `{pattern}`")))?;
                Ok(Value::Str(out))
            }
            DateOp::AddDays => {
                expect_arity(ident, &args, 2)?;
                let ms = expect_num(ident, &args[0])?;
                let days = expect_num(ident, &args[1])?;
                Ok(Value::Num(ms + days * MS_PER_DAY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpret::Interpreter;
    use crate::library::{HostRegistry, Libraries, DEFAULT_LIBRARIES};
    use crate::parse::parse;
    use crate::print_handler::Printer;
    use crate::symtab::Env;

    fn run(src: &str) -> Result<String, String> {
        let libraries = Libraries::activate(DEFAULT_LIBRARIES, &HostRegistry::default()).unwrap();
        Interpreter::new(libraries, Printer::Silent)
            .run(&parse(src).unwrap(), &Env::new())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_components() {
        // 2024-02-29T13:45:30.250Z, a Thursday
        let t = "1709214330250";
        let cases = [
            ("date-year", "2024"),
            ("date-month", "2"),
            ("date-day", "29"),
            ("date-hour", "13"),
            ("date-minute", "45"),
            ("date-second", "30"),
            ("date-weekday", "4"),
        ];
        for (ident, expected) in cases {
            assert_eq!(run(&format!("({ident} {t})")), Ok(expected.to_string()), "{ident}");
        }
        assert_eq!(
            run(&format!("(date-format {t})")),
            Ok("2024-02-29T13:45:30.250Z".to_string())
        );
    }

    #[test]
    fn test_make_parse_format() {
        let cases = [
            ("(date-make 1970 1 1)", "0"),
            ("(date-make 2024 2 29 13 45 30)", "1709214330000"),
            ("(date-parse \"2024-02-29\")", "1709164800000"),
            ("(date-parse \"2024-02-29T13:45:30+01:00\")", "1709210730000"),
            ("(date-format (date-make 2000 12 31) \"%d/%m/%Y\")", "31/12/2000"),
            ("(date-format (date-add-days (date-make 2024 2 28) 2) \"%F\")", "2024-03-01"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_date_errors() {
        let cases = [
            ("(date-make 2023 2 29)", "date-make: no such date 2023-02-29"),
            ("(date-make 2023 13 1)", "date-make: component 13 out of range"),
            ("(date-parse \"yesterday\")", "date-parse: cannot read `yesterday` as a date"),
            ("(date-format 0 \"%Q\")", "date-format: invalid format `%Q`"),
            ("(date-year \"now\")", "date-year: requires number, got string `now`"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Err(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_now_is_recent() {
        let now: f64 = run("(date-now)").unwrap().parse().unwrap();
        // after 2020-01-01
        assert!(now > 1_577_836_800_000.0);
    }
}
