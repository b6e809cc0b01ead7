//! Date parsing and formatting.
//!
//! Posts carry full dates (`YYYY-MM-DD` or RFC3339), the CV uses
//! month precision (`YYYY-MM`). Both are plain UTC values.

use anyhow::{Result, bail};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun",
    "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse from "YYYY-MM-DD" or "YYYY-MM-DDTHH:MM:SSZ" format
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();

        // Minimum: "YYYY-MM-DD" (10 chars)
        if bytes.len() < 10 {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        if bytes[7] != b'-' {
            return None;
        }
        let day = parse_u8(&bytes[8..10])?;

        // Optional time part (RFC3339)
        let (hour, minute, second) = match bytes.len() {
            10 => (0, 0, 0),
            20 if bytes[10] == b'T' && bytes[19] == b'Z' => {
                if bytes[13] != b':' || bytes[16] != b':' {
                    return None;
                }
                (
                    parse_u8(&bytes[11..13])?,
                    parse_u8(&bytes[14..16])?,
                    parse_u8(&bytes[17..19])?,
                )
            }
            _ => return None,
        };

        let datetime = Self::new(year, month, day, hour, minute, second);
        datetime.validate().ok()?;
        Some(datetime)
    }

    pub fn validate(&self) -> Result<()> {
        let Self { year, month, day, hour, minute, second } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }
        if day == 0 || day > days_in_month(year, month) {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    pub fn to_rfc2822(&self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];

        // Zeller's congruence
        let (y, m) = if self.month < 3 {
            (self.year as i32 - 1, self.month as i32 + 12)
        } else {
            (self.year as i32, self.month as i32)
        };
        let d = self.day as i32;
        let weekday = ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize;

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[weekday],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }
}

/// A `YYYY-MM` month as used by CV date ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8,
}

impl YearMonth {
    /// Parse from "YYYY-MM" format
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        let month = parse_u8(&bytes[5..7])?;
        if !(1..=12).contains(&month) {
            return None;
        }

        Some(Self { year, month })
    }

    /// Format as "Jan 2020"
    pub fn display(&self) -> String {
        format!("{} {}", MONTHS[(self.month - 1) as usize], self.year)
    }
}

/// Format a CV date range as "Jan 2020 – Present" / "Jan 2020 – Mar 2022".
///
/// Falls back to the raw strings if either endpoint fails to parse;
/// validation reports that separately.
pub fn format_range(start: &str, end: Option<&str>) -> String {
    let start = YearMonth::parse(start).map_or_else(|| start.to_owned(), |ym| ym.display());
    let end = end.map_or_else(
        || "Present".to_owned(),
        |e| YearMonth::parse(e).map_or_else(|| e.to_owned(), |ym| ym.display()),
    );
    format!("{start} – {end}")
}

const fn days_in_month(year: u16, month: u8) -> u8 {
    let is_leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap => 29,
        _ => 28,
    }
}

fn parse_u16(bytes: &[u8]) -> Option<u16> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn parse_u8(bytes: &[u8]) -> Option<u8> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

#[test]
fn test_parse_date_only() {
    let dt = DateTimeUtc::parse("2024-06-15").unwrap();
    assert_eq!(dt, DateTimeUtc::from_ymd(2024, 6, 15));
}

#[test]
fn test_parse_rfc3339() {
    let dt = DateTimeUtc::parse("2024-06-15T14:30:45Z").unwrap();
    assert_eq!(dt, DateTimeUtc::new(2024, 6, 15, 14, 30, 45));
}

#[test]
fn test_parse_rejects_malformed() {
    assert!(DateTimeUtc::parse("2024-6-15").is_none());
    assert!(DateTimeUtc::parse("2024/06/15").is_none());
    assert!(DateTimeUtc::parse("2024-06-15T14:30Z").is_none());
    assert!(DateTimeUtc::parse("yesterday").is_none());
    assert!(DateTimeUtc::parse("").is_none());
}

#[test]
fn test_parse_rejects_invalid_calendar_date() {
    assert!(DateTimeUtc::parse("2024-13-01").is_none());
    assert!(DateTimeUtc::parse("2024-04-31").is_none());
    assert!(DateTimeUtc::parse("2023-02-29").is_none());
}

#[test]
fn test_validate_leap_year() {
    assert!(DateTimeUtc::from_ymd(2024, 2, 29).validate().is_ok());
    assert!(DateTimeUtc::from_ymd(2000, 2, 29).validate().is_ok()); // divisible by 400
    assert!(DateTimeUtc::from_ymd(2023, 2, 29).validate().is_err());
    assert!(DateTimeUtc::from_ymd(1900, 2, 29).validate().is_err()); // divisible by 100 but not 400
}

#[test]
fn test_validate_time_bounds() {
    assert!(DateTimeUtc::new(2024, 6, 15, 24, 0, 0).validate().is_err());
    assert!(DateTimeUtc::new(2024, 6, 15, 12, 60, 0).validate().is_err());
    assert!(DateTimeUtc::new(2024, 6, 15, 12, 30, 60).validate().is_err());
    assert!(DateTimeUtc::new(2024, 12, 31, 23, 59, 59).validate().is_ok());
}

#[test]
fn test_to_rfc2822() {
    let dt = DateTimeUtc::new(2024, 1, 15, 10, 30, 45);
    assert_eq!(dt.to_rfc2822(), "Mon, 15 Jan 2024 10:30:45 GMT");
}

#[test]
fn test_to_rfc2822_format() {
    let rfc2822 = DateTimeUtc::from_ymd(2024, 6, 15).to_rfc2822();
    let parts: Vec<&str> = rfc2822.split(' ').collect();
    assert_eq!(parts.len(), 6);
    assert!(parts[0].ends_with(','));
    assert_eq!(parts[5], "GMT");
}

#[test]
fn test_year_month_parse() {
    assert_eq!(YearMonth::parse("2020-01"), Some(YearMonth { year: 2020, month: 1 }));
    assert_eq!(YearMonth::parse("2020-12"), Some(YearMonth { year: 2020, month: 12 }));
    assert!(YearMonth::parse("2020-13").is_none());
    assert!(YearMonth::parse("2020-00").is_none());
    assert!(YearMonth::parse("2020-1").is_none());
    assert!(YearMonth::parse("2020-01-01").is_none());
}

#[test]
fn test_year_month_ordering() {
    let a = YearMonth::parse("2020-03").unwrap();
    let b = YearMonth::parse("2021-01").unwrap();
    let c = YearMonth::parse("2020-11").unwrap();
    assert!(a < b);
    assert!(a < c);
    assert!(c < b);
}

#[test]
fn test_year_month_display() {
    assert_eq!(YearMonth::parse("2020-01").unwrap().display(), "Jan 2020");
    assert_eq!(YearMonth::parse("2024-12").unwrap().display(), "Dec 2024");
}

#[test]
fn test_format_range() {
    assert_eq!(format_range("2020-01", Some("2022-03")), "Jan 2020 – Mar 2022");
    assert_eq!(format_range("2020-01", None), "Jan 2020 – Present");
    // unparseable endpoints pass through untouched
    assert_eq!(format_range("som eday", None), "som eday – Present");
}
