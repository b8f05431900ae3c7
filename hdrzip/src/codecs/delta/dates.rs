//! HTTP date parsing and hexadecimal epoch encoding.
//!
//! Accepts the three date grammars of HTTP/1.1:
//!
//! ```text
//! Sun, 06 Nov 1994 08:49:37 GMT   ; RFC 1123
//! Sunday, 06-Nov-94 08:49:37 GMT  ; RFC 850
//! Sun Nov  6 08:49:37 1994        ; ANSI C asctime()
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::{Captures, Regex};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

static RFC1123: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\w{3}, (?P<day>[0-9]{2}) (?P<month>\w{3}) (?P<year>[0-9]{4}) (?P<h>[0-9]{2}):(?P<m>[0-9]{2}):(?P<s>[0-9]{2}) GMT$",
    )
    .expect("valid regex")
});

static RFC850: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\w{6,9}, (?P<day>[0-9]{2})-(?P<month>\w{3})-(?P<year>[0-9]{2}) (?P<h>[0-9]{2}):(?P<m>[0-9]{2}):(?P<s>[0-9]{2}) GMT$",
    )
    .expect("valid regex")
});

static ASCTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\w{3} (?P<month>\w{3}) (?P<day>[0-9 ][0-9]) (?P<h>[0-9]{2}):(?P<m>[0-9]{2}):(?P<s>[0-9]{2}) (?P<year>[0-9]{4})$",
    )
    .expect("valid regex")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parses an HTTP date into seconds since the Unix epoch.
///
/// Two-digit years above 68 belong to the 1900s, the rest to the 2000s.
/// Returns `None` for anything that is not one of the three grammars or
/// names an impossible date.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let captures = [&*RFC1123, &*RFC850, &*ASCTIME]
        .into_iter()
        .find_map(|pattern| pattern.captures(value))?;
    let year = expand_year(field(&captures, "year")?);
    let month = month_number(captures.name("month")?.as_str())?;
    let date = NaiveDate::from_ymd_opt(year, month, field(&captures, "day")?)?;
    let time = date.and_hms_opt(
        field(&captures, "h")?,
        field(&captures, "m")?,
        field(&captures, "s")?,
    )?;
    Some(time.and_utc().timestamp())
}

/// Formats epoch seconds as an RFC 1123 date.
pub fn format_http_date(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|instant| instant.format(HTTP_DATE_FORMAT).to_string())
}

/// Encodes an HTTP date as lowercase hexadecimal epoch seconds.
pub fn encode_date(value: &str) -> Option<String> {
    parse_http_date(value).map(|seconds| {
        if seconds < 0 {
            format!("-{:x}", seconds.unsigned_abs())
        } else {
            format!("{seconds:x}")
        }
    })
}

/// Decodes a value produced by [`encode_date`] back into an RFC 1123 date.
pub fn decode_date(encoded: &str) -> Option<String> {
    i64::from_str_radix(encoded, 16)
        .ok()
        .and_then(format_http_date)
}

fn expand_year(year: i32) -> i32 {
    match year {
        69..=99 => year + 1900,
        0..=68 => year + 2000,
        _ => year,
    }
}

fn month_number(month: &str) -> Option<u32> {
    let month = month.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|candidate| *candidate == month)
        .map(|index| index as u32 + 1)
}

fn field<T: std::str::FromStr>(captures: &Captures<'_>, name: &str) -> Option<T> {
    captures.name(name)?.as_str().trim().parse().ok()
}
