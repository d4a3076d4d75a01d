//! Date parsing primitives for the calendar rules

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Parse a date or date-time the way the calendar rules understand dates.
///
/// Accepts `now`, `today`, `tomorrow`, `yesterday`, `@<unix seconds>`,
/// RFC 3339, RFC 2822 and a set of common numeric and month-name layouts.
/// Offsets are converted to local time; everything else is read as local.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    let now = Local::now().naive_local();
    let today = now.date();
    match text.to_ascii_lowercase().as_str() {
        "now" => return Some(now),
        "today" | "midnight" => return Some(today.and_time(NaiveTime::MIN)),
        "tomorrow" => return today.succ_opt().map(|d| d.and_time(NaiveTime::MIN)),
        "yesterday" => return today.pred_opt().map(|d| d.and_time(NaiveTime::MIN)),
        _ => {}
    }

    if let Some(seconds) = text.strip_prefix('@') {
        let seconds: i64 = seconds.parse().ok()?;
        return DateTime::from_timestamp(seconds, 0)
            .map(|utc| utc.with_timezone(&Local).naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Whether `value` matches a date format written with single-letter
/// codes, e.g. `Y-m-d H:i:s`.
///
/// Only the shape and field ranges are checked; the fields do not need to
/// form a complete or real calendar date.
pub fn matches_format(value: &str, format: &str) -> bool {
    let strftime = translate_format(format);
    let mut parsed = Parsed::new();
    parse(&mut parsed, value, StrftimeItems::new(&strftime)).is_ok()
}

/// Translate single-letter format codes (`Y-m-d H:i:s`) into strftime specifiers.
fn translate_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        let spec = match c {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'n' => "%m",
            'd' | 'j' => "%d",
            'H' | 'G' => "%H",
            'h' | 'g' => "%I",
            'i' => "%M",
            's' => "%S",
            'A' | 'a' => "%p",
            'M' => "%b",
            'F' => "%B",
            'D' => "%a",
            'l' => "%A",
            'U' => "%s",
            'O' => "%z",
            'P' => "%:z",
            '%' => "%%",
            '\\' => {
                match chars.next() {
                    Some('%') => out.push_str("%%"),
                    Some(escaped) => out.push(escaped),
                    None => {}
                }
                continue;
            }
            literal => {
                out.push(literal);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}
