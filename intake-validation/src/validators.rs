// Built-in format predicates

use crate::classify::{is_numeric_str, parse_numeric_str};
use intake_core::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// Common regex patterns
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$").unwrap()
});

static ALPHA_DASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]*$").unwrap());

static ALPHANUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]*$").unwrap());

/// Schemes that are valid URLs without a host
const HOSTLESS_SCHEMES: &[&str] = &["mailto", "news", "file", "urn", "data"];

const ACCEPTED: &[&str] = &["yes", "on", "1", "true"];
const BOOLEAN: &[&str] = &["yes", "no", "on", "off", "1", "0", "true", "false"];

/// Email address with a dotted domain
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Absolute URL; a host is required unless the scheme has none
pub fn is_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => url.has_host() || HOSTLESS_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}

/// Host to look up for a URL or bare host name
pub fn host_of(value: &str) -> Option<String> {
    match url::Url::parse(value) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(_) => {
            let host = value.trim().trim_end_matches('.');
            (!host.is_empty() && !host.contains(['/', ' ', '@'])).then(|| host.to_string())
        }
    }
}

pub fn is_ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

pub fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

pub fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

/// JSON text that does not decode to `null`
pub fn is_json(value: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(value).is_ok_and(|json| !json.is_null())
}

/// ASCII letters only
pub fn is_alpha(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
}

/// ASCII letters, digits, dashes and underscores
pub fn is_alpha_dash(value: &str) -> bool {
    ALPHA_DASH_REGEX.is_match(value)
}

/// ASCII letters and digits
pub fn is_alpha_num(value: &str) -> bool {
    ALPHANUMERIC_REGEX.is_match(value)
}

/// Non-negative whole number: digit-only text or a non-negative integer
pub fn is_integer(value: &FieldValue) -> bool {
    match value {
        FieldValue::String(s) => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        FieldValue::Int(n) => *n >= 0,
        _ => false,
    }
}

/// One of yes/on/1/true (case-insensitive), the integer 1 or `true`
pub fn is_accepted(value: &FieldValue) -> bool {
    match value {
        FieldValue::String(s) => ACCEPTED.contains(&s.to_ascii_lowercase().as_str()),
        FieldValue::Int(n) => *n == 1,
        FieldValue::Bool(b) => *b,
        _ => false,
    }
}

/// A value convertible to a boolean
pub fn is_boolean(value: &FieldValue) -> bool {
    match value {
        FieldValue::String(s) => BOOLEAN.contains(&s.to_ascii_lowercase().as_str()),
        FieldValue::Int(n) => *n == 0 || *n == 1,
        FieldValue::Bool(_) => true,
        _ => false,
    }
}

/// Numeric text of exactly `length` characters
pub fn has_digits(value: &str, length: usize) -> bool {
    is_numeric_str(value) && value.len() == length
}

/// Numeric text whose length lies in `min..=max`
pub fn has_digits_between(value: &str, min: usize, max: usize) -> bool {
    is_numeric_str(value) && (min..=max).contains(&value.len())
}

/// IANA timezone identifier
pub fn is_timezone(value: &str) -> bool {
    value.parse::<chrono_tz::Tz>().is_ok()
}

/// Loose equality between a value and a rule argument.
///
/// Numbers and numeric strings compare numerically, null equals the empty
/// string, booleans compare by truthiness and everything else by text.
pub fn loose_eq(value: &FieldValue, arg: &str) -> bool {
    match value {
        FieldValue::Null => arg.is_empty(),
        FieldValue::Bool(b) => *b == (!arg.is_empty() && arg != "0"),
        FieldValue::String(s) => match (parse_numeric_str(s), parse_numeric_str(arg)) {
            (Some(left), Some(right)) => left == right,
            _ => s == arg,
        },
        FieldValue::Int(_) | FieldValue::Float(_) => {
            match (crate::classify::parse_number(value), parse_numeric_str(arg)) {
                (Some(left), Some(right)) => left == right,
                _ => value.as_text().is_some_and(|text| text == arg),
            }
        }
        _ => false,
    }
}
