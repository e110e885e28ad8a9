//! Lexical spaces of the builtin types and the value operations facets need.

use super::model::Builtin;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// A regex compiled on first use. `None` only if the literal is malformed.
macro_rules! lexical {
    ($pattern:expr) => {{
        static CELL: OnceLock<Option<Regex>> = OnceLock::new();
        CELL.get_or_init(|| Regex::new($pattern).ok()).as_ref()
    }};
}

// XML 1.0 (fifth edition) NameStartChar and the extra NameChar ranges.
macro_rules! name_start {
    () => {
        r":A-Z_a-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}"
    };
}
macro_rules! name_extra {
    () => {
        r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}"
    };
}
macro_rules! tz {
    () => {
        r"(Z|[+-](?:0[0-9]|1[0-4]):[0-5][0-9])?"
    };
}

fn is(re: Option<&Regex>, value: &str) -> bool {
    re.is_some_and(|re| re.is_match(value))
}

fn is_name(v: &str) -> bool {
    is(lexical!(concat!("^[", name_start!(), "][", name_start!(), name_extra!(), "]*$")), v)
}

fn is_ncname(v: &str) -> bool {
    is_name(v) && !v.contains(':')
}

fn is_nmtoken(v: &str) -> bool {
    is(lexical!(concat!("^[", name_start!(), name_extra!(), "]+$")), v)
}

pub fn is_decimal(v: &str) -> bool {
    is(lexical!(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$"), v)
}

fn is_double(v: &str) -> bool {
    is(
        lexical!(r"^([+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?|-?INF|NaN)$"),
        v,
    )
}

fn offset(tz: Option<&str>) -> Option<FixedOffset> {
    match tz {
        None | Some("Z") => FixedOffset::east_opt(0),
        Some(tz) => {
            let sign = if tz.starts_with('-') { -1 } else { 1 };
            let hours: i32 = tz.get(1..3)?.parse().ok()?;
            let minutes: i32 = tz.get(4..6)?.parse().ok()?;
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        }
    }
}

fn date_parts(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// An `xs:dateTime`, as UTC when it carries a timezone.
pub fn date_time(v: &str) -> Option<NaiveDateTime> {
    let caps = lexical!(concat!(
        r"^(-?[0-9]{4,})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})(\.[0-9]+)?",
        tz!(),
        "$"
    ))?
    .captures(v)?;
    let date = date_parts(&caps[1], &caps[2], &caps[3])?;
    let nanos = match caps.get(7) {
        Some(frac) => {
            let digits = format!("{:0<9}", &frac.as_str()[1..]);
            digits.get(..9)?.parse().ok()?
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
        nanos,
    )?;
    let local = date.and_time(time);
    match caps.get(8) {
        Some(tz) => {
            let offset = offset(Some(tz.as_str()))?;
            Some(offset.from_local_datetime(&local).single()?.naive_utc())
        }
        None => Some(local),
    }
}

pub fn date(v: &str) -> Option<NaiveDate> {
    let caps = lexical!(concat!(r"^(-?[0-9]{4,})-([0-9]{2})-([0-9]{2})", tz!(), "$"))?.captures(v)?;
    date_parts(&caps[1], &caps[2], &caps[3])
}

pub fn time(v: &str) -> Option<NaiveTime> {
    let caps = lexical!(concat!(r"^([0-9]{2}):([0-9]{2}):([0-9]{2})(\.[0-9]+)?", tz!(), "$"))?.captures(v)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn is_duration(v: &str) -> bool {
    is(
        lexical!(r"^-?P([0-9]+Y)?([0-9]+M)?([0-9]+D)?(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$"),
        v,
    ) && !v.ends_with('P')
        && !v.ends_with('T')
}

/// Decoded length of `xs:base64Binary` content.
pub fn base64_len(v: &str) -> Option<usize> {
    let body: Vec<u8> = v.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if body.len() % 4 != 0 {
        return None;
    }
    let padding = body.iter().rev().take_while(|&&b| b == b'=').count();
    let data = &body[..body.len() - padding];
    let valid = padding <= 2
        && data
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/');
    valid.then(|| body.len() / 4 * 3 - padding)
}

/// Check `value` against the lexical space (and range) of `b`.
pub fn check_builtin(b: Builtin, value: &str) -> Result<(), String> {
    let normalized = b.white_space().apply(value);
    let v = normalized.as_ref();
    let ok = match b {
        Builtin::String
        | Builtin::NormalizedString
        | Builtin::Token
        | Builtin::AnyUri
        | Builtin::AnySimple => true,
        Builtin::Name => is_name(v),
        Builtin::NcName => is_ncname(v),
        Builtin::QName => match v.split_once(':') {
            Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
            None => is_ncname(v),
        },
        Builtin::NmToken => is_nmtoken(v),
        Builtin::NmTokens => !v.is_empty() && v.split(' ').all(is_nmtoken),
        Builtin::NcNames => !v.is_empty() && v.split(' ').all(is_ncname),
        Builtin::Language => is(lexical!(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$"), v),
        Builtin::Boolean => matches!(v, "true" | "false" | "1" | "0"),
        Builtin::Integer { min, max } => {
            if !is(lexical!(r"^[+-]?[0-9]+$"), v) {
                false
            } else if min.is_none() && max.is_none() {
                true
            } else {
                // Out of i128 range is out of every bounded range.
                v.parse::<i128>().is_ok_and(|n| {
                    min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
                })
            }
        }
        Builtin::Decimal => is_decimal(v),
        Builtin::Double => is_double(v),
        Builtin::DateTime => date_time(v).is_some(),
        Builtin::Date => date(v).is_some(),
        Builtin::Time => time(v).is_some(),
        Builtin::Duration => is_duration(v),
        Builtin::GYear => is(lexical!(concat!(r"^-?[0-9]{4,}", tz!(), "$")), v),
        Builtin::GYearMonth => is(lexical!(concat!(r"^-?[0-9]{4,}-(0[1-9]|1[0-2])", tz!(), "$")), v),
        Builtin::GMonth => is(lexical!(concat!(r"^--(0[1-9]|1[0-2])", tz!(), "$")), v),
        Builtin::GDay => is(lexical!(concat!(r"^---(0[1-9]|[12][0-9]|3[01])", tz!(), "$")), v),
        Builtin::GMonthDay => is(
            lexical!(concat!(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])", tz!(), "$")),
            v,
        ),
        Builtin::HexBinary => v.len() % 2 == 0 && v.bytes().all(|b| b.is_ascii_hexdigit()),
        Builtin::Base64Binary => base64_len(v).is_some(),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid {} value", v, builtin_name(b)))
    }
}

fn builtin_name(b: Builtin) -> &'static str {
    match b {
        Builtin::String => "string",
        Builtin::NormalizedString => "normalizedString",
        Builtin::Token => "token",
        Builtin::Name => "Name",
        Builtin::NcName => "NCName",
        Builtin::QName => "QName",
        Builtin::NmToken => "NMTOKEN",
        Builtin::NmTokens => "NMTOKENS",
        Builtin::NcNames => "IDREFS",
        Builtin::Language => "language",
        Builtin::Boolean => "boolean",
        Builtin::Integer { .. } => "integer",
        Builtin::Decimal => "decimal",
        Builtin::Double => "double",
        Builtin::AnyUri => "anyURI",
        Builtin::DateTime => "dateTime",
        Builtin::Date => "date",
        Builtin::Time => "time",
        Builtin::Duration => "duration",
        Builtin::GYear => "gYear",
        Builtin::GYearMonth => "gYearMonth",
        Builtin::GMonth => "gMonth",
        Builtin::GDay => "gDay",
        Builtin::GMonthDay => "gMonthDay",
        Builtin::HexBinary => "hexBinary",
        Builtin::Base64Binary => "base64Binary",
        Builtin::AnySimple => "anySimpleType",
    }
}

/// A value of an ordered type, as range facets compare it.
#[derive(Debug)]
enum Ordinal {
    Number(f64),
    Instant(NaiveDateTime),
    Day(NaiveDate),
    Clock(NaiveTime),
}

fn ordinal(v: &str) -> Option<Ordinal> {
    let v = v.trim();
    if is_double(v) {
        let n = match v {
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            _ => v.parse().ok()?,
        };
        return Some(Ordinal::Number(n));
    }
    date_time(v)
        .map(Ordinal::Instant)
        .or_else(|| date(v).map(Ordinal::Day))
        .or_else(|| time(v).map(Ordinal::Clock))
}

/// Order `value` against the facet `bound`.
pub fn compare(value: &str, bound: &str) -> Result<Ordering, String> {
    let (a, b) = match (ordinal(value), ordinal(bound)) {
        (Some(a), Some(b)) => (a, b),
        (None, _) => return Err(format!("'{}' is not an ordered value", value)),
        (_, None) => return Err(format!("range bound '{}' is not an ordered value", bound)),
    };
    let ordering = match (a, b) {
        (Ordinal::Number(a), Ordinal::Number(b)) => a.partial_cmp(&b),
        (Ordinal::Instant(a), Ordinal::Instant(b)) => Some(a.cmp(&b)),
        (Ordinal::Day(a), Ordinal::Day(b)) => Some(a.cmp(&b)),
        (Ordinal::Clock(a), Ordinal::Clock(b)) => Some(a.cmp(&b)),
        _ => None,
    };
    ordering.ok_or_else(|| format!("'{}' cannot be compared with '{}'", value, bound))
}

/// Significant (total, fraction) digits of a decimal.
pub fn digits(v: &str) -> Option<(usize, usize)> {
    let v = v.trim();
    if !is_decimal(v) {
        return None;
    }
    let body = v.trim_start_matches(['+', '-']);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    Some((int.len() + frac.len(), frac.len()))
}

/// Translate an XML Schema regular expression into an anchored `regex` pattern.
///
/// Unicode block escapes (`\p{IsBasicLatin}`) have no equivalent and are rejected.
pub fn translate_pattern(xsd: &str) -> Result<String, String> {
    let mut out = String::from("^(?:");
    let mut chars = xsd.chars().peekable();
    let mut class_depth = 0usize;

    let push_class = |out: &mut String, negated: bool, body: &str| {
        out.push('[');
        if negated {
            out.push('^');
        }
        out.push_str(body);
        out.push(']');
    };

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let e = chars
                    .next()
                    .ok_or_else(|| format!("pattern '{}' ends with a backslash", xsd))?;
                match e {
                    'i' | 'I' => push_class(&mut out, e == 'I', name_start!()),
                    'c' | 'C' => push_class(&mut out, e == 'C', concat!(name_start!(), name_extra!())),
                    's' | 'S' => push_class(&mut out, e == 'S', r" \t\n\r"),
                    'w' => push_class(&mut out, true, r"\p{P}\p{Z}\p{C}"),
                    'W' => push_class(&mut out, false, r"\p{P}\p{Z}\p{C}"),
                    'd' | 'D' | 'n' | 'r' | 't' => {
                        out.push('\\');
                        out.push(e);
                    }
                    'p' | 'P' => {
                        let mut property = String::new();
                        if chars.next() != Some('{') {
                            return Err(format!("malformed category escape in '{}'", xsd));
                        }
                        for p in chars.by_ref() {
                            if p == '}' {
                                break;
                            }
                            property.push(p);
                        }
                        if property.starts_with("Is") {
                            return Err(format!("Unicode block escape '\\{}{{{}}}' is not supported", e, property));
                        }
                        out.push('\\');
                        out.push(e);
                        out.push('{');
                        out.push_str(&property);
                        out.push('}');
                    }
                    '\\' | '|' | '.' | '-' | '^' | '?' | '*' | '+' | '{' | '}' | '(' | ')' | '['
                    | ']' => {
                        out.push('\\');
                        out.push(e);
                    }
                    other => return Err(format!("unsupported escape '\\{}' in '{}'", other, xsd)),
                }
            }
            '[' if class_depth == 0 => {
                class_depth += 1;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            '[' => return Err(format!("unexpected '[' in a character class of '{}'", xsd)),
            // Class subtraction: [a-z-[aeiou]]
            '-' if class_depth > 0 && chars.peek() == Some(&'[') => {
                chars.next();
                class_depth += 1;
                out.push_str("--[");
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(']');
            }
            '.' if class_depth == 0 => out.push_str(r"[^\n\r]"),
            '^' | '$' if class_depth == 0 => {
                out.push('\\');
                out.push(c);
            }
            '&' | '~' if class_depth > 0 => {
                out.push('\\');
                out.push(c);
            }
            '(' if class_depth == 0 && chars.peek() == Some(&'?') => {
                return Err(format!("'(?' is not allowed in '{}'", xsd))
            }
            _ => out.push(c),
        }
    }
    if class_depth != 0 {
        return Err(format!("unterminated character class in '{}'", xsd));
    }
    out.push_str(")$");
    Ok(out)
}
