//! Shared bucketing helpers used by the platform extractors.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HASHTAG_RE: Regex = Regex::new(r"#(\w+)").unwrap();
    static ref MENTION_RE: Regex = Regex::new(r"@(\w+)").unwrap();
}

pub const UNKNOWN: &str = "unknown";

const TEXT_SHORT_MAX: usize = 100;
const TEXT_MEDIUM_MAX: usize = 300;
const TEXT_LONG_MAX: usize = 1000;

const FOLLOWERS_SMALL_MAX: f64 = 1_000.0;
const FOLLOWERS_MEDIUM_MAX: f64 = 10_000.0;
const FOLLOWERS_LARGE_MAX: f64 = 100_000.0;

const DURATION_SHORT_MAX: f64 = 15.0;
const DURATION_MEDIUM_MAX: f64 = 30.0;
const DURATION_LONG_MAX: f64 = 60.0;

/// Publication time split into the parts the miner buckets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedAt {
    pub hour: u32,
    pub weekday: Weekday,
}

impl From<NaiveDateTime> for PostedAt {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            hour: dt.hour(),
            weekday: dt.weekday(),
        }
    }
}

/// Parses RFC 3339 timestamps as well as the naive `YYYY-MM-DD HH:MM[:SS]`
/// shapes the scrapers emit.
pub fn parse_timestamp(raw: &str) -> Option<PostedAt> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().into());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(PostedAt::from)
}

/// Unix timestamp in seconds (milliseconds are detected and scaled).
pub fn parse_epoch(seconds: f64) -> Option<PostedAt> {
    let seconds = if seconds > 1e11 { seconds / 1000.0 } else { seconds };
    DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.naive_utc().into())
}

pub fn time_period(hour: u32) -> &'static str {
    match hour {
        6..=11 => "morning",
        12..=17 => "afternoon",
        18..=21 => "evening",
        _ => "night",
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn is_weekend_day(name: &str) -> bool {
    matches!(name, "saturday" | "sunday")
}

/// Appends the time-of-day, weekday and weekend tokens for a publication time.
pub fn time_tokens(posted_at: Option<PostedAt>) -> [String; 3] {
    match posted_at {
        Some(at) => {
            let day = weekday_name(at.weekday);
            let part = if is_weekend_day(day) {
                "weekend"
            } else {
                "weekday"
            };
            [
                format!("time_{}", time_period(at.hour)),
                format!("day_{}", day),
                part.to_string(),
            ]
        }
        None => [
            format!("time_{}", UNKNOWN),
            format!("day_{}", UNKNOWN),
            format!("weekpart_{}", UNKNOWN),
        ],
    }
}

pub fn text_length_class(text: Option<&str>) -> &'static str {
    let Some(text) = text else {
        return UNKNOWN;
    };
    match text.chars().count() {
        n if n < TEXT_SHORT_MAX => "short",
        n if n < TEXT_MEDIUM_MAX => "medium",
        n if n < TEXT_LONG_MAX => "long",
        _ => "very_long",
    }
}

pub fn follower_class(followers: Option<f64>) -> &'static str {
    match followers {
        None => UNKNOWN,
        Some(n) if n < FOLLOWERS_SMALL_MAX => "small",
        Some(n) if n < FOLLOWERS_MEDIUM_MAX => "medium",
        Some(n) if n < FOLLOWERS_LARGE_MAX => "large",
        Some(_) => "very_large",
    }
}

pub fn duration_class(seconds: Option<f64>) -> &'static str {
    match seconds {
        None => UNKNOWN,
        Some(s) if s < DURATION_SHORT_MAX => "short",
        Some(s) if s < DURATION_MEDIUM_MAX => "medium",
        Some(s) if s < DURATION_LONG_MAX => "long",
        Some(_) => "very_long",
    }
}

/// `no_`, `few_` or `many_` prefix for a per-record count.
pub fn count_class(count: usize, few_max: usize) -> &'static str {
    match count {
        0 => "no",
        n if n <= few_max => "few",
        _ => "many",
    }
}

pub fn extract_hashtags(text: &str) -> Vec<String> {
    capture_all(&HASHTAG_RE, text)
}

pub fn extract_mentions(text: &str) -> Vec<String> {
    capture_all(&MENTION_RE, text)
}

fn capture_all(re: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in re.captures_iter(text) {
        let value = caps[1].to_lowercase();
        if !found.contains(&value) {
            found.push(value);
        }
    }
    found
}

/// Lowercases and joins whitespace runs with `_`. Blank input yields `None`.
pub fn slug(raw: &str) -> Option<String> {
    let joined = raw
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
