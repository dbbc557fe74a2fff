//! Post date parsing
//!
//! Boards print dates in at least four notations. All of them are local
//! Korean time; results are returned in UTC.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use once_cell::sync::Lazy;

use super::pattern::Pattern;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// UTC+9
pub fn kst_offset() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

static JUST_NOW: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"방금|(?i:just now)"));
static MINUTES_AGO: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d+)\s*분\s*전"));
static HOURS_AGO: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d+)\s*시간\s*전"));
static DAYS_AGO: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d+)\s*일\s*전"));

// 2025-07-12 16:56:24, 2025.07.12, 2025/07/12 16:56, 2025.07.12 (16:56:24)
static FULL_DATE: Lazy<Pattern> = Lazy::new(|| {
    Pattern::new(
        r"^(\d{4})\s*[-./]\s*(\d{1,2})\s*[-./]\s*(\d{1,2})\.?(?:[\sT(]+(\d{1,2}):(\d{2})(?::(\d{2}))?)?",
    )
});

// 25/07/11, 25.07.11, 25-07-11
static SHORT_YEAR_DATE: Lazy<Pattern> =
    Lazy::new(|| Pattern::new(r"^(\d{2})[-./](\d{1,2})[-./](\d{1,2})(?:\s+(\d{1,2}):(\d{2}))?$"));

// 07-11, 07.11, 07/11
static MONTH_DAY: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"^(\d{1,2})[-./](\d{1,2})\.?$"));

// 16:56, 16:56:24
static TIME_ONLY: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$"));

fn group(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn local_to_utc(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    kst_offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn time_of(hour: Option<u32>, minute: Option<u32>, second: Option<u32>) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.unwrap_or(0), minute.unwrap_or(0), second.unwrap_or(0))
}

fn relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if JUST_NOW.is_match(text) {
        return Some(now);
    }
    let amount = |pattern: &Pattern| pattern.capture(text).and_then(|n| n.parse::<i64>().ok());
    let ago = |delta: Option<TimeDelta>| delta.and_then(|delta| now.checked_sub_signed(delta));
    if let Some(minutes) = amount(&MINUTES_AGO) {
        return ago(TimeDelta::try_minutes(minutes));
    }
    if let Some(hours) = amount(&HOURS_AGO) {
        return ago(TimeDelta::try_hours(hours));
    }
    amount(&DAYS_AGO).and_then(|days| ago(TimeDelta::try_days(days)))
}

/// Parse a board date, or `None` when the text has no recognizable shape
pub fn try_parse_post_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(parsed) = relative(text, now) {
        return Some(parsed);
    }

    let local_now = now.with_timezone(&kst_offset());

    if let Some(caps) = FULL_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            group(&caps, 1)? as i32,
            group(&caps, 2)?,
            group(&caps, 3)?,
        )?;
        let time = time_of(group(&caps, 4), group(&caps, 5), group(&caps, 6))?;
        return local_to_utc(date, time);
    }

    if let Some(caps) = SHORT_YEAR_DATE.captures(text) {
        let year = 2000 + group(&caps, 1)? as i32;
        let date = NaiveDate::from_ymd_opt(year, group(&caps, 2)?, group(&caps, 3)?)?;
        let time = time_of(group(&caps, 4), group(&caps, 5), None)?;
        return local_to_utc(date, time);
    }

    if let Some(caps) = TIME_ONLY.captures(text) {
        let time = time_of(group(&caps, 1), group(&caps, 2), group(&caps, 3))?;
        return local_to_utc(local_now.date_naive(), time);
    }

    if let Some(caps) = MONTH_DAY.captures(text) {
        let (month, day) = (group(&caps, 1)?, group(&caps, 2)?);
        let this_year = NaiveDate::from_ymd_opt(local_now.year(), month, day)
            .and_then(|date| local_to_utc(date, NaiveTime::MIN));
        return match this_year {
            Some(candidate) if candidate <= now => Some(candidate),
            // in the future: the post is from last year
            _ => NaiveDate::from_ymd_opt(local_now.year() - 1, month, day)
                .and_then(|date| local_to_utc(date, NaiveTime::MIN)),
        };
    }

    None
}

/// Total variant: unrecognized text resolves to `now`.
///
/// A silent fallback makes a post look fresh, which can keep the
/// time-window controller paging longer than necessary.
pub fn parse_post_date(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    try_parse_post_date(text, now).unwrap_or(now)
}
