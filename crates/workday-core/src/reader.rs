use crate::boundary::resolve_local;
use crate::error::{ConvertError, ConvertResult};
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::unfold;
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime};
use std::borrow::Cow;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// One event instance from the source feed, with times resolved to instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

impl SourceEvent {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            summary: String::new(),
            description: String::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingStart,
    MissingEnd,
    EndBeforeStart,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingStart => "missing DTSTART",
            SkipReason::MissingEnd => "missing DTEND",
            SkipReason::EndBeforeStart => "DTEND before DTSTART",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event dropped while reading; the rest of the feed is still used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEvent {
    /// Position among the VEVENT blocks of the feed.
    pub index: usize,
    pub uid: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub events: Vec<SourceEvent>,
    pub skipped: Vec<SkippedEvent>,
}

/// Parses a calendar payload into events.
///
/// Floating and all-day values, and values tagged with a TZID unknown to the
/// timezone database, are read in `timezone`.
pub fn parse(raw: &str, timezone: Tz) -> ConvertResult<ParsedFeed> {
    let body = raw.trim_start_matches('\u{feff}').trim_start();
    ensure_calendar_envelope(body)?;
    let calendar = normalize_names(&unfold(body))
        .parse::<Calendar>()
        .map_err(|err| ConvertError::malformed(format!("{err}")))?;

    let mut feed = ParsedFeed::default();
    let events = calendar.components.iter().filter_map(|component| match component {
        CalendarComponent::Event(event) => Some(event),
        _ => None,
    });

    for (index, event) in events.enumerate() {
        let uid = event.property_value("UID").map(str::to_string);
        let start = event.get_start().map(|value| to_instant(value, timezone));
        let end = event.get_end().map(|value| to_instant(value, timezone));

        let outcome = match (start, end) {
            (None, _) => Err(SkipReason::MissingStart),
            (_, None) => Err(SkipReason::MissingEnd),
            (Some(start), Some(end)) if end < start => Err(SkipReason::EndBeforeStart),
            (Some(start), Some(end)) => Ok((start, end)),
        };

        match outcome {
            Ok((start, end)) => feed.events.push(SourceEvent {
                start,
                end,
                summary: event.get_summary().unwrap_or_default().to_string(),
                description: event.get_description().unwrap_or_default().to_string(),
            }),
            Err(reason) => {
                warn!(index, uid = uid.as_deref().unwrap_or("-"), %reason, "skipping event");
                feed.skipped.push(SkippedEvent { index, uid, reason });
            }
        }
    }

    Ok(feed)
}

fn ensure_calendar_envelope(body: &str) -> ConvertResult<()> {
    let first_line = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty());
    match first_line {
        Some(line) if line.eq_ignore_ascii_case("BEGIN:VCALENDAR") => Ok(()),
        Some(line) => Err(ConvertError::malformed(format!(
            "expected BEGIN:VCALENDAR, found '{}'",
            truncate(line, 40)
        ))),
        None => Err(ConvertError::malformed("empty payload")),
    }
}

/// Uppercases component, property and parameter names, which are
/// case-insensitive but only recognized by the parser in upper case.
/// Expects unfolded input.
fn normalize_names(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for physical in body.split_inclusive('\n') {
        let content = physical.trim_end_matches(['\r', '\n']);
        out.push_str(&normalize_line(content));
        out.push_str(&physical[content.len()..]);
    }
    out
}

fn normalize_line(line: &str) -> Cow<'_, str> {
    let mut head = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut in_param_value = false;
    let mut value_at = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                head.push(ch);
            }
            ':' if !in_quotes => {
                value_at = Some(idx);
                break;
            }
            ';' if !in_quotes => {
                in_param_value = false;
                head.push(ch);
            }
            '=' if !in_quotes && !in_param_value => {
                in_param_value = true;
                head.push(ch);
            }
            _ if in_quotes || in_param_value => head.push(ch),
            _ => head.push(ch.to_ascii_uppercase()),
        }
    }

    // lines without a value are left for the parser to reject
    let Some(idx) = value_at else {
        return Cow::Borrowed(line);
    };
    let value = &line[idx..];
    if head == "BEGIN" || head == "END" {
        head.push_str(&value.to_ascii_uppercase());
    } else {
        head.push_str(value);
    }
    Cow::Owned(head)
}

fn to_instant(value: DatePerhapsTime, fallback: Tz) -> DateTime<Utc> {
    match value {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(instant)) => instant,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(local)) => {
            resolve_local(fallback, local)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let zone = tzid.trim_matches('"').parse::<Tz>().unwrap_or_else(|_| {
                debug!(%tzid, fallback = fallback.name(), "unknown TZID, using configured zone");
                fallback
            });
            resolve_local(zone, date_time)
        }
        DatePerhapsTime::Date(date) => resolve_local(fallback, date.and_time(NaiveTime::MIN)),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
