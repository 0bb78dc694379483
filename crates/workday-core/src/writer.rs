use crate::aggregate::{WorkdayMap, WorkdayRecord};
use crate::error::{ConvertError, ConvertResult};
use crate::vtimezone;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

pub const PRODUCT_ID: &str = "-//iCal Converter//Calendar//SV";

const UTC_ZONE_NAMES: [&str; 8] = [
    "UTC",
    "Etc/UTC",
    "Etc/UCT",
    "Etc/Universal",
    "Etc/Zulu",
    "UCT",
    "Universal",
    "Zulu",
];

/// Renders one VEVENT per workday, stamped with the current time.
pub fn render(records: &WorkdayMap, summary: &str, timezone: Tz) -> ConvertResult<String> {
    render_at(records, summary, timezone, Utc::now())
}

pub fn render_at(
    records: &WorkdayMap,
    summary: &str,
    timezone: Tz,
    generated_at: DateTime<Utc>,
) -> ConvertResult<String> {
    let mut calendar = Calendar::empty();
    calendar
        .append_property(("VERSION", "2.0"))
        .append_property(("PRODID", PRODUCT_ID))
        .append_property(("CALSCALE", "GREGORIAN"));

    let summary = summary.replace('\r', "");
    for record in records.values() {
        check_record(record)?;
        let event = Event::new()
            .uid(&new_uid(record))
            .starts(calendar_time(record.earliest_start, timezone))
            .ends(calendar_time(record.latest_end, timezone))
            .summary(&summary)
            .timestamp(generated_at)
            .done();
        calendar.push(event);
    }

    let document = calendar.to_string();
    Ok(match vtimezone::definition(timezone) {
        Some(lines) => splice_timezone(document, &lines),
        None => document,
    })
}

fn check_record(record: &WorkdayRecord) -> ConvertResult<()> {
    if record.is_consistent() {
        Ok(())
    } else {
        Err(ConvertError::RenderInconsistency {
            workday: record.workday,
            earliest_start: record.earliest_start,
            latest_end: record.latest_end,
        })
    }
}

fn new_uid(record: &WorkdayRecord) -> String {
    format!("{}-{:016x}", record.workday, rand::random::<u64>())
}

fn is_utc_zone(timezone: Tz) -> bool {
    UTC_ZONE_NAMES.contains(&timezone.name())
}

fn calendar_time(instant: DateTime<Utc>, timezone: Tz) -> CalendarDateTime {
    if is_utc_zone(timezone) {
        CalendarDateTime::Utc(instant)
    } else {
        CalendarDateTime::WithTimezone {
            date_time: instant.with_timezone(&timezone).naive_local(),
            tzid: timezone.name().to_string(),
        }
    }
}

/// Inserts the VTIMEZONE block after the calendar properties. The calendar
/// model has no component for it, so it is added to the serialized text.
fn splice_timezone(document: String, lines: &[String]) -> String {
    let at = document
        .find("BEGIN:VEVENT\r\n")
        .or_else(|| document.rfind("END:VCALENDAR\r\n"))
        .unwrap_or(document.len());
    let mut block = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
    for line in lines {
        block.push_str(line);
        block.push_str("\r\n");
    }
    let mut out = document;
    out.insert_str(at, &block);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn one_record() -> WorkdayMap {
        let start = NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
            .and_utc();
        let mut map = WorkdayMap::new();
        map.insert(
            start.date_naive(),
            WorkdayRecord {
                workday: start.date_naive(),
                earliest_start: start,
                latest_end: start + chrono::Duration::hours(8),
            },
        );
        map
    }

    #[test]
    fn long_summaries_fold_within_octet_limit() {
        let summary = "å".repeat(60);
        let text = render(&one_record(), &summary, chrono_tz::UTC).unwrap();
        for physical in text.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(physical.len() <= 75, "{physical:?} too long");
        }
        let unfolded = text.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("SUMMARY:{summary}\r\n")));
    }

    #[test]
    fn summary_delimiters_are_escaped() {
        let text = render(&one_record(), "a,b;c\\d\r\ne", chrono_tz::UTC).unwrap();
        assert!(text.contains("SUMMARY:a\\,b\\;c\\\\d\\ne\r\n"));
    }

    #[test]
    fn utc_zone_renders_zulu_times() {
        let text = render(&one_record(), "Jobb", chrono_tz::UTC).unwrap();
        assert!(text.contains("DTSTART:20240311T070000Z\r\n"));
        assert!(!text.contains("BEGIN:VTIMEZONE"));

        let text = render(&one_record(), "Jobb", chrono_tz::Europe::Stockholm).unwrap();
        assert!(text.contains("DTSTART;TZID=Europe/Stockholm:20240311T080000\r\n"));
    }

    #[test]
    fn timezone_block_sits_before_end_of_an_empty_calendar() {
        let text = render(&WorkdayMap::new(), "Jobb", chrono_tz::Europe::Stockholm).unwrap();
        let block = text.find("BEGIN:VTIMEZONE").unwrap();
        assert!(block > text.find("CALSCALE:GREGORIAN").unwrap());
        assert!(text.ends_with("END:VTIMEZONE\r\nEND:VCALENDAR\r\n"));
    }
}
