use chrono::{TimeZone, Utc};
use workday_core::{WorkdayConfig, convert};
use workday_feed::feed::FEED_ID_LEN;
use workday_feed::{FeedRecord, feed_id};

#[test]
fn feed_id_is_a_short_stable_hex_digest() {
    let id = feed_id("https://example.com/a.ics", "Jobb");
    assert_eq!(id.len(), FEED_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(id, feed_id("https://example.com/a.ics", "Jobb"));
    assert_ne!(id, feed_id("https://example.com/a.ics", "Work"));
    assert_ne!(id, feed_id("webcal://example.com/a.ics", "Jobb"));
}

#[test]
fn feed_id_hashes_url_and_summary_concatenated() {
    // sha256("abc") = ba7816bf8f01cfea...
    assert_eq!(feed_id("ab", "c"), "ba7816bf8f01cfea");
    assert_eq!(feed_id("a", "bc"), feed_id("ab", "c"));
}

#[test]
fn record_follows_its_conversion() {
    let raw = concat!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Roster//EN\r\n",
        "BEGIN:VEVENT\r\n",
        "DTSTART:20240304T070000Z\r\n",
        "DTEND:20240304T150000Z\r\n",
        "SUMMARY:Pass\r\n",
        "END:VEVENT\r\n",
        "END:VCALENDAR\r\n",
    );
    let conversion = convert(raw, &WorkdayConfig::default()).unwrap();
    let document = conversion.document.clone();
    let stamp = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();

    let mut record =
        FeedRecord::from_conversion("https://example.com/a.ics", "Jobb", conversion, stamp);
    assert_eq!(record.unique_id, feed_id("https://example.com/a.ics", "Jobb"));
    assert_eq!(record.ical_content, document);
    assert_eq!(record.workdays.len(), 1);

    let empty = convert(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Roster//EN\r\nEND:VCALENDAR\r\n",
        &WorkdayConfig::default(),
    )
    .unwrap();
    let later = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
    record.apply_conversion(empty, later);
    assert!(record.workdays.is_empty());
    assert_eq!(record.last_updated, later);
    assert_eq!(record.unique_id, feed_id("https://example.com/a.ics", "Jobb"));
}
