use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use workday_core::{Segment, WorkdayAggregator, aggregate};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(day: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, h, 0, 0).unwrap()
}

fn seg(workday: NaiveDate, start: DateTime<Utc>, end: DateTime<Utc>) -> Segment {
    Segment {
        workday,
        start,
        end,
    }
}

fn sample() -> Vec<Segment> {
    vec![
        seg(d(2024, 3, 11), t(11, 9), t(11, 12)),
        seg(d(2024, 3, 11), t(11, 7), t(11, 8)),
        seg(d(2024, 3, 12), t(12, 10), t(12, 11)),
        seg(d(2024, 3, 11), t(11, 13), t(11, 17)),
        seg(d(2024, 3, 12), t(12, 6), t(12, 9)),
    ]
}

#[test]
fn folds_to_min_start_and_max_end_per_workday() {
    let records = aggregate(sample());
    assert_eq!(records.len(), 2);
    let first = &records[&d(2024, 3, 11)];
    assert_eq!(first.earliest_start, t(11, 7));
    assert_eq!(first.latest_end, t(11, 17));
    let second = &records[&d(2024, 3, 12)];
    assert_eq!(second.earliest_start, t(12, 6));
    assert_eq!(second.latest_end, t(12, 11));
}

#[test]
fn result_does_not_depend_on_arrival_order() {
    let forward = aggregate(sample());
    let mut reversed = sample();
    reversed.reverse();
    assert_eq!(aggregate(reversed), forward);

    let mut rotated = sample();
    rotated.rotate_left(2);
    assert_eq!(aggregate(rotated), forward);
}

#[test]
fn bounds_cover_every_contributing_segment() {
    let segments = sample();
    let records = aggregate(segments.clone());
    for segment in &segments {
        let record = &records[&segment.workday];
        assert!(record.earliest_start <= segment.start);
        assert!(record.latest_end >= segment.end);
        assert!(record.is_consistent());
    }
}

#[test]
fn degenerate_segment_is_absorbed() {
    let mut aggregator = WorkdayAggregator::new();
    aggregator.push(&seg(d(2024, 3, 11), t(11, 8), t(11, 16)));
    aggregator.push(&seg(d(2024, 3, 11), t(11, 10), t(11, 10)));
    assert_eq!(aggregator.segment_count(), 2);
    let record = aggregator.get(d(2024, 3, 11)).unwrap();
    assert_eq!(record.earliest_start, t(11, 8));
    assert_eq!(record.latest_end, t(11, 16));
}

#[test]
fn lone_degenerate_segment_makes_zero_width_record() {
    let records = aggregate(vec![seg(d(2024, 3, 11), t(11, 10), t(11, 10))]);
    let record = &records[&d(2024, 3, 11)];
    assert_eq!(record.earliest_start, record.latest_end);
    assert!(record.is_consistent());
}

#[test]
fn records_iterate_in_workday_order() {
    let records = aggregate(sample());
    let keys: Vec<NaiveDate> = records.keys().copied().collect();
    assert_eq!(keys, vec![d(2024, 3, 11), d(2024, 3, 12)]);
}
