use crate::segment::Segment;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Earliest start and latest end of everything scheduled on one workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdayRecord {
    pub workday: NaiveDate,
    pub earliest_start: DateTime<Utc>,
    pub latest_end: DateTime<Utc>,
}

impl WorkdayRecord {
    pub fn from_segment(segment: &Segment) -> Self {
        Self {
            workday: segment.workday,
            earliest_start: segment.start,
            latest_end: segment.end,
        }
    }

    pub fn absorb(&mut self, segment: &Segment) {
        self.earliest_start = self.earliest_start.min(segment.start);
        self.latest_end = self.latest_end.max(segment.end);
    }

    pub fn is_consistent(&self) -> bool {
        self.earliest_start <= self.latest_end
    }
}

pub type WorkdayMap = BTreeMap<NaiveDate, WorkdayRecord>;

/// Folds segments into one record per workday. Arrival order does not matter.
#[derive(Debug, Clone, Default)]
pub struct WorkdayAggregator {
    records: WorkdayMap,
    segment_count: usize,
}

impl WorkdayAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: &Segment) {
        self.segment_count += 1;
        self.records
            .entry(segment.workday)
            .and_modify(|record| record.absorb(segment))
            .or_insert_with(|| WorkdayRecord::from_segment(segment));
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, workday: NaiveDate) -> Option<&WorkdayRecord> {
        self.records.get(&workday)
    }

    pub fn into_records(self) -> WorkdayMap {
        self.records
    }
}

impl<'a> Extend<&'a Segment> for WorkdayAggregator {
    fn extend<T: IntoIterator<Item = &'a Segment>>(&mut self, iter: T) {
        for segment in iter {
            self.push(segment);
        }
    }
}

impl Extend<Segment> for WorkdayAggregator {
    fn extend<T: IntoIterator<Item = Segment>>(&mut self, iter: T) {
        for segment in iter {
            self.push(&segment);
        }
    }
}

pub fn aggregate<I>(segments: I) -> WorkdayMap
where
    I: IntoIterator<Item = Segment>,
{
    let mut aggregator = WorkdayAggregator::new();
    aggregator.extend(segments);
    aggregator.into_records()
}
