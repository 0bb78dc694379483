use crate::boundary::WorkdayBoundary;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The part of an event that falls inside one workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub workday: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Segment {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Cuts `[start, end)` at every workday boundary it crosses.
///
/// Segments come back in chronological order and are contiguous. A zero-length
/// interval yields a single degenerate segment; an inverted one yields nothing.
pub fn split_by_workday(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    boundary: &WorkdayBoundary,
) -> Vec<Segment> {
    if end < start {
        return Vec::new();
    }
    if end == start {
        return vec![Segment {
            workday: boundary.workday_of(start),
            start,
            end,
        }];
    }

    let mut segments = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let mut workday = boundary.workday_of(cursor);
        let mut close = boundary.closing(workday);
        // Only reachable around odd DST rules where a local boundary repeats.
        while close <= cursor {
            match workday.succ_opt() {
                Some(next) => {
                    workday = next;
                    close = boundary.closing(workday);
                }
                None => {
                    warn!(%start, %end, %cursor, "no workday closes after cursor, stopping");
                    return segments;
                }
            }
        }

        // close > cursor here, so every pass moves the cursor forward
        let segment_end = close.min(end);
        segments.push(Segment {
            workday,
            start: cursor,
            end: segment_end,
        });
        cursor = segment_end;
    }
    segments
}
