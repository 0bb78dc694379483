use crate::aggregate::{WorkdayAggregator, WorkdayMap};
use crate::boundary::WorkdayBoundary;
use crate::config::WorkdayConfig;
use crate::error::ConvertResult;
use crate::filter::KeywordFilter;
use crate::reader::{self, SkippedEvent};
use crate::segment::split_by_workday;
use crate::writer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub event_count: usize,
    pub excluded_count: usize,
    pub skipped_count: usize,
    pub segment_count: usize,
    pub workday_count: usize,
}

impl ConversionSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("events={}", self.event_count));
        parts.push(format!("workdays={}", self.workday_count));
        parts.push(format!("segments={}", self.segment_count));
        if self.excluded_count > 0 {
            parts.push(format!("excluded={}", self.excluded_count));
        }
        if self.skipped_count > 0 {
            parts.push(format!("skipped={}", self.skipped_count));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct AggregatedFeed {
    pub records: WorkdayMap,
    pub skipped: Vec<SkippedEvent>,
    pub summary: ConversionSummary,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: String,
    pub records: WorkdayMap,
    pub skipped: Vec<SkippedEvent>,
    pub summary: ConversionSummary,
}

/// Validated configuration ready to turn feeds into workday calendars.
///
/// Holds no mutable state, so one converter can serve any number of callers.
#[derive(Debug, Clone)]
pub struct WorkdayConverter {
    config: WorkdayConfig,
    boundary: WorkdayBoundary,
    filter: KeywordFilter,
}

impl WorkdayConverter {
    pub fn new(config: WorkdayConfig) -> ConvertResult<Self> {
        config.validate()?;
        let boundary = WorkdayBoundary::from_config(&config)?;
        let filter = KeywordFilter::new(&config.exclusion_keywords);
        Ok(Self {
            config,
            boundary,
            filter,
        })
    }

    pub fn config(&self) -> &WorkdayConfig {
        &self.config
    }

    pub fn boundary(&self) -> &WorkdayBoundary {
        &self.boundary
    }

    pub fn filter(&self) -> &KeywordFilter {
        &self.filter
    }

    pub fn aggregate(&self, raw: &str) -> ConvertResult<AggregatedFeed> {
        let parsed = reader::parse(raw, self.boundary.timezone())?;
        let mut summary = ConversionSummary {
            event_count: parsed.events.len(),
            skipped_count: parsed.skipped.len(),
            ..ConversionSummary::default()
        };

        let mut aggregator = WorkdayAggregator::new();
        for event in &parsed.events {
            if let Some(term) = self.filter.matching_term(event) {
                debug!(summary = %event.summary, term, "excluding event");
                summary.excluded_count += 1;
                continue;
            }
            aggregator.extend(split_by_workday(event.start, event.end, &self.boundary));
        }

        summary.segment_count = aggregator.segment_count();
        summary.workday_count = aggregator.len();
        Ok(AggregatedFeed {
            records: aggregator.into_records(),
            skipped: parsed.skipped,
            summary,
        })
    }

    pub fn convert(&self, raw: &str) -> ConvertResult<Conversion> {
        self.convert_at(raw, Utc::now())
    }

    pub fn convert_at(&self, raw: &str, generated_at: DateTime<Utc>) -> ConvertResult<Conversion> {
        let aggregated = self.aggregate(raw)?;
        let document = writer::render_at(
            &aggregated.records,
            &self.config.summary,
            self.boundary.timezone(),
            generated_at,
        )?;
        Ok(Conversion {
            document,
            records: aggregated.records,
            skipped: aggregated.skipped,
            summary: aggregated.summary,
        })
    }
}

pub fn convert(raw: &str, config: &WorkdayConfig) -> ConvertResult<Conversion> {
    WorkdayConverter::new(config.clone())?.convert(raw)
}
