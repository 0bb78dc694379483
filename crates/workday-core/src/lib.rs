pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod reader;
pub mod segment;
pub mod vtimezone;
pub mod writer;

pub use aggregate::{WorkdayAggregator, WorkdayMap, WorkdayRecord, aggregate};
pub use boundary::{WorkdayBoundary, resolve_local, workday_anchor_of};
pub use config::{WorkdayConfig, parse_timezone};
pub use error::{ConvertError, ConvertResult, ErrorCategory};
pub use filter::KeywordFilter;
pub use pipeline::{AggregatedFeed, Conversion, ConversionSummary, WorkdayConverter, convert};
pub use reader::{ParsedFeed, SkipReason, SkippedEvent, SourceEvent, parse};
pub use segment::{Segment, split_by_workday};
pub use writer::{PRODUCT_ID, render, render_at};
