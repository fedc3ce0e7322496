//! Pure helper functions shared across services.

pub mod extract;
pub mod timestamp;

pub use extract::{ExtractError, Shape, extract_structured, locate_payload};
pub use timestamp::{
    TimestampError, TimestampMention, extract_timestamps, find_text_in_segments, format_position,
    format_timestamp, parse_timestamp,
};
