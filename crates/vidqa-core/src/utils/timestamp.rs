//! Timestamp text codec.
//!
//! Positions are written as `M:SS` below one hour and `H:MM:SS` from one
//! hour on. Parsing accepts both two- and three-field forms.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::domain::{TranscriptMatch, TranscriptSegment};

/// One or two digits, a colon, two digits, optionally a colon and two more digits.
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2})(?::(\d{2}))?").expect("timestamp pattern is valid")
});

/// Errors from parsing timestamp text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Invalid timestamp format: {0:?}")]
    InvalidFormat(String),

    #[error("Timestamp out of range: {0:?}")]
    Overflow(String),
}

/// A timestamp found inside free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampMention {
    /// The matched text, exactly as written.
    pub text: String,
    pub seconds: u64,
}

/// Format whole seconds as `M:SS` or `H:MM:SS`.
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Format a fractional position, truncating to whole seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_position(position_seconds: f64) -> String {
    if position_seconds.is_finite() && position_seconds > 0.0 {
        format_timestamp(position_seconds as u64)
    } else {
        format_timestamp(0)
    }
}

/// Parse `HH:MM:SS` / `MM:SS` (any digit count per field) into seconds.
pub fn parse_timestamp(text: &str) -> Result<u64, TimestampError> {
    let trimmed = text.trim();
    let fields: Vec<&str> = trimmed.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(TimestampError::InvalidFormat(trimmed.to_string()));
    }

    let mut values = Vec::with_capacity(fields.len());
    for field in &fields {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError::InvalidFormat(trimmed.to_string()));
        }
        let value: u64 = field
            .parse()
            .map_err(|_| TimestampError::Overflow(trimmed.to_string()))?;
        values.push(value);
    }

    let overflow = || TimestampError::Overflow(trimmed.to_string());
    let (hours, minutes, seconds) = match values.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimestampError::InvalidFormat(trimmed.to_string())),
    };

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(overflow)
}

/// Find every timestamp written in `text`, in order of appearance.
pub fn extract_timestamps(text: &str) -> Vec<TimestampMention> {
    TIMESTAMP_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let seconds = parse_timestamp(m.as_str()).ok()?;
            Some(TimestampMention {
                text: m.as_str().to_string(),
                seconds,
            })
        })
        .collect()
}

/// Case-insensitive substring search over transcript segments.
pub fn find_text_in_segments(segments: &[TranscriptSegment], query: &str) -> Vec<TranscriptMatch> {
    let needle = query.to_lowercase();
    segments
        .iter()
        .filter(|segment| segment.text.to_lowercase().contains(&needle))
        .map(|segment| TranscriptMatch {
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
            timestamp: format_position(segment.start),
        })
        .collect()
}
