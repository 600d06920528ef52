//! Timecode parsing and clip range validation.

use crate::error::ValidationError;

/// Longest clip that may be requested, in seconds.
pub const MAX_CLIP_SECONDS: u64 = 600;

/// A validated clip range, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub start: u64,
    pub end: u64,
    pub duration: u64,
}

/// Parse `H:MM:SS`, `MM:SS` or `SS` into seconds.
pub fn parse_timecode(raw: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat(raw.to_string());

    let parts = raw
        .split(':')
        .map(|part| part.trim().parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<u64>, _>>()?;

    let seconds = match parts.as_slice() {
        [h, m, s] => h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*s)),
        [m, s] => m.checked_mul(60).and_then(|m| m.checked_add(*s)),
        [s] => Some(*s),
        _ => None,
    };

    seconds.ok_or_else(invalid)
}

/// Validate a requested range against the video duration.
pub fn validate_time_range(
    start: &str,
    end: &str,
    total_duration: u64,
) -> Result<ClipRange, ValidationError> {
    let start = parse_timecode(start)?;
    let end = parse_timecode(end)?;

    if end <= start {
        return Err(ValidationError::InvalidRange(
            "End time must be after start time",
        ));
    }
    if start >= total_duration {
        return Err(ValidationError::InvalidRange(
            "Start time exceeds video duration",
        ));
    }
    if end > total_duration {
        return Err(ValidationError::InvalidRange(
            "End time exceeds video duration",
        ));
    }

    let duration = end - start;
    if duration > MAX_CLIP_SECONDS {
        return Err(ValidationError::DurationExceeded {
            requested: duration,
            max: MAX_CLIP_SECONDS,
        });
    }

    Ok(ClipRange {
        start,
        end,
        duration,
    })
}
