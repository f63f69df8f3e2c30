//! Reference (anchor) line detection
//!
//! An anchor line carries both a relative timestamp and the calendar time at
//! that instant, e.g.
//!
//! ```text
//! <6>[  100.000000] Android time (2023-01-01 00:00:00.000000 UTC)
//! ```
//!
//! The first parseable anchor in a log becomes the [`Baseline`] for the whole
//! conversion.

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::config::ConverterConfig;
use crate::error::{AnchorError, ConvertError, Result};
use crate::timestamp::RelativeTimestamp;

/// A (relative, absolute) pair that converted lines are offset from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub relative: RelativeTimestamp,
    pub absolute: NaiveDateTime,
}

impl Baseline {
    pub fn new(relative: RelativeTimestamp, absolute: NaiveDateTime) -> Self {
        Self { relative, absolute }
    }
}

/// Try to read a [`Baseline`] from a single line
pub fn parse_anchor(
    line: &str,
    config: &ConverterConfig,
) -> std::result::Result<Baseline, AnchorError> {
    let marker_at = config.find_marker(line).ok_or(AnchorError::NoMarker)?;
    let relative = RelativeTimestamp::find_in(line)?;
    let date_text = date_near_marker(line, marker_at, config)?;
    let date = strip_tail(date_text, config)?;

    let absolute = NaiveDateTime::parse_from_str(date, &config.date_format).map_err(|e| {
        AnchorError::BadDate {
            text: date.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(Baseline::new(relative, absolute))
}

/// A baseline together with the 1-based line number it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedBaseline {
    pub line: usize,
    pub baseline: Baseline,
}

/// Scan `lines` for the first usable anchor
///
/// Lines that carry the marker but fail to parse are skipped.
pub fn locate_baseline<I, S>(lines: I, config: &ConverterConfig) -> Result<Baseline>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    locate_anchor_line(lines, config).map(|located| located.baseline)
}

/// Like [`locate_baseline`], also reporting which line the anchor is on
pub fn locate_anchor_line<I, S>(lines: I, config: &ConverterConfig) -> Result<LocatedBaseline>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (index, line) in lines.into_iter().enumerate() {
        match parse_anchor(line.as_ref(), config) {
            Ok(baseline) => {
                debug!(
                    line = index + 1,
                    relative = %baseline.relative,
                    absolute = %baseline.absolute,
                    "anchor found"
                );
                return Ok(LocatedBaseline {
                    line: index + 1,
                    baseline,
                });
            }
            Err(AnchorError::NoMarker) => {}
            Err(err) => trace!(line = index + 1, %err, "skipping marker line"),
        }
    }
    Err(ConvertError::NoReferenceFound {
        marker: config.marker.clone(),
    })
}

/// Content between the first `(` at or after the search window and the next `)`
///
/// The window is counted in characters back from the marker.
fn date_near_marker<'a>(
    line: &'a str,
    marker_at: usize,
    config: &ConverterConfig,
) -> std::result::Result<&'a str, AnchorError> {
    let chars_before = line[..marker_at].chars().count();
    let skip = chars_before.saturating_sub(config.date_window);
    let window_start = line
        .char_indices()
        .nth(skip)
        .map_or(marker_at, |(i, _)| i);
    let open = window_start
        + line[window_start..]
            .find('(')
            .ok_or(AnchorError::MissingDate)?;
    let close = line[open + 1..].find(')').ok_or(AnchorError::MissingDate)?;
    Ok(&line[open + 1..open + 1 + close])
}

/// Drop the zone annotation (and excess sub-microsecond digits) from the date
fn strip_tail<'a>(
    content: &'a str,
    config: &ConverterConfig,
) -> std::result::Result<&'a str, AnchorError> {
    let len = content.chars().count();
    let measured = len.checked_sub(config.short_tail_trim);
    let trim = match measured {
        Some(m) if m > config.long_form_threshold => config.long_tail_trim,
        _ => config.short_tail_trim,
    };
    let keep = len
        .checked_sub(trim)
        .filter(|&k| k > 0)
        .ok_or_else(|| AnchorError::DateTooShort(content.to_string()))?;
    let end = content
        .char_indices()
        .nth(keep)
        .map_or(content.len(), |(i, _)| i);
    Ok(content[..end].trim())
}
