//! Per-line conversion of relative timestamps to wall-clock time
//!
//! Failure policy: a line whose timestamp cannot be converted is emitted
//! unchanged. The reason is typed ([`LineError`]) and logged at `trace`
//! level, but never returned to the caller of [`Rewriter::rewrite_line`].
//!
//! Anchor lines met while rewriting replace the current [`Baseline`], so long
//! logs with periodic RTC sync messages are re-based at every sync point.

use chrono::{NaiveDateTime, TimeDelta};
use std::fmt::Write;
use tracing::{debug, trace};

use crate::anchor::{parse_anchor, Baseline};
use crate::config::ConverterConfig;
use crate::error::LineError;
use crate::timestamp::RelativeTimestamp;

/// What happened to a single input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Prefixed with a converted timestamp
    Converted(String),
    /// An anchor line that moved the baseline; converted against the new one
    Reanchored(String),
    /// Emitted unchanged
    PassedThrough(String),
}

impl LineOutcome {
    /// The output text for this line
    pub fn text(&self) -> &str {
        match self {
            LineOutcome::Converted(s)
            | LineOutcome::Reanchored(s)
            | LineOutcome::PassedThrough(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            LineOutcome::Converted(s)
            | LineOutcome::Reanchored(s)
            | LineOutcome::PassedThrough(s) => s,
        }
    }

    pub fn is_converted(&self) -> bool {
        !matches!(self, LineOutcome::PassedThrough(_))
    }
}

/// Absolute time of `relative` measured from `baseline`
///
/// `baseline.absolute + (Δseconds + tz_correction_secs) s + Δmicros µs`
pub fn absolute_time(
    baseline: &Baseline,
    relative: &RelativeTimestamp,
    tz_correction_secs: i64,
) -> Result<NaiveDateTime, LineError> {
    let (delta_secs, delta_micros) = relative
        .delta_since(&baseline.relative)
        .ok_or(LineError::Overflow)?;
    let delta_secs = delta_secs
        .checked_add(tz_correction_secs)
        .ok_or(LineError::Overflow)?;
    let delta = TimeDelta::try_seconds(delta_secs)
        .and_then(|secs| secs.checked_add(&TimeDelta::microseconds(delta_micros)))
        .ok_or(LineError::Overflow)?;
    baseline
        .absolute
        .checked_add_signed(delta)
        .ok_or(LineError::Overflow)
}

/// Timestamp prefix computed for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// Formatted absolute time, without the separating space
    pub timestamp: String,
    /// The line was an anchor that changed the baseline
    pub reanchored: bool,
}

/// Stateful rewriter holding the current baseline
#[derive(Debug, Clone)]
pub struct Rewriter<'a> {
    baseline: Baseline,
    config: &'a ConverterConfig,
}

impl<'a> Rewriter<'a> {
    pub fn new(baseline: Baseline, config: &'a ConverterConfig) -> Self {
        Self { baseline, config }
    }

    /// The baseline currently in effect
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Convert one line (including its terminator, if any)
    pub fn rewrite_line(&mut self, line: &str) -> LineOutcome {
        match self.stamp(line) {
            Ok(stamp) => {
                let text = format!("{} {}", stamp.timestamp, line);
                if stamp.reanchored {
                    LineOutcome::Reanchored(text)
                } else {
                    LineOutcome::Converted(text)
                }
            }
            Err(err) => {
                trace!(%err, "passing line through");
                LineOutcome::PassedThrough(line.to_string())
            }
        }
    }

    /// Compute the timestamp prefix for `line`
    ///
    /// An anchor line that parses replaces the baseline before its own time
    /// is computed. On error the baseline is left untouched.
    pub fn stamp(&mut self, line: &str) -> Result<Stamp, LineError> {
        let anchor = match self.config.find_marker(line) {
            Some(_) => Some(parse_anchor(line, self.config)?),
            None => None,
        };
        let baseline = anchor.as_ref().unwrap_or(&self.baseline);

        let relative = RelativeTimestamp::find_in(line)?;
        let absolute = absolute_time(baseline, &relative, self.config.tz_correction_secs)?;
        let mut timestamp = String::new();
        write!(timestamp, "{}", absolute.format(&self.config.output_format))
            .map_err(|_| LineError::Format(self.config.output_format.clone()))?;

        let reanchored = match anchor {
            Some(new) if new != self.baseline => {
                debug!(
                    relative = %new.relative,
                    absolute = %new.absolute,
                    "re-anchored"
                );
                self.baseline = new;
                true
            }
            _ => false,
        };
        Ok(Stamp {
            timestamp,
            reanchored,
        })
    }
}

/// Rewrite a whole sequence of lines against `baseline`
pub fn rewrite_lines<I, S>(lines: I, baseline: Baseline, config: &ConverterConfig) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rewriter = Rewriter::new(baseline, config);
    lines
        .into_iter()
        .map(|line| rewriter.rewrite_line(line.as_ref()).into_text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ANCHOR: &str = "<6>[  100.000000] rtc (2023-01-01 00:00:00.000000 UTC) anchor\n";

    fn baseline() -> Baseline {
        parse_anchor(ANCHOR, &ConverterConfig::default()).unwrap()
    }

    fn at(h: u32, mi: u32, s: u32, us: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_micro_opt(h, mi, s, us)
            .unwrap()
    }

    #[test]
    fn test_absolute_time_applies_correction() {
        let line = RelativeTimestamp::new(105, 500_000);
        let abs = absolute_time(&baseline(), &line, 28_800).unwrap();
        assert_eq!(abs, at(8, 0, 5, 500_000));
    }

    #[test]
    fn test_absolute_time_negative_micro_delta() {
        // (1 s, -800000 us) nets out to +0.2 s
        let base = Baseline::new(RelativeTimestamp::new(100, 900_000), at(0, 0, 0, 0));
        let abs = absolute_time(&base, &RelativeTimestamp::new(101, 100_000), 0).unwrap();
        assert_eq!(abs, at(0, 0, 0, 200_000));
    }

    #[test]
    fn test_absolute_time_before_baseline() {
        let abs = absolute_time(&baseline(), &RelativeTimestamp::new(40, 0), 0).unwrap();
        assert_eq!(
            abs,
            NaiveDate::from_ymd_opt(2022, 12, 31)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_absolute_time_overflow() {
        let err = absolute_time(&baseline(), &RelativeTimestamp::new(i64::MAX, 0), 28_800);
        assert_eq!(err, Err(LineError::Overflow));
    }

    #[test]
    fn test_rewrite_line_round_trip_scenario() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);
        let out = rewriter.rewrite_line("<6>[  105.500000] next\n");
        assert_eq!(
            out,
            LineOutcome::Converted("2023-01-01 08:00:05.500000 <6>[  105.500000] next\n".into())
        );
    }

    #[test]
    fn test_rewrite_line_passes_through_plain_text() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);
        let lines = [
            "--------- beginning of kernel\n",
            "<6>[abc.def] junk\n",
            "<6>[1.2.3]\n",
            "",
        ];
        for line in lines {
            assert_eq!(
                rewriter.rewrite_line(line),
                LineOutcome::PassedThrough(line.into())
            );
        }
    }

    #[test]
    fn test_rewrite_line_anchor_itself_is_converted() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);
        let out = rewriter.rewrite_line(ANCHOR);
        // Same anchor as the current baseline: converted, not a re-anchor
        assert_eq!(
            out,
            LineOutcome::Converted(format!("2023-01-01 08:00:00.000000 {}", ANCHOR))
        );
    }

    #[test]
    fn test_stamp_returns_prefix_only() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);
        let stamp = rewriter.stamp("<6>[  105.500000] next\n").unwrap();
        assert_eq!(stamp.timestamp, "2023-01-01 08:00:05.500000");
        assert!(!stamp.reanchored);
    }

    #[test]
    fn test_invalid_output_format_passes_through() {
        let config = ConverterConfig {
            output_format: "%Y %".into(),
            ..ConverterConfig::default()
        };
        let mut rewriter = Rewriter::new(baseline(), &config);
        let line = "<6>[  105.500000] next\n";
        assert!(matches!(rewriter.stamp(line), Err(LineError::Format(_))));
        assert_eq!(rewriter.rewrite_line(line), LineOutcome::PassedThrough(line.into()));
    }

    #[test]
    fn test_rewrite_line_reanchors() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);

        let second = "<6>[  200.000000] rtc (2023-06-01 12:00:00.000000 UTC)\n";
        assert!(matches!(rewriter.rewrite_line(second), LineOutcome::Reanchored(_)));
        assert_eq!(rewriter.baseline().relative, RelativeTimestamp::new(200, 0));

        let out = rewriter.rewrite_line("<6>[  201.000001] after\n");
        assert_eq!(out.text(), "2023-06-01 20:00:01.000001 <6>[  201.000001] after\n");
    }

    #[test]
    fn test_rewrite_line_broken_anchor_keeps_baseline() {
        let config = ConverterConfig::default();
        let mut rewriter = Rewriter::new(baseline(), &config);
        let broken = "<6>[  150.000000] rtc (not a date UTC)\n";

        assert_eq!(rewriter.rewrite_line(broken), LineOutcome::PassedThrough(broken.into()));
        assert_eq!(rewriter.baseline(), &baseline());
    }

    #[test]
    fn test_rewrite_line_zero_correction() {
        let config = ConverterConfig::default().with_tz_correction(0);
        let mut rewriter = Rewriter::new(baseline(), &config);
        let out = rewriter.rewrite_line("<6>[  101.000000] x");
        assert_eq!(out.text(), "2023-01-01 00:00:01.000000 <6>[  101.000000] x");
    }

    #[test]
    fn test_rewrite_lines_preserves_order_and_count() {
        let config = ConverterConfig::default();
        let input = ["a\n", "<6>[100.000001] b\n", "c\n", "<6>[100.000002] d\n"];
        let out = rewrite_lines(input, baseline(), &config);
        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], "a\n");
        assert!(out[1].ends_with("<6>[100.000001] b\n"));
        assert_eq!(out[2], "c\n");
        assert!(out[3].starts_with("2023-01-01 08:00:00.000002 "));
    }

    #[test]
    fn test_line_outcome_is_converted() {
        assert!(LineOutcome::Converted(String::new()).is_converted());
        assert!(LineOutcome::Reanchored(String::new()).is_converted());
        assert!(!LineOutcome::PassedThrough(String::new()).is_converted());
    }
}
