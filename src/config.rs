// Configuration for the relative-to-absolute timestamp conversion
//
// Every number the conversion depends on lives here under a name. The defaults
// reproduce the Qualcomm/Android kernel log layout the tool was written for;
// logs from other vendors may need different values.

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Substring that marks a line as carrying a UTC calendar timestamp
pub const DEFAULT_MARKER: &str = "UTC)";

/// How far (in characters) before the marker the search for `(` begins
pub const DEFAULT_DATE_WINDOW: usize = 45;

/// Measured date length above which the long (nanosecond) tail is assumed
pub const DEFAULT_LONG_FORM_THRESHOLD: usize = 26;

/// Characters stripped from a long-form date, e.g. `789 UTC` of `...123456789 UTC`
pub const DEFAULT_LONG_TAIL_TRIM: usize = 7;

/// Characters stripped from a short-form date, e.g. ` UTC`
pub const DEFAULT_SHORT_TAIL_TRIM: usize = 4;

/// Seconds added to every converted delta (UTC+8)
pub const DEFAULT_TZ_CORRECTION_SECS: i64 = 28_800;

/// Format of the calendar timestamp embedded in anchor lines
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Format of the timestamp prepended to converted lines
pub const DEFAULT_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Tunables for locating anchors and rewriting lines
///
/// # Example
/// ```
/// use klog_convert::config::ConverterConfig;
///
/// let config = ConverterConfig::default();
/// assert_eq!(config.tz_correction_secs, 28_800);
/// assert_eq!(config.marker, "UTC)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Substring identifying an anchor line
    ///
    /// Default: `UTC)`
    pub marker: String,

    /// Characters before the marker where the `(` search starts
    ///
    /// The search runs forward from that point to the end of the line, so a
    /// `(` after the marker is also accepted.
    ///
    /// Default: 45
    pub date_window: usize,

    /// Threshold on `content_len - short_tail_trim` selecting the long tail
    ///
    /// Fragile: tied to the exact width of the vendor's date annotation.
    ///
    /// Default: 26
    pub long_form_threshold: usize,

    /// Trailing characters dropped from a long-form date
    ///
    /// Default: 7
    pub long_tail_trim: usize,

    /// Trailing characters dropped from a short-form date
    ///
    /// Default: 4
    pub short_tail_trim: usize,

    /// Fixed correction added to the seconds delta of every converted line
    ///
    /// The embedded calendar time is UTC; the default shifts output to UTC+8.
    /// Set to 0 to emit UTC.
    ///
    /// Default: 28800
    pub tz_correction_secs: i64,

    /// chrono parse format for the embedded date
    pub date_format: String,

    /// chrono format for the prepended timestamp
    pub output_format: String,

    /// Ignore a marker found at byte offset 0 of a line
    ///
    /// Older releases only treated the marker as present when it occurred at
    /// an offset of 1 or more. Enable to reproduce that output exactly.
    ///
    /// Default: false
    pub legacy_marker_index: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            date_window: DEFAULT_DATE_WINDOW,
            long_form_threshold: DEFAULT_LONG_FORM_THRESHOLD,
            long_tail_trim: DEFAULT_LONG_TAIL_TRIM,
            short_tail_trim: DEFAULT_SHORT_TAIL_TRIM,
            tz_correction_secs: DEFAULT_TZ_CORRECTION_SECS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            legacy_marker_index: false,
        }
    }
}

impl ConverterConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConvertError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Override the timezone correction
    pub fn with_tz_correction(mut self, secs: i64) -> Self {
        self.tz_correction_secs = secs;
        self
    }

    /// Reject settings that can never match a line
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            return Err(ConvertError::Config("marker must not be empty".into()));
        }
        check_format("date_format", &self.date_format)?;
        check_format("output_format", &self.output_format)?;
        Ok(())
    }

    /// Byte offset of the marker in `line`, honoring `legacy_marker_index`
    pub fn find_marker(&self, line: &str) -> Option<usize> {
        match line.find(&self.marker) {
            Some(0) if self.legacy_marker_index => None,
            found => found,
        }
    }
}

/// chrono panics when rendering an invalid format, so reject it up front
fn check_format(name: &str, format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(ConvertError::Config(format!("{name} must not be empty")));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConvertError::Config(format!(
            "{name} `{format}` is not a valid strftime format"
        )));
    }
    Ok(())
}
