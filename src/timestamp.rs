//! Relative (monotonic) kernel timestamps
//!
//! Kernel log lines carry the time since boot as `<6>[   12.345678] ...`.
//! Only the first `>[` token of a line is considered.

use crate::error::LineError;

const TOKEN_OPEN: &str = ">[";
const TOKEN_CLOSE: char = ']';

/// A `seconds.micros` reading of the device's monotonic clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelativeTimestamp {
    pub seconds: i64,
    pub micros: i64,
}

impl RelativeTimestamp {
    pub fn new(seconds: i64, micros: i64) -> Self {
        Self { seconds, micros }
    }

    /// Locate and parse the first `>[seconds.micros]` token in `line`
    pub fn find_in(line: &str) -> Result<Self, LineError> {
        let open = line.find(TOKEN_OPEN).ok_or(LineError::MissingToken)?;
        let body_start = open + TOKEN_OPEN.len();
        let close = line[body_start..]
            .find(TOKEN_CLOSE)
            .ok_or(LineError::UnclosedToken)?;
        Self::parse(&line[body_start..body_start + close])
    }

    /// Parse the inside of a token, e.g. `"   12.345678"`
    ///
    /// The micros part is an integer count, so `1.5` is one second and five
    /// microseconds.
    pub fn parse(token: &str) -> Result<Self, LineError> {
        let token = token.trim();
        let mut parts = token.split('.');
        let (Some(secs), Some(micros), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(LineError::MalformedToken(token.to_string()));
        };
        Ok(Self {
            seconds: parse_int(secs)?,
            micros: parse_int(micros)?,
        })
    }

    /// Signed (seconds, micros) difference `self - earlier`, not normalized
    pub fn delta_since(&self, earlier: &Self) -> Option<(i64, i64)> {
        Some((
            self.seconds.checked_sub(earlier.seconds)?,
            self.micros.checked_sub(earlier.micros)?,
        ))
    }
}

impl std::fmt::Display for RelativeTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}", self.seconds, self.micros)
    }
}

fn parse_int(text: &str) -> Result<i64, LineError> {
    let text = text.trim();
    text.parse::<i64>()
        .map_err(|_| LineError::InvalidNumber(text.to_string()))
}
