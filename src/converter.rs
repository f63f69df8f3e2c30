//! Two-pass conversion over a rewindable input
//!
//! Pass one finds the baseline, the input is rewound to its start, and pass
//! two rewrites every line. Inputs that cannot seek (pipes, stdin) must be
//! loaded into memory with [`buffer_input`] first, which costs one copy of
//! the whole log.
//!
//! Lines are split on `\n` and keep their terminator. Lines are parsed from a
//! lossy UTF-8 decoding, but the original bytes are always what gets written
//! after the timestamp prefix, so invalid sequences survive unchanged.

use serde::Serialize;
use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom, Write};
use tracing::{info, trace};

use crate::anchor::{locate_anchor_line, Baseline, LocatedBaseline};
use crate::config::ConverterConfig;
use crate::error::Result;
use crate::rewriter::Rewriter;

/// Counters for one conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Lines read in the rewrite pass
    pub lines: usize,
    /// Lines prefixed with an absolute timestamp (anchors included)
    pub converted: usize,
    /// Lines copied unchanged
    pub passed_through: usize,
    /// Later anchor lines that moved the baseline during the rewrite pass
    pub reanchors: usize,
    /// 1-based line number of the anchor found by the locate pass
    pub baseline_line: usize,
}

/// Iterator over raw `\n`-terminated lines of a reader
struct RawLines<R> {
    reader: R,
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read a non-seekable source fully so it can be scanned twice
pub fn buffer_input<R: Read>(mut source: R) -> io::Result<Cursor<Vec<u8>>> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    Ok(Cursor::new(data))
}

/// Drives the locate and rewrite passes with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Validate `config` and build a converter around it
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Pass one: find the first anchor line in `input`
    pub fn locate<R: BufRead>(&self, input: R) -> Result<LocatedBaseline> {
        let mut io_error = None;
        let lines = RawLines { reader: input }
            .map_while(|line| match line {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    io_error = Some(e);
                    None
                }
            })
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        let located = locate_anchor_line(lines, &self.config);
        if let Some(e) = io_error {
            return Err(e.into());
        }
        located
    }

    /// Pass two: rewrite every line of `input` into `output`
    pub fn rewrite<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
        baseline: Baseline,
    ) -> Result<ConversionSummary> {
        let mut rewriter = Rewriter::new(baseline, &self.config);
        let mut summary = ConversionSummary::default();

        for line in (RawLines { reader: input }) {
            let line = line?;
            summary.lines += 1;
            let text = String::from_utf8_lossy(&line);
            match rewriter.stamp(&text) {
                Ok(stamp) => {
                    summary.converted += 1;
                    if stamp.reanchored {
                        summary.reanchors += 1;
                    }
                    output.write_all(stamp.timestamp.as_bytes())?;
                    output.write_all(b" ")?;
                }
                Err(err) => {
                    trace!(line = summary.lines, %err, "passing line through");
                    summary.passed_through += 1;
                }
            }
            output.write_all(&line)?;
        }
        output.flush()?;

        info!(
            lines = summary.lines,
            converted = summary.converted,
            passed_through = summary.passed_through,
            reanchors = summary.reanchors,
            "conversion complete"
        );
        Ok(summary)
    }

    /// Locate, rewind, then rewrite into `output`
    pub fn convert<R, W>(&self, input: R, output: W) -> Result<ConversionSummary>
    where
        R: BufRead + Seek,
        W: Write,
    {
        self.convert_with(input, || Ok(output))
    }

    /// Like [`Converter::convert`], but the output is only opened once a
    /// baseline has been found, so a log without anchors leaves no file behind
    pub fn convert_with<R, W, F>(&self, mut input: R, open_output: F) -> Result<ConversionSummary>
    where
        R: BufRead + Seek,
        W: Write,
        F: FnOnce() -> io::Result<W>,
    {
        let located = self.locate(&mut input)?;
        input.seek(SeekFrom::Start(0))?;
        let output = open_output()?;
        let summary = self.rewrite(input, output, located.baseline)?;
        Ok(ConversionSummary {
            baseline_line: located.line,
            ..summary
        })
    }
}
