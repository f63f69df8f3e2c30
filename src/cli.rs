//! CLI argument parsing for klog-convert

use clap::Parser;
use std::path::PathBuf;

/// Path value meaning stdin (for `-i`) or stdout (for `-o`)
pub const STDIO_PATH: &str = "-";

/// Output file name used when `-o` is not given
pub const DEFAULT_OUTPUT_NAME: &str = "out.txt";

#[derive(Parser, Debug)]
#[command(name = "klog-convert")]
#[command(version)]
#[command(
    about = "Prefix kernel log lines with absolute wall-clock timestamps",
    long_about = "Finds the first line carrying both a relative `>[seconds.micros]` timestamp \
                  and a `(YYYY-MM-DD HH:MM:SS.ffffff UTC)` calendar time, then prefixes every \
                  line that has a relative timestamp with the matching absolute time."
)]
pub struct Cli {
    /// Log file to convert (`-` reads stdin)
    #[arg(short = 'i', long = "inputfile", value_name = "PATH")]
    pub input: PathBuf,

    /// Converted log destination (`-` writes stdout) [default: ./out.txt]
    #[arg(short = 'o', long = "outputfile", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// TOML file with converter settings
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seconds added to every converted delta, overriding the config (default 28800, UTC+8)
    #[arg(
        long = "tz-offset",
        value_name = "SECONDS",
        allow_negative_numbers = true
    )]
    pub tz_offset: Option<i64>,

    /// Print a JSON conversion summary to stderr
    #[arg(long = "summary")]
    pub summary: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Output path, falling back to `out.txt` in the current directory
    pub fn output_path(&self) -> std::io::Result<PathBuf> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?.join(DEFAULT_OUTPUT_NAME)),
        }
    }

    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == STDIO_PATH
    }

    pub fn writes_stdout(&self) -> bool {
        self.output
            .as_ref()
            .is_some_and(|path| path.as_os_str() == STDIO_PATH)
    }
}
