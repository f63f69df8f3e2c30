//! klog-convert - absolute wall-clock timestamps for kernel logs
//!
//! Kernel and Android device logs stamp every line with the time since boot
//! (`<6>[  105.500000] ...`). Somewhere in the log an RTC sync line also
//! prints the calendar time at one of those instants. This library locates
//! that anchor line and prefixes every other line with its absolute time.
//!
//! ```
//! use klog_convert::converter::Converter;
//! use std::io::Cursor;
//!
//! let log = "<6>[  100.000000] rtc (2023-01-01 00:00:00.000000 UTC)\n<6>[  105.500000] next\n";
//! let mut out = Vec::new();
//! Converter::default().convert(Cursor::new(log), &mut out).unwrap();
//!
//! let out = String::from_utf8(out).unwrap();
//! assert!(out.ends_with("2023-01-01 08:00:05.500000 <6>[  105.500000] next\n"));
//! ```

pub mod anchor;
pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod rewriter;
pub mod timestamp;
