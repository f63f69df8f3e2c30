#![no_main]

use klog_convert::anchor::parse_anchor;
use klog_convert::config::ConverterConfig;
use klog_convert::converter::Converter;
use klog_convert::timestamp::RelativeTimestamp;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Single-line parsers must never panic
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = RelativeTimestamp::find_in(line);
        let _ = parse_anchor(line, &ConverterConfig::default());
    }

    // Whole-log conversion, including non-UTF-8 lines
    let mut out = Vec::new();
    let _ = Converter::default().convert(Cursor::new(data), &mut out);
});
