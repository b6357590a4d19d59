#![no_main]
use cfdplot_log::TableParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Panic freedom only; structural errors are expected for most inputs.
    let s = String::from_utf8_lossy(data);
    let _ = TableParser::new().parse(&s);
});
