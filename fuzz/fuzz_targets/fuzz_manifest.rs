//! Fuzz target for manifest parsing.
//!
//! Any manifest text must either be rejected or processed entry by entry
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlops_agent::installer::ManifestParser;
use mlops_agent::MemoryBackend;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let backend = MemoryBackend::new();
        let _ = ManifestParser::new(&backend).parse_str(text, "{}");
    }
});
