//! Fuzz target for pattern parsing and matching.
//!
//! The first line is the pattern source, the rest is the candidate.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scrub_redact::{Pattern, TextRule};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (source, candidate) = text.split_once('\n').unwrap_or((text, ""));
    if let Ok(pattern) = Pattern::parse(source) {
        let _ = pattern.matches(candidate, false, true);
        let _ = pattern.matches(candidate, true, false);
        let _ = pattern.matches_whole(candidate, true);
    }
    let _ = TextRule::parse(source);
});
