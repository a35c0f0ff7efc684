//! Fuzz target for config document parsing and resolution.
//!
//! Arbitrary YAML must parse, merge and validate without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scrub_config::{ConfigLoader, DocumentFormat};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let loader = ConfigLoader::new();
    let _ = loader.load_document(text, DocumentFormat::Yaml, None);
    let _ = loader.load_document(text, DocumentFormat::Json, None);
});
