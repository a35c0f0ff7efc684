//! Fuzz target for container event lines.
//!
//! A decoded event must re-encode to a stable encoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scrub_container::Event;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = serde_json::from_slice::<Event>(data) else {
        return;
    };
    let encoded = serde_json::to_string(&event).expect("decoded events re-encode");
    let again: Event = serde_json::from_str(&encoded).expect("encoded events decode");
    let reencoded = serde_json::to_string(&again).expect("decoded events re-encode");
    assert_eq!(encoded, reencoded);
});
