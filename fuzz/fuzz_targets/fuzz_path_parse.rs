#![no_main]

use libfuzzer_sys::fuzz_target;
use stately_core::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = Path::parse(text) else {
        return;
    };
    // Display output must parse back to the same segments.
    let shown = path.to_string();
    assert_eq!(Path::parse(&shown).ok(), Some(path), "{text:?} -> {shown:?}");
});
