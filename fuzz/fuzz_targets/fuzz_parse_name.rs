#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };

    // Tokenization must never panic; malformed names return an error.
    if let Ok(parsed) = gangliostat::preprocess::parse_name(name) {
        assert!(!parsed.base.is_empty());

        // Composition derivation must also be total.
        let _ = gangliostat::composition::parse_composition(&parsed.base);
    }
});
