#![no_main]

use libfuzzer_sys::fuzz_target;
use safe_html_validator::{Preset, Safelist, is_conformant, load_fragment};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let document = load_fragment(input, "");
    for preset in Preset::ALL {
        let safelist = Safelist::from_preset(preset);
        let verdict = is_conformant(&document, &safelist);
        assert_eq!(verdict, is_conformant(&document, &safelist));
        if preset == Preset::None && verdict {
            assert!(document.descendants(document.body()).all(|id| {
                document.node(id).as_element().is_none_or(|e| e.name() == "body")
            }));
        }
    }
});
