#![no_main]

use libfuzzer_sys::fuzz_target;
use puppet_core::Axis;
use puppet_sprite::parse_sprite_name;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(key) = parse_sprite_name(name) {
        for axis in Axis::ALL {
            assert!(key.get(axis) <= axis.max_level());
        }
        // Canonical name of a parsed key parses to the same key
        assert_eq!(parse_sprite_name(&format!("eye_face_{}.png", key)), Some(key));
    }
});
