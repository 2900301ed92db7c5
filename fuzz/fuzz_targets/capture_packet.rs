#![no_main]

use libfuzzer_sys::fuzz_target;
use puppet_core::names;
use puppet_wire::parse_packet;

fuzz_target!(|data: &[u8]| {
    let report = parse_packet(data);
    for sample in &report.samples {
        assert!(sample.value.is_finite());
        let rotation = names::HEAD
            .iter()
            .chain(names::RIGHT_EYE.iter())
            .chain(names::LEFT_EYE.iter())
            .any(|n| *n == sample.name);
        if !rotation {
            assert!((0.0..=1.0).contains(&sample.value));
        }
    }
});
