#![no_main]

use libfuzzer_sys::fuzz_target;
use navlock_core::NavLockConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // Parsing must never panic, and anything accepted must validate.
    if let Ok(config) = NavLockConfig::from_json_str(text) {
        assert!(config.validate().is_ok());
        assert!(config.pad_depth >= 1);
        assert!(config.edge_zone_px.is_finite() && config.edge_zone_px > 0.0);
    }
});
