//! Fuzz target: `apply_update`
//!
//! Applies arbitrary form bodies to the default limits. Whatever the input,
//! every field must stay inside its plausible range and every min below
//! its max.
//!
//! cargo fuzz run fuzz_config_update

#![no_main]

use libfuzzer_sys::fuzz_target;
use weather_station::config::{ConfigField, ConfigLimits};
use weather_station::net::config_update::apply_update;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };
    let mut limits = ConfigLimits::default();
    let report = apply_update(&mut limits, body);

    assert!(limits.is_consistent());
    for field in ConfigField::ALL {
        let (lo, hi) = field.range();
        assert!((lo..=hi).contains(&limits.get(field)), "{field} escaped its range");
    }
    assert_eq!(report.applied_any(), report.status == "success");
});
