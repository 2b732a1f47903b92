#![no_main]
use libfuzzer_sys::fuzz_target;
use scale_core::{CalibrationTable, WeightConverter};

fuzz_target!(|data: &str| {
    let Ok(file) = scale_config::parse_calibration_json(data) else {
        return;
    };
    let Ok(table) = CalibrationTable::try_from(&file) else {
        return;
    };
    // Conversion over an accepted table must not panic, in or out of range.
    let conv = WeightConverter::new(&table);
    let (lo, hi) = conv.adc_range();
    for adc in [lo - 1.0, lo, (lo + hi) / 2.0, hi, hi + 1.0] {
        let _ = conv.convert(adc);
    }
});
