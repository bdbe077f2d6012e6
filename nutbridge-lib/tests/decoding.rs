//! Table-driven decoder behavior against the real model profiles.

use nutbridge_lib::decode::ReportDecoder;
use nutbridge_lib::profile::{CYBERPOWER_VP1000ELCD, SANTAK_TG_BOX_850};
use nutbridge_lib::telemetry::TelemetryRecord;

#[test]
fn status_byte_0x0b_sets_exactly_three_flags() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    let updated = decoder.decode(0x01, &[0x01, 0x0B], &mut record);
    assert_eq!(updated, 1);
    assert!(record.ac_present);
    assert!(record.charging);
    assert!(record.healthy);
    assert!(!record.discharging);
    assert!(!record.internal_failure);
    assert!(!record.needs_replacement);
    assert!(!record.overload);
    assert!(!record.shutdown_imminent);
}

#[test]
fn battery_charge_clamps_to_100() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    decoder.decode(0x06, &[0x06, 134, 0x00, 0x00, 0x00, 0x00], &mut record);
    assert_eq!(record.battery_charge, 100);
}

#[test]
fn runtime_scale_converts_minutes_to_seconds() {
    let decoder = ReportDecoder::new(&CYBERPOWER_VP1000ELCD);
    let mut record = TelemetryRecord::default();
    let updated = decoder.decode(0x25, &[0x25, 18], &mut record);
    assert_eq!(updated, 1);
    assert_eq!(record.runtime, 1080);
}

#[test]
fn one_report_can_update_several_fields() {
    // SANTAK report 0x06 carries battery charge and a 4-byte runtime.
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    let updated = decoder.decode(0x06, &[0x06, 87, 0x40, 0x04, 0x00, 0x00], &mut record);
    assert_eq!(updated, 2);
    assert_eq!(record.battery_charge, 87);
    assert_eq!(record.runtime, 0x0440);
}

#[test]
fn decode_is_idempotent() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let data = [0x06, 55, 0x10, 0x00, 0x00, 0x00];
    let mut once = TelemetryRecord::default();
    decoder.decode(0x06, &data, &mut once);
    let mut twice = once;
    decoder.decode(0x06, &data, &mut twice);
    assert_eq!(once, twice);
}

#[test]
fn short_report_skips_out_of_range_maps() {
    // Voltage on this model is 2 bytes at offset 1; a 1-byte report cannot
    // carry it, so the pass updates nothing and the record keeps its value.
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord {
        voltage: 2320,
        ..Default::default()
    };
    let updated = decoder.decode(0x0E, &[0x0E], &mut record);
    assert_eq!(updated, 0);
    assert_eq!(record.voltage, 2320);
}

#[test]
fn unmapped_report_updates_nothing() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    assert_eq!(decoder.decode(0x7F, &[0x7F, 0xFF, 0xFF], &mut record), 0);
    assert_eq!(record, TelemetryRecord::default());
}

#[test]
fn beep_state_compares_unscaled_byte() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    decoder.decode(0x1F, &[0x1F, 0x02], &mut record);
    assert!(record.beep_enabled);
    assert_eq!(record.alarm_control, 0x02);
    decoder.decode(0x1F, &[0x1F, 0x01], &mut record);
    assert!(!record.beep_enabled);
}

#[test]
fn beep_frame_uses_profile_values() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    assert_eq!(decoder.beep_frame(true), [0x1F, 0x02]);
    assert_eq!(decoder.beep_frame(false), [0x1F, 0x01]);
}

#[test]
fn full_report_cycle_builds_a_complete_record() {
    // Captured SANTAK exchange: status, battery+runtime, load, voltage.
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    for hex_data in ["010b", "06554004000000", "07000000000019", "0e1009"] {
        let data = hex::decode(hex_data).expect("Failed to decode hex");
        decoder.decode(data[0], &data, &mut record);
    }
    assert!(record.ac_present);
    assert!(record.charging);
    assert_eq!(record.battery_charge, 85);
    assert_eq!(record.runtime, 0x0440);
    assert_eq!(record.load, 0x19);
    assert_eq!(record.voltage, 2320);
}

#[test]
fn voltage_stored_in_decivolts() {
    let decoder = ReportDecoder::new(&SANTAK_TG_BOX_850);
    let mut record = TelemetryRecord::default();
    // 2320 decivolts, little endian
    decoder.decode(0x0E, &[0x0E, 0x10, 0x09], &mut record);
    assert_eq!(record.voltage, 2320);
    assert_eq!(record.voltage_v(), 232.0);
}
