//! Table-driven report decoding.

use crate::profile::{FieldKind, ModelProfile};
use crate::telemetry::TelemetryRecord;
use modular_bitfield::prelude::*;
use tracing::trace;

/// UPS status bitmask layout, shared by every profile.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy)]
pub struct StatusBits {
    pub ac_present: bool,
    pub charging: bool,
    pub discharging: bool,
    pub healthy: bool,
    pub internal_failure: bool,
    pub needs_replacement: bool,
    pub overload: bool,
    pub shutdown_imminent: bool,
}

/// Applies a model profile to raw reports, updating a telemetry record
/// field by field.
#[derive(Debug)]
pub struct ReportDecoder {
    profile: &'static ModelProfile,
}

impl ReportDecoder {
    pub fn new(profile: &'static ModelProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'static ModelProfile {
        self.profile
    }

    /// Decode one raw report into `record`.
    ///
    /// Walks every field map whose report ID matches and overwrites just
    /// those fields. Maps whose span exceeds the buffer are skipped, so a
    /// short or malformed report degrades to a partial decode instead of
    /// an error. Returns the number of fields updated; zero means the
    /// report carried no usable telemetry.
    pub fn decode(&self, report_id: u8, data: &[u8], record: &mut TelemetryRecord) -> usize {
        let mut updated = 0;
        for map in self.profile.fields.iter().filter(|m| m.report_id == report_id) {
            let Some(raw) = extract_le(data, map.offset, map.width) else {
                trace!(
                    report_id,
                    offset = map.offset,
                    width = map.width,
                    len = data.len(),
                    "field map out of range, skipping"
                );
                continue;
            };
            let scaled = raw as f32 * map.scale;
            match map.kind {
                FieldKind::Status => {
                    let bits = StatusBits::from_bytes([raw as u8]);
                    record.ac_present = bits.ac_present();
                    record.charging = bits.charging();
                    record.discharging = bits.discharging();
                    record.healthy = bits.healthy();
                    record.internal_failure = bits.internal_failure();
                    record.needs_replacement = bits.needs_replacement();
                    record.overload = bits.overload();
                    record.shutdown_imminent = bits.shutdown_imminent();
                }
                FieldKind::BatteryCharge => {
                    record.battery_charge = (scaled as u32).min(100) as u8;
                }
                FieldKind::Runtime => {
                    record.runtime = scaled as u32;
                }
                FieldKind::Load => {
                    record.load = (scaled as u32).min(100) as u8;
                }
                FieldKind::Voltage => {
                    record.voltage = scaled as u16;
                }
                FieldKind::AlarmControl => {
                    record.alarm_control = scaled as u8;
                    // Beep detection compares the unscaled byte.
                    record.beep_enabled = raw as u8 == self.profile.beep_on_value;
                }
            }
            updated += 1;
        }
        updated
    }

    /// The 2-byte control write that toggles the audible alarm.
    pub fn beep_frame(&self, enabled: bool) -> [u8; 2] {
        let value = if enabled {
            self.profile.beep_on_value
        } else {
            self.profile.beep_off_value
        };
        [self.profile.beep_report_id, value]
    }
}

/// Assemble a little-endian unsigned integer of `width` bytes at `offset`.
fn extract_le(data: &[u8], offset: usize, width: usize) -> Option<u32> {
    if offset + width > data.len() {
        return None;
    }
    let mut value: u32 = 0;
    for (i, byte) in data[offset..offset + width].iter().enumerate() {
        value |= (*byte as u32) << (i * 8);
    }
    Some(value)
}
