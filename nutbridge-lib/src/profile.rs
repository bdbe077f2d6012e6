//! Per-model decode profiles.
//!
//! Every supported UPS is described by a static table of field maps rather
//! than model-specific parsing code. Onboarding a new model means appending
//! a `ModelProfile` record here; the decoder never changes.

use strum_macros::Display;

/// What a mapped field means once extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FieldKind {
    /// Packed status bitmask, one bit per flag
    Status,
    /// Battery charge percentage, clamped to 0..=100 after scaling
    BatteryCharge,
    /// Remaining runtime, stored in seconds (scale absorbs unit conversion)
    Runtime,
    /// Output load percentage, clamped to 0..=100 after scaling
    Load,
    /// Voltage in decivolts, unclamped
    Voltage,
    /// Audible alarm control byte, stored verbatim
    AlarmControl,
}

/// Where one telemetry field lives inside a raw report.
///
/// Offsets index into the report buffer exactly as the model delivers it.
/// Some models prefix the buffer with the report ID byte and some do not;
/// the per-model tables absorb that difference.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub report_id: u8,
    pub offset: usize,
    /// Field width in bytes, little endian; 1, 2 or 4
    pub width: usize,
    pub kind: FieldKind,
    pub scale: f32,
}

/// Decode profile for one UPS model.
#[derive(Debug)]
pub struct ModelProfile {
    pub name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub fields: &'static [FieldMap],
    pub beep_report_id: u8,
    pub beep_on_value: u8,
    pub beep_off_value: u8,
}

impl ModelProfile {
    /// Manufacturer part of the model name (first word).
    pub fn manufacturer(&self) -> &'static str {
        self.name.split_whitespace().next().unwrap_or(self.name)
    }

    /// Model part of the name (everything after the manufacturer).
    pub fn model(&self) -> &'static str {
        match self.name.split_once(' ') {
            Some((_, rest)) => rest,
            None => self.name,
        }
    }
}

pub static SANTAK_TG_BOX_850: ModelProfile = ModelProfile {
    name: "SANTAK TG-BOX 850",
    vendor_id: 0x0463, // EATON
    product_id: 0xFFFF,
    fields: &[
        FieldMap { report_id: 0x01, offset: 1, width: 1, kind: FieldKind::Status, scale: 1.0 },
        FieldMap { report_id: 0x06, offset: 1, width: 1, kind: FieldKind::BatteryCharge, scale: 1.0 },
        FieldMap { report_id: 0x06, offset: 2, width: 4, kind: FieldKind::Runtime, scale: 1.0 },
        FieldMap { report_id: 0x07, offset: 6, width: 1, kind: FieldKind::Load, scale: 1.0 },
        FieldMap { report_id: 0x0E, offset: 1, width: 2, kind: FieldKind::Voltage, scale: 1.0 },
        FieldMap { report_id: 0x1F, offset: 1, width: 1, kind: FieldKind::AlarmControl, scale: 1.0 },
    ],
    beep_report_id: 0x1F,
    beep_on_value: 0x02,
    beep_off_value: 0x01,
};

pub static CYBERPOWER_VP700ELCD: ModelProfile = ModelProfile {
    name: "CyberPower VP700ELCD",
    vendor_id: 0x0764,
    product_id: 0x0501,
    fields: &[
        FieldMap { report_id: 0x01, offset: 0, width: 1, kind: FieldKind::Status, scale: 1.0 },
        FieldMap { report_id: 0x02, offset: 0, width: 1, kind: FieldKind::BatteryCharge, scale: 1.0 },
        FieldMap { report_id: 0x03, offset: 0, width: 2, kind: FieldKind::Runtime, scale: 1.0 },
        FieldMap { report_id: 0x04, offset: 0, width: 1, kind: FieldKind::Load, scale: 1.0 },
        FieldMap { report_id: 0x05, offset: 0, width: 2, kind: FieldKind::Voltage, scale: 1.0 },
        FieldMap { report_id: 0x06, offset: 0, width: 1, kind: FieldKind::AlarmControl, scale: 1.0 },
    ],
    beep_report_id: 0x07,
    beep_on_value: 0x01,
    beep_off_value: 0x00,
};

pub static CYBERPOWER_CP1500PFCLCD: ModelProfile = ModelProfile {
    name: "CyberPower CP1500PFCLCD",
    vendor_id: 0x0764,
    product_id: 0x0502,
    fields: &[
        FieldMap { report_id: 0x01, offset: 0, width: 1, kind: FieldKind::Status, scale: 1.0 },
        FieldMap { report_id: 0x02, offset: 0, width: 1, kind: FieldKind::BatteryCharge, scale: 1.0 },
        FieldMap { report_id: 0x03, offset: 0, width: 2, kind: FieldKind::Runtime, scale: 1.0 },
        FieldMap { report_id: 0x04, offset: 0, width: 1, kind: FieldKind::Load, scale: 1.0 },
        FieldMap { report_id: 0x05, offset: 0, width: 2, kind: FieldKind::Voltage, scale: 1.0 },
        FieldMap { report_id: 0x06, offset: 0, width: 1, kind: FieldKind::AlarmControl, scale: 1.0 },
    ],
    beep_report_id: 0x07,
    beep_on_value: 0x01,
    beep_off_value: 0x00,
};

// Runtime arrives in minutes on this model, hence the 60.0 scale.
pub static CYBERPOWER_VP1000ELCD: ModelProfile = ModelProfile {
    name: "CyberPower VP1000ELCD",
    vendor_id: 0x0764,
    product_id: 0x0503,
    fields: &[
        FieldMap { report_id: 0x21, offset: 1, width: 1, kind: FieldKind::Status, scale: 1.0 },
        FieldMap { report_id: 0x20, offset: 1, width: 1, kind: FieldKind::BatteryCharge, scale: 1.0 },
        FieldMap { report_id: 0x25, offset: 1, width: 1, kind: FieldKind::Runtime, scale: 60.0 },
        FieldMap { report_id: 0x20, offset: 2, width: 1, kind: FieldKind::Load, scale: 1.0 },
        FieldMap { report_id: 0x23, offset: 1, width: 2, kind: FieldKind::Voltage, scale: 1.0 },
        FieldMap { report_id: 0x80, offset: 1, width: 1, kind: FieldKind::AlarmControl, scale: 1.0 },
    ],
    beep_report_id: 0x80,
    beep_on_value: 0x02,
    beep_off_value: 0x00,
};

/// Fallback for unrecognized hardware, tolerant of the most common layout.
pub static GENERIC_UPS: ModelProfile = ModelProfile {
    name: "Generic UPS",
    vendor_id: 0x0000,
    product_id: 0x0000,
    fields: &[
        FieldMap { report_id: 0x01, offset: 0, width: 1, kind: FieldKind::Status, scale: 1.0 },
        FieldMap { report_id: 0x02, offset: 0, width: 1, kind: FieldKind::BatteryCharge, scale: 1.0 },
        FieldMap { report_id: 0x03, offset: 0, width: 2, kind: FieldKind::Runtime, scale: 1.0 },
        FieldMap { report_id: 0x04, offset: 0, width: 1, kind: FieldKind::Load, scale: 1.0 },
        FieldMap { report_id: 0x05, offset: 0, width: 2, kind: FieldKind::Voltage, scale: 1.0 },
        FieldMap { report_id: 0x06, offset: 0, width: 1, kind: FieldKind::AlarmControl, scale: 1.0 },
    ],
    beep_report_id: 0x07,
    beep_on_value: 0x01,
    beep_off_value: 0x00,
};

/// All known model profiles, in match order.
pub static PROFILES: &[&ModelProfile] = &[
    &SANTAK_TG_BOX_850,
    &CYBERPOWER_VP700ELCD,
    &CYBERPOWER_CP1500PFCLCD,
    &CYBERPOWER_VP1000ELCD,
];

/// Select the decode profile for a confirmed device.
///
/// Vendor/product matching picks a concrete model; anything unrecognized
/// gets the generic fallback.
pub fn select(vendor_id: u16, product_id: u16) -> &'static ModelProfile {
    PROFILES
        .iter()
        .find(|p| p.vendor_id == vendor_id && p.product_id == product_id)
        .copied()
        .unwrap_or(&GENERIC_UPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_matches_known_model() {
        let profile = select(0x0764, 0x0503);
        assert_eq!(profile.name, "CyberPower VP1000ELCD");
    }

    #[test]
    fn select_falls_back_to_generic() {
        let profile = select(0x1234, 0x5678);
        assert_eq!(profile.name, "Generic UPS");
    }

    #[test]
    fn manufacturer_and_model_split() {
        assert_eq!(CYBERPOWER_VP700ELCD.manufacturer(), "CyberPower");
        assert_eq!(CYBERPOWER_VP700ELCD.model(), "VP700ELCD");
        assert_eq!(SANTAK_TG_BOX_850.model(), "TG-BOX 850");
    }
}
