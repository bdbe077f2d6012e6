//! Shared helpers for integration tests

#![allow(dead_code)]

use std::time::Instant;

use bytes::Bytes;
use nutbridge_lib::classifier::{ClassHint, HidProtocol};
use nutbridge_lib::gateway::{Event, Gateway};

pub fn hint(vendor_id: u16, product_id: u16) -> ClassHint {
    ClassHint {
        protocol: HidProtocol::None,
        vendor_id,
        product_id,
    }
}

pub fn keyboard_hint() -> ClassHint {
    ClassHint {
        protocol: HidProtocol::Keyboard,
        vendor_id: 0x046D,
        product_id: 0xC31C,
    }
}

pub fn report(bytes: &[u8]) -> Bytes {
    Bytes::copy_from_slice(bytes)
}

/// Attach device 1 as a SANTAK TG-BOX 850 and confirm it with a healthy
/// on-line status report. Returns the events from the confirming report.
pub fn confirm_santak(gateway: &mut Gateway, now: Instant) -> Vec<Event> {
    gateway.on_attach(1, hint(0x0463, 0xFFFF), now);
    gateway.on_raw_report(1, 0x01, &report(&[0x01, 0x09]), now)
}
