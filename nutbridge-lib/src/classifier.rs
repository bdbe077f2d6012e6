//! UPS vs. not-a-UPS classification for newly attached devices.
//!
//! Vendor/product IDs are not trusted as the sole signal; plenty of real
//! UPS units enumerate with no distinguishing class information. Instead a
//! new device gets a bounded observation window: produce a report within
//! the window and it is promoted to the confirmed UPS, stay silent and it
//! is written off for the rest of its attach session.

use std::time::Instant;

use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;

use crate::constants::CLASSIFY_WINDOW;

/// Transport-assigned identifier for one attached device session.
pub type DeviceId = u32;

/// HID interface protocol, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HidProtocol {
    #[default]
    None = 0,
    Keyboard = 1,
    Mouse = 2,
}

/// Everything the transport knows about a device at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassHint {
    pub protocol: HidProtocol,
    pub vendor_id: u16,
    pub product_id: u16,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    device: DeviceId,
    hint: ClassHint,
    since: Instant,
}

/// Outcome of feeding one raw report through the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The pending candidate just proved itself; decode this report.
    Promoted(ClassHint),
    /// Report from the already confirmed UPS; decode it.
    Confirmed,
    /// Unknown or rejected device; drop the report.
    Ignored,
}

#[derive(Debug, Default)]
pub struct DeviceClassifier {
    confirmed: Option<DeviceId>,
    candidate: Option<Candidate>,
    rejected: Option<DeviceId>,
}

impl DeviceClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed(&self) -> Option<DeviceId> {
        self.confirmed
    }

    /// Register a newly attached device.
    ///
    /// Keyboards and mice are rejected outright. Anything else becomes the
    /// single pending candidate, displacing a stale one.
    ///
    /// Returns `true` when the device enters observation.
    pub fn on_attach(&mut self, device: DeviceId, hint: ClassHint, now: Instant) -> bool {
        match hint.protocol {
            HidProtocol::Keyboard | HidProtocol::Mouse => {
                self.rejected = Some(device);
                false
            }
            HidProtocol::None => {
                self.candidate = Some(Candidate { device, hint, since: now });
                true
            }
        }
    }

    /// Route one raw report's device through the classification gate.
    pub fn on_report(&mut self, device: DeviceId, now: Instant) -> ReportOutcome {
        if self.confirmed == Some(device) {
            return ReportOutcome::Confirmed;
        }
        match self.candidate {
            Some(c)
                if c.device == device
                    && self.confirmed.is_none()
                    && now.duration_since(c.since) <= CLASSIFY_WINDOW =>
            {
                self.confirmed = Some(device);
                self.candidate = None;
                ReportOutcome::Promoted(c.hint)
            }
            _ => ReportOutcome::Ignored,
        }
    }

    /// Expire a candidate whose observation window ran out.
    ///
    /// Returns the written-off device, if any. No retry within the same
    /// attach session.
    pub fn tick(&mut self, now: Instant) -> Option<DeviceId> {
        let expired = self
            .candidate
            .filter(|c| now.duration_since(c.since) > CLASSIFY_WINDOW)?;
        self.candidate = None;
        self.rejected = Some(expired.device);
        Some(expired.device)
    }

    /// Handle a device disconnect.
    ///
    /// Returns `true` when the confirmed UPS just went away. Rejection
    /// bookkeeping for the device is released so a future re-attach starts
    /// a fresh session.
    pub fn on_detach(&mut self, device: DeviceId) -> bool {
        if self.rejected == Some(device) {
            self.rejected = None;
        }
        if self.candidate.is_some_and(|c| c.device == device) {
            self.candidate = None;
        }
        if self.confirmed == Some(device) {
            self.confirmed = None;
            true
        } else {
            false
        }
    }
}
