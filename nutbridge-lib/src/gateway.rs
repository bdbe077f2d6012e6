//! The gateway context object.
//!
//! One instance owns the whole classification/decode/liveness/failure
//! pipeline for the single UPS slot. All inbound entry points take an
//! explicit `Instant` so the timing behavior is deterministic under test;
//! the owner drives time by calling `tick` on a ~100 ms cadence.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::classifier::{ClassHint, DeviceClassifier, DeviceId, ReportOutcome};
use crate::constants::{FRESHNESS_INTERVAL, RESTART_DELAY};
use crate::decode::ReportDecoder;
use crate::error::BridgeError;
use crate::monitor::FailureMonitor;
use crate::profile::{self, ModelProfile};
use crate::store::{Liveness, TelemetryStore};
use crate::telemetry::TelemetryRecord;

/// Outbound notifications for the gateway's collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    UpsConfirmed {
        device: DeviceId,
        profile: &'static str,
    },
    DeviceRejected {
        device: DeviceId,
    },
    LivenessChanged(Liveness),
    RestartScheduled {
        delay: Duration,
    },
}

/// Point-in-time view for protocol responses.
#[derive(Debug, Clone, Copy)]
pub struct StatusSnapshot {
    pub ups_present: bool,
    pub liveness: Liveness,
    pub record: TelemetryRecord,
    pub profile: Option<&'static ModelProfile>,
}

#[derive(Debug, Default)]
pub struct Gateway {
    classifier: DeviceClassifier,
    store: TelemetryStore,
    monitor: FailureMonitor,
    decoder: Option<ReportDecoder>,
    last_freshness: Option<Instant>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device appeared on the bus.
    pub fn on_attach(&mut self, device: DeviceId, hint: ClassHint, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if self.classifier.on_attach(device, hint, now) {
            debug!(
                device,
                vendor_id = format_args!("{:#06x}", hint.vendor_id),
                product_id = format_args!("{:#06x}", hint.product_id),
                "observing new device"
            );
        } else {
            info!(device, "device is a {}, not a UPS", hint.protocol);
            events.push(Event::DeviceRejected { device });
        }
        events
    }

    /// A device disappeared from the bus.
    pub fn on_detach(&mut self, device: DeviceId, _now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if self.classifier.on_detach(device) {
            info!(device, "confirmed UPS disconnected");
            self.decoder = None;
            if let Some(state) = self.store.mark_absent() {
                events.push(Event::LivenessChanged(state));
            }
        }
        events
    }

    /// Raw report delivery from the transport. The buffer includes the
    /// report ID byte at offset 0, matching the profile field maps.
    pub fn on_raw_report(
        &mut self,
        device: DeviceId,
        report_id: u8,
        data: &Bytes,
        now: Instant,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        match self.classifier.on_report(device, now) {
            ReportOutcome::Promoted(hint) => {
                let profile = profile::select(hint.vendor_id, hint.product_id);
                info!(device, profile = profile.name, "device confirmed as UPS");
                self.decoder = Some(ReportDecoder::new(profile));
                events.push(Event::UpsConfirmed {
                    device,
                    profile: profile.name,
                });
                if let Some(state) = self.store.mark_waiting() {
                    events.push(Event::LivenessChanged(state));
                }
                self.decode_report(report_id, data, now, &mut events);
            }
            ReportOutcome::Confirmed => {
                self.decode_report(report_id, data, now, &mut events);
            }
            ReportOutcome::Ignored => {
                debug!(device, report_id, "dropping report from unconfirmed device");
            }
        }
        events
    }

    /// Periodic maintenance: classification window expiry plus the slower
    /// freshness and connectivity checks.
    pub fn tick(&mut self, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(device) = self.classifier.tick(now) {
            warn!(device, "no reports inside the observation window, not a UPS");
            events.push(Event::DeviceRejected { device });
        }

        let due = self
            .last_freshness
            .is_none_or(|at| now.duration_since(at) >= FRESHNESS_INTERVAL);
        if due {
            self.last_freshness = Some(now);
            if self.classifier.confirmed().is_none() {
                if self.monitor.record_failure() {
                    warn!("failure threshold reached, scheduling restart");
                    events.push(Event::RestartScheduled { delay: RESTART_DELAY });
                }
            } else if let Some(state) = self.store.check_freshness(now) {
                warn!(liveness = %state, "telemetry went stale");
                events.push(Event::LivenessChanged(state));
            }
        }
        events
    }

    /// The 2-byte control frame toggling the audible alarm, for the
    /// transport to write. Best effort; the write is not retried here.
    pub fn beep_frame(&self, enabled: bool) -> Result<[u8; 2], BridgeError> {
        self.decoder
            .as_ref()
            .map(|d| d.beep_frame(enabled))
            .ok_or(BridgeError::NoProfile)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ups_present: self.classifier.confirmed().is_some(),
            liveness: self.store.liveness(),
            record: *self.store.record(),
            profile: self.decoder.as_ref().map(|d| d.profile()),
        }
    }

    fn decode_report(&mut self, report_id: u8, data: &Bytes, now: Instant, events: &mut Vec<Event>) {
        let Some(decoder) = &self.decoder else {
            return;
        };
        debug!(report_id, bytes = hex::encode(data), "decoding report");
        let updated = decoder.decode(report_id, data, self.store.record_mut());
        if updated > 0 {
            self.monitor.record_success();
            debug!("{}", self.store.record());
            if let Some(state) = self.store.sample_received(now) {
                info!(liveness = %state, "telemetry live");
                events.push(Event::LivenessChanged(state));
            }
        } else {
            warn!(report_id, "report carried no usable telemetry");
            if self.monitor.record_failure() {
                warn!("failure threshold reached, scheduling restart");
                events.push(Event::RestartScheduled { delay: RESTART_DELAY });
            }
        }
    }
}
