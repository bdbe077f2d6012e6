//! Latest-telemetry store and liveness state machine.

use std::time::Instant;

use strum_macros::Display;

use crate::constants::FRESHNESS_TIMEOUT;
use crate::telemetry::TelemetryRecord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether currently held telemetry can be trusted.
///
/// `Absent → WaitingForData → Active ⟷ Stale`, back to `Absent` only on
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Liveness {
    #[default]
    Absent,
    WaitingForData,
    Active,
    Stale,
}

/// Holds the latest record, the liveness state and the last sample time.
/// No history.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    record: TelemetryRecord,
    liveness: Liveness,
    last_sample: Option<Instant>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &TelemetryRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut TelemetryRecord {
        &mut self.record
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// A device was just confirmed but has not delivered a decodable
    /// sample yet. Returns the new state if it changed.
    pub fn mark_waiting(&mut self) -> Option<Liveness> {
        match self.liveness {
            Liveness::Absent | Liveness::Stale => {
                self.liveness = Liveness::WaitingForData;
                Some(self.liveness)
            }
            _ => None,
        }
    }

    /// A decode pass just updated the record.
    pub fn sample_received(&mut self, now: Instant) -> Option<Liveness> {
        self.last_sample = Some(now);
        match self.liveness {
            Liveness::WaitingForData | Liveness::Stale | Liveness::Absent => {
                self.liveness = Liveness::Active;
                Some(self.liveness)
            }
            Liveness::Active => None,
        }
    }

    /// Freshness check, expected on a ~2 s cadence.
    pub fn check_freshness(&mut self, now: Instant) -> Option<Liveness> {
        match (self.liveness, self.last_sample) {
            (Liveness::Active, Some(at)) if now.duration_since(at) > FRESHNESS_TIMEOUT => {
                self.liveness = Liveness::Stale;
                Some(self.liveness)
            }
            _ => None,
        }
    }

    /// The confirmed device disconnected.
    pub fn mark_absent(&mut self) -> Option<Liveness> {
        self.last_sample = None;
        match self.liveness {
            Liveness::Absent => None,
            _ => {
                self.liveness = Liveness::Absent;
                Some(self.liveness)
            }
        }
    }
}
