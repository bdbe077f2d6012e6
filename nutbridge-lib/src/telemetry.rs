use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decoded UPS telemetry snapshot.
///
/// Rebuilt incrementally: a decode pass only touches the fields whose
/// report type just arrived, everything else keeps its previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetryRecord {
    pub ac_present: bool,
    pub charging: bool,
    pub discharging: bool,
    pub healthy: bool,
    pub internal_failure: bool,
    pub needs_replacement: bool,
    pub overload: bool,
    pub shutdown_imminent: bool,

    /// Battery charge percentage, clamped to 0..=100
    pub battery_charge: u8,
    /// Output load percentage, clamped to 0..=100
    pub load: u8,
    /// Remaining runtime in seconds
    pub runtime: u32,
    /// Voltage in decivolts
    pub voltage: u16,

    /// Raw audible alarm control byte
    pub alarm_control: u8,
    pub beep_enabled: bool,
}

impl TelemetryRecord {
    /// NUT status word: `OL` on line power, `OB` on battery, with
    /// `LB`/`RB`/`OVER` flags appended as applicable.
    pub fn status_string(&self) -> String {
        let mut status = String::from(if self.ac_present { "OL" } else { "OB" });
        if self.shutdown_imminent {
            status.push_str(" LB");
        }
        if !self.healthy || self.internal_failure || self.needs_replacement {
            status.push_str(" RB");
        }
        if self.overload {
            status.push_str(" OVER");
        }
        status
    }

    pub fn charger_status(&self) -> &'static str {
        if self.charging {
            "charging"
        } else if self.discharging {
            "discharging"
        } else {
            "floating"
        }
    }

    /// Voltage in volts, for protocol output.
    pub fn voltage_v(&self) -> f32 {
        self.voltage as f32 / 10.0
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AC: {}, Charging: {}, Discharging: {}, Buzzer: {}, Battery: {}%, Load: {}%, Runtime: {} s",
            if self.ac_present { "ON" } else { "OFF" },
            if self.charging { "Y" } else { "N" },
            if self.discharging { "Y" } else { "N" },
            if self.beep_enabled { "ON" } else { "OFF" },
            self.battery_charge,
            self.load,
            self.runtime,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_on_line() {
        let record = TelemetryRecord {
            ac_present: true,
            healthy: true,
            ..Default::default()
        };
        assert_eq!(record.status_string(), "OL");
    }

    #[test]
    fn status_string_on_battery_low() {
        let record = TelemetryRecord {
            ac_present: false,
            healthy: true,
            shutdown_imminent: true,
            ..Default::default()
        };
        assert_eq!(record.status_string(), "OB LB");
    }

    #[test]
    fn status_string_flags_accumulate() {
        let record = TelemetryRecord {
            ac_present: true,
            healthy: false,
            overload: true,
            ..Default::default()
        };
        assert_eq!(record.status_string(), "OL RB OVER");
    }

    #[test]
    fn charger_status_prefers_charging() {
        let record = TelemetryRecord {
            charging: true,
            discharging: true,
            ..Default::default()
        };
        assert_eq!(record.charger_status(), "charging");
    }
}
