// Timing and protocol constants for the UPS gateway

use std::time::Duration;

/// Largest raw HID report accepted from the transport
pub const MAX_REPORT_SIZE: usize = 64;

/// Observation window for deciding whether a new device is a UPS
pub const CLASSIFY_WINDOW: Duration = Duration::from_secs(1);

/// Cadence at which the owner is expected to call `Gateway::tick`
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Cadence of the telemetry freshness check inside `tick`
pub const FRESHNESS_INTERVAL: Duration = Duration::from_secs(2);

/// Telemetry older than this counts as stale
pub const FRESHNESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Consecutive failures before a restart is scheduled
pub const RESTART_THRESHOLD: u32 = 5;

/// Delay between scheduling a restart and firing it
pub const RESTART_DELAY: Duration = Duration::from_secs(10);

/// Default NUT listen port
pub const DEFAULT_PORT: u16 = 3493;

/// Longest request line the protocol server will answer
pub const MAX_LINE_LEN: usize = 128;

/// Concurrent protocol connections served at once
pub const MAX_CONNECTIONS: usize = 8;
