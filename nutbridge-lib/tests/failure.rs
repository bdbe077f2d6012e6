//! Failure escalation through the gateway.

mod common;

use std::time::{Duration, Instant};

use common::*;
use nutbridge_lib::constants::RESTART_DELAY;
use nutbridge_lib::gateway::{Event, Gateway};

fn restart_events(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::RestartScheduled { .. }))
        .count()
}

#[test]
fn five_absent_ticks_schedule_one_restart() {
    let mut gateway = Gateway::new();
    let start = Instant::now();
    let mut restarts = 0;
    // Freshness checks run on a 2 s cadence; with no device ever confirmed
    // each one records a failure.
    for i in 0..5 {
        let events = gateway.tick(start + Duration::from_secs(2 * i));
        restarts += restart_events(&events);
    }
    assert_eq!(restarts, 1);

    // More failing ticks before the restart fires must not schedule again.
    for i in 5..10 {
        let events = gateway.tick(start + Duration::from_secs(2 * i));
        assert_eq!(restart_events(&events), 0);
    }
}

#[test]
fn restart_carries_the_fixed_delay() {
    let mut gateway = Gateway::new();
    let start = Instant::now();
    let mut scheduled = None;
    for i in 0..5 {
        for event in gateway.tick(start + Duration::from_secs(2 * i)) {
            if let Event::RestartScheduled { delay } = event {
                scheduled = Some(delay);
            }
        }
    }
    assert_eq!(scheduled, Some(RESTART_DELAY));
}

#[test]
fn undecodable_reports_escalate() {
    let mut gateway = Gateway::new();
    let start = Instant::now();
    confirm_santak(&mut gateway, start);

    // Report ID 0x7F is mapped by no profile; five in a row cross the
    // threshold.
    let mut restarts = 0;
    for i in 0..5u64 {
        let events = gateway.on_raw_report(
            1,
            0x7F,
            &report(&[0x7F, 0x00]),
            start + Duration::from_millis(i),
        );
        restarts += restart_events(&events);
    }
    assert_eq!(restarts, 1);
}

#[test]
fn successful_decode_resets_the_count() {
    let mut gateway = Gateway::new();
    let start = Instant::now();
    confirm_santak(&mut gateway, start);

    for _ in 0..4 {
        gateway.on_raw_report(1, 0x7F, &report(&[0x7F, 0x00]), start);
    }
    // A good sample clears the slate.
    gateway.on_raw_report(1, 0x01, &report(&[0x01, 0x09]), start);
    let events = gateway.on_raw_report(1, 0x7F, &report(&[0x7F, 0x00]), start);
    assert_eq!(restart_events(&events), 0);
}
