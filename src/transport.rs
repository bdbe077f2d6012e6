// src/transport.rs
//
// USB HID transport feeding the gateway. This is the collaborator below
// the core: it scans the bus, claims a candidate device, delivers raw
// `(report_id, bytes)` pairs upward and performs the beep control write.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use bytes::Bytes;
use nusb::transfer::{ControlOut, ControlType, Recipient, RequestBuffer};
use nusb::{DeviceInfo, Interface};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use nutbridge_lib::constants::MAX_REPORT_SIZE;
use nutbridge_lib::gateway::Event;
use nutbridge_lib::{profile, ClassHint, HidProtocol, SharedGateway};

use crate::dispatch;
use crate::error::TransportError;

const USB_CLASS_HID: u8 = 0x03;
const ENDPOINT_IN: u8 = 0x81;
const HID_REQUEST_SET_REPORT: u8 = 0x09;
const HID_REPORT_TYPE_FEATURE: u16 = 0x03;

/// Pause between bus scans while no device is held
const SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// How long to sit on the interrupt endpoint before rechecking whether the
/// device is still worth holding
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

pub struct HidTransport {
    gateway: SharedGateway,
    next_device_id: u32,
    /// Bus/address pairs written off for as long as they stay plugged in
    skip: HashSet<(u8, u8)>,
}

impl HidTransport {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            gateway,
            next_device_id: 1,
            skip: HashSet::new(),
        }
    }

    /// Scan, claim, pump reports, repeat. Never returns; individual
    /// session errors are logged and lead back to scanning.
    pub async fn run(mut self) {
        loop {
            self.prune_skip_list();
            match find_candidate(&self.skip) {
                Ok(Some((info, hint))) => {
                    if let Err(error) = self.session(&info, hint).await {
                        warn!(%error, "device session ended with error");
                    }
                }
                Ok(None) => debug!("no HID candidate on the bus"),
                Err(error) => warn!(%error, "bus scan failed"),
            }
            tokio::time::sleep(SCAN_INTERVAL).await;
        }
    }

    /// One attach-to-detach session with a single device.
    async fn session(&mut self, info: &DeviceInfo, hint: ClassHint) -> Result<(), TransportError> {
        let key = (info.bus_number(), info.device_address());
        let device = info.open()?;
        let interface = device.detach_and_claim_interface(0)?;

        let device_id = self.next_device_id;
        self.next_device_id += 1;
        info!(
            device_id,
            vendor_id = format_args!("{:#06x}", hint.vendor_id),
            product_id = format_args!("{:#06x}", hint.product_id),
            protocol = %hint.protocol,
            "claimed HID device"
        );

        let events = self
            .gateway
            .write()
            .await
            .on_attach(device_id, hint, Instant::now());
        dispatch(&events);
        if events
            .iter()
            .any(|e| matches!(e, Event::DeviceRejected { .. }))
        {
            // Keyboard or mouse; release it and leave it alone.
            self.skip.insert(key);
            return Ok(());
        }

        loop {
            let transfer = interface.interrupt_in(ENDPOINT_IN, RequestBuffer::new(MAX_REPORT_SIZE));
            match timeout(READ_TIMEOUT, transfer).await {
                Ok(completion) => match completion.into_result() {
                    Ok(data) if data.is_empty() => continue,
                    Ok(data) => {
                        let report = Bytes::from(data);
                        let report_id = report[0];
                        let events = self.gateway.write().await.on_raw_report(
                            device_id,
                            report_id,
                            &report,
                            Instant::now(),
                        );
                        dispatch(&events);
                    }
                    Err(error) => {
                        warn!(device_id, %error, "interrupt transfer failed");
                        break;
                    }
                },
                Err(_) => {
                    // Silent device. If the observation window already
                    // wrote it off, stop holding it hostage.
                    if !self.gateway.read().await.snapshot().ups_present {
                        info!(device_id, "device stayed silent, releasing");
                        self.skip.insert(key);
                        break;
                    }
                }
            }
        }

        let events = self.gateway.write().await.on_detach(device_id, Instant::now());
        dispatch(&events);
        Ok(())
    }

    /// Forget skip entries for devices that have left the bus, so a
    /// re-plug starts a fresh attach session.
    fn prune_skip_list(&mut self) {
        if self.skip.is_empty() {
            return;
        }
        if let Ok(devices) = nusb::list_devices() {
            let present: HashSet<(u8, u8)> = devices
                .map(|d| (d.bus_number(), d.device_address()))
                .collect();
            self.skip.retain(|key| present.contains(key));
        }
    }
}

/// Pick the most promising HID device on the bus: a vendor/product match
/// against the profile registry wins, otherwise the first HID-class device
/// not yet written off.
fn find_candidate(
    skip: &HashSet<(u8, u8)>,
) -> Result<Option<(DeviceInfo, ClassHint)>, TransportError> {
    let mut fallback: Option<(DeviceInfo, ClassHint)> = None;
    for info in nusb::list_devices()? {
        if skip.contains(&(info.bus_number(), info.device_address())) {
            continue;
        }
        let Some(hid) = info.interfaces().find(|i| i.class() == USB_CLASS_HID) else {
            continue;
        };
        let hint = ClassHint {
            protocol: HidProtocol::from(hid.protocol()),
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
        };
        let known = profile::PROFILES
            .iter()
            .any(|p| p.vendor_id == hint.vendor_id && p.product_id == hint.product_id);
        if known {
            return Ok(Some((info, hint)));
        }
        if fallback.is_none() {
            fallback = Some((info, hint));
        }
    }
    Ok(fallback)
}

/// One-shot beep toggle for the `beep` subcommand. Best effort: failures
/// are reported to the caller and never retried.
pub async fn set_beep(enabled: bool) -> Result<(), TransportError> {
    let (info, hint) = find_candidate(&HashSet::new())?.ok_or(TransportError::DeviceNotFound)?;
    let profile = profile::select(hint.vendor_id, hint.product_id);
    info!(profile = profile.name, "toggling beeper");

    let device = info.open()?;
    let interface = device.detach_and_claim_interface(0)?;
    let frame = [
        profile.beep_report_id,
        if enabled {
            profile.beep_on_value
        } else {
            profile.beep_off_value
        },
    ];
    write_feature_report(&interface, frame[0], &frame).await
}

async fn write_feature_report(
    interface: &Interface,
    report_id: u8,
    data: &[u8],
) -> Result<(), TransportError> {
    debug!(bytes = hex::encode(data), "control write");
    let transfer = interface.control_out(ControlOut {
        control_type: ControlType::Class,
        recipient: Recipient::Interface,
        request: HID_REQUEST_SET_REPORT,
        value: (HID_REPORT_TYPE_FEATURE << 8) | report_id as u16,
        index: 0,
        data,
    });
    timeout(CONTROL_TIMEOUT, transfer).await?.into_result()?;
    Ok(())
}
