// src/error.rs

use nusb::transfer::TransferError;
use thiserror::Error;

/// Errors surfaced by the USB HID transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no HID device found on the bus")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("USB transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Timeout during USB operation: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}
