use std::io;
use thiserror::Error;

/// The primary error type for the `nutbridge-lib` library.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no UPS model profile selected")]
    NoProfile,
}
