pub mod classifier;
pub mod constants;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod monitor;
pub mod profile;
pub mod server;
pub mod store;
pub mod telemetry;

// Re-export the types most callers wire together
pub use classifier::{ClassHint, DeviceId, HidProtocol};
pub use error::BridgeError;
pub use gateway::{Event, Gateway, StatusSnapshot};
pub use server::{NutServer, ServerConfig, SharedGateway};
pub use store::Liveness;
pub use telemetry::TelemetryRecord;
