//! NUT-compatible text protocol server.
//!
//! Line-oriented request/response over TCP. Every response is re-derived
//! from the gateway's current snapshot at answer time; a read never waits
//! on hardware I/O. Protocol errors answer with an `ERR` line and keep the
//! connection open; only transport errors close a connection.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::constants::{MAX_CONNECTIONS, MAX_LINE_LEN};
use crate::error::BridgeError;
use crate::gateway::{Gateway, StatusSnapshot};

pub type SharedGateway = Arc<RwLock<Gateway>>;

const ERR_UNKNOWN_COMMAND: &str = "ERR UNKNOWN COMMAND\n";
const ERR_UNKNOWN_UPS: &str = "ERR UNKNOWN UPS\n";
const ERR_UNKNOWN_VARIABLE: &str = "ERR UNKNOWN VARIABLE\n";
const ERR_UPS_NOT_FOUND: &str = "ERR UPS-NOT-FOUND\n";

/// How the single UPS is addressed by protocol clients.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub alias: String,
    pub description: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            alias: "ups".to_string(),
            description: "USB HID UPS gateway".to_string(),
        }
    }
}

pub struct NutServer {
    config: Arc<ServerConfig>,
    gateway: SharedGateway,
}

impl NutServer {
    pub fn new(config: ServerConfig, gateway: SharedGateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }

    /// Accept loop. Each client gets its own task; a fixed semaphore bounds
    /// how many are served at once, anyone beyond that is turned away.
    pub async fn run(self, listener: TcpListener) -> Result<(), BridgeError> {
        let limiter = Arc::new(Semaphore::new(MAX_CONNECTIONS));
        let addr = listener.local_addr()?;
        info!(%addr, "NUT server listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            let Ok(permit) = limiter.clone().try_acquire_owned() else {
                warn!(%peer, "connection limit reached, refusing client");
                continue;
            };
            info!(%peer, "client connected");
            let config = Arc::clone(&self.config);
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move {
                if let Err(error) = serve_client(stream, &config, &gateway).await {
                    debug!(%peer, %error, "connection closed");
                }
                drop(permit);
            });
        }
    }
}

async fn serve_client(
    stream: TcpStream,
    config: &ServerConfig,
    gateway: &SharedGateway,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let request = line.trim_end_matches(['\r', '\n']);
        debug!(request, "request");
        let reply = if request.len() > MAX_LINE_LEN {
            ERR_UNKNOWN_COMMAND.to_string()
        } else {
            let snapshot = gateway.read().await.snapshot();
            respond(request, config, &snapshot)
        };
        writer.write_all(reply.as_bytes()).await?;
    }
}

/// Interpret one request line against a telemetry snapshot.
pub fn respond(request: &str, config: &ServerConfig, snapshot: &StatusSnapshot) -> String {
    let mut words = request.split_whitespace();
    match words.next() {
        // Credentials are accepted unconditionally. Keep the LAN safe.
        Some("USERNAME" | "PASSWORD" | "LOGIN") => "OK\n".to_string(),
        Some("LOGOUT") => "OK Goodbye\n".to_string(),
        Some("LIST") => match words.next() {
            Some("UPS") => list_ups(config, snapshot),
            Some("VAR") => list_var(words.next(), config, snapshot),
            Some("CMD") => list_cmd(words.next(), config, snapshot),
            _ => ERR_UNKNOWN_COMMAND.to_string(),
        },
        Some("GET") => match words.next() {
            Some("VAR") => get_var(words.next(), words.next(), config, snapshot),
            _ => ERR_UNKNOWN_COMMAND.to_string(),
        },
        _ => ERR_UNKNOWN_COMMAND.to_string(),
    }
}

fn list_ups(config: &ServerConfig, snapshot: &StatusSnapshot) -> String {
    if snapshot.ups_present {
        format!(
            "BEGIN LIST UPS\nUPS {} \"{}\"\nEND LIST UPS\n",
            config.alias, config.description
        )
    } else {
        "BEGIN LIST UPS\nEND LIST UPS\n".to_string()
    }
}

fn list_var(alias: Option<&str>, config: &ServerConfig, snapshot: &StatusSnapshot) -> String {
    if !snapshot.ups_present {
        return "BEGIN LIST VAR\nEND LIST VAR\n".to_string();
    }
    if alias.is_some_and(|a| a != config.alias) {
        return ERR_UNKNOWN_UPS.to_string();
    }
    let mut out = format!("BEGIN LIST VAR {}\n", config.alias);
    for (name, value) in variables(snapshot) {
        out.push_str(&format!("VAR {} {} \"{}\"\n", config.alias, name, value));
    }
    out.push_str(&format!("END LIST VAR {}\n", config.alias));
    out
}

fn list_cmd(alias: Option<&str>, config: &ServerConfig, snapshot: &StatusSnapshot) -> String {
    // No controllable commands are exposed; the list is always empty.
    let echo = alias.or(snapshot.ups_present.then_some(config.alias.as_str()));
    match echo {
        Some(alias) => format!("BEGIN LIST CMD {alias}\nEND LIST CMD {alias}\n"),
        None => "BEGIN LIST CMD\nEND LIST CMD\n".to_string(),
    }
}

fn get_var(
    alias: Option<&str>,
    name: Option<&str>,
    config: &ServerConfig,
    snapshot: &StatusSnapshot,
) -> String {
    if !snapshot.ups_present {
        return ERR_UPS_NOT_FOUND.to_string();
    }
    let (Some(alias), Some(name)) = (alias, name) else {
        return ERR_UNKNOWN_COMMAND.to_string();
    };
    if alias != config.alias {
        return ERR_UNKNOWN_UPS.to_string();
    }
    match variables(snapshot).into_iter().find(|(n, _)| *n == name) {
        Some((n, v)) => format!("VAR {} {} \"{}\"\n", config.alias, n, v),
        None => ERR_UNKNOWN_VARIABLE.to_string(),
    }
}

/// Derive the full variable set from the current snapshot.
///
/// Variable names match the usbhid-ups driver; matching is exact and
/// case-sensitive. Values without a live source are fixed placeholders.
fn variables(snapshot: &StatusSnapshot) -> Vec<(&'static str, String)> {
    let r = &snapshot.record;
    let mfr = snapshot.profile.map_or("Unknown", |p| p.manufacturer());
    let model = snapshot.profile.map_or("Unknown", |p| p.model());
    vec![
        ("ups.status", r.status_string()),
        ("ups.load", r.load.to_string()),
        ("ups.battery.charge", r.battery_charge.to_string()),
        ("ups.battery.runtime", r.runtime.to_string()),
        ("ups.battery.voltage", format!("{:.1}", r.voltage_v())),
        ("ups.battery.type", "PbAc".to_string()),
        ("ups.battery.charge.low", "20".to_string()),
        ("ups.battery.charger.status", r.charger_status().to_string()),
        ("ups.input.voltage", format!("{:.1}", r.voltage_v())),
        ("ups.input.frequency", "60.0".to_string()),
        ("ups.input.frequency.nominal", "60".to_string()),
        ("ups.output.voltage", format!("{:.1}", r.voltage_v())),
        ("ups.output.frequency", "60.0".to_string()),
        ("ups.output.frequency.nominal", "60".to_string()),
        ("ups.power.nominal", "700".to_string()),
        ("ups.mfr", mfr.to_string()),
        ("ups.model", model.to_string()),
        ("ups.serial", "Unknown".to_string()),
        ("ups.firmware", "Unknown".to_string()),
        ("ups.type", "offline / line interactive".to_string()),
        (
            "ups.beeper.status",
            if r.beep_enabled { "enabled" } else { "disabled" }.to_string(),
        ),
        ("ups.delay.shutdown", "20".to_string()),
        ("ups.delay.start", "30".to_string()),
        ("ups.timer.shutdown", "0".to_string()),
        ("ups.timer.start", "0".to_string()),
    ]
}
