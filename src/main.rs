mod error;
mod transport;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use nutbridge_lib::constants::{DEFAULT_PORT, TICK_INTERVAL};
use nutbridge_lib::gateway::Event;
use nutbridge_lib::{Gateway, NutServer, ServerConfig, SharedGateway};

#[derive(Parser)]
#[command(name = "nutbridge", about = "USB HID UPS to NUT protocol gateway")]
struct Cli {
    /// Address to bind the NUT listener on
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// NUT listener port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Alias the single UPS is addressed by
    #[arg(long, default_value = "ups")]
    alias: String,

    /// Description reported by LIST UPS
    #[arg(long, default_value = "USB HID UPS gateway")]
    description: String,

    /// Also write logs to daily rolling files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Toggle the UPS audible alarm once and exit
    Beep { state: BeepState },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BeepState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli);

    if let Some(Command::Beep { state }) = cli.command {
        let enabled = matches!(state, BeepState::On);
        transport::set_beep(enabled).await?;
        println!("beeper {}", if enabled { "enabled" } else { "disabled" });
        return Ok(());
    }

    let gateway: SharedGateway = Arc::new(RwLock::new(Gateway::new()));

    let listener = TcpListener::bind((cli.bind, cli.port)).await?;
    let server = NutServer::new(
        ServerConfig {
            alias: cli.alias.clone(),
            description: cli.description.clone(),
        },
        Arc::clone(&gateway),
    );
    tokio::spawn(async move {
        if let Err(err) = server.run(listener).await {
            error!(%err, "NUT server terminated");
            std::process::exit(1);
        }
    });

    // Classification windows, freshness checks and failure escalation all
    // run off this one externally driven tick.
    {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                let events = gateway.write().await.tick(Instant::now());
                dispatch(&events);
            }
        });
    }

    transport::HidTransport::new(gateway).run().await;
    Ok(())
}

/// Act on gateway events. Liveness changes and rejections are already
/// logged at the source; the restart request is the one that needs doing.
pub(crate) fn dispatch(events: &[Event]) {
    for event in events {
        if let Event::RestartScheduled { delay } = event {
            let delay = *delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                error!("restarting to recover the USB link");
                std::process::exit(1);
            });
        }
    }
}

fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.verbosity.tracing_level_filter().to_string()));
    match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "nutbridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
