//! Conference client entry point.
//!
//! Wires together the TCP messaging adapter, the session task, the command
//! dispatcher and the local preview loop, then reads commands from stdin.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()                 -- TOML file + CLI overrides
//!  └─ TcpMessagingClient::new()     -- lazy TCP connection to the server
//!  └─ SessionHandle::spawn()        -- single-flight task owning the controller
//!  └─ spawn_preview()               -- capture → codec → composite every tick
//!  └─ spawn_line_reader()           -- stdin on its own thread → line channel
//!  └─ run_command_loop()            -- prompt, parse, dispatch until EOF or Ctrl-C
//! ```
//!
//! # Usage
//!
//! ```text
//! conf-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --server <HOST:PORT>   Session server, overrides the config file
//!   --username <NAME>      User part of the SIP from-URI
//!   --no-preview           Do not run the local preview loop
//! ```
//!
//! Each option can also be set through `CONF_CONFIG`, `CONF_SERVER`,
//! `CONF_USERNAME` and `CONF_NO_PREVIEW`.  Logs go to stderr so the prompt on
//! stdout stays readable; `RUST_LOG` overrides the configured log level.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::{task::JoinHandle, time};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use conf_client::application::{
    dispatch_command::CommandDispatcher,
    manage_session::ConferenceSessionController,
    render_frame::{FrameCapture, RenderFrameUseCase},
    session_actor::SessionHandle,
};
use conf_client::infrastructure::{
    capture::SyntheticCapture,
    console::{run_command_loop, spawn_line_reader},
    network::{TcpMessagingClient, TcpMessagingConfig},
    storage::config::{load_config, ClientConfig, DisplayConfig},
};
use conf_core::{Compositor, JpegCodec, SharingState};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Conference client.
///
/// Creates, joins, quits and cancels conferences on a session server and
/// shows a local preview of the media being shared.
#[derive(Debug, Parser)]
#[command(name = "conf-client", about = "Command-line conference client", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONF_CONFIG")]
    config: Option<PathBuf>,

    /// Session server as `HOST:PORT`; overrides `[server]` in the config.
    #[arg(long, env = "CONF_SERVER")]
    server: Option<String>,

    /// User part of the `from` URI; overrides `client.username`.
    #[arg(long, env = "CONF_USERNAME")]
    username: Option<String>,

    /// Disable the local preview loop.
    #[arg(long, env = "CONF_NO_PREVIEW")]
    no_preview: bool,
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut ClientConfig, cli: &Cli) -> anyhow::Result<()> {
    if let Some(server) = &cli.server {
        let (host, port) = server
            .rsplit_once(':')
            .with_context(|| format!("--server must be HOST:PORT, got {server:?}"))?;
        config.server.port = port
            .parse()
            .with_context(|| format!("invalid port in --server {server:?}"))?;
        config.server.host = host.to_string();
    }
    if let Some(username) = &cli.username {
        config.client.username = username.clone();
    }
    Ok(())
}

/// Spawns the local preview loop.
///
/// Capture, JPEG encode/decode and compositing are CPU-bound, so each tick
/// runs on the blocking pool.
fn spawn_preview(display_config: &DisplayConfig, sharing: Arc<SharingState>) -> JoinHandle<()> {
    let capture = Arc::new(SyntheticCapture::new(display_config.canvas(), display_config.camera()));
    let layout = display_config.layout;
    let use_case = Arc::new(RenderFrameUseCase::new(
        Arc::new(JpegCodec::new(display_config.jpeg_quality)),
        Compositor::with_policy(display_config.canvas(), layout),
    ));
    let period = display_config.frame_interval().max(time::Duration::from_millis(1));

    info!(
        screen = ?capture.screen_size(),
        ?layout,
        "preview loop every {period:?}"
    );

    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let (uc, cap, sharing) = (Arc::clone(&use_case), Arc::clone(&capture), Arc::clone(&sharing));
            match tokio::task::spawn_blocking(move || uc.preview(cap.as_ref(), &sharing)).await {
                Ok(Ok(Some(frame))) => {
                    debug!(width = frame.width(), height = frame.height(), "preview frame ready");
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => warn!("preview tick failed: {e}"),
                Err(e) => warn!("preview task panicked: {e}"),
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        load_config(cli.config.as_deref()).context("failed to load configuration")?;
    apply_overrides(&mut config, &cli)?;

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(server = %config.server.address(), user = %config.client.username, "conference client starting");

    // ── Session ───────────────────────────────────────────────────────────────
    let messaging = Arc::new(TcpMessagingClient::new(TcpMessagingConfig {
        server_addr: config.server.address(),
        request_timeout: config.server.request_timeout(),
    }));
    let controller = ConferenceSessionController::new(messaging, config.endpoints());
    let (session, session_task) = SessionHandle::spawn(controller);

    let sharing = Arc::new(SharingState::new());
    let dispatcher = CommandDispatcher::new(session, Arc::clone(&sharing));

    // ── Preview loop ──────────────────────────────────────────────────────────
    let preview_task = (!cli.no_preview).then(|| spawn_preview(&config.display, Arc::clone(&sharing)));

    // ── Command loop ──────────────────────────────────────────────────────────
    let (mut lines, _reader) = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("failed to start console reader")?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let exit = run_command_loop(&dispatcher, &mut lines, &mut tokio::io::stdout(), shutdown)
        .await
        .context("command loop failed")?;
    debug!(?exit, "command loop finished");

    // ── Shutdown ──────────────────────────────────────────────────────────────
    if let Some(task) = preview_task {
        task.abort();
    }
    drop(dispatcher);
    session_task.await.context("session task panicked")?;
    info!("conference client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("conf-client").chain(args.iter().copied()))
    }

    #[test]
    fn test_server_override_splits_host_and_port() {
        let mut config = ClientConfig::default();

        apply_overrides(&mut config, &cli(&["--server", "10.1.2.3:7000"])).unwrap();

        assert_eq!(config.server.host, "10.1.2.3");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_server_override_without_port_is_error() {
        let mut config = ClientConfig::default();
        assert!(apply_overrides(&mut config, &cli(&["--server", "localhost"])).is_err());
    }

    #[test]
    fn test_username_override() {
        let mut config = ClientConfig::default();

        apply_overrides(&mut config, &cli(&["--username", "carol"])).unwrap();

        assert_eq!(config.client.username, "carol");
        assert_eq!(config.server, ClientConfig::default().server);
    }

    #[tokio::test]
    async fn test_preview_loop_keeps_running_until_aborted() {
        // Arrange
        let display_config = DisplayConfig {
            canvas_width: 320,
            canvas_height: 180,
            camera_width: 64,
            camera_height: 48,
            frame_interval_ms: 5,
            ..ClientConfig::default().display
        };
        let sharing = Arc::new(SharingState::new());
        sharing.toggle(conf_core::MediaKind::Screen);

        // Act
        let task = spawn_preview(&display_config, sharing);
        time::sleep(time::Duration::from_millis(50)).await;

        // Assert
        assert!(!task.is_finished());
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
