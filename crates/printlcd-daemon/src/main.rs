//! printlcd daemon
//!
//! Shows print job status on an LCDproc display.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use printlcd_daemon::driver::{StateDriver, SystemClock};
use printlcd_daemon::ipc::{self, IpcServer, RequestHandler};

#[derive(Parser, Debug)]
#[command(name = "printlcdd")]
#[command(about = "Print status daemon for LCDproc displays")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/printlcd/config.kdl")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    // RUST_LOG wins over the configured level. Problems with the file are
    // reported by the real load below, once logging is up.
    let log_level = printlcd_config::parse_config(&config_path)
        .map(|config| config.global.log_level)
        .unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .init();

    tracing::info!("Loading configuration from {}", config_path.display());
    let config = printlcd_daemon::load_config(&config_path)?;

    let remaining = Arc::new(RwLock::new(None));
    let (driver, driver_handle) =
        StateDriver::new(config.display.clone(), remaining.clone(), SystemClock);
    let driver_task = driver.spawn();

    let socket_path = ipc::socket_path(config.global.control_socket.as_deref());
    let server = IpcServer::bind(socket_path)?;
    let handler = RequestHandler::new(driver_handle.clone(), remaining, config_path);

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tracing::info!("printlcd daemon running");

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let result = ipc::handle_ipc_connection(stream, |request| async move {
                            handler.handle(request).await
                        })
                        .await;
                        if let Err(e) = result {
                            tracing::warn!("Control connection failed: {:#}", e);
                        }
                    });
                }
                Err(e) => tracing::warn!("{:#}", e),
            },
            _ = hangup.recv() => {
                tracing::info!("Received SIGHUP");
                if let Err(e) = handler.reload().await {
                    tracing::error!("Reload failed: {:#}", e);
                }
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received Ctrl-C");
                break;
            }
        }
    }

    tracing::info!("Shutting down...");

    // Closes the LCDd session before returning
    if driver_handle.shutdown().await.is_ok() {
        driver_task.await?;
    }
    drop(server);

    Ok(())
}
