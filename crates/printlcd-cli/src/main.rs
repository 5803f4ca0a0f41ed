//! printlcd CLI
//!
//! Control and configuration tool for printlcd.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use printlcd_daemon::driver::DriverStatus;
use printlcd_daemon::ipc::{self, IpcRequest, IpcResponse};

const DAEMON_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "printlcd")]
#[command(about = "Print status display tool for LCDproc")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/printlcd/config.kdl")]
    config: String,

    /// Control socket of the daemon (overrides the configuration file)
    #[arg(short, long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// Write a configuration file with all defaults
    Init {
        /// Output path (defaults to the configuration file path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Report that a print job started
    Started {
        /// File being printed
        name: String,
    },

    /// Report that the print job finished
    Done,

    /// Report that the print job was cancelled
    Cancelled,

    /// Report that the print job failed
    Failed,

    /// Report job progress
    Progress {
        /// Percent complete (0-100)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Report the estimated time left
    TimeLeft {
        /// Seconds until the job finishes, or `unknown`
        #[arg(value_parser = parse_time_left)]
        seconds: TimeLeft,
    },

    /// Show current daemon status
    Status,

    /// Reload daemon configuration
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeLeft(Option<f64>);

fn parse_time_left(value: &str) -> Result<TimeLeft, String> {
    if value.eq_ignore_ascii_case("unknown") {
        return Ok(TimeLeft(None));
    }

    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(TimeLeft(Some(seconds))),
        _ => Err(format!(
            "`{}` is not a number of seconds or `unknown`",
            value
        )),
    }
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    let request = match cli.command {
        Commands::Validate => return cmd_validate(&config_path),
        Commands::Init { output, force } => {
            return cmd_init(output.as_deref().unwrap_or(&config_path), force)
        }
        Commands::Started { name } => IpcRequest::PrintStarted { name },
        Commands::Done => IpcRequest::PrintDone { name: None },
        Commands::Cancelled => IpcRequest::PrintCancelled { name: None },
        Commands::Failed => IpcRequest::PrintFailed { name: None },
        Commands::Progress { percent } => IpcRequest::Progress { percent },
        Commands::TimeLeft { seconds } => IpcRequest::TimeLeft { seconds: seconds.0 },
        Commands::Status => IpcRequest::Status,
        Commands::Reload => IpcRequest::Reload,
    };

    let socket_path = resolve_socket(cli.socket, &config_path);
    match send_request(&socket_path, &request)? {
        IpcResponse::Success { message } => {
            if let Some(message) = message {
                println!("{}", message);
            }
            Ok(())
        }
        IpcResponse::Status(status) => {
            print_status(&status);
            Ok(())
        }
        IpcResponse::Error { message } => Err(miette::miette!("Daemon error: {}", message)),
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = printlcd_config::parse_config(config_path)?;
    let display = &config.display;

    println!("Configuration is valid!");
    println!("  LCDd:      {}:{}", display.host, display.port);
    println!("  Enabled:   {}", display.enabled);
    println!(
        "  Priority:  {} while printing, {} otherwise",
        display.priority_printing, display.priority_non_printing
    );
    if display.hide_page_when_idle {
        println!("  Idle:      hidden after {} minute(s)", display.idle_time_minutes);
    }
    if display.title_show {
        println!("  Title:     {}", display.title_text);
    }

    Ok(())
}

fn cmd_init(output: &Path, force: bool) -> miette::Result<()> {
    if output.exists() && !force {
        return Err(miette::miette!(
            help = "pass --force to overwrite it",
            "{} already exists",
            output.display()
        ));
    }

    let content = printlcd_config::generate_config(&printlcd_config::Config::default());

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    std::fs::write(output, content).into_diagnostic()?;

    println!("Wrote default configuration: {}", output.display());
    Ok(())
}

/// `--socket`, else the configured control socket, else the default location
fn resolve_socket(explicit: Option<PathBuf>, config_path: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let configured = if config_path.exists() {
        match printlcd_config::parse_config(config_path) {
            Ok(config) => config.global.control_socket,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", config_path.display(), e);
                None
            }
        }
    } else {
        None
    };

    ipc::socket_path(configured.as_deref())
}

fn send_request(socket_path: &Path, request: &IpcRequest) -> miette::Result<IpcResponse> {
    let mut stream = UnixStream::connect(socket_path).map_err(|e| {
        miette::miette!(
            help = "is printlcdd running?",
            "Cannot connect to {}: {}",
            socket_path.display(),
            e
        )
    })?;
    stream
        .set_read_timeout(Some(DAEMON_TIMEOUT))
        .into_diagnostic()?;

    let mut line = serde_json::to_string(request).into_diagnostic()?;
    line.push('\n');
    stream.write_all(line.as_bytes()).into_diagnostic()?;

    let mut reply = String::new();
    BufReader::new(stream)
        .read_line(&mut reply)
        .into_diagnostic()?;

    if reply.is_empty() {
        return Err(miette::miette!("Daemon closed the connection without replying"));
    }

    serde_json::from_str(reply.trim()).into_diagnostic()
}

fn print_status(status: &DriverStatus) {
    println!("State:     {}", status.state);
    println!("Priority:  {}", status.priority);
    println!("File:      {}", status.filename.as_deref().unwrap_or("-"));
    match status.percent {
        Some(percent) => println!("Progress:  {}%", percent),
        None => println!("Progress:  -"),
    }
    println!("ETA:       {}", status.eta.trim());
    println!("Finish:    {}", status.finish.trim());

    match (status.connected, status.width, status.height) {
        (true, Some(width), Some(height)) => println!("LCDd:      connected ({}x{})", width, height),
        (true, _, _) => println!("LCDd:      connected"),
        (false, _, _) => println!(
            "LCDd:      not connected ({} attempt(s))",
            status.connect_attempts
        ),
    }
}
