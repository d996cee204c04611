//! restcycle - activity-aware work/rest reminders
//!
//! Work time only counts while you are actually using the keyboard or mouse:
//! - a rest prompt once the work target is reached
//! - a resume prompt once you have rested long enough
//! - an automatic rest when you stay away for a long time

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use restcycle::cli::{Cli, Commands, ConfigAction, Display, IpcClient, RunArgs};
use restcycle::daemon::{Daemon, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, matches!(cli.command, Some(Commands::Run(_))));

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise the daemon logs at info and the client only
/// reports warnings, with `--verbose` raising both to debug.
fn init_tracing(verbose: bool, is_daemon: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = match (verbose, is_daemon) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let socket = cli.socket;
    let client = || -> Result<IpcClient> {
        match &socket {
            Some(path) => Ok(IpcClient::with_socket_path(path.clone())),
            None => IpcClient::new(),
        }
    };

    match cli.command {
        Some(Commands::Run(args)) => {
            let socket_path = match &socket {
                Some(path) => path.clone(),
                None => restcycle::daemon::default_socket_path()?,
            };
            run_daemon(socket_path, args).await?;
        }
        Some(Commands::Status { watch: false }) => {
            let response = client()?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Status { watch: true }) => {
            watch_status(&client()?).await?;
        }
        Some(Commands::Config { action }) => {
            let client = client()?;
            match action {
                ConfigAction::Show => {
                    let response = client.get_config().await?;
                    Display::show_config(&response);
                }
                ConfigAction::Set(args) => {
                    let response = client.set_config(args.to_update()).await?;
                    Display::show_success(&response);
                    Display::show_config(&response);
                }
            }
        }
        Some(Commands::Input) => {
            client()?.input().await?;
        }
        Some(Commands::Stop) => {
            let response = client()?.shutdown().await?;
            Display::show_success(&response);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Runs the daemon in the foreground until it is stopped.
async fn run_daemon(socket_path: std::path::PathBuf, args: RunArgs) -> Result<()> {
    let mut options = DaemonOptions::new(socket_path);
    options.config_path = args.config;
    options.no_sound = args.no_sound;
    options.inactivity_threshold = args.inactivity_threshold;
    options.sounds_dir = args.sounds_dir;

    Daemon::new(options).run().await
}

/// Redraws the status line every second until Ctrl-C.
async fn watch_status(client: &IpcClient) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut stdout = std::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                return Ok(());
            }
            _ = interval.tick() => {
                let response = client.status().await?;
                if let Some(snapshot) = response.data.and_then(|data| data.snapshot) {
                    // Pad to clear leftovers from a longer previous line
                    write!(stdout, "\r{:<60}", Display::status_line(&snapshot))?;
                    stdout.flush()?;
                }
            }
        }
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
