use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fault_console::config::ConsoleConfig;
use fault_console::console::run_console;
use fault_console::protocol::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use tracing_subscriber::EnvFilter;

// Use mimalloc as the global allocator for the binary (non-Windows only)
#[cfg(not(windows))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "fault-console",
    author,
    version,
    disable_version_flag = true,
    about = "Batch fault injection console for network labs"
)]
struct Cli {
    /// Print the version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    print_version: bool,

    /// Base URL of the lab's discovery and fault services
    #[arg(long = "base-url", env = "FAULT_CONSOLE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Session file for the discovered topology (default: per shell session
    /// under $XDG_RUNTIME_DIR)
    #[arg(long = "session-file")]
    session_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Tell the measurement service a fault was injected after a batch in
    /// which something took effect
    #[arg(long = "mark-fault-flag")]
    mark_fault_flag: bool,

    /// Do not refresh the topology at startup
    #[arg(long = "no-refresh")]
    no_refresh: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    if args.print_version {
        println!(
            "{} ({}@{}{}) [{}]",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_BRANCH"),
            env!("GIT_HASH"),
            env!("GIT_DIRTY"),
            env!("CARGO_PKG_NAME")
        );
        return Ok(());
    }

    let config = ConsoleConfig::from_cli(
        args.base_url,
        args.session_file,
        args.timeout_secs,
        args.mark_fault_flag,
        args.no_refresh,
    )?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build runtime")?
        .block_on(run_console(config))
        .context("fault-console failed")
}
