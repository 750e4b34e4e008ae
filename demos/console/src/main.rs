//! SP0256 Console
//!
//! Runs the emulator on simulated pins and reads control commands from
//! stdin. `POKE <token>` plays the part of the host CPU.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use sp0256_core::TARGET_SYSTEM;
use sp0256_runtime::{init_logging, ControlSurface, EmulatorConfig, EmulatorHandle, LogConfig};

/// SP0256-AL2 speech chip emulator console
#[derive(Parser, Debug)]
#[command(name = "sp0256-console")]
#[command(about = "SP0256-AL2 emulator with an interactive control console", long_about = None)]
struct Cli {
    /// Compressed allophone container
    #[arg(short, long, value_name = "FILE")]
    container: Option<PathBuf>,

    /// Directory of <id>.raw files used when the container has no entry
    #[arg(short, long, value_name = "DIR")]
    raw_dir: Option<PathBuf>,

    /// Request SCHED_FIFO and CPU pinning for the playback thread
    #[arg(long)]
    realtime: bool,

    /// CPU to pin the playback thread to
    #[arg(long, value_name = "CPU")]
    cpu: Option<usize>,

    /// Strobe debounce window in microseconds
    #[arg(long, value_name = "US", default_value_t = 1_000)]
    debounce_us: u64,

    /// Start with only SYSTEM logging on
    #[arg(short, long)]
    quiet: bool,

    /// Start at TRACE for enabled categories
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> EmulatorConfig {
        let mut log = if self.quiet {
            LogConfig::quiet()
        } else {
            LogConfig::default()
        };
        log.verbose = self.verbose;

        EmulatorConfig {
            debounce: Duration::from_micros(self.debounce_us),
            realtime_isolation: self.realtime,
            realtime_cpu: self.cpu,
            container_path: self.container.clone(),
            raw_dir: self.raw_dir.clone(),
            log,
            ..EmulatorConfig::simulation()
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.config();
    let logging = init_logging(config.log);

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           SP0256-AL2 Speech Chip Emulator                  ║");
    println!("║     Simulated bus - type HELP for commands                 ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let store = config.open_store()?;
    let sim = match EmulatorHandle::start_simulated(config, store, false).await {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!(target: TARGET_SYSTEM, "startup failed: {}", e);
            return Err(e.into());
        }
    };

    let status = sim.handle.status();
    println!(
        "Source: {}, {} waveforms cached",
        status.data_source, status.cache_size
    );
    println!();

    let console = ControlSurface::new(sim.handle)
        .with_logging(logging)
        .with_host(sim.bus);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match console.dispatch(&line).await {
            Ok(response) if response.is_quit() => break,
            Ok(response) => {
                let text = response.to_string();
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(target: TARGET_SYSTEM, "{}", e);
                break;
            }
            Err(e) => println!("Error: {}", e),
        }
        prompt();
    }

    console.shutdown().await?;
    println!("Goodbye!");
    Ok(())
}
