//! # verbosity - channel toggle console
//!
//! Inspect and change persisted channel masks from a terminal:
//!
//! ```text
//! verbosity list
//! verbosity toggle universal audio ui
//! verbosity clear universal
//! verbosity test-logs
//! ```
//!
//! `toggle` replaces the whole mask of a channel set; list every channel that
//! should stay enabled.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use verbosity::channel::ChannelFlag;
use verbosity::config::VerbosityConfig;
use verbosity::logger;
use verbosity::Verbosity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Toggle diagnostic channels", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preference file holding channel masks
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every known channel set and its enabled channels
    List {
        #[arg(long)]
        json: bool,
    },
    /// Replace the mask of a channel set
    Toggle {
        identity: String,
        /// Flag names or integers, OR-combined
        #[arg(required = true)]
        flags: Vec<String>,
    },
    /// Reset one channel set, or all of them
    Clear { identity: Option<String> },
    /// Emit one app, flow and issue line
    TestLogs,
}

#[derive(Serialize)]
struct ChannelReport {
    identity: String,
    mask: u32,
    enabled: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => VerbosityConfig::load_from(path),
        None => VerbosityConfig::load(),
    };
    if cli.preferences.is_some() {
        config.preferences_path = cli.preferences.clone();
    }
    logger::init_logger_with_filter(&config.log_filter)?;

    let verbose = Verbosity::from_config(&config);
    let registry = verbose.registry();

    // Pull persisted identities into the registry so they are listed and cleared too
    for identity in registry.store().persisted_identities() {
        registry.mask(&identity);
    }

    match cli.command {
        Command::List { json } => {
            let reports: Vec<ChannelReport> = registry
                .identities()
                .into_iter()
                .map(|identity| {
                    let mask = registry.mask(&identity);
                    let enabled = match registry.descriptor(&identity) {
                        Some(descriptor) => descriptor
                            .enabled_names(mask)
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                        None => Vec::new(),
                    };
                    ChannelReport {
                        identity,
                        mask: mask.bits(),
                        enabled,
                    }
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                println!("Verbosity toggles (x{})", reports.len());
                for report in reports {
                    println!(
                        "  {:<16} {:#010x}  {}",
                        report.identity,
                        report.mask,
                        report.enabled.join(", ")
                    );
                }
            }
        }
        Command::Toggle { identity, flags } => {
            let descriptor = registry.descriptor(&identity);
            let mut mask = ChannelFlag::NONE;
            for token in &flags {
                let flag = match &descriptor {
                    Some(descriptor) => descriptor.parse(token),
                    None => token.parse::<u32>().ok().map(ChannelFlag::from_bits),
                };
                mask |= flag.ok_or_else(|| format!("unknown flag '{}' for '{}'", token, identity))?;
            }
            registry.toggle(&identity, mask);
            println!("{} = {}", identity, registry.flag_name(&identity, mask));
        }
        Command::Clear { identity } => match identity {
            Some(identity) => {
                registry.clear(&identity);
                println!("{} cleared", identity);
            }
            None => {
                registry.clear_all();
                println!("all channel sets cleared");
            }
        },
        Command::TestLogs => {
            verbose.app("app", "things to say");
            verbose.flow("flow", "things to say");
            verbose.issue("issue", "things to say");
        }
    }

    if registry.store().is_degraded() {
        eprintln!("warning: preference file unavailable, changes were not saved");
    }
    Ok(())
}
