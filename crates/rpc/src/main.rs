//! Surety CLI - Main entry point

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use surety_core::{Amount, FlightStatus, SuretyConfig};
use surety_rpc::commands::{self, SimulationOptions};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "surety")]
#[command(about = "Surety - flight delay insurance core", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data", global = true)]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the end-to-end scenario with simulated oracles
    Simulate {
        /// Number of oracle agents
        #[arg(long, default_value = "20")]
        oracles: usize,
        /// Seed for index assignment and random statuses
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Premium paid by the passenger
        #[arg(long, default_value = commands::DEFAULT_PREMIUM)]
        premium: Decimal,
        /// Force every oracle to report this status code (0, 10, 20, 30, 40, 50)
        #[arg(long)]
        status: Option<u8>,
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Status requests to issue before giving up
        #[arg(long, default_value = "10")]
        rounds: usize,
    },

    /// Write the default configuration
    Config {
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the recorded event journal
    Journal,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            oracles,
            seed,
            premium,
            status,
            config,
            rounds,
        } => {
            let config = match config {
                Some(path) => SuretyConfig::from_file(&path)?,
                None => SuretyConfig::default(),
            };
            let forced_status = status.map(FlightStatus::try_from).transpose()?;
            let options = SimulationOptions {
                oracles,
                seed,
                premium: Amount::new(premium)?,
                forced_status,
                max_rounds: rounds,
            };

            let run_id = Uuid::new_v4();
            tracing::info!(%run_id, seed, oracles, "Simulation started");

            let mut ctx = commands::scenario_context(config, seed, Some(&cli.data))?;
            let report = commands::simulate(&mut ctx, &options).await?;

            println!();
            println!("Run {}", run_id);
            println!("  Flight:    {}", report.flight);
            println!("  Status:    {} ({})", report.status, report.status.code());
            println!("  Credited:  {}", report.credited);
            println!("  Withdrawn: {}", report.withdrawn);
            println!("  Events:    {}", ctx.last_sequence());
        }

        Commands::Config { output } => {
            commands::write_config(output.as_deref())?;
        }

        Commands::Journal => {
            commands::print_journal(&cli.data)?;
        }
    }

    Ok(())
}
