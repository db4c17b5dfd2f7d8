//! CLI commands

use std::path::Path;
use std::sync::Arc;

use surety_core::{Amount, FlightKey, FlightStatus, Principal, SuretyConfig};
use surety_events::EventReader;
use surety_oracle::FetchOutcome;
use surety_settlement::RecordingTransfer;

use crate::context::AppContext;
use crate::simulator::OracleSimulator;

pub const OWNER: &str = "OWNER";
pub const GENESIS_AIRLINE: &str = "AIRLINE-1";
pub const PASSENGER: &str = "PASSENGER-1";
pub const FLIGHT_DESIGNATOR: &str = "ND1309";
pub const FLIGHT_TIMESTAMP: u64 = 1_624_103_191_959;
/// Premium paid in the scenario; the CLI default must parse to the same value
pub const DEFAULT_PREMIUM: &str = "0.5";

pub fn default_premium() -> Amount {
    Amount::from_smallest_units(500_000_000_000_000_000)
}

/// Parameters of one simulated run
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub oracles: usize,
    pub seed: u64,
    pub premium: Amount,
    pub forced_status: Option<FlightStatus>,
    /// Re-issue the status request this many times before giving up
    pub max_rounds: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            oracles: 20,
            seed: 42,
            premium: default_premium(),
            forced_status: None,
            max_rounds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub flight: FlightKey,
    pub status: FlightStatus,
    pub rounds: usize,
    pub responses: usize,
    pub credited: Amount,
    pub withdrawn: Amount,
}

/// Build a context for the scenario, journaling under `data` when given
pub fn scenario_context(
    config: SuretyConfig,
    seed: u64,
    data: Option<&Path>,
) -> Result<AppContext, anyhow::Error> {
    let ctx = AppContext::new(
        config,
        Principal::from(OWNER),
        Principal::from(GENESIS_AIRLINE),
        "Genesis Air",
        Arc::new(RecordingTransfer::new()),
    )
    .with_seed(seed);

    Ok(match data {
        Some(path) => ctx.with_journal(path.join("journal"))?,
        None => ctx,
    })
}

/// Fund, register, insure, resolve by simulated oracles, withdraw
pub async fn simulate(
    ctx: &mut AppContext,
    options: &SimulationOptions,
) -> Result<SimulationReport, anyhow::Error> {
    let airline = Principal::from(GENESIS_AIRLINE);
    let passenger = Principal::from(PASSENGER);
    let flight = FlightKey::new(airline.clone(), FLIGHT_DESIGNATOR, FLIGHT_TIMESTAMP);

    let fee = ctx.config().governance.minimum_participation_fee;
    ctx.fund_airline(&airline, fee)?;
    println!("✅ {} funded with {}", airline, fee);

    ctx.register_flight(&airline, &airline, FLIGHT_DESIGNATOR, FLIGHT_TIMESTAMP)?;
    println!("✅ Flight {} registered", flight);

    ctx.buy_flight_insurance(
        &passenger,
        &airline,
        FLIGHT_DESIGNATOR,
        FLIGHT_TIMESTAMP,
        options.premium,
    )?;
    println!("✅ {} insured {} for {}", passenger, flight, options.premium);

    let mut rx = ctx.subscribe();
    let mut simulator =
        OracleSimulator::register(ctx, options.oracles, options.seed, options.forced_status)?;
    println!("✅ {} oracles registered", simulator.agents().len());

    let mut rounds = 0;
    let mut responses = 0;
    while rounds < options.max_rounds {
        rounds += 1;
        let outcome =
            ctx.fetch_flight_status(&passenger, &airline, FLIGHT_DESIGNATOR, FLIGHT_TIMESTAMP)?;
        if let FetchOutcome::AlreadyResolved { .. } = outcome {
            break;
        }

        responses += simulator.process_pending(ctx, &mut rx)?.len();
        if ctx.flight_status(&flight).is_some_and(|s| s.is_final()) {
            break;
        }
    }

    let status = ctx.flight_status(&flight).unwrap_or_default();
    let credited = ctx.get_balance(&passenger);
    println!("✅ Flight status after {} round(s): {} ({} responses)", rounds, status, responses);

    let withdrawn = if credited.is_zero() {
        println!("   No payout credited to {}", passenger);
        Amount::ZERO
    } else {
        let receipt = ctx.withdraw_balance(&passenger).await?;
        println!("✅ {} withdrew {} (receipt {})", passenger, receipt.amount, receipt.id);
        receipt.amount
    };

    Ok(SimulationReport {
        flight,
        status,
        rounds,
        responses,
        credited,
        withdrawn,
    })
}

/// Write the default configuration as JSON
pub fn write_config(output: Option<&Path>) -> Result<(), anyhow::Error> {
    let json = serde_json::to_string_pretty(&SuretyConfig::default())?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("✅ Default configuration written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Print every recorded event
pub fn print_journal(data: &Path) -> Result<(), anyhow::Error> {
    let reader = EventReader::from_directory(data.join("journal"))?;
    let envelopes = reader.read_all()?;

    if envelopes.is_empty() {
        println!("No events recorded under {}", data.display());
        return Ok(());
    }

    for envelope in &envelopes {
        println!(
            "#{:<5} {} {:<28} {}",
            envelope.sequence,
            envelope.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            envelope.event.kind(),
            serde_json::to_string(&envelope.event)?
        );
    }
    println!("{} event(s)", envelopes.len());
    Ok(())
}
