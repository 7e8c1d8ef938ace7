//! `warashi simulate` - run the scheduler against a synthetic world.
//!
//! Tick time is modeled as a base cost plus a per-block-entity cost for
//! every chunk that still has an active ticket, so suspending groups
//! visibly raises the tick rate.

use std::time::Duration;

use clap::Args;
use warashi::config::ConfigFile;
use warashi::control::{RunSummary, TicketScheduler};
use warashi::host::{MemoryWorld, ResidencyQuery};
use warashi::ticket::PauseableTicket;

use super::world::{synthetic_world, FARM_SIDE};
use crate::error::CliError;

/// Arguments for `simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Number of farms in the world
    #[arg(long, default_value_t = 8)]
    pub farms: usize,

    /// Server ticks to simulate
    #[arg(long, default_value_t = 600)]
    pub ticks: u64,

    /// Tick cost with every farm suspended, in milliseconds
    #[arg(long, default_value_t = 20.0)]
    pub base_ms: f64,

    /// Tick cost per active block entity, in microseconds
    #[arg(long, default_value_t = 120.0)]
    pub block_entity_us: f64,

    /// Override ticket.run_every
    #[arg(long)]
    pub run_every: Option<u32>,

    /// Override ticket.group_size
    #[arg(long)]
    pub group_size: Option<usize>,

    /// Override load.recover_tps; the estimate never exceeds 20, so a value
    /// below 20 is needed for suspended groups to come back
    #[arg(long)]
    pub recover_tps: Option<f64>,
}

/// Run the simulation.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    validate_costs(&args)?;

    let config = ConfigFile::load()?;
    let mut scheduler_config = config.scheduler_config();
    if let Some(run_every) = args.run_every {
        scheduler_config.run_every = run_every.max(1);
    }
    // One farm per group unless overridden.
    scheduler_config.grouping.target_size = args
        .group_size
        .unwrap_or((FARM_SIDE * FARM_SIDE) as usize);
    scheduler_config.grouping.proximity_threshold = 0;
    if let Some(recover) = args.recover_tps {
        if !recover.is_finite() || recover < scheduler_config.load.disable_below {
            return Err(CliError::InvalidArgument(format!(
                "--recover-tps must be at least load.disable_tps ({})",
                scheduler_config.load.disable_below
            )));
        }
        scheduler_config.load.recover_at = recover;
    }

    let mut world = synthetic_world(args.farms);
    let mut scheduler = TicketScheduler::new(scheduler_config);

    println!(
        "Simulating {} ticks, {} farms, run every {} ticks",
        args.ticks,
        args.farms,
        scheduler.config().run_every
    );
    println!();

    for age in 0..args.ticks {
        let tick_ms = args.base_ms + active_block_entities(&world) as f64 * args.block_entity_us / 1000.0;
        let tick_time = Duration::try_from_secs_f64(tick_ms / 1000.0).map_err(|e| {
            CliError::InvalidArgument(format!("modeled tick time of {}ms: {}", tick_ms, e))
        })?;
        scheduler.estimator_mut().record_duration(tick_time);

        match scheduler.process(&mut world, age) {
            RunSummary::Skipped(_) => {}
            RunSummary::PausedAll {
                tickets,
                updated_chunks,
            } => println!(
                "age={:>6}  all {} tickets suspended ({} chunks updated)",
                age, tickets, updated_chunks
            ),
            RunSummary::Rotated(rotation) => println!(
                "age={:>6}  tps={:>5.1}  tick={:>6.1}ms  groups={}  suspended={:?}  active={}  updated={}",
                age,
                rotation.rate,
                tick_ms,
                rotation.group_count,
                rotation.suspended_groups,
                rotation
                    .active_group
                    .map(|g| format!("G{}", g))
                    .unwrap_or_else(|| "-".to_string()),
                rotation.updated_chunks
            ),
        }
    }

    println!();
    println!(
        "Final: {} of {} tickets paused",
        world.paused_count(),
        world.ticket_count()
    );
    Ok(())
}

/// Tick costs must be finite and non-negative to become durations.
fn validate_costs(args: &SimulateArgs) -> Result<(), CliError> {
    for (name, value) in [("--base-ms", args.base_ms), ("--block-entity-us", args.block_entity_us)] {
        if !value.is_finite() || value < 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "{} must be a finite, non-negative number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

/// Block entities in chunks that hold at least one active ticket.
fn active_block_entities(world: &MemoryWorld) -> u64 {
    world
        .ticketed_chunks()
        .filter(|&pos| world.tickets_at(pos).iter().any(|t| !t.is_paused()))
        .map(|pos| u64::from(world.block_entity_count(pos).unwrap_or(0)))
        .sum()
}
