//! `warashi perf` - profile groups of a synthetic world.

use std::time::{Duration, Instant};

use clap::Subcommand;
use warashi::config::ConfigFile;
use warashi::grouping::GroupingFilter;
use warashi::host::{ChunkWorld, MemoryWorld, ResidencyQuery};
use warashi::perf::{
    owner_stats, ChunkProfiler, GroupOutcome, GroupSummary, OwnerLevel, PerfCategory,
    MAX_ANALYSIS_DURATION,
};

use super::world::{machine_type, mob_type, synthetic_world, FARM_SIDE};
use crate::error::CliError;

const NO_GROUPS: &str = "No ticket groups found.";
const NO_LOWERED_GROUPS: &str = "No lowered ticket groups found.";
const NO_TICKETS: &str = "No tickets found.";

/// Server ticks per simulated second.
const TICKS_PER_SECOND: u64 = 20;

/// Perf subcommands.
#[derive(Debug, Subcommand)]
pub enum PerfCommands {
    /// List ticket groups
    List {
        /// Number of farms in the world
        #[arg(long, default_value_t = 8)]
        farms: usize,

        /// Include groups whose tickets are already paused
        #[arg(long)]
        include_paused: bool,
    },

    /// Profile one group for a simulated duration and print the report
    Run {
        /// Group index from `perf list`
        group: usize,

        /// Number of farms in the world
        #[arg(long, default_value_t = 8)]
        farms: usize,

        /// Simulated seconds to profile (1-3600)
        #[arg(
            long,
            default_value_t = 10,
            value_parser = clap::value_parser!(u64).range(1..=MAX_ANALYSIS_DURATION.as_secs())
        )]
        seconds: u64,

        /// Include groups whose tickets are already paused
        #[arg(long)]
        include_paused: bool,
    },

    /// Lower a group, show the lowered listing, then restore it
    Lower {
        /// Group index from `perf list`
        group: usize,

        /// Number of farms in the world
        #[arg(long, default_value_t = 8)]
        farms: usize,
    },

    /// Show chunk, block entity and entity counts per ticket owner
    Dump {
        /// Number of farms in the world
        #[arg(long, default_value_t = 8)]
        farms: usize,

        /// Attribute chunks by the level tickets impose now, pauses included
        #[arg(long)]
        working: bool,

        /// Lower this group before dumping
        #[arg(long, value_name = "GROUP")]
        lower: Option<usize>,
    },
}

/// Run a perf subcommand.
pub fn run(command: PerfCommands) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let mut profiler_config = config.profiler_config();
    // One farm per group.
    profiler_config.grouping.target_size = (FARM_SIDE * FARM_SIDE) as usize;
    profiler_config.grouping.proximity_threshold = 0;
    let exclude_default = profiler_config.exclude_paused;
    let mut profiler = ChunkProfiler::new(profiler_config);

    match command {
        PerfCommands::List {
            farms,
            include_paused,
        } => {
            let world = synthetic_world(farms);
            let filter = GroupingFilter::for_profiling(exclude_default && !include_paused);
            print_groups(&profiler.list_groups(&world, filter), NO_GROUPS);
            Ok(())
        }
        PerfCommands::Run {
            group,
            farms,
            seconds,
            include_paused,
        } => {
            let world = synthetic_world(farms);
            run_session(
                &mut profiler,
                &world,
                group,
                exclude_default && !include_paused,
                seconds,
            )
        }
        PerfCommands::Lower { group, farms } => {
            let mut world = synthetic_world(farms);
            match profiler.lower(&mut world, group, exclude_default)? {
                GroupOutcome::NoGroups => {
                    println!("{}", NO_GROUPS);
                    return Ok(());
                }
                GroupOutcome::Done(change) => println!("{}", change),
            }
            println!();
            println!("Lowered groups:");
            print_groups(
                &profiler.list_groups(&world, GroupingFilter::OnlyPaused),
                NO_LOWERED_GROUPS,
            );
            println!();
            match profiler.restore(&mut world, 0)? {
                GroupOutcome::NoGroups => println!("{}", NO_LOWERED_GROUPS),
                GroupOutcome::Done(change) => println!("{}", change),
            }
            Ok(())
        }
        PerfCommands::Dump {
            farms,
            working,
            lower,
        } => {
            let mut world = synthetic_world(farms);
            if let Some(group) = lower {
                if let GroupOutcome::Done(change) = profiler.lower(&mut world, group, exclude_default)? {
                    println!("{}", change);
                    println!();
                }
            }
            let level = if working {
                OwnerLevel::Working
            } else {
                OwnerLevel::Requested
            };
            print!("{}", format_owner_stats(&world, level));
            Ok(())
        }
    }
}

/// Owner listing in the `perf dump` layout.
fn format_owner_stats(world: &MemoryWorld, level: OwnerLevel) -> String {
    let stats = owner_stats(world, level);
    let mut out = String::from("Dumped tickets:\n");
    if stats.is_empty() {
        out.push_str(NO_TICKETS);
        out.push('\n');
        return out;
    }
    for (index, owner) in stats.iter().enumerate() {
        out.push_str(&format!(
            "  G{}: {} C={} BE={} E={}\n",
            index, owner.owner, owner.chunk_count, owner.block_entities, owner.entities
        ));
    }
    out
}

fn print_groups(groups: &[GroupSummary], empty: &str) {
    if groups.is_empty() {
        println!("{}", empty);
        return;
    }
    println!("Ticket groups:");
    for group in groups {
        println!("  {}", group);
    }
}

/// Start a session, feed it synthetic tick timings, and print the report.
fn run_session(
    profiler: &mut ChunkProfiler,
    world: &MemoryWorld,
    group: usize,
    exclude_paused: bool,
    seconds: u64,
) -> Result<(), CliError> {
    let started_at = Instant::now();
    match profiler.start_at(world, group, exclude_paused, None, None, started_at)? {
        GroupOutcome::NoGroups => {
            println!("{}", NO_GROUPS);
            return Ok(());
        }
        GroupOutcome::Done(started) => println!("{}", started),
    }
    println!();

    let chunks: Vec<_> = world.ticketed_chunks().collect();
    for tick in 0..seconds * TICKS_PER_SECOND {
        for &pos in &chunks {
            if !profiler.should_track(world.id(), pos) {
                continue;
            }
            let machines = world.block_entity_count(pos).unwrap_or(0);
            let mobs = world.entity_count(pos).unwrap_or(0);
            let mut chunk_nanos = 0;
            for i in 0..machines {
                let nanos = synthetic_nanos(20_000, tick, i);
                profiler.record(world.id(), pos, PerfCategory::BlockEntityTick, machine_type(i), nanos);
                chunk_nanos += nanos;
            }
            for i in 0..mobs {
                let nanos = synthetic_nanos(35_000, tick, i);
                profiler.record(world.id(), pos, PerfCategory::EntityTick, mob_type(i), nanos);
                chunk_nanos += nanos;
            }
            profiler.record(world.id(), pos, PerfCategory::ChunkTick, "", chunk_nanos);
        }
    }

    let finished_at = started_at + Duration::from_secs(seconds);
    if let Some(report) = profiler.stop_at(world.id(), finished_at) {
        print!("{}", report);
    }
    Ok(())
}

/// Deterministic jitter around `base` nanoseconds.
fn synthetic_nanos(base: u64, tick: u64, index: u32) -> u64 {
    let spread = (tick * 31 + u64::from(index) * 17) % 11;
    base + spread * base / 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct PerfCli {
        #[command(subcommand)]
        command: PerfCommands,
    }

    fn parse(args: &[&str]) -> Result<PerfCommands, clap::Error> {
        PerfCli::try_parse_from(std::iter::once("perf").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_run_seconds_bounded() {
        assert!(parse(&["run", "0", "--seconds", "3600"]).is_ok());
        assert!(parse(&["run", "0", "--seconds", "1"]).is_ok());
        assert!(parse(&["run", "0", "--seconds", "0"]).is_err());
        assert!(parse(&["run", "0", "--seconds", "3601"]).is_err());
        assert!(parse(&["run", "0", "--seconds", "18446744073709551615"]).is_err());
    }

    #[test]
    fn test_dump_arguments() {
        match parse(&["dump", "--working", "--lower", "2"]) {
            Ok(PerfCommands::Dump { working, lower, farms }) => {
                assert!(working);
                assert_eq!(lower, Some(2));
                assert_eq!(farms, 8);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_owner_dump_lists_every_farm() {
        let world = synthetic_world(3);
        let text = format_owner_stats(&world, OwnerLevel::Requested);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Dumped tickets:",
                "  G0: farm-2 C=16 BE=192 E=48",
                "  G1: farm-1 C=16 BE=128 E=32",
                // The spawn ticket decides the first chunk of farm 0.
                "  G2: farm-0 C=15 BE=60 E=15",
            ]
        );
    }

    #[test]
    fn test_owner_dump_after_lowering() {
        let mut world = synthetic_world(2);
        let profiler = ChunkProfiler::default();
        profiler.lower(&mut world, 0, true).unwrap();
        // Paused tickets still hold their chunks at level 33.
        let working = format_owner_stats(&world, OwnerLevel::Working);
        let requested = format_owner_stats(&world, OwnerLevel::Requested);
        assert_eq!(working, requested);
        assert_eq!(working.lines().count(), 3);
    }

    #[test]
    fn test_owner_dump_empty_world() {
        let world = MemoryWorld::new("overworld");
        assert_eq!(
            format_owner_stats(&world, OwnerLevel::Working),
            "Dumped tickets:\nNo tickets found.\n"
        );
    }

    #[test]
    fn test_synthetic_nanos_bounded() {
        for tick in 0..50 {
            for i in 0..10 {
                let nanos = synthetic_nanos(1000, tick, i);
                assert!((1000..=2000).contains(&nanos));
            }
        }
    }
}
