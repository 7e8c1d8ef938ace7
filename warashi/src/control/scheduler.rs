//! Adaptive ticket scheduler.
//!
//! Every `run_every` ticks the scheduler regroups a world's tickets and
//! decides which groups may run:
//!
//! ```text
//!   tick rate ──► hysteresis ──► suspended count
//!                                     │
//!   groups ──► cost ranking ──────────┴──► costliest N suspended
//!                                           │
//!   remaining groups ──► rotation ──────────┴──► exactly one active
//! ```
//!
//! The suspended count only moves by one step per pass: it grows while the
//! rate is below the disable threshold and shrinks while the rate is above
//! the recovery threshold. Between the thresholds it holds.

use std::collections::HashMap;

use super::cost::GroupCostEstimator;
use super::propagate::{apply_pause, propagate_levels, ModifiedChunks};
use super::tps::{TickRateEstimator, DEFAULT_TPS_WINDOW};
use crate::grouping::{GroupingConfig, GroupingFilter, TicketGrouper};
use crate::host::{ChunkWorld, WorldId};

/// Default number of ticks between scheduling passes.
pub const DEFAULT_RUN_EVERY: u32 = 20;

/// Below this rate one more group is suspended per pass.
pub const TPS_DISABLE_THRESHOLD: f64 = 15.0;

/// Above this rate one group is released per pass.
pub const TPS_RECOVER_THRESHOLD: f64 = 20.0;

/// Load measurement and the hysteresis band for the suspended count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadConfig {
    /// Tick durations kept by the rate estimator.
    pub window: usize,
    /// Rate below which suspension grows.
    pub disable_below: f64,
    /// Rate above which suspension shrinks.
    pub recover_at: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_TPS_WINDOW,
            disable_below: TPS_DISABLE_THRESHOLD,
            recover_at: TPS_RECOVER_THRESHOLD,
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Master switch; a disabled scheduler never touches tickets.
    pub enabled: bool,
    /// Suspend every non-system ticket regardless of load.
    pub pause_all: bool,
    /// Ticks between passes.
    pub run_every: u32,
    /// Group sizing.
    pub grouping: GroupingConfig,
    /// Load measurement.
    pub load: LoadConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pause_all: false,
            run_every: DEFAULT_RUN_EVERY,
            grouping: GroupingConfig::default(),
            load: LoadConfig::default(),
        }
    }
}

/// Why a pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The scheduler is switched off.
    Disabled,
    /// The world age is not a multiple of `run_every`.
    NotDue,
    /// No schedulable tickets in the world.
    NoTickets,
}

/// Outcome of a rotating pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSummary {
    /// Rate the decision was based on.
    pub rate: f64,
    /// Groups formed this pass.
    pub group_count: usize,
    /// Suspended count after the hysteresis step.
    pub suspended_count: usize,
    /// Indices of the groups suspended for cost, costliest first.
    pub suspended_groups: Vec<usize>,
    /// The one group allowed to run.
    pub active_group: Option<usize>,
    /// Chunks whose level was re-propagated.
    pub updated_chunks: usize,
}

/// Outcome of [`TicketScheduler::process`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunSummary {
    /// Nothing was evaluated.
    Skipped(SkipReason),
    /// Global suspend: every schedulable ticket was paused.
    PausedAll {
        /// Tickets considered.
        tickets: usize,
        /// Chunks whose level was re-propagated.
        updated_chunks: usize,
    },
    /// Regular pass.
    Rotated(RotationSummary),
}

impl RunSummary {
    /// Whether the pass evaluated the world.
    pub fn ran(&self) -> bool {
        !matches!(self, RunSummary::Skipped(_))
    }
}

/// One hysteresis step of the suspended count.
///
/// The result is always within `0..=group_count - 1` (zero when there are
/// no groups), so at least one group stays eligible.
pub fn update_suspended_count(
    current: usize,
    group_count: usize,
    rate: f64,
    load: &LoadConfig,
) -> usize {
    let ceiling = group_count.saturating_sub(1);
    let next = if rate < load.disable_below {
        current.saturating_add(1)
    } else if rate > load.recover_at {
        current.saturating_sub(1)
    } else {
        current
    };
    next.min(ceiling)
}

/// Index into the eligible groups that runs at `age`.
fn rotation_slot(age: u64, run_every: u32, eligible: usize) -> usize {
    let pass = age / u64::from(run_every.max(1));
    (pass % eligible as u64) as usize
}

/// Adaptive scheduler over any number of worlds.
#[derive(Debug)]
pub struct TicketScheduler {
    config: SchedulerConfig,
    grouper: TicketGrouper,
    estimator: TickRateEstimator,
    costs: GroupCostEstimator,
    suspended: HashMap<WorldId, usize>,
}

impl TicketScheduler {
    /// Create a scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            grouper: TicketGrouper::new(config.grouping),
            estimator: TickRateEstimator::new(config.load.window),
            costs: GroupCostEstimator::new(),
            suspended: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Replace the settings. Rate samples survive unless the window changed.
    pub fn set_config(&mut self, config: SchedulerConfig) {
        if config.load.window.max(1) != self.estimator.window() {
            self.estimator = TickRateEstimator::new(config.load.window);
        }
        self.grouper = TicketGrouper::new(config.grouping);
        self.config = config;
    }

    /// Host hook: a server tick begins.
    pub fn on_tick_start(&mut self) {
        self.estimator.on_tick_start();
    }

    /// Host hook: a server tick ended.
    pub fn on_tick_end(&mut self) {
        self.estimator.on_tick_end();
    }

    pub fn estimator(&self) -> &TickRateEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut TickRateEstimator {
        &mut self.estimator
    }

    pub fn costs(&self) -> &GroupCostEstimator {
        &self.costs
    }

    /// Current suspended count of a world.
    pub fn suspended_count(&self, world: &WorldId) -> usize {
        self.suspended.get(world).copied().unwrap_or(0)
    }

    /// Drop all state held for a world.
    pub fn forget_world(&mut self, world: &WorldId) {
        self.suspended.remove(world);
        self.costs.forget_world(world);
    }

    /// Run a pass using the estimator's current rate.
    pub fn process<W: ChunkWorld>(&mut self, world: &mut W, age: u64) -> RunSummary {
        let rate = self.estimator.estimate();
        self.process_at_rate(world, age, rate)
    }

    /// Run a pass as if the server ran at `rate` ticks per second.
    pub fn process_at_rate<W: ChunkWorld>(&mut self, world: &mut W, age: u64, rate: f64) -> RunSummary {
        if !self.config.enabled {
            return RunSummary::Skipped(SkipReason::Disabled);
        }
        if age % u64::from(self.config.run_every.max(1)) != 0 {
            return RunSummary::Skipped(SkipReason::NotDue);
        }

        let grouping = self.grouper.build(&*world, GroupingFilter::Scheduling);
        if grouping.is_empty() {
            return RunSummary::Skipped(SkipReason::NoTickets);
        }

        let mut modified = ModifiedChunks::new();

        if self.config.pause_all {
            for entry in grouping.entries() {
                apply_pause(world, entry.handle, true, &mut modified);
            }
            let updated_chunks = propagate_levels(world, &modified);
            tracing::debug!(
                world = %world.id(),
                tickets = grouping.entries().len(),
                updated_chunks,
                "Ticket scheduler: all tickets suspended"
            );
            return RunSummary::PausedAll {
                tickets: grouping.entries().len(),
                updated_chunks,
            };
        }

        let group_count = grouping.group_count();
        let world_id = world.id().clone();
        let previous = self.suspended_count(&world_id);
        let suspended_count =
            update_suspended_count(previous, group_count, rate, &self.config.load);
        self.suspended.insert(world_id.clone(), suspended_count);

        if suspended_count != previous {
            tracing::info!(
                world = %world_id,
                tps = format!("{:.1}", rate),
                groups = group_count,
                from = previous,
                to = suspended_count,
                "Ticket scheduler: suspended group count changed"
            );
        }

        let mut suspended = vec![false; group_count];
        let mut suspended_groups = Vec::with_capacity(suspended_count);
        if suspended_count > 0 {
            let ranked = self.costs.rank(&world_id, &*world, &grouping);
            for cost in ranked.into_iter().take(suspended_count) {
                suspended[cost.index] = true;
                suspended_groups.push(cost.index);
            }
        }

        let eligible: Vec<usize> = (0..group_count).filter(|&i| !suspended[i]).collect();
        if eligible.is_empty() {
            tracing::warn!(world = %world_id, groups = group_count, "No eligible group, rotation skipped");
            return RunSummary::Rotated(RotationSummary {
                rate,
                group_count,
                suspended_count,
                suspended_groups,
                active_group: None,
                updated_chunks: 0,
            });
        }
        let active = eligible[rotation_slot(age, self.config.run_every, eligible.len())];

        for (index, _, entries) in grouping.iter() {
            let paused = index != active;
            for entry in entries {
                apply_pause(world, entry.handle, paused, &mut modified);
            }
        }
        let updated_chunks = propagate_levels(world, &modified);

        tracing::debug!(
            world = %world_id,
            tps = format!("{:.1}", rate),
            groups = group_count,
            suspended = suspended_count,
            active,
            updated_chunks,
            "Ticket scheduler pass"
        );

        RunSummary::Rotated(RotationSummary {
            rate,
            group_count,
            suspended_count,
            suspended_groups,
            active_group: Some(active),
            updated_chunks,
        })
    }
}

impl Default for TicketScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::ChunkPos;
    use crate::host::MemoryWorld;
    use crate::ticket::{PauseableTicket, SimTicket, TicketKind};

    /// `groups` far-apart chunks with one ticket each, so each is its own group.
    fn spread_world(groups: i32) -> MemoryWorld {
        let mut world = MemoryWorld::new("overworld");
        for i in 0..groups {
            world.add_ticket(ChunkPos::new(i * 1000, 0), SimTicket::custom(31, "loader"));
        }
        world
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            run_every: 1,
            grouping: GroupingConfig {
                target_size: 1,
                proximity_threshold: 0,
            },
            ..SchedulerConfig::default()
        }
    }

    fn active_chunks(world: &MemoryWorld) -> Vec<ChunkPos> {
        world
            .ticketed_chunks()
            .filter(|&pos| world.tickets_at(pos).iter().any(|t| !t.is_paused()))
            .collect()
    }

    #[test]
    fn test_hysteresis_sequence() {
        let load = LoadConfig::default();
        let mut count = 0;
        let mut seen = Vec::new();
        for rate in [10.0, 10.0, 22.0, 22.0] {
            count = update_suspended_count(count, 4, rate, &load);
            seen.push(count);
        }
        assert_eq!(seen, vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_hysteresis_holds_inside_band() {
        let load = LoadConfig::default();
        assert_eq!(update_suspended_count(2, 4, 15.0, &load), 2);
        assert_eq!(update_suspended_count(2, 4, 20.0, &load), 2);
        assert_eq!(update_suspended_count(2, 4, 20.5, &load), 1);
    }

    #[test]
    fn test_hysteresis_bounded_by_group_count() {
        let load = LoadConfig::default();
        assert_eq!(update_suspended_count(3, 4, 1.0, &load), 3);
        assert_eq!(update_suspended_count(5, 2, 17.0, &load), 1);
        assert_eq!(update_suspended_count(0, 0, 1.0, &load), 0);
        assert_eq!(update_suspended_count(0, 1, 1.0, &load), 0);
    }

    #[test]
    fn test_rotation_slot() {
        assert_eq!(rotation_slot(0, 20, 3), 0);
        assert_eq!(rotation_slot(20, 20, 3), 1);
        assert_eq!(rotation_slot(40, 20, 3), 2);
        assert_eq!(rotation_slot(60, 20, 3), 0);
        assert_eq!(rotation_slot(60, 0, 3), 0);
    }

    #[test]
    fn test_disabled_scheduler_skips() {
        let mut world = spread_world(3);
        let mut scheduler = TicketScheduler::new(SchedulerConfig {
            enabled: false,
            ..config()
        });
        assert_eq!(
            scheduler.process_at_rate(&mut world, 0, 20.0),
            RunSummary::Skipped(SkipReason::Disabled)
        );
        assert_eq!(world.paused_count(), 0);
    }

    #[test]
    fn test_not_due_skips() {
        let mut world = spread_world(3);
        let mut scheduler = TicketScheduler::new(SchedulerConfig {
            run_every: 20,
            ..config()
        });
        assert_eq!(
            scheduler.process_at_rate(&mut world, 7, 20.0),
            RunSummary::Skipped(SkipReason::NotDue)
        );
        assert!(scheduler.process_at_rate(&mut world, 40, 20.0).ran());
    }

    #[test]
    fn test_no_tickets_skips() {
        let mut world = MemoryWorld::new("overworld");
        world.add_ticket(
            ChunkPos::new(0, 0),
            SimTicket::new(31, TicketKind::Player, "steve"),
        );
        let mut scheduler = TicketScheduler::new(config());
        assert_eq!(
            scheduler.process_at_rate(&mut world, 0, 20.0),
            RunSummary::Skipped(SkipReason::NoTickets)
        );
        assert_eq!(world.paused_count(), 0);
    }

    #[test]
    fn test_exactly_one_group_active() {
        let mut world = spread_world(4);
        let mut scheduler = TicketScheduler::new(config());
        let summary = scheduler.process_at_rate(&mut world, 0, 20.0);

        let RunSummary::Rotated(rotation) = summary else {
            panic!("expected rotation, got {summary:?}");
        };
        assert_eq!(rotation.group_count, 4);
        assert_eq!(rotation.active_group, Some(0));
        assert_eq!(active_chunks(&world), vec![ChunkPos::new(0, 0)]);
        assert_eq!(world.paused_count(), 3);
    }

    #[test]
    fn test_rotation_visits_every_group() {
        let mut world = spread_world(3);
        let mut scheduler = TicketScheduler::new(config());
        let mut active = Vec::new();
        for age in 0..6 {
            if let RunSummary::Rotated(r) = scheduler.process_at_rate(&mut world, age, 20.0) {
                active.push(r.active_group);
            }
        }
        assert_eq!(
            active,
            vec![Some(0), Some(1), Some(2), Some(0), Some(1), Some(2)]
        );
    }

    #[test]
    fn test_low_rate_suspends_costliest_group() {
        let mut world = spread_world(3);
        world.load_chunk(ChunkPos::new(0, 0), 1, 0);
        world.load_chunk(ChunkPos::new(1000, 0), 90, 0);
        world.load_chunk(ChunkPos::new(2000, 0), 10, 0);

        let mut scheduler = TicketScheduler::new(config());
        let summary = scheduler.process_at_rate(&mut world, 1, 5.0);
        let RunSummary::Rotated(rotation) = summary else {
            panic!("expected rotation, got {summary:?}");
        };
        assert_eq!(rotation.suspended_count, 1);
        assert_eq!(rotation.suspended_groups, vec![1]);
        // Eligible [0, 2]; pass 1 picks the second.
        assert_eq!(rotation.active_group, Some(2));
        assert_eq!(scheduler.suspended_count(world.id()), 1);
    }

    #[test]
    fn test_unloaded_groups_follow_load_alone() {
        // Three clusters of ten unloaded chunks, one group each.
        let mut world = MemoryWorld::new("overworld");
        for cluster in 0..3 {
            for x in 0..10 {
                world.add_ticket(ChunkPos::new(cluster * 1000 + x, 0), SimTicket::custom(31, "loader"));
            }
        }
        let mut scheduler = TicketScheduler::new(SchedulerConfig {
            grouping: GroupingConfig {
                target_size: 10,
                proximity_threshold: 0,
            },
            ..config()
        });

        let summary = scheduler.process_at_rate(&mut world, 0, 20.0);
        let RunSummary::Rotated(rotation) = summary else {
            panic!("expected rotation, got {summary:?}");
        };
        assert_eq!(rotation.group_count, 3);
        assert_eq!(rotation.suspended_count, 0);
        assert!(rotation.suspended_groups.is_empty());

        // All costs are 0, so low load suspends by index order.
        let summary = scheduler.process_at_rate(&mut world, 1, 10.0);
        let RunSummary::Rotated(rotation) = summary else {
            panic!("expected rotation, got {summary:?}");
        };
        assert_eq!(rotation.suspended_count, 1);
        assert_eq!(rotation.suspended_groups, vec![0]);
    }

    #[test]
    fn test_suspended_never_covers_all_groups() {
        let mut world = spread_world(2);
        let mut scheduler = TicketScheduler::new(config());
        for age in 0..10 {
            scheduler.process_at_rate(&mut world, age, 1.0);
        }
        assert_eq!(scheduler.suspended_count(world.id()), 1);
        assert_eq!(active_chunks(&world).len(), 1);
    }

    #[test]
    fn test_pause_all_suspends_everything() {
        let mut world = spread_world(3);
        let mut scheduler = TicketScheduler::new(SchedulerConfig {
            pause_all: true,
            ..config()
        });
        let summary = scheduler.process_at_rate(&mut world, 0, 20.0);
        assert_eq!(
            summary,
            RunSummary::PausedAll {
                tickets: 3,
                updated_chunks: 3
            }
        );
        assert!(active_chunks(&world).is_empty());
        assert!(world.notifications().iter().all(|n| !n.relaxing));
    }

    #[test]
    fn test_resumed_chunks_notified_relaxing() {
        let mut world = spread_world(2);
        let mut scheduler = TicketScheduler::new(config());
        scheduler.process_at_rate(&mut world, 0, 20.0);
        world.take_notifications();

        scheduler.process_at_rate(&mut world, 1, 20.0);
        let notes = world.take_notifications();
        assert_eq!(notes.len(), 2);
        let resumed = notes.iter().find(|n| n.pos == ChunkPos::new(1000, 0));
        assert!(resumed.is_some_and(|n| n.relaxing && n.level == 31));
        let paused = notes.iter().find(|n| n.pos == ChunkPos::new(0, 0));
        assert!(paused.is_some_and(|n| !n.relaxing));
    }

    #[test]
    fn test_unchanged_pass_sends_no_notifications() {
        let mut world = spread_world(1);
        let mut scheduler = TicketScheduler::new(config());
        scheduler.process_at_rate(&mut world, 0, 20.0);
        scheduler.process_at_rate(&mut world, 1, 20.0);
        assert!(world.notifications().is_empty());
    }

    #[test]
    fn test_forget_world_resets_state() {
        let mut world = spread_world(3);
        let mut scheduler = TicketScheduler::new(config());
        scheduler.process_at_rate(&mut world, 0, 1.0);
        assert_eq!(scheduler.suspended_count(world.id()), 1);
        scheduler.forget_world(world.id());
        assert_eq!(scheduler.suspended_count(world.id()), 0);
    }

    #[test]
    fn test_set_config_keeps_samples_for_same_window() {
        let mut scheduler = TicketScheduler::new(config());
        scheduler
            .estimator_mut()
            .record_duration(std::time::Duration::from_millis(100));
        scheduler.set_config(SchedulerConfig {
            run_every: 5,
            ..config()
        });
        assert_eq!(scheduler.estimator().sample_count(), 1);
        scheduler.set_config(SchedulerConfig {
            load: LoadConfig {
                window: 10,
                ..LoadConfig::default()
            },
            ..config()
        });
        assert_eq!(scheduler.estimator().sample_count(), 0);
    }
}
