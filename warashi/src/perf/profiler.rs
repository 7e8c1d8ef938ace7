//! Operator-driven profiling of ticket groups.
//!
//! One session per world. A session snapshots the chunks of a group at
//! start; the host's tick hooks then ask [`ChunkProfiler::should_track`]
//! before timing anything and hand measurements to
//! [`ChunkProfiler::record`]. Sessions started with a duration are stopped
//! by [`ChunkProfiler::sweep`] once their deadline passes and the report is
//! delivered through a [`ReportSink`].

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use super::error::{PerfError, PerfResult};
use super::report::PerfReport;
use super::session::{PerfCategory, PerfSession};
use crate::control::{apply_pause, propagate_levels, ModifiedChunks};
use crate::coord::ChunkPos;
use crate::grouping::{GroupingConfig, GroupingFilter, GroupingResult, TicketGroup, TicketGrouper};
use crate::host::{ChunkWorld, ResidencyQuery, TicketSource, WorldId};
use crate::ticket::Ticket;

/// Default number of types listed per category in a report.
pub const DEFAULT_TOP_TYPES: usize = 5;

/// Longest auto-analysis an operator may request.
pub const MAX_ANALYSIS_DURATION: Duration = Duration::from_secs(3600);

/// Profiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Default for the "exclude already paused tickets" flag.
    pub exclude_paused: bool,
    /// Types listed per category in a report.
    pub top_types: usize,
    /// Group sizing, normally the scheduler's.
    pub grouping: GroupingConfig,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            exclude_paused: true,
            top_types: DEFAULT_TOP_TYPES,
            grouping: GroupingConfig::default(),
        }
    }
}

/// Result of a command that selects a group by index.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome<T> {
    /// The grouping was empty.
    NoGroups,
    /// The command ran on the selected group.
    Done(T),
}

impl<T> GroupOutcome<T> {
    /// The value, if the command ran.
    pub fn done(self) -> Option<T> {
        match self {
            GroupOutcome::NoGroups => None,
            GroupOutcome::Done(value) => Some(value),
        }
    }
}

/// One row of a group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub index: usize,
    pub owner_label: String,
    pub chunk_count: usize,
    /// Block entities in the group's loaded chunks.
    pub block_entities: u64,
    /// Entities in the group's loaded chunks.
    pub entities: u64,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G{} {} (chunks={}, BE={}, E={})",
            self.index, self.owner_label, self.chunk_count, self.block_entities, self.entities
        )
    }
}

/// Confirmation of a started session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted {
    pub group: GroupSummary,
    /// Auto-analysis duration, if one was requested.
    pub duration: Option<Duration>,
}

impl fmt::Display for SessionStarted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration {
            Some(duration) => writeln!(f, "Chunk perf analysis started ({}s) >", duration.as_secs())?,
            None => writeln!(f, "Chunk perf session started >")?,
        }
        writeln!(f, "    {}", self.group.owner_label)?;
        write!(
            f,
            "    (G{}, chunks={}, BE={}, E={}).",
            self.group.index, self.group.chunk_count, self.group.block_entities, self.group.entities
        )
    }
}

/// Whether a group was lowered or restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    Lowered,
    Restored,
}

/// Outcome of lowering or restoring a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChange {
    pub action: GroupAction,
    pub index: usize,
    pub owner_label: String,
    pub chunk_count: usize,
    /// Chunks whose level actually changed.
    pub updated: usize,
}

impl fmt::Display for GroupChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            GroupAction::Lowered => "Lowered",
            GroupAction::Restored => "Restored",
        };
        write!(
            f,
            "{} tickets for G{} {} (chunks={}, updated={}).",
            verb, self.index, self.owner_label, self.chunk_count, self.updated
        )
    }
}

/// Receives reports from expired auto-analyses.
pub trait ReportSink {
    /// Deliver to one recipient. Returns false if the recipient is not
    /// reachable right now.
    fn deliver(&mut self, recipient: &str, report: &PerfReport) -> bool;

    /// Deliver to everyone (the server console).
    fn broadcast(&mut self, report: &PerfReport);
}

#[derive(Debug, Clone)]
struct AutoAnalysis {
    deadline: Instant,
    recipient: Option<String>,
}

/// Profiling sessions and the commands that drive them.
#[derive(Debug)]
pub struct ChunkProfiler {
    config: ProfilerConfig,
    grouper: TicketGrouper,
    sessions: HashMap<WorldId, PerfSession>,
    auto_analyses: HashMap<WorldId, AutoAnalysis>,
}

impl ChunkProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self {
            grouper: TicketGrouper::new(config.grouping),
            config,
            sessions: HashMap::new(),
            auto_analyses: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Whether a session is running in `world`.
    pub fn has_session(&self, world: &WorldId) -> bool {
        self.sessions.contains_key(world)
    }

    /// The running session of `world`.
    pub fn session(&self, world: &WorldId) -> Option<&PerfSession> {
        self.sessions.get(world)
    }

    /// Groups as an operator would index them.
    pub fn list_groups<W: ChunkWorld>(&self, world: &W, filter: GroupingFilter) -> Vec<GroupSummary> {
        let grouping = self.grouper.build(world, filter);
        grouping
            .groups()
            .iter()
            .enumerate()
            .map(|(index, group)| summarize_group(world, &grouping, index, group))
            .collect()
    }

    /// Start profiling group `index` now.
    pub fn start<W: ChunkWorld>(
        &mut self,
        world: &W,
        index: usize,
        exclude_paused: bool,
        duration: Option<Duration>,
        recipient: Option<String>,
    ) -> PerfResult<GroupOutcome<SessionStarted>> {
        self.start_at(world, index, exclude_paused, duration, recipient, Instant::now())
    }

    /// Start profiling group `index` as of `now`.
    ///
    /// Replaces any session already running in the world. A zero or absent
    /// duration means the session runs until stopped; anything longer than
    /// [`MAX_ANALYSIS_DURATION`] is rejected and leaves the running session
    /// untouched.
    pub fn start_at<W: ChunkWorld>(
        &mut self,
        world: &W,
        index: usize,
        exclude_paused: bool,
        duration: Option<Duration>,
        recipient: Option<String>,
        now: Instant,
    ) -> PerfResult<GroupOutcome<SessionStarted>> {
        let duration = duration.filter(|d| !d.is_zero());
        let deadline = duration.map(|d| analysis_deadline(now, d)).transpose()?;

        let grouping = self
            .grouper
            .build(world, GroupingFilter::for_profiling(exclude_paused));
        let group = match select(&grouping, index)? {
            Some(group) => group,
            None => return Ok(GroupOutcome::NoGroups),
        };
        let summary = summarize_group(world, &grouping, index, group);

        let world_id = world.id().clone();
        let session = PerfSession::new(
            world_id.clone(),
            index,
            summary.owner_label.clone(),
            group.chunks().iter().copied(),
            summary.block_entities,
            summary.entities,
            now,
        );
        if self.sessions.insert(world_id.clone(), session).is_some() {
            tracing::debug!(world = %world_id, "Replaced running perf session");
        }

        match deadline {
            Some(deadline) => {
                self.auto_analyses.insert(
                    world_id.clone(),
                    AutoAnalysis {
                        deadline,
                        recipient,
                    },
                );
            }
            None => {
                self.auto_analyses.remove(&world_id);
            }
        }

        tracing::info!(
            world = %world_id,
            group = index,
            owner = %summary.owner_label,
            chunks = summary.chunk_count,
            duration_secs = duration.map(|d| d.as_secs()),
            "Perf session started"
        );

        Ok(GroupOutcome::Done(SessionStarted {
            group: summary,
            duration,
        }))
    }

    /// Stop the session of `world` now.
    pub fn stop(&mut self, world: &WorldId) -> Option<PerfReport> {
        self.stop_at(world, Instant::now())
    }

    /// Stop the session of `world` and build its report as of `now`.
    ///
    /// Returns `None` when no session is running.
    pub fn stop_at(&mut self, world: &WorldId, now: Instant) -> Option<PerfReport> {
        let session = self.sessions.remove(world)?;
        self.auto_analyses.remove(world);
        let report = session.report(now, self.config.top_types);
        tracing::info!(
            world = %world,
            group = report.group_index,
            elapsed_secs = report.elapsed.as_secs(),
            ticks = report.total_count(),
            "Perf session stopped"
        );
        Some(report)
    }

    /// Pause every non-system ticket in the chunks of group `index`.
    pub fn lower<W: ChunkWorld>(
        &self,
        world: &mut W,
        index: usize,
        exclude_paused: bool,
    ) -> PerfResult<GroupOutcome<GroupChange>> {
        let filter = GroupingFilter::for_profiling(exclude_paused);
        self.change_group(world, index, filter, GroupAction::Lowered)
    }

    /// Resume every non-system ticket in the chunks of lowered group `index`.
    ///
    /// Indexes into the grouping of paused tickets only.
    pub fn restore<W: ChunkWorld>(
        &self,
        world: &mut W,
        index: usize,
    ) -> PerfResult<GroupOutcome<GroupChange>> {
        self.change_group(world, index, GroupingFilter::OnlyPaused, GroupAction::Restored)
    }

    fn change_group<W: ChunkWorld>(
        &self,
        world: &mut W,
        index: usize,
        filter: GroupingFilter,
        action: GroupAction,
    ) -> PerfResult<GroupOutcome<GroupChange>> {
        let grouping = self.grouper.build(&*world, filter);
        let group = match select(&grouping, index)? {
            Some(group) => group,
            None => return Ok(GroupOutcome::NoGroups),
        };
        let owner_label = grouping.owner_label(&*world, group);
        let paused = action == GroupAction::Lowered;
        let updated = set_chunks_paused(world, group.chunks(), paused);

        tracing::info!(
            world = %world.id(),
            group = index,
            action = ?action,
            updated,
            "Ticket group changed by operator"
        );

        Ok(GroupOutcome::Done(GroupChange {
            action,
            index,
            owner_label,
            chunk_count: group.chunk_count(),
            updated,
        }))
    }

    /// Whether measurements at `pos` in `world` should be taken.
    #[inline]
    pub fn should_track(&self, world: &WorldId, pos: ChunkPos) -> bool {
        self.sessions
            .get(world)
            .is_some_and(|session| session.contains(pos))
    }

    /// Record one measurement. Returns whether it was counted.
    #[inline]
    pub fn record(
        &mut self,
        world: &WorldId,
        pos: ChunkPos,
        category: PerfCategory,
        type_name: &str,
        nanos: u64,
    ) -> bool {
        match self.sessions.get_mut(world) {
            Some(session) if session.contains(pos) => {
                session.record(category, type_name, nanos);
                true
            }
            _ => false,
        }
    }

    /// Stop expired auto-analyses now.
    pub fn sweep<S: ReportSink + ?Sized>(
        &mut self,
        is_live: impl Fn(&WorldId) -> bool,
        sink: &mut S,
    ) -> usize {
        self.sweep_at(Instant::now(), is_live, sink)
    }

    /// Stop every auto-analysis whose deadline is at or before `now` and
    /// deliver its report. Returns the number of reports delivered.
    ///
    /// A session whose world is gone is discarded without a report.
    pub fn sweep_at<S: ReportSink + ?Sized>(
        &mut self,
        now: Instant,
        is_live: impl Fn(&WorldId) -> bool,
        sink: &mut S,
    ) -> usize {
        if self.auto_analyses.is_empty() {
            return 0;
        }
        let mut expired: Vec<(WorldId, Option<String>)> = self
            .auto_analyses
            .iter()
            .filter(|(_, auto)| now >= auto.deadline)
            .map(|(world, auto)| (world.clone(), auto.recipient.clone()))
            .collect();
        expired.sort_by(|a, b| a.0.cmp(&b.0));

        let mut delivered = 0;
        for (world, recipient) in expired {
            self.auto_analyses.remove(&world);
            if !is_live(&world) {
                self.sessions.remove(&world);
                tracing::warn!(world = %world, "World gone, discarding perf session");
                continue;
            }
            let Some(report) = self.stop_at(&world, now) else {
                continue;
            };
            let reached = recipient
                .as_deref()
                .is_some_and(|who| sink.deliver(who, &report));
            if !reached {
                if let Some(who) = recipient.as_deref() {
                    tracing::warn!(recipient = who, "Recipient offline, broadcasting perf report");
                }
                sink.broadcast(&report);
            }
            delivered += 1;
        }
        delivered
    }
}

impl Default for ChunkProfiler {
    fn default() -> Self {
        Self::new(ProfilerConfig::default())
    }
}

/// Deadline of an auto-analysis of `duration` started at `now`.
fn analysis_deadline(now: Instant, duration: Duration) -> PerfResult<Instant> {
    let out_of_range = || PerfError::DurationOutOfRange {
        secs: duration.as_secs(),
        max_secs: MAX_ANALYSIS_DURATION.as_secs(),
    };
    if duration > MAX_ANALYSIS_DURATION {
        return Err(out_of_range());
    }
    now.checked_add(duration).ok_or_else(out_of_range)
}

/// Group `index`, `None` for an empty grouping, or an error past the end.
fn select(grouping: &GroupingResult, index: usize) -> PerfResult<Option<&TicketGroup>> {
    if grouping.is_empty() {
        return Ok(None);
    }
    grouping
        .group(index)
        .map(Some)
        .ok_or(PerfError::GroupIndexOutOfRange {
            index,
            max: grouping.group_count() - 1,
        })
}

fn summarize_group<W: TicketSource + ResidencyQuery>(
    world: &W,
    grouping: &GroupingResult,
    index: usize,
    group: &TicketGroup,
) -> GroupSummary {
    let (block_entities, entities) = group.chunks().iter().fold((0u64, 0u64), |(be, e), &pos| {
        (
            be + u64::from(world.block_entity_count(pos).unwrap_or(0)),
            e + u64::from(world.entity_count(pos).unwrap_or(0)),
        )
    });
    GroupSummary {
        index,
        owner_label: grouping.owner_label(world, group),
        chunk_count: group.chunk_count(),
        block_entities,
        entities,
    }
}

/// Pause or resume every non-system ticket on `chunks` and propagate levels.
/// Returns the number of chunks whose level was re-propagated.
fn set_chunks_paused<W: ChunkWorld>(world: &mut W, chunks: &[ChunkPos], paused: bool) -> usize {
    let mut handles = Vec::new();
    for &pos in chunks {
        world.for_each_ticket_at(pos, &mut |handle, ticket| {
            if !ticket.is_system() {
                handles.push(handle);
            }
        });
    }
    let mut modified = ModifiedChunks::new();
    for handle in handles {
        apply_pause(world, handle, paused, &mut modified);
    }
    propagate_levels(world, &modified)
}
