//! Profiling report.
//!
//! The text rendering follows the layout operators already know:
//!
//! ```text
//! Warashi Profiler Report
//! ====================================
//! Target: overworld | G0 quarry
//! Chunks: 2, BlockEntity=4, Entity=2  | Elapsed: 30s
//! Total: 15.000ms, Totalticks: 3, 5.000000ms/tick
//! ---- summary ----
//! block entities (5.000000ms/tick)>total=15.000ms, max=7.000ms, ticks=3
//! entities (0.000000ms/tick)>total=0.000ms, max=0.000ms, ticks=0
//! chunks (0.000000ms/tick)>total=0.000ms, max=0.000ms, ticks=0
//! ---- top block entities ----
//!  - A (6.000000ms/tick): total=12.000ms, ticks=2
//!  - B (3.000000ms/tick): total=3.000ms, ticks=1
//! ---- top entities ----
//! ```

use std::fmt;
use std::time::Duration;

use crate::host::WorldId;

fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn per_tick_millis(total: Duration, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        millis(total) / count as f64
    }
}

/// Totals for one measurement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategorySummary {
    /// Measurements taken.
    pub count: u64,
    /// Sum of all measurements.
    pub total: Duration,
    /// Largest single measurement.
    pub max: Duration,
}

impl CategorySummary {
    /// Mean measurement in milliseconds, zero when nothing was recorded.
    pub fn average_millis(&self) -> f64 {
        per_tick_millis(self.total, self.count)
    }
}

/// Totals for one entity or block entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub name: String,
    pub count: u64,
    pub total: Duration,
}

impl TypeSummary {
    pub fn average_millis(&self) -> f64 {
        per_tick_millis(self.total, self.count)
    }
}

/// Result of a stopped profiling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfReport {
    pub world: WorldId,
    pub group_index: usize,
    pub owner_label: String,
    pub chunk_count: usize,
    /// Block entities in the group when the session started.
    pub block_entity_count: u64,
    /// Entities in the group when the session started.
    pub entity_count: u64,
    /// Wall time the session ran.
    pub elapsed: Duration,
    pub block_entities: CategorySummary,
    pub entities: CategorySummary,
    pub chunks: CategorySummary,
    /// Costliest block entity types, largest total first.
    pub top_block_entities: Vec<TypeSummary>,
    /// Costliest entity types, largest total first.
    pub top_entities: Vec<TypeSummary>,
}

impl PerfReport {
    /// Combined time of all categories.
    pub fn total(&self) -> Duration {
        self.block_entities.total + self.entities.total + self.chunks.total
    }

    /// Combined measurement count of all categories.
    pub fn total_count(&self) -> u64 {
        self.block_entities.count + self.entities.count + self.chunks.count
    }

    /// Mean over every measurement in milliseconds.
    pub fn average_millis(&self) -> f64 {
        per_tick_millis(self.total(), self.total_count())
    }
}

fn write_category(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    summary: &CategorySummary,
) -> fmt::Result {
    writeln!(
        f,
        "{} ({:.6}ms/tick)>total={:.3}ms, max={:.3}ms, ticks={}",
        label,
        summary.average_millis(),
        millis(summary.total),
        millis(summary.max),
        summary.count
    )
}

fn write_types(f: &mut fmt::Formatter<'_>, types: &[TypeSummary]) -> fmt::Result {
    for row in types {
        writeln!(
            f,
            " - {} ({:.6}ms/tick): total={:.3}ms, ticks={}",
            row.name,
            row.average_millis(),
            millis(row.total),
            row.count
        )?;
    }
    Ok(())
}

impl fmt::Display for PerfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Warashi Profiler Report")?;
        writeln!(f, "====================================")?;
        writeln!(
            f,
            "Target: {} | G{} {}",
            self.world, self.group_index, self.owner_label
        )?;
        writeln!(
            f,
            "Chunks: {}, BlockEntity={}, Entity={}  | Elapsed: {}s",
            self.chunk_count,
            self.block_entity_count,
            self.entity_count,
            self.elapsed.as_secs()
        )?;
        writeln!(
            f,
            "Total: {:.3}ms, Totalticks: {}, {:.6}ms/tick",
            millis(self.total()),
            self.total_count(),
            self.average_millis()
        )?;
        writeln!(f, "---- summary ----")?;
        write_category(f, "block entities", &self.block_entities)?;
        write_category(f, "entities", &self.entities)?;
        write_category(f, "chunks", &self.chunks)?;
        writeln!(f, "---- top block entities ----")?;
        write_types(f, &self.top_block_entities)?;
        writeln!(f, "---- top entities ----")?;
        write_types(f, &self.top_entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> PerfReport {
        PerfReport {
            world: WorldId::new("overworld"),
            group_index: 0,
            owner_label: "quarry".to_string(),
            chunk_count: 2,
            block_entity_count: 4,
            entity_count: 2,
            elapsed: Duration::from_millis(30_900),
            block_entities: CategorySummary {
                count: 3,
                total: Duration::from_millis(15),
                max: Duration::from_millis(7),
            },
            entities: CategorySummary::default(),
            chunks: CategorySummary::default(),
            top_block_entities: vec![
                TypeSummary {
                    name: "A".to_string(),
                    count: 2,
                    total: Duration::from_millis(12),
                },
                TypeSummary {
                    name: "B".to_string(),
                    count: 1,
                    total: Duration::from_millis(3),
                },
            ],
            top_entities: Vec::new(),
        }
    }

    #[test]
    fn test_totals() {
        let report = report();
        assert_eq!(report.total(), Duration::from_millis(15));
        assert_eq!(report.total_count(), 3);
        assert!((report.average_millis() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_category_average_is_zero() {
        assert_eq!(CategorySummary::default().average_millis(), 0.0);
    }

    #[test]
    fn test_display_layout() {
        let text = report().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Warashi Profiler Report");
        assert_eq!(lines[2], "Target: overworld | G0 quarry");
        assert_eq!(lines[3], "Chunks: 2, BlockEntity=4, Entity=2  | Elapsed: 30s");
        assert_eq!(lines[4], "Total: 15.000ms, Totalticks: 3, 5.000000ms/tick");
        assert_eq!(
            lines[6],
            "block entities (5.000000ms/tick)>total=15.000ms, max=7.000ms, ticks=3"
        );
        assert_eq!(lines[10], " - A (6.000000ms/tick): total=12.000ms, ticks=2");
        assert_eq!(lines[11], " - B (3.000000ms/tick): total=3.000ms, ticks=1");
        assert_eq!(lines.last(), Some(&"---- top entities ----"));
    }
}
