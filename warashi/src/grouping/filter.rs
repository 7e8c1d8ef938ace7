//! Ticket selection for grouping.

use crate::ticket::Ticket;

/// Which tickets take part in a grouping.
///
/// System tickets are always excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingFilter {
    /// Every non-system ticket, paused or not. Used by the scheduler.
    #[default]
    Scheduling,
    /// Non-system tickets that are not currently paused.
    ExcludePaused,
    /// Only paused non-system tickets (the "lowered" groups).
    OnlyPaused,
}

impl GroupingFilter {
    /// Filter for profiling and lowering, from the operator's exclusion flag.
    pub fn for_profiling(exclude_paused: bool) -> Self {
        if exclude_paused {
            GroupingFilter::ExcludePaused
        } else {
            GroupingFilter::Scheduling
        }
    }

    /// Whether `ticket` takes part in the grouping.
    #[inline]
    pub fn accepts<T: Ticket + ?Sized>(&self, ticket: &T) -> bool {
        if ticket.is_system() {
            return false;
        }
        match self {
            GroupingFilter::Scheduling => true,
            GroupingFilter::ExcludePaused => !ticket.is_paused(),
            GroupingFilter::OnlyPaused => ticket.is_paused(),
        }
    }
}
