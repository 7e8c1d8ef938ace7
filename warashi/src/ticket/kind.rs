//! Ticket kinds and level constants.

use std::fmt;

/// Highest level a ticket may carry and still be managed by the scheduler.
///
/// Tickets above this level are system-critical and never touched.
pub const SYSTEM_LEVEL_CEILING: u32 = 32;

/// Effective level reported by a paused ticket.
///
/// One step past the ceiling: the chunk stays known to the host but no
/// longer ticks.
pub const PAUSED_TICKET_LEVEL: u32 = SYSTEM_LEVEL_CEILING + 1;

/// Effective level of a chunk that holds no tickets at all.
pub const UNTICKETED_LEVEL: u32 = 45;

/// What created a ticket.
///
/// The first six kinds form the closed set of system-owned kinds that the
/// scheduler never suspends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketKind {
    /// World spawn area.
    Start,
    /// Player view distance.
    Player,
    /// Operator force-loaded chunk.
    Forced,
    /// Portal destination.
    Portal,
    /// Short-lived ticket after a teleport.
    PostTeleport,
    /// Boss fight arena.
    Dragon,
    /// Lighting pass.
    Light,
    /// Ticket of unknown origin.
    Unknown,
    /// Ticket registered by an extension (chunk loaders, machines, ...).
    Custom(String),
}

impl TicketKind {
    /// Whether this kind belongs to the system-owned set.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            TicketKind::Start
                | TicketKind::Player
                | TicketKind::Forced
                | TicketKind::Portal
                | TicketKind::PostTeleport
                | TicketKind::Dragon
        )
    }

    /// Short name for display.
    pub fn as_str(&self) -> &str {
        match self {
            TicketKind::Start => "start",
            TicketKind::Player => "player",
            TicketKind::Forced => "forced",
            TicketKind::Portal => "portal",
            TicketKind::PostTeleport => "post_teleport",
            TicketKind::Dragon => "dragon",
            TicketKind::Light => "light",
            TicketKind::Unknown => "unknown",
            TicketKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
