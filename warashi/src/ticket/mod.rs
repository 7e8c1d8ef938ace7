//! Tickets and the pause capability.
//!
//! A ticket is a standing request from the host that a chunk stay loaded at
//! some level. The scheduler never creates or destroys tickets; it only
//! toggles the paused flag through [`PauseableTicket`] and reads the dirty
//! flag to learn which chunks need their level recomputed.
//!
//! Hosts implement [`Ticket`] on their own ticket type. [`SimTicket`] is a
//! plain implementation used by [`crate::host::MemoryWorld`].

mod kind;

pub use kind::{TicketKind, PAUSED_TICKET_LEVEL, SYSTEM_LEVEL_CEILING, UNTICKETED_LEVEL};

/// Pause capability of a ticket.
///
/// `set_paused` must mark the ticket dirty only when the paused state
/// actually changes; the scheduler relies on this to detect which chunks
/// were modified during a pass.
pub trait PauseableTicket {
    /// Whether the ticket is currently paused.
    fn is_paused(&self) -> bool;

    /// Pause or resume the ticket.
    fn set_paused(&mut self, paused: bool);

    /// Whether the paused state changed since the last [`clear_dirty`](Self::clear_dirty).
    fn is_dirty(&self) -> bool;

    /// Acknowledge a state change once the host has been told about it.
    fn clear_dirty(&mut self);
}

/// A chunk ticket as seen by the scheduler and profiler.
pub trait Ticket: PauseableTicket {
    /// Level the ticket was created with (lower is more important).
    fn level(&self) -> u32;

    /// Origin of the ticket.
    fn kind(&self) -> &TicketKind;

    /// Human-readable owner of the ticket (block, entity, mod name, ...).
    fn owner(&self) -> &str;

    /// Level the ticket currently imposes on its chunk.
    fn effective_level(&self) -> u32 {
        if self.is_paused() {
            PAUSED_TICKET_LEVEL.max(self.level())
        } else {
            self.level()
        }
    }

    /// System-critical tickets are never grouped, paused or resumed.
    fn is_system(&self) -> bool {
        self.level() > SYSTEM_LEVEL_CEILING || self.kind().is_system()
    }
}

/// Plain in-memory ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTicket {
    level: u32,
    kind: TicketKind,
    owner: String,
    paused: bool,
    dirty: bool,
}

impl SimTicket {
    /// Create an active ticket.
    pub fn new(level: u32, kind: TicketKind, owner: impl Into<String>) -> Self {
        Self {
            level,
            kind,
            owner: owner.into(),
            paused: false,
            dirty: false,
        }
    }

    /// Create an extension ticket owned by `owner` at `level`.
    pub fn custom(level: u32, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        Self::new(level, TicketKind::Custom(owner.clone()), owner)
    }
}

impl PauseableTicket for SimTicket {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            self.dirty = true;
        }
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Ticket for SimTicket {
    fn level(&self) -> u32 {
        self.level
    }

    fn kind(&self) -> &TicketKind {
        &self.kind
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}
