//! Single-slot, cancelable auto-advance.
//!
//! The scheduler only hands out tickets; the host owns the actual timer and
//! calls back with the ticket when it fires. A ticket that was cancelled or
//! replaced in the meantime is simply not due any more.

use std::time::Duration;

/// Identifies one scheduled advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// The advance currently waiting to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub ticket: Ticket,
    pub delay: Duration,
}

#[derive(Debug, Default)]
pub struct AdvanceScheduler {
    issued: u64,
    pending: Option<PendingAdvance>,
}

impl AdvanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an advance, replacing any pending one.
    pub fn schedule(&mut self, delay: Duration) -> PendingAdvance {
        self.issued += 1;
        let pending = PendingAdvance {
            ticket: Ticket(self.issued),
            delay,
        };
        if let Some(previous) = self.pending.replace(pending) {
            tracing::debug!(ticket = previous.ticket.0, "pending advance replaced");
        }
        pending
    }

    /// Drop the pending advance, if any.
    pub fn cancel(&mut self) -> Option<Ticket> {
        self.pending.take().map(|p| p.ticket)
    }

    pub fn pending(&self) -> Option<PendingAdvance> {
        self.pending
    }

    /// Claim a fired ticket. True only for the ticket still pending.
    pub fn take_due(&mut self, ticket: Ticket) -> bool {
        match self.pending {
            Some(p) if p.ticket == ticket => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_schedule_replaces_old() {
        let mut scheduler = AdvanceScheduler::new();
        let first = scheduler.schedule(Duration::from_millis(2000));
        let second = scheduler.schedule(Duration::from_millis(2000));
        assert_ne!(first.ticket, second.ticket);
        assert!(!scheduler.take_due(first.ticket));
        assert!(scheduler.take_due(second.ticket));
        assert!(scheduler.pending().is_none());
    }

    #[test]
    fn cancelled_ticket_never_fires() {
        let mut scheduler = AdvanceScheduler::new();
        let pending = scheduler.schedule(Duration::ZERO);
        assert_eq!(scheduler.cancel(), Some(pending.ticket));
        assert!(!scheduler.take_due(pending.ticket));
        assert_eq!(scheduler.cancel(), None);
    }

    #[test]
    fn ticket_fires_once() {
        let mut scheduler = AdvanceScheduler::new();
        let pending = scheduler.schedule(Duration::from_secs(1));
        assert!(scheduler.take_due(pending.ticket));
        assert!(!scheduler.take_due(pending.ticket));
    }
}
