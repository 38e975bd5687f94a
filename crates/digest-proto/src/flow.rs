//! Request tickets: per-flow sequence numbers that let a flow ignore
//! responses overtaken by a newer request of the same flow.

/// Identifies one outstanding request of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Monotonic ticket issuer. Only the most recently issued ticket is current.
#[derive(Debug, Clone, Default)]
pub struct RequestSeq {
    issued: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}
