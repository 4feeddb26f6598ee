//! Superseding in-flight queries.
//!
//! Every new query takes a ticket from the gate.  Taking a ticket bumps the
//! gate's generation, so all older tickets report themselves stale.  Long
//! work checks its ticket between units and bails out with
//! [`QueryError::Superseded`](crate::QueryError::Superseded).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues [`QueryTicket`]s; cheap to clone and share.
#[derive(Clone, Debug, Default)]
pub struct SupersedeGate {
    generation: Arc<AtomicU64>,
}

/// Handle held by one query.
#[derive(Clone, Debug)]
pub struct QueryTicket {
    generation: Arc<AtomicU64>,
    issued:     u64,
}

impl SupersedeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query, superseding every ticket issued before.
    pub fn issue(&self) -> QueryTicket {
        let issued = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        QueryTicket { generation: Arc::clone(&self.generation), issued }
    }

    /// Supersede all outstanding tickets without starting a new query.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl QueryTicket {
    /// A ticket that is never superseded, for callers without a gate.
    pub fn detached() -> Self {
        Self { generation: Arc::new(AtomicU64::new(0)), issued: 0 }
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.issued
    }
}
