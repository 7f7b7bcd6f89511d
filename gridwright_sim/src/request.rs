// Shared-resource claim protocol.
//
// The player's aim, active slot, inventory focus and raw interaction are
// each owned by exactly one manager. Code never writes to them directly; it
// submits a request and polls the returned `Submission`. Submissions are
// idempotent within a tick: re-submitting an equivalent request reports the
// same state the first submission saw. A request for a *different* target
// while the resource is mid-transition is rejected outright rather than
// queued — the caller re-ranks next tick, which prevents two candidates
// thrashing one resource.
//
// Claims expire: a request must be re-submitted every tick (within its
// `keep_ticks` grace window) or the resource is released.

use serde::{Deserialize, Serialize};

/// Outcome of submitting a request this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The resource is claimed for this request (now or from a prior tick).
    pub accepted: bool,
    /// The resource already holds the requested value.
    pub done: bool,
}

impl Submission {
    /// The resource is busy with a different target; try again next tick.
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            done: false,
        }
    }

    /// Claimed but the resource has not reached the requested value yet.
    pub fn pending() -> Self {
        Self {
            accepted: true,
            done: false,
        }
    }

    /// Claimed and the requested value already holds.
    pub fn satisfied() -> Self {
        Self {
            accepted: true,
            done: true,
        }
    }
}

/// A manager owning one shared resource. Resolution and end-of-tick
/// bookkeeping have manager-specific signatures and are inherent methods.
pub trait ResourceManager {
    type Request;

    fn submit(&mut self, request: Self::Request) -> Submission;
}
