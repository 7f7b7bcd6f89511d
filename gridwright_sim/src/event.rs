// Narrative events emitted while the planner runs.
//
// Every `SimState::tick` returns the events it produced, in order. They are
// the observable record of what the planner did (and why positions were
// given up on) — the frontend renders them, the tests assert on them.

use serde::{Deserialize, Serialize};

use crate::rank::Rank;
use crate::types::{BlockId, BlockPos};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    TaskStarted {
        name: String,
    },
    TaskSucceeded {
        name: String,
    },
    TaskFailed {
        name: String,
        reason: String,
    },
    TaskCancelled {
        name: String,
    },
    BlockBroken {
        pos: BlockPos,
        block: BlockId,
    },
    BlockPlaced {
        pos: BlockPos,
        block: BlockId,
    },
    /// A position was dropped from the blueprint after an unsolvable outcome.
    PositionDropped {
        pos: BlockPos,
        rank: Rank,
    },
    SlotSwapped {
        slot: usize,
    },
    /// A silent swap ended and the player's own selection was restored.
    SlotRestored {
        slot: usize,
    },
    RotationSettled {
        yaw: f64,
        pitch: f64,
    },
    /// One inventory click moved a stack between two slots.
    StackMoved {
        from: usize,
        to: usize,
    },
    /// A staged blueprint advanced to its next stage.
    StageAdvanced {
        remaining_positions: usize,
    },
}
