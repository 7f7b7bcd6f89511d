// Raw interaction ownership: the single world action per tick.
//
// Placement and use clicks commit immediately during resolution. Breaking
// is progressive: the claim must be re-submitted every tick to keep mining,
// and progress at a position survives across ticks until it completes or a
// different position claims the resource. Dropping the resubmission resets
// nothing — abandoned progress simply goes stale and is discarded when a
// different block is mined.

use serde::{Deserialize, Serialize};

use crate::event::PlanEvent;
use crate::request::{ResourceManager, Submission};
use crate::types::{BlockId, BlockPos, BlockState};
use crate::world::WorldView;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WorldAction {
    /// Place `state` at `pos`, consuming one item from the hotbar slot.
    Place {
        pos: BlockPos,
        state: BlockState,
        slot: usize,
    },
    /// Mine the block at `pos`; `ticks` is the total duration, zero means
    /// instant.
    Break { pos: BlockPos, ticks: u32 },
    /// Click the block at `pos`, toggling its `powered` property.
    Use { pos: BlockPos, state: BlockState },
}

impl WorldAction {
    pub fn pos(&self) -> BlockPos {
        match self {
            WorldAction::Place { pos, .. }
            | WorldAction::Break { pos, .. }
            | WorldAction::Use { pos, .. } => *pos,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MiningState {
    pos: BlockPos,
    progress: u32,
    total: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractRequest {
    pub action: WorldAction,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct InteractManager {
    queued: Option<WorldAction>,
    mining: Option<MiningState>,
}

impl InteractManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mining progress at `pos` as a fraction, if any.
    pub fn mining_progress(&self, pos: BlockPos) -> Option<f64> {
        self.mining
            .as_ref()
            .filter(|m| m.pos == pos && m.total > 0)
            .map(|m| m.progress as f64 / m.total as f64)
    }

    /// Commit the queued action to the world.
    pub fn resolve(&mut self, world: &mut WorldView, events: &mut Vec<PlanEvent>) {
        let Some(action) = self.queued.take() else {
            return;
        };
        match action {
            WorldAction::Place { pos, state, slot } => {
                let held = world.player.inventory.slot(slot);
                if held.is_empty() {
                    return;
                }
                let block = state.id;
                world.set(pos, state);
                let mut remaining = held;
                remaining.count -= 1;
                world.player.inventory.set_slot(slot, remaining);
                events.push(PlanEvent::BlockPlaced { pos, block });
            }
            WorldAction::Use { pos, state } => {
                world.set(pos, state);
            }
            WorldAction::Break { pos, ticks } => {
                // Progress at another position goes stale and is dropped.
                let progress = match self.mining.take() {
                    Some(m) if m.pos == pos => m.progress + 1,
                    _ => 1,
                };
                if ticks == 0 || progress >= ticks {
                    let block = world.get(pos).id;
                    world.set(pos, BlockState::of(BlockId::Air));
                    events.push(PlanEvent::BlockBroken { pos, block });
                } else {
                    self.mining = Some(MiningState {
                        pos,
                        progress,
                        total: ticks,
                    });
                }
            }
        }
    }

    pub fn end_tick(&mut self) {
        // Unexecuted claims do not carry over; the owner resubmits.
        self.queued = None;
    }
}

impl ResourceManager for InteractManager {
    type Request = InteractRequest;

    fn submit(&mut self, request: InteractRequest) -> Submission {
        if let Some(queued) = &self.queued {
            return if *queued == request.action {
                Submission::pending()
            } else {
                Submission::rejected()
            };
        }
        self.queued = Some(request.action);
        Submission::pending()
    }
}
