// Inventory-focus ownership: serializes slot click actions.
//
// One owner may queue actions per tick; the manager executes up to
// `clicks_per_tick` of them during resolution, bumping the screen revision
// per click exactly like the real container protocol would. Actions that
// don't fit carry over and block new claims until the queue drains.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::InventoryConfig;
use crate::event::PlanEvent;
use crate::request::{ResourceManager, Submission};
use crate::world::WorldView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryAction {
    /// Exchange the contents of two slots.
    Swap { a: usize, b: usize },
    /// Drop the stack in a slot.
    Throw { slot: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub actions: SmallVec<[InventoryAction; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryManager {
    cfg: InventoryConfig,
    queue: VecDeque<InventoryAction>,
    claimed_this_tick: bool,
}

impl InventoryManager {
    pub fn new(cfg: InventoryConfig) -> Self {
        Self {
            cfg,
            queue: VecDeque::new(),
            claimed_this_tick: false,
        }
    }

    pub fn idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Execute queued actions against the player inventory.
    pub fn resolve(&mut self, world: &mut WorldView, events: &mut Vec<PlanEvent>) {
        for _ in 0..self.cfg.clicks_per_tick {
            let Some(action) = self.queue.pop_front() else {
                break;
            };
            match action {
                InventoryAction::Swap { a, b } => {
                    let slots = &mut world.player.inventory.slots;
                    if a < slots.len() && b < slots.len() {
                        slots.swap(a, b);
                        events.push(PlanEvent::StackMoved { from: a, to: b });
                    }
                }
                InventoryAction::Throw { slot } => {
                    world
                        .player
                        .inventory
                        .set_slot(slot, crate::types::ItemStack::EMPTY);
                }
            }
            world.screen.bump();
        }
    }

    pub fn end_tick(&mut self) {
        self.claimed_this_tick = false;
    }
}

impl ResourceManager for InventoryManager {
    type Request = InventoryRequest;

    fn submit(&mut self, request: InventoryRequest) -> Submission {
        if self.claimed_this_tick || !self.queue.is_empty() {
            return Submission::rejected();
        }
        self.claimed_this_tick = true;
        self.queue.extend(request.actions);
        if self.queue.is_empty() {
            Submission::satisfied()
        } else {
            Submission::pending()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockId, ItemId, ItemStack};
    use smallvec::smallvec;

    fn world_with_stone_in(slot: usize) -> WorldView {
        let mut w = WorldView::new(8, 8, 8);
        w.player
            .inventory
            .set_slot(slot, ItemStack::new(ItemId::Block(BlockId::Stone), 5));
        w
    }

    #[test]
    fn swap_moves_stacks_and_bumps_revision() {
        let mut w = world_with_stone_in(10);
        let mut m = InventoryManager::new(InventoryConfig::default());
        let mut events = Vec::new();
        let sub = m.submit(InventoryRequest {
            actions: smallvec![InventoryAction::Swap { a: 10, b: 2 }],
        });
        assert!(sub.accepted && !sub.done);
        m.resolve(&mut w, &mut events);
        assert_eq!(w.player.inventory.slot(2).count, 5);
        assert!(w.player.inventory.slot(10).is_empty());
        assert_eq!(w.screen.revision, 1);
    }

    #[test]
    fn second_claim_same_tick_rejected() {
        let mut m = InventoryManager::new(InventoryConfig::default());
        assert!(
            m.submit(InventoryRequest {
                actions: smallvec![InventoryAction::Throw { slot: 1 }],
            })
            .accepted
        );
        assert!(
            !m.submit(InventoryRequest {
                actions: smallvec![InventoryAction::Throw { slot: 2 }],
            })
            .accepted
        );
    }

    #[test]
    fn clicks_per_tick_limits_throughput() {
        let mut w = world_with_stone_in(10);
        w.player
            .inventory
            .set_slot(11, ItemStack::new(ItemId::Block(BlockId::Dirt), 1));
        let mut m = InventoryManager::new(InventoryConfig { clicks_per_tick: 1 });
        let mut events = Vec::new();
        m.submit(InventoryRequest {
            actions: smallvec![
                InventoryAction::Swap { a: 10, b: 0 },
                InventoryAction::Swap { a: 11, b: 1 },
            ],
        });
        m.resolve(&mut w, &mut events);
        assert_eq!(w.screen.revision, 1);
        assert!(!m.idle());
        m.end_tick();
        m.resolve(&mut w, &mut events);
        assert_eq!(w.screen.revision, 2);
        assert!(m.idle());
    }
}
