// Active-slot ownership: serializes hotbar slot changes.
//
// `server_slot` is the last acknowledged active slot. A request claims the
// resource and is satisfied once the slot has been switched *and* held for
// `swap_pause` ticks (acting in the same tick as a swap is how actions get
// attributed to the wrong item).
//
// ## Silent swaps
// Claims expire like every resource claim; when an expired claim leaves the
// acknowledged slot different from the slot the player themselves selected,
// the manager swaps back. A task that stops resubmitting therefore never
// leaves the player's hand switched.

use serde::{Deserialize, Serialize};

use crate::config::HotbarConfig;
use crate::event::PlanEvent;
use crate::request::{ResourceManager, Submission};
use crate::world::HOTBAR_SIZE;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HotbarRequest {
    pub slot: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ActiveSwap {
    slot: usize,
    age: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HotbarManager {
    cfg: HotbarConfig,
    server_slot: usize,
    active: Option<ActiveSwap>,
    swaps_this_tick: u32,
    swap_delay: u32,
    /// Ticks since the acknowledged slot last changed.
    held_ticks: u32,
}

impl HotbarManager {
    pub fn new(cfg: HotbarConfig) -> Self {
        Self {
            cfg,
            server_slot: 0,
            active: None,
            swaps_this_tick: 0,
            swap_delay: 0,
            held_ticks: u32::MAX,
        }
    }

    /// The last acknowledged active slot.
    pub fn server_slot(&self) -> usize {
        self.server_slot
    }

    fn satisfied(&self, slot: usize) -> bool {
        self.server_slot == slot && self.held_ticks >= self.cfg.swap_pause
    }

    /// Perform the pending slot switch if the swap budget allows it.
    pub fn resolve(&mut self, events: &mut Vec<PlanEvent>) {
        let Some(active) = &self.active else { return };
        if self.server_slot == active.slot {
            return;
        }
        if self.swaps_this_tick >= self.cfg.swaps_per_tick || self.swap_delay > 0 {
            return;
        }
        self.server_slot = active.slot;
        self.swaps_this_tick += 1;
        self.swap_delay = self.cfg.swap_delay;
        self.held_ticks = 0;
        events.push(PlanEvent::SlotSwapped { slot: active.slot });
    }

    /// Age the claim, expire it, and restore the player's own selection
    /// after a silent swap ends.
    pub fn end_tick(&mut self, player_selected: usize, events: &mut Vec<PlanEvent>) {
        self.swaps_this_tick = 0;
        self.swap_delay = self.swap_delay.saturating_sub(1);
        self.held_ticks = self.held_ticks.saturating_add(1);
        if let Some(active) = &mut self.active {
            active.age += 1;
            if active.age > self.cfg.keep_ticks {
                self.active = None;
                if self.server_slot != player_selected {
                    self.server_slot = player_selected;
                    self.held_ticks = 0;
                    events.push(PlanEvent::SlotRestored {
                        slot: player_selected,
                    });
                }
            }
        }
    }
}

impl ResourceManager for HotbarManager {
    type Request = HotbarRequest;

    fn submit(&mut self, request: HotbarRequest) -> Submission {
        if request.slot >= HOTBAR_SIZE {
            return Submission::rejected();
        }
        if let Some(active) = &mut self.active {
            if active.slot == request.slot {
                active.age = 0;
                return if self.satisfied(request.slot) {
                    Submission::satisfied()
                } else {
                    Submission::pending()
                };
            }
            if active.age == 0 {
                return Submission::rejected();
            }
        }
        let done = self.satisfied(request.slot);
        self.active = Some(ActiveSwap {
            slot: request.slot,
            age: 0,
        });
        if done {
            Submission::satisfied()
        } else {
            Submission::pending()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> HotbarManager {
        HotbarManager::new(HotbarConfig::default())
    }

    #[test]
    fn swap_needs_a_pause_before_done() {
        let mut m = manager();
        let mut events = Vec::new();
        assert!(!m.submit(HotbarRequest { slot: 3 }).done);
        m.resolve(&mut events);
        assert_eq!(m.server_slot(), 3);
        m.end_tick(0, &mut events);
        // Swapped last tick; one tick of holding satisfies the pause.
        assert!(m.submit(HotbarRequest { slot: 3 }).done);
    }

    #[test]
    fn competing_slot_rejected_same_tick() {
        let mut m = manager();
        assert!(m.submit(HotbarRequest { slot: 3 }).accepted);
        assert!(!m.submit(HotbarRequest { slot: 5 }).accepted);
        // The equivalent request is still fine.
        assert!(m.submit(HotbarRequest { slot: 3 }).accepted);
    }

    #[test]
    fn out_of_range_slot_rejected() {
        let mut m = manager();
        assert!(!m.submit(HotbarRequest { slot: 9 }).accepted);
    }

    #[test]
    fn silent_swap_restores_player_selection() {
        let mut m = manager();
        let mut events = Vec::new();
        m.submit(HotbarRequest { slot: 7 });
        m.resolve(&mut events);
        assert_eq!(m.server_slot(), 7);
        // No resubmission: claim ages out and the selection is restored.
        m.end_tick(2, &mut events);
        m.end_tick(2, &mut events);
        assert_eq!(m.server_slot(), 2);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlanEvent::SlotRestored { slot: 2 })));
    }

    #[test]
    fn swap_budget_limits_switches_per_tick() {
        let mut m = manager();
        let mut events = Vec::new();
        m.submit(HotbarRequest { slot: 3 });
        m.resolve(&mut events);
        m.resolve(&mut events);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, PlanEvent::SlotSwapped { .. }))
                .count(),
            1
        );
    }
}
