// Inventory transfers: item selections, slot-diff tracking, and the
// `SlotTransfer` task that restocks a destination region one swap per tick.
//
// ## Selections
// A `StackSelection` is a predicate over item stacks plus a required count.
// Targets use them to say what must be held; transfers use them to say what
// must arrive in the destination slots.
//
// ## Diff tracking
// `InventoryChanges` snapshots the slots once and appends a (before, after)
// pair per slot per observed change. Fulfillment is judged on the *diff*,
// not the absolute contents: a freshly constructed tracker fulfills
// nothing. The transfer task separately short-circuits when the destination
// already holds enough, so re-entry is idempotent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::config::BuildConfig;
use crate::inventory::{InventoryAction, InventoryRequest};
use crate::request::ResourceManager;
use crate::task::{Poll, TaskStep, TickCtx};
use crate::types::{BlockId, ItemId, ItemStack};
use crate::world::{Screen, HOTBAR_SIZE};

/// Predicate over item stacks. Closed set, matched exhaustively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StackMatcher {
    /// Any non-empty stack.
    Any,
    Item(ItemId),
    AnyOf(Vec<ItemId>),
    /// Items listed as expendable in the build config.
    Disposable,
    /// Any solid block item outside the exclusion set.
    SolidBlock { exclude: Vec<BlockId> },
    /// A tool of the family suited to mining `BlockId`.
    ToolFor(BlockId),
}

impl StackMatcher {
    pub fn matches(&self, stack: &ItemStack, cfg: &BuildConfig) -> bool {
        if stack.is_empty() {
            return false;
        }
        match self {
            StackMatcher::Any => true,
            StackMatcher::Item(id) => stack.item == *id,
            StackMatcher::AnyOf(ids) => ids.contains(&stack.item),
            StackMatcher::Disposable => cfg.disposable.contains(&stack.item),
            StackMatcher::SolidBlock { exclude } => stack
                .item
                .as_block()
                .is_some_and(|b| b.is_solid() && !exclude.contains(&b)),
            StackMatcher::ToolFor(block) => {
                matches!(stack.item, ItemId::Tool(_)) && stack.item.is_suitable_for(*block)
            }
        }
    }

    /// A representative block this matcher would accept, used to pick the
    /// concrete state for open-ended targets.
    pub fn example_block(&self, cfg: &BuildConfig) -> Option<BlockId> {
        match self {
            StackMatcher::Item(id) => id.as_block(),
            StackMatcher::AnyOf(ids) => ids.iter().find_map(ItemId::as_block),
            StackMatcher::Disposable => cfg.disposable.iter().find_map(ItemId::as_block),
            StackMatcher::SolidBlock { exclude } => cfg
                .disposable
                .iter()
                .filter_map(ItemId::as_block)
                .find(|b| b.is_solid() && !exclude.contains(b))
                .or(Some(BlockId::Cobblestone)),
            StackMatcher::Any | StackMatcher::ToolFor(_) => None,
        }
    }
}

/// A matcher plus how many items must satisfy it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackSelection {
    pub matcher: StackMatcher,
    pub count: u32,
}

impl StackSelection {
    pub fn new(matcher: StackMatcher, count: u32) -> Self {
        Self { matcher, count }
    }

    /// A selection requiring a single matching item.
    pub fn one(matcher: StackMatcher) -> Self {
        Self::new(matcher, 1)
    }

    /// Total matching items across the given slots.
    pub fn count_in(&self, slots: &[ItemStack], indices: &[usize], cfg: &BuildConfig) -> u32 {
        indices
            .iter()
            .filter_map(|&i| slots.get(i))
            .filter(|s| self.matcher.matches(s, cfg))
            .map(|s| s.count)
            .sum()
    }
}

/// Per-slot change history against a baseline snapshot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InventoryChanges {
    last: Vec<ItemStack>,
    changes: BTreeMap<usize, Vec<(ItemStack, ItemStack)>>,
}

impl InventoryChanges {
    pub fn new(snapshot: &[ItemStack]) -> Self {
        Self {
            last: snapshot.to_vec(),
            changes: BTreeMap::new(),
        }
    }

    /// Record any slots that differ from the last observation.
    pub fn update(&mut self, current: &[ItemStack]) {
        for (i, stack) in current.iter().enumerate() {
            let before = self.last.get(i).copied().unwrap_or(ItemStack::EMPTY);
            if before != *stack {
                self.changes.entry(i).or_default().push((before, *stack));
            }
        }
        self.last = current.to_vec();
    }

    /// Fold another diff into this one, appending its per-slot history.
    pub fn merge(&mut self, other: InventoryChanges) {
        for (slot, mut pairs) in other.changes {
            self.changes.entry(slot).or_default().append(&mut pairs);
        }
        if !other.last.is_empty() {
            self.last = other.last;
        }
    }

    pub fn changed_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.keys().copied()
    }

    /// Whether the summed latest post-change counts across `dest` slots
    /// matching the selection reach the required count. A tracker with no
    /// recorded changes fulfills nothing.
    pub fn fulfills(&self, selection: &StackSelection, dest: &[usize], cfg: &BuildConfig) -> bool {
        let total: u32 = dest
            .iter()
            .filter_map(|slot| self.changes.get(slot))
            .filter_map(|history| history.last())
            .filter(|(_, after)| selection.matcher.matches(after, cfg))
            .map(|(_, after)| after.count)
            .sum();
        total >= selection.count
    }
}

/// Task that moves items matching a selection into a destination slot
/// region, one swap per tick.
pub struct SlotTransfer {
    selection: StackSelection,
    dest: Vec<usize>,
    start_screen: Screen,
    issued_clicks: u32,
    changes: InventoryChanges,
}

impl SlotTransfer {
    pub fn new(selection: StackSelection, dest: Vec<usize>) -> Self {
        Self {
            selection,
            dest,
            start_screen: Screen::default(),
            issued_clicks: 0,
            changes: InventoryChanges::default(),
        }
    }

    /// Transfer into the hotbar region.
    pub fn to_hotbar(selection: StackSelection) -> Self {
        Self::new(selection, (0..HOTBAR_SIZE).collect())
    }

    /// Destination slot usable as a drop target: empty, or disposable
    /// filler that is not itself part of the wanted material.
    fn pick_dest(&self, slots: &[ItemStack], cfg: &BuildConfig) -> Option<usize> {
        self.dest
            .iter()
            .copied()
            .find(|&i| slots.get(i).is_some_and(ItemStack::is_empty))
            .or_else(|| {
                self.dest.iter().copied().find(|&i| {
                    slots.get(i).is_some_and(|s| {
                        !s.is_empty()
                            && StackMatcher::Disposable.matches(s, cfg)
                            && !self.selection.matcher.matches(s, cfg)
                    })
                })
            })
    }
}

impl TaskStep for SlotTransfer {
    fn name(&self) -> &'static str {
        "slot_transfer"
    }

    fn on_start(&mut self, ctx: &mut TickCtx<'_>) {
        self.start_screen = ctx.world.screen;
        self.changes = InventoryChanges::new(&ctx.world.player.inventory.slots);
    }

    fn advance(&mut self, ctx: &mut TickCtx<'_>) -> Poll {
        let cfg = &ctx.config.build;
        let screen = ctx.world.screen;
        if screen.sync_id != self.start_screen.sync_id
            || screen.revision != self.start_screen.revision + self.issued_clicks
        {
            return Poll::Failed(format!(
                "container changed under transfer (sync {} rev {} -> sync {} rev {})",
                self.start_screen.sync_id,
                self.start_screen.revision + self.issued_clicks,
                screen.sync_id,
                screen.revision,
            ));
        }

        let slots = ctx.world.player.inventory.slots.clone();
        self.changes.update(&slots);

        // Done when the destination region holds enough, whether we moved
        // it there or it was there all along.
        if self.selection.count_in(&slots, &self.dest, cfg) >= self.selection.count
            || self.changes.fulfills(&self.selection, &self.dest, cfg)
        {
            return Poll::Succeeded;
        }

        let source = slots
            .iter()
            .enumerate()
            .find(|&(i, s)| !self.dest.contains(&i) && self.selection.matcher.matches(s, cfg))
            .map(|(i, _)| i);
        let Some(source) = source else {
            if slots.iter().any(|s| self.selection.matcher.matches(s, cfg)) {
                // Everything matching is already in the destination but the
                // count is short: nothing more to move.
                return Poll::Failed("not enough matching items".to_string());
            }
            return Poll::Failed("no stacks matching the selection".to_string());
        };

        let Some(dest) = self.pick_dest(&slots, cfg) else {
            // No destination capacity right now; hold until it changes or
            // the caller cancels.
            return Poll::Pending;
        };

        let sub = ctx.inventory.submit(InventoryRequest {
            actions: smallvec![InventoryAction::Swap { a: source, b: dest }],
        });
        if sub.accepted {
            self.issued_clicks += 1;
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::hotbar::HotbarManager;
    use crate::interact::InteractManager;
    use crate::inventory::InventoryManager;
    use crate::rotation::RotationManager;
    use crate::task::{Task, TaskRunner, TaskState};
    use crate::world::WorldView;
    use gridwright_prng::GameRng;

    fn cfg() -> BuildConfig {
        BuildConfig::default()
    }

    fn stone(count: u32) -> ItemStack {
        ItemStack::new(ItemId::Block(BlockId::Stone), count)
    }

    #[test]
    fn fresh_tracker_fulfills_nothing() {
        let slots = vec![stone(10); 4];
        let changes = InventoryChanges::new(&slots);
        let selection = StackSelection::one(StackMatcher::Item(ItemId::Block(BlockId::Stone)));
        assert!(!changes.fulfills(&selection, &[0, 1, 2, 3], &cfg()));
    }

    #[test]
    fn update_records_latest_post_change() {
        let mut slots = vec![ItemStack::EMPTY; 4];
        let mut changes = InventoryChanges::new(&slots);
        slots[1] = stone(3);
        changes.update(&slots);
        slots[1] = stone(5);
        changes.update(&slots);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 5);
        assert!(changes.fulfills(&selection, &[1], &cfg()));
        assert!(!changes.fulfills(&selection, &[0], &cfg()));
    }

    #[test]
    fn merge_appends_history() {
        let base = vec![ItemStack::EMPTY; 2];
        let mut a = InventoryChanges::new(&base);
        a.update(&[stone(2), ItemStack::EMPTY]);
        let mut b = InventoryChanges::new(&[stone(2), ItemStack::EMPTY]);
        b.update(&[stone(2), stone(7)]);
        a.merge(b);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 7);
        assert!(a.fulfills(&selection, &[1], &cfg()));
    }

    #[test]
    fn solid_block_matcher_excludes() {
        let c = cfg();
        let matcher = StackMatcher::SolidBlock {
            exclude: vec![BlockId::Stone],
        };
        assert!(!matcher.matches(&stone(1), &c));
        assert!(matcher.matches(&ItemStack::new(ItemId::Block(BlockId::Dirt), 1), &c));
        assert!(!matcher.matches(&ItemStack::new(ItemId::Block(BlockId::Torch), 1), &c));
    }

    struct Harness {
        world: WorldView,
        rotation: RotationManager,
        hotbar: HotbarManager,
        inventory: InventoryManager,
        interact: InteractManager,
        config: PlannerConfig,
        rng: GameRng,
        runner: TaskRunner,
        last_state: Option<TaskState>,
    }

    impl Harness {
        fn new(world: WorldView) -> Self {
            let config = PlannerConfig::default();
            Self {
                world,
                rotation: RotationManager::new(config.rotation.clone()),
                hotbar: HotbarManager::new(config.hotbar.clone()),
                inventory: InventoryManager::new(config.inventory.clone()),
                interact: InteractManager::new(),
                config,
                rng: GameRng::new(7),
                runner: TaskRunner::default(),
                last_state: None,
            }
        }

        fn tick(&mut self) -> Vec<crate::event::PlanEvent> {
            let mut events = Vec::new();
            let mut ctx = TickCtx {
                world: &mut self.world,
                rotation: &mut self.rotation,
                hotbar: &mut self.hotbar,
                inventory: &mut self.inventory,
                interact: &mut self.interact,
                config: &self.config,
                rng: &mut self.rng,
                events: &mut events,
                tick: 0,
                spawned: Vec::new(),
            };
            self.runner.tick(&mut ctx);
            self.inventory.resolve(&mut self.world, &mut events);
            self.inventory.end_tick();
            for e in &events {
                match e {
                    crate::event::PlanEvent::TaskSucceeded { .. } => {
                        self.last_state = Some(TaskState::Succeeded)
                    }
                    crate::event::PlanEvent::TaskFailed { reason, .. } => {
                        self.last_state = Some(TaskState::Failed(reason.clone()))
                    }
                    _ => {}
                }
            }
            events
        }
    }

    #[test]
    fn transfer_moves_one_stack_per_tick() {
        let mut world = WorldView::new(8, 8, 8);
        world.player.inventory.set_slot(12, stone(10));
        world.player.inventory.set_slot(13, stone(10));
        let mut h = Harness::new(world);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 20);
        h.runner.spawn(Task::new(SlotTransfer::to_hotbar(selection)));

        // Tick 1 starts the task and queues the first swap.
        h.tick();
        assert_eq!(h.world.player.inventory.slot(0).count, 10);
        h.tick();
        assert_eq!(h.world.player.inventory.slot(1).count, 10);
        h.tick();
        assert_eq!(h.last_state, Some(TaskState::Succeeded));
    }

    #[test]
    fn transfer_succeeds_immediately_when_satisfied() {
        let mut world = WorldView::new(8, 8, 8);
        world.player.inventory.set_slot(3, stone(5));
        let mut h = Harness::new(world);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 5);
        h.runner.spawn(Task::new(SlotTransfer::to_hotbar(selection)));
        h.tick();
        assert_eq!(h.last_state, Some(TaskState::Succeeded));
        assert_eq!(h.world.screen.revision, 0);
    }

    #[test]
    fn transfer_fails_without_matching_items() {
        let world = WorldView::new(8, 8, 8);
        let mut h = Harness::new(world);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 1);
        h.runner.spawn(Task::new(SlotTransfer::to_hotbar(selection)));
        h.tick();
        h.tick();
        match &h.last_state {
            Some(TaskState::Failed(reason)) => {
                assert!(reason.contains("no stacks matching"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn transfer_waits_when_destination_full() {
        let mut world = WorldView::new(8, 8, 8);
        // Hotbar full of non-disposable, non-matching items.
        for i in 0..HOTBAR_SIZE {
            world
                .player
                .inventory
                .set_slot(i, ItemStack::new(ItemId::Block(BlockId::Obsidian), 1));
        }
        world.player.inventory.set_slot(20, stone(5));
        let mut h = Harness::new(world);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 5);
        h.runner.spawn(Task::new(SlotTransfer::to_hotbar(selection)));
        for _ in 0..5 {
            h.tick();
        }
        // No silent partial success: the task is still running.
        assert_eq!(h.last_state, None);
        assert!(!h.runner.is_idle());
        // Freeing a slot lets it finish.
        h.world.player.inventory.set_slot(4, ItemStack::EMPTY);
        h.tick();
        h.tick();
        assert_eq!(h.last_state, Some(TaskState::Succeeded));
    }

    #[test]
    fn transfer_fails_on_screen_change() {
        let mut world = WorldView::new(8, 8, 8);
        world.player.inventory.set_slot(20, stone(5));
        let mut h = Harness::new(world);
        let selection =
            StackSelection::new(StackMatcher::Item(ItemId::Block(BlockId::Stone)), 5);
        h.runner.spawn(Task::new(SlotTransfer::to_hotbar(selection)));
        h.tick();
        // Another screen opens mid-transfer.
        h.world.screen.sync_id = 9;
        h.tick();
        match &h.last_state {
            Some(TaskState::Failed(reason)) => assert!(reason.contains("container changed")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
