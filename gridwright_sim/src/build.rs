// The build task: works a blueprint to completion, one planning pass per
// tick.
//
// Each tick the task re-plans from scratch against the live world, ranks
// the results, and acts on the single best candidate: it submits aim and
// hotbar claims, and only once both are acknowledged submits the world
// action. Solvable obstacles make it wait; a missing hotbar item spawns a
// `SlotTransfer` sub-task; unsolvable positions are removed from the
// blueprint and reported. Committed actions are tracked in `pending` until
// the world reflects them, which is when the stats count them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::context::{BuildContext, RankView};
use crate::event::PlanEvent;
use crate::hotbar::HotbarRequest;
use crate::interact::{InteractRequest, WorldAction};
use crate::planner::{plan_pass, rank_results};
use crate::rank::BuildResult;
use crate::request::ResourceManager;
use crate::rotation::RotationRequest;
use crate::task::{Poll, Task, TaskStep, TickCtx};
use crate::transfer::SlotTransfer;
use crate::types::BlockPos;

const TICKS_PER_SECOND: f64 = 20.0;

/// Progress counters for a build run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub broken: u64,
    pub placed: u64,
    pub started_tick: u64,
    pub finished_tick: Option<u64>,
}

impl BuildStats {
    pub fn actions(&self) -> u64 {
        self.broken + self.placed
    }

    /// Actions per second, measured against `now` while running.
    pub fn per_second(&self, now: u64) -> f64 {
        let end = self.finished_tick.unwrap_or(now);
        let elapsed = end.saturating_sub(self.started_tick).max(1);
        self.actions() as f64 * TICKS_PER_SECOND / elapsed as f64
    }
}

#[derive(Clone, Copy, Debug)]
enum PendingKind {
    Break,
    Place,
}

pub struct BuildTask {
    blueprint: Box<dyn Blueprint>,
    pending: BTreeMap<BlockPos, PendingKind>,
    stats: BuildStats,
    /// Crouch state to restore after a click that required a different one.
    sneak_restore: Option<bool>,
}

impl BuildTask {
    pub fn new(blueprint: impl Blueprint + 'static) -> Self {
        Self {
            blueprint: Box::new(blueprint),
            pending: BTreeMap::new(),
            stats: BuildStats::default(),
            sneak_restore: None,
        }
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Credit dispatched actions whose effect now shows in the world.
    fn settle_pending(&mut self, ctx: &TickCtx<'_>) {
        let structure = self.blueprint.structure();
        let mut settled = Vec::new();
        for (&pos, kind) in &self.pending {
            match structure.get(&pos) {
                None => settled.push((pos, None)),
                Some(target) => {
                    let state = ctx.world.get(pos);
                    if target.matches(ctx.world, pos, &state, &ctx.config.build) {
                        settled.push((pos, Some(*kind)));
                    }
                }
            }
        }
        for (pos, kind) in settled {
            self.pending.remove(&pos);
            match kind {
                Some(PendingKind::Break) => self.stats.broken += 1,
                Some(PendingKind::Place) => self.stats.placed += 1,
                None => {}
            }
        }
    }

    /// Claim aim and slot for the winning candidate; submit the world
    /// action once both are acknowledged.
    fn dispatch(&mut self, ctx: &mut TickCtx<'_>, context: &BuildContext) {
        let pos = context.pos();
        if self.pending.len() >= ctx.config.build.max_pending
            && !self.pending.contains_key(&pos)
        {
            return;
        }
        let aim = ctx.rotation.submit(RotationRequest {
            target: context.rotation(),
        });
        if !aim.accepted {
            return;
        }
        let slot = ctx.hotbar.submit(HotbarRequest {
            slot: context.slot(),
        });
        if !slot.accepted || !aim.done || !slot.done {
            return;
        }
        let (action, kind) = match context {
            BuildContext::Break(c) => (
                WorldAction::Break {
                    pos: c.pos,
                    ticks: c.break_ticks,
                },
                PendingKind::Break,
            ),
            BuildContext::Interact(c) if c.placing => {
                // Crouch for the click only; released before the next pass.
                if ctx.world.player.sneaking != c.sneak {
                    self.sneak_restore.get_or_insert(ctx.world.player.sneaking);
                    ctx.world.player.sneaking = c.sneak;
                }
                (
                    WorldAction::Place {
                        pos: c.pos,
                        state: c.expected.clone(),
                        slot: c.slot,
                    },
                    PendingKind::Place,
                )
            }
            BuildContext::Interact(c) => (
                WorldAction::Use {
                    pos: c.pos,
                    state: c.expected.clone(),
                },
                PendingKind::Place,
            ),
        };
        if ctx.interact.submit(InteractRequest { action }).accepted {
            self.pending.insert(pos, kind);
        }
    }
}

impl TaskStep for BuildTask {
    fn name(&self) -> &'static str {
        "build"
    }

    fn on_start(&mut self, ctx: &mut TickCtx<'_>) {
        self.stats.started_tick = ctx.tick;
    }

    fn advance(&mut self, ctx: &mut TickCtx<'_>) -> Poll {
        if let Some(prior) = self.sneak_restore.take() {
            ctx.world.player.sneaking = prior;
        }
        self.blueprint.tick(ctx.world);
        self.settle_pending(ctx);

        let view = RankView {
            active_rotation: ctx.rotation.server(),
            server_slot: ctx.hotbar.server_slot(),
            sneaking: ctx.world.player.sneaking,
            sort: ctx.config.build.sort,
        };
        let seed = ctx.rng.next_u64();
        let mut results = plan_pass(ctx.world, self.blueprint.structure(), ctx.config, &view, seed);

        if results.iter().all(|r| r.rank().is_non_issue()) {
            if self.blueprint.advance() {
                ctx.events.push(PlanEvent::StageAdvanced {
                    remaining_positions: self.blueprint.structure().len(),
                });
                return Poll::Pending;
            }
            if ctx.config.build.finish_on_done {
                self.stats.finished_tick = Some(ctx.tick);
                return Poll::Succeeded;
            }
            return Poll::Pending;
        }

        for result in &results {
            if result.rank().is_unsolvable() {
                ctx.events.push(PlanEvent::PositionDropped {
                    pos: result.pos(),
                    rank: result.rank(),
                });
                self.blueprint.remove(result.pos());
                self.pending.remove(&result.pos());
            }
        }

        rank_results(&mut results, &view);
        let best = results
            .iter()
            .find(|r| !r.rank().is_unsolvable() && !r.rank().is_non_issue());
        match best {
            Some(result) => {
                if let Some(context) = result.context() {
                    self.dispatch(ctx, &context);
                } else if let BuildResult::WrongItem { selection, .. } = result {
                    // Restock from the main inventory; this task resumes
                    // once the transfer finishes.
                    ctx.spawn(Task::new(SlotTransfer::to_hotbar(selection.clone())));
                }
                // Any other solvable obstacle: wait for it to clear.
            }
            None => {
                // Only unsolvable results this pass; they were removed and
                // the next pass re-plans what is left.
            }
        }
        Poll::Pending
    }

    fn on_cancel(&mut self, ctx: &mut TickCtx<'_>) {
        if let Some(prior) = self.sneak_restore.take() {
            ctx.world.player.sneaking = prior;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::StaticBlueprint;
    use crate::config::PlannerConfig;
    use crate::hotbar::HotbarManager;
    use crate::interact::InteractManager;
    use crate::inventory::InventoryManager;
    use crate::rotation::RotationManager;
    use crate::target::TargetState;
    use crate::task::TaskRunner;
    use crate::types::{BlockId, BlockState, ItemId, ItemStack, Vec3};
    use crate::world::WorldView;
    use gridwright_prng::GameRng;

    struct Harness {
        world: WorldView,
        config: PlannerConfig,
        rotation: RotationManager,
        hotbar: HotbarManager,
        inventory: InventoryManager,
        interact: InteractManager,
        rng: GameRng,
        runner: TaskRunner,
        events: Vec<PlanEvent>,
        tick: u64,
    }

    impl Harness {
        fn new() -> Self {
            let config = PlannerConfig::default();
            let mut world = WorldView::new(16, 16, 16);
            world.fill(
                BlockPos::new(0, 0, 0),
                BlockPos::new(15, 0, 15),
                &BlockState::of(BlockId::Stone),
            );
            world.player.pos = Vec3::new(8.5, 1.0, 8.5);
            Self {
                world,
                rotation: RotationManager::new(config.rotation.clone()),
                hotbar: HotbarManager::new(config.hotbar.clone()),
                inventory: InventoryManager::new(config.inventory.clone()),
                interact: InteractManager::new(),
                config,
                rng: GameRng::new(42),
                runner: TaskRunner::default(),
                events: Vec::new(),
                tick: 0,
            }
        }

        fn step(&mut self) {
            let mut ctx = TickCtx {
                world: &mut self.world,
                rotation: &mut self.rotation,
                hotbar: &mut self.hotbar,
                inventory: &mut self.inventory,
                interact: &mut self.interact,
                config: &self.config,
                rng: &mut self.rng,
                events: &mut self.events,
                tick: self.tick,
                spawned: Vec::new(),
            };
            self.runner.tick(&mut ctx);
            self.rotation.resolve(&mut self.events);
            self.hotbar.resolve(&mut self.events);
            self.inventory.resolve(&mut self.world, &mut self.events);
            self.interact.resolve(&mut self.world, &mut self.events);
            self.rotation.end_tick();
            self.hotbar
                .end_tick(self.world.player.inventory.selected, &mut self.events);
            self.inventory.end_tick();
            self.interact.end_tick();
            self.tick += 1;
        }

        fn run(&mut self, ticks: u64) {
            for _ in 0..ticks {
                if self.runner.is_idle() {
                    return;
                }
                self.step();
            }
        }
    }

    #[test]
    fn places_a_block_and_finishes() {
        let mut h = Harness::new();
        h.world
            .player
            .inventory
            .set_slot(0, ItemStack::new(ItemId::Block(BlockId::Stone), 4));
        let pos = BlockPos::new(10, 1, 8);
        h.runner.spawn(Task::new(BuildTask::new(
            StaticBlueprint::filled_box(pos, pos, TargetState::Block(BlockId::Stone)),
        )));
        h.run(30);
        assert!(h.runner.is_idle());
        assert_eq!(h.world.get(pos).id, BlockId::Stone);
        assert_eq!(h.world.player.inventory.slot(0).count, 3);
        assert!(h
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::BlockPlaced { .. })));
        assert!(h.events.iter().any(
            |e| matches!(e, PlanEvent::TaskSucceeded { name } if name == "build")
        ));
    }

    #[test]
    fn mines_a_block_over_multiple_ticks() {
        let mut h = Harness::new();
        let pos = BlockPos::new(10, 1, 8);
        h.world.set(pos, BlockState::of(BlockId::Dirt));
        h.runner
            .spawn(Task::new(BuildTask::new(StaticBlueprint::clear_region(
                pos, pos,
            ))));
        h.run(60);
        assert!(h.runner.is_idle());
        assert!(h.world.get(pos).id.is_air());
        assert!(h
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::BlockBroken { .. })));
    }

    #[test]
    fn satisfied_blueprint_finishes_without_actions() {
        let mut h = Harness::new();
        let pos = BlockPos::new(10, 0, 8);
        h.runner.spawn(Task::new(BuildTask::new(
            StaticBlueprint::filled_box(pos, pos, TargetState::Block(BlockId::Stone)),
        )));
        h.run(5);
        assert!(h.runner.is_idle());
        assert!(!h
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::BlockPlaced { .. } | PlanEvent::BlockBroken { .. })));
    }

    #[test]
    fn unbreakable_position_is_dropped_and_reported() {
        let mut h = Harness::new();
        let pos = BlockPos::new(10, 1, 8);
        h.world.set(pos, BlockState::of(BlockId::Bedrock));
        h.runner
            .spawn(Task::new(BuildTask::new(StaticBlueprint::clear_region(
                pos, pos,
            ))));
        h.run(10);
        assert!(h.runner.is_idle());
        assert_eq!(h.world.get(pos).id, BlockId::Bedrock);
        assert!(h
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::PositionDropped { .. })));
    }

    /// Placing on top of a chest needs a crouched click so the chest does
    /// not open. The crouch must not outlive the click.
    #[test]
    fn crouch_released_after_placing_against_a_chest() {
        let mut h = Harness::new();
        h.world
            .player
            .inventory
            .set_slot(0, ItemStack::new(ItemId::Block(BlockId::Stone), 4));
        h.world
            .set(BlockPos::new(10, 1, 8), BlockState::of(BlockId::Chest));
        let pos = BlockPos::new(10, 2, 8);
        h.runner.spawn(Task::new(BuildTask::new(
            StaticBlueprint::filled_box(pos, pos, TargetState::Block(BlockId::Stone)),
        )));
        h.run(40);
        assert!(h.runner.is_idle());
        assert_eq!(h.world.get(pos).id, BlockId::Stone);
        assert!(!h.world.player.sneaking);
    }

    #[test]
    fn missing_item_triggers_a_transfer_then_builds() {
        let mut h = Harness::new();
        // Stone only in the main inventory.
        h.world
            .player
            .inventory
            .set_slot(20, ItemStack::new(ItemId::Block(BlockId::Stone), 8));
        let pos = BlockPos::new(10, 1, 8);
        h.runner.spawn(Task::new(BuildTask::new(
            StaticBlueprint::filled_box(pos, pos, TargetState::Block(BlockId::Stone)),
        )));
        h.run(40);
        assert!(h.runner.is_idle());
        assert_eq!(h.world.get(pos).id, BlockId::Stone);
        assert!(h.events.iter().any(
            |e| matches!(e, PlanEvent::TaskSucceeded { name } if name == "slot_transfer")
        ));
    }
}
