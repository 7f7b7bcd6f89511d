// Top-level simulation state: the world, the resource managers, and the
// task runner, advanced one tick at a time.
//
// A tick runs in fixed phases: the active task is polled (submitting
// resource requests), then each manager resolves its claim against the
// world, then each manager ends the tick (ageing and expiring claims).
// The phase order is part of the behavior: requests submitted this tick
// resolve this tick, and expiry only happens after resolution.
//
// The whole state serializes; the task runner does not (closures), so a
// restored state starts idle and a new task must be spawned.

use std::mem;

use gridwright_prng::GameRng;
use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::build::BuildTask;
use crate::config::PlannerConfig;
use crate::event::PlanEvent;
use crate::hotbar::HotbarManager;
use crate::interact::InteractManager;
use crate::inventory::InventoryManager;
use crate::rotation::RotationManager;
use crate::task::{Task, TaskRunner, TickCtx};
use crate::world::WorldView;

#[derive(Serialize, Deserialize)]
pub struct SimState {
    pub tick: u64,
    pub world: WorldView,
    pub config: PlannerConfig,
    rng: GameRng,
    rotation: RotationManager,
    hotbar: HotbarManager,
    inventory: InventoryManager,
    interact: InteractManager,
    #[serde(skip)]
    runner: TaskRunner,
}

impl SimState {
    pub fn new(seed: u64, config: PlannerConfig, world: WorldView) -> Self {
        Self {
            tick: 0,
            rng: GameRng::new(seed),
            rotation: RotationManager::new(config.rotation.clone()),
            hotbar: HotbarManager::new(config.hotbar.clone()),
            inventory: InventoryManager::new(config.inventory.clone()),
            interact: InteractManager::new(),
            runner: TaskRunner::default(),
            config,
            world,
        }
    }

    pub fn idle(&self) -> bool {
        self.runner.is_idle()
    }

    pub fn active_task(&self) -> Option<&'static str> {
        self.runner.active_name()
    }

    /// Start building `blueprint`. Runs as a sub-task if something is
    /// already active.
    pub fn start_build(&mut self, blueprint: impl Blueprint + 'static) {
        self.runner.spawn(Task::new(BuildTask::new(blueprint)));
    }

    /// Cancel everything that is running. Claims are released; world
    /// actions already committed stay.
    pub fn cancel(&mut self) -> Vec<PlanEvent> {
        let mut events = Vec::new();
        let mut runner = mem::take(&mut self.runner);
        let mut ctx = TickCtx {
            world: &mut self.world,
            rotation: &mut self.rotation,
            hotbar: &mut self.hotbar,
            inventory: &mut self.inventory,
            interact: &mut self.interact,
            config: &self.config,
            rng: &mut self.rng,
            events: &mut events,
            tick: self.tick,
            spawned: Vec::new(),
        };
        runner.cancel_all(&mut ctx);
        self.runner = runner;
        events
    }

    /// Advance the simulation by one tick, returning the events produced.
    pub fn tick(&mut self) -> Vec<PlanEvent> {
        let mut events = Vec::new();

        let mut runner = mem::take(&mut self.runner);
        let mut ctx = TickCtx {
            world: &mut self.world,
            rotation: &mut self.rotation,
            hotbar: &mut self.hotbar,
            inventory: &mut self.inventory,
            interact: &mut self.interact,
            config: &self.config,
            rng: &mut self.rng,
            events: &mut events,
            tick: self.tick,
            spawned: Vec::new(),
        };
        runner.tick(&mut ctx);
        self.runner = runner;

        self.rotation.resolve(&mut events);
        self.hotbar.resolve(&mut events);
        self.inventory.resolve(&mut self.world, &mut events);
        self.interact.resolve(&mut self.world, &mut events);

        self.rotation.end_tick();
        self.hotbar
            .end_tick(self.world.player.inventory.selected, &mut events);
        self.inventory.end_tick();
        self.interact.end_tick();

        self.tick += 1;
        events
    }
}
