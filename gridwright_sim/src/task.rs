// Multi-tick task execution.
//
// A `Task` wraps a `TaskStep` state machine that an external driver polls
// once per tick. Steps never block: they submit resource requests, observe
// the world, and report `Poll::Pending` until a terminal outcome. Tasks
// chain with `then` (on success) and `finally` (always), and may spawn
// sub-tasks through the tick context; a sub-task pauses its parent until it
// finishes. Failure bubbles: a failed sub-task fails every ancestor with a
// reason chain naming each level.
//
// Cancellation is cooperative. It prevents continuations from starting and
// gives each step an `on_cancel` to release claims, but never rolls back
// world actions already committed — re-planning is the recovery mechanism.

use gridwright_prng::GameRng;

use crate::config::PlannerConfig;
use crate::event::PlanEvent;
use crate::hotbar::HotbarManager;
use crate::interact::InteractManager;
use crate::inventory::InventoryManager;
use crate::rotation::RotationManager;
use crate::world::WorldView;

/// Everything a task step may touch during one tick. Holding the context
/// is the only way to reach the world or the resource managers.
pub struct TickCtx<'a> {
    pub world: &'a mut WorldView,
    pub rotation: &'a mut RotationManager,
    pub hotbar: &'a mut HotbarManager,
    pub inventory: &'a mut InventoryManager,
    pub interact: &'a mut InteractManager,
    pub config: &'a PlannerConfig,
    pub rng: &'a mut GameRng,
    pub events: &'a mut Vec<PlanEvent>,
    pub tick: u64,
    pub(crate) spawned: Vec<Task>,
}

impl TickCtx<'_> {
    /// Spawn a sub-task. The current task pauses until it finishes.
    pub fn spawn(&mut self, task: Task) {
        self.spawned.push(task);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed(_) | TaskState::Cancelled
        )
    }
}

/// One tick of progress from a step.
#[derive(Debug)]
pub enum Poll {
    Pending,
    Succeeded,
    Failed(String),
}

/// The per-tick state machine behind a task.
pub trait TaskStep {
    fn name(&self) -> &'static str;

    /// Runs once when the task enters `Running`.
    fn on_start(&mut self, _ctx: &mut TickCtx<'_>) {}

    fn advance(&mut self, ctx: &mut TickCtx<'_>) -> Poll;

    /// Release claims held by the step. Runs on cancellation and when a
    /// sub-task failure tears this task down.
    fn on_cancel(&mut self, _ctx: &mut TickCtx<'_>) {}
}

type Continuation = Box<dyn FnOnce(&mut TickCtx<'_>) -> Task>;
type FinishHook = Box<dyn FnOnce(&mut TickCtx<'_>)>;

pub struct Task {
    step: Box<dyn TaskStep>,
    state: TaskState,
    next: Option<Continuation>,
    on_finish: Option<FinishHook>,
}

impl Task {
    pub fn new(step: impl TaskStep + 'static) -> Self {
        Self {
            step: Box::new(step),
            state: TaskState::Pending,
            next: None,
            on_finish: None,
        }
    }

    /// Chain a follow-up task started when this one succeeds.
    pub fn then(mut self, factory: impl FnOnce(&mut TickCtx<'_>) -> Task + 'static) -> Self {
        self.next = Some(Box::new(factory));
        self
    }

    /// Run `hook` when this task reaches any terminal state. The only
    /// guaranteed-cleanup mechanism.
    pub fn finally(mut self, hook: impl FnOnce(&mut TickCtx<'_>) + 'static) -> Self {
        self.on_finish = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &'static str {
        self.step.name()
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    fn finish(&mut self, ctx: &mut TickCtx<'_>) {
        if let Some(hook) = self.on_finish.take() {
            hook(ctx);
        }
    }
}

/// Drives the task stack. The top of the stack is the active task; spawned
/// sub-tasks push on top and pop when they finish.
#[derive(Default)]
pub struct TaskRunner {
    stack: Vec<Task>,
}

impl TaskRunner {
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.stack.last().map(Task::name)
    }

    /// Start a task. When another task is active the new one runs as its
    /// sub-task.
    pub fn spawn(&mut self, task: Task) {
        self.stack.push(task);
    }

    /// Advance the active task by one tick.
    pub fn tick(&mut self, ctx: &mut TickCtx<'_>) {
        let Some(task) = self.stack.last_mut() else {
            return;
        };

        if task.state == TaskState::Pending {
            task.state = TaskState::Running;
            ctx.events.push(PlanEvent::TaskStarted {
                name: task.name().to_string(),
            });
            task.step.on_start(ctx);
            if self.adopt_spawned(ctx) {
                return;
            }
        }

        let task = self
            .stack
            .last_mut()
            .filter(|t| t.state == TaskState::Running);
        let Some(task) = task else {
            return;
        };
        let poll = task.step.advance(ctx);
        match poll {
            Poll::Pending => {
                self.adopt_spawned(ctx);
            }
            Poll::Succeeded => {
                ctx.spawned.clear();
                self.complete(ctx);
            }
            Poll::Failed(reason) => {
                ctx.spawned.clear();
                self.fail(ctx, reason);
            }
        }
    }

    /// Cancel the whole stack, innermost task first.
    pub fn cancel_all(&mut self, ctx: &mut TickCtx<'_>) {
        while let Some(mut task) = self.stack.pop() {
            task.step.on_cancel(ctx);
            task.state = TaskState::Cancelled;
            ctx.events.push(PlanEvent::TaskCancelled {
                name: task.name().to_string(),
            });
            task.finish(ctx);
        }
    }

    fn adopt_spawned(&mut self, ctx: &mut TickCtx<'_>) -> bool {
        if ctx.spawned.is_empty() {
            return false;
        }
        self.stack.append(&mut ctx.spawned);
        true
    }

    fn complete(&mut self, ctx: &mut TickCtx<'_>) {
        let Some(mut task) = self.stack.pop() else {
            return;
        };
        task.state = TaskState::Succeeded;
        ctx.events.push(PlanEvent::TaskSucceeded {
            name: task.name().to_string(),
        });
        let next = task.next.take();
        task.finish(ctx);
        if let Some(factory) = next {
            self.stack.push(factory(ctx));
        }
    }

    fn fail(&mut self, ctx: &mut TickCtx<'_>, reason: String) {
        let Some(mut task) = self.stack.pop() else {
            return;
        };
        let mut chain = format!("{}: {}", task.name(), reason);
        task.state = TaskState::Failed(reason);
        ctx.events.push(PlanEvent::TaskFailed {
            name: task.name().to_string(),
            reason: chain.clone(),
        });
        task.finish(ctx);

        // Bubble the failure through every ancestor.
        while let Some(mut parent) = self.stack.pop() {
            parent.step.on_cancel(ctx);
            chain = format!("{} <- {}", parent.name(), chain);
            parent.state = TaskState::Failed(chain.clone());
            ctx.events.push(PlanEvent::TaskFailed {
                name: parent.name().to_string(),
                reason: chain.clone(),
            });
            parent.finish(ctx);
        }
    }
}
