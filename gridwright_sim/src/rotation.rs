// Aim ownership: interpolates the acknowledged view direction toward a
// requested target over ticks.
//
// `server` is the direction the world has last acknowledged; `active` is
// the direction the current request wants. Resolution steps `server`
// toward `active` by at most `turn_speed` degrees per tick. A request is
// done once the remaining angular distance is within `settle_epsilon`.

use serde::{Deserialize, Serialize};

use crate::config::RotationConfig;
use crate::event::PlanEvent;
use crate::request::{ResourceManager, Submission};
use crate::types::Rotation;

/// Two requests within this angular distance are considered equivalent.
const SAME_TARGET_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotationRequest {
    pub target: Rotation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ActiveAim {
    target: Rotation,
    /// Ticks since the last submission that claimed this aim.
    age: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotationManager {
    cfg: RotationConfig,
    server: Rotation,
    active: Option<ActiveAim>,
    settled_last_resolve: bool,
}

impl RotationManager {
    pub fn new(cfg: RotationConfig) -> Self {
        Self {
            cfg,
            server: Rotation::default(),
            active: None,
            settled_last_resolve: false,
        }
    }

    /// The last acknowledged view direction.
    pub fn server(&self) -> Rotation {
        self.server
    }

    /// The direction currently being converged toward, if any.
    pub fn active_target(&self) -> Option<Rotation> {
        self.active.as_ref().map(|a| a.target)
    }

    fn settled(&self, target: Rotation) -> bool {
        self.server.dist(target) <= self.cfg.settle_epsilon
    }

    /// Step the acknowledged direction toward the active target.
    pub fn resolve(&mut self, events: &mut Vec<PlanEvent>) {
        let Some(active) = &self.active else {
            self.settled_last_resolve = false;
            return;
        };
        let was_settled = self.settled(active.target);
        self.server = self.server.step_toward(active.target, self.cfg.turn_speed);
        let now_settled = self.settled(active.target);
        if now_settled && !was_settled {
            events.push(PlanEvent::RotationSettled {
                yaw: self.server.yaw,
                pitch: self.server.pitch,
            });
        }
        self.settled_last_resolve = now_settled;
    }

    /// Age the claim; release it once it outlives its grace window.
    pub fn end_tick(&mut self) {
        if let Some(active) = &mut self.active {
            active.age += 1;
            if active.age > self.cfg.keep_ticks {
                self.active = None;
            }
        }
    }

    /// Force the aim to an externally observed direction, dropping any
    /// claim (e.g. after the world teleports the player's view).
    pub fn reset(&mut self, rotation: Rotation) {
        self.server = rotation;
        self.active = None;
        self.settled_last_resolve = false;
    }
}

impl ResourceManager for RotationManager {
    type Request = RotationRequest;

    fn submit(&mut self, request: RotationRequest) -> Submission {
        if let Some(active) = &mut self.active {
            if active.target.dist(request.target) <= SAME_TARGET_EPSILON {
                // Equivalent request: refresh the claim, report progress.
                active.age = 0;
                return if self.settled(request.target) {
                    Submission::satisfied()
                } else {
                    Submission::pending()
                };
            }
            if active.age == 0 {
                // Mid-transition toward a different target: fail fast.
                return Submission::rejected();
            }
        }
        let done = self.settled(request.target);
        self.active = Some(ActiveAim {
            target: request.target,
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

    fn manager() -> RotationManager {
        RotationManager::new(RotationConfig::default())
    }

    fn target(yaw: f64) -> RotationRequest {
        RotationRequest {
            target: Rotation::new(yaw, 10.0),
        }
    }

    #[test]
    fn resubmission_same_tick_is_idempotent() {
        let mut m = manager();
        let a = m.submit(target(90.0));
        let b = m.submit(target(90.0));
        assert!(a.accepted && b.accepted);
        assert_eq!(a.done, b.done);
    }

    #[test]
    fn mismatched_target_fails_fast() {
        let mut m = manager();
        assert!(m.submit(target(90.0)).accepted);
        assert!(!m.submit(target(-45.0)).accepted);
    }

    #[test]
    fn converges_then_reports_done() {
        let mut m = manager();
        let mut events = Vec::new();
        let mut done_tick = None;
        for tick in 0..10 {
            let sub = m.submit(target(90.0));
            assert!(sub.accepted);
            if sub.done {
                done_tick = Some(tick);
                break;
            }
            m.resolve(&mut events);
            m.end_tick();
        }
        // 90 degrees yaw + 10 pitch at 40 deg/tick needs three resolves.
        assert_eq!(done_tick, Some(3));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlanEvent::RotationSettled { .. })));
    }

    #[test]
    fn stale_claim_is_released() {
        let mut m = manager();
        assert!(m.submit(target(90.0)).accepted);
        m.end_tick();
        m.end_tick();
        // Claim expired without resubmission; a new target is accepted.
        assert!(m.submit(target(-45.0)).accepted);
    }

    #[test]
    fn reset_drops_claim() {
        let mut m = manager();
        m.submit(target(90.0));
        m.reset(Rotation::new(5.0, 5.0));
        assert!(m.active_target().is_none());
        assert_eq!(m.server().yaw, 5.0);
    }
}
