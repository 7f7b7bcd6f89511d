// The planning pass: classify every blueprint position into a
// `BuildResult` against the current world snapshot.
//
// ## Pass structure
// Positions are evaluated independently and in parallel with rayon, then
// collected in blueprint order, so a pass is a pure deterministic function
// of `(world, structure, config, view, seed)`. Randomness for the `Random`
// sort policy comes from a per-position stream forked off the pass seed,
// which keeps results independent of evaluation order.
//
// ## Evaluation order per position
// Cheap pre-checks (bounds, chunk loading, already satisfied, permissions)
// run first, then the action simulation: a break simulation when the
// occupying block must go, an interact simulation when something must be
// placed or used. Each simulation either yields an executable context or
// names the obstacle precisely enough for the ranker and the caller to act
// on it.
//
// **Critical constraint: determinism.** Identical inputs must produce an
// identical result vector. No wall clock, no ambient randomness, no
// iteration over unordered maps.

use gridwright_prng::GameRng;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::config::PlannerConfig;
use crate::context::{BreakContext, HitInfo, InteractContext, RankView};
use crate::rank::{compare_results, BuildResult};
use crate::target::TargetState;
use crate::transfer::{StackMatcher, StackSelection};
use crate::types::{BlockId, BlockPos, BlockState, Direction, ItemId, Rotation, Vec3};
use crate::world::{WorldView, HOTBAR_SIZE};

use std::collections::BTreeMap;

/// Evaluate every position of `structure` against the world.
pub fn plan_pass(
    world: &WorldView,
    structure: &BTreeMap<BlockPos, TargetState>,
    cfg: &PlannerConfig,
    view: &RankView,
    seed: u64,
) -> Vec<BuildResult> {
    let entries: Vec<(&BlockPos, &TargetState)> = structure.iter().collect();
    entries
        .par_iter()
        .map(|(pos, target)| evaluate_position(world, **pos, target, cfg, view, seed))
        .collect()
}

/// Sort results so the best candidate is first.
pub fn rank_results(results: &mut [BuildResult], view: &RankView) {
    results.sort_by(|a, b| compare_results(a, b, view));
}

/// Classify a single position.
pub fn evaluate_position(
    world: &WorldView,
    pos: BlockPos,
    target: &TargetState,
    cfg: &PlannerConfig,
    view: &RankView,
    seed: u64,
) -> BuildResult {
    if !world.in_bounds(pos) {
        return BuildResult::OutOfWorld { pos };
    }
    if !world.is_loaded(pos) {
        return BuildResult::ChunkNotLoaded { pos };
    }
    let state = world.get(pos);
    if target.matches(world, pos, &state, &cfg.build) {
        return BuildResult::Done { pos };
    }
    if !world.player.allow_modify_world {
        return BuildResult::Restricted { pos };
    }
    let jitter = GameRng::new(seed ^ pos.key()).next_f64();

    if target.is_empty() {
        if let Some(fluid) = state.id.fluid() {
            return BuildResult::Submerge { pos, fluid };
        }
        if state.id.is_air() {
            return BuildResult::NoMatch { pos };
        }
        if cfg.build.ignored_blocks.contains(&state.id) {
            return BuildResult::Ignored { pos };
        }
        return break_sim(world, pos, &state, cfg, view, jitter);
    }

    if let Some(result) = use_click_sim(world, pos, target, &state, cfg, view, jitter) {
        return result;
    }

    if !state.id.is_replaceable() {
        // Wrong block in the way: it must be cleared before placing.
        return break_sim(world, pos, &state, cfg, view, jitter);
    }

    interact_sim(world, pos, target, &state, cfg, view, jitter)
}

enum FaceScanMiss {
    NotExposed,
    OutOfReach(f64),
    NotVisible,
}

struct FaceHit {
    point: Vec3,
    face: Direction,
    distance: f64,
}

/// Nearest visible, reachable point on an exposed face of `pos`.
fn scan_faces(world: &WorldView, eye: Vec3, pos: BlockPos, reach: f64) -> Result<FaceHit, FaceScanMiss> {
    let mut nearest_any = f64::INFINITY;
    let mut best: Option<FaceHit> = None;
    let mut exposed = false;
    for dir in Direction::ALL {
        if world.get(pos.offset(dir)).id.is_solid() {
            continue;
        }
        exposed = true;
        let point = pos.center() + dir.unit() * 0.5;
        let distance = eye.distance_to(point);
        nearest_any = nearest_any.min(distance);
        if distance > reach {
            continue;
        }
        if !world.can_see(eye, point, pos) {
            continue;
        }
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(FaceHit {
                point,
                face: dir,
                distance,
            });
        }
    }
    match best {
        Some(hit) => Ok(hit),
        None if !exposed => Err(FaceScanMiss::NotExposed),
        None if nearest_any > reach => Err(FaceScanMiss::OutOfReach(nearest_any)),
        None => Err(FaceScanMiss::NotVisible),
    }
}

/// Hotbar slot mining `block` fastest; equal speeds prefer the active
/// slot, then the lowest index.
fn best_mining_slot(world: &WorldView, block: BlockId, server_slot: usize) -> usize {
    let inv = &world.player.inventory;
    let mut best_slot = 0;
    let mut best_speed = f64::NEG_INFINITY;
    for i in 0..HOTBAR_SIZE {
        let speed = inv.slot(i).item.mining_speed(block);
        if speed > best_speed || (speed == best_speed && i == server_slot) {
            best_slot = i;
            best_speed = speed;
        }
    }
    best_slot
}

fn break_sim(
    world: &WorldView,
    pos: BlockPos,
    state: &BlockState,
    cfg: &PlannerConfig,
    view: &RankView,
    jitter: f64,
) -> BuildResult {
    if state.id.is_operator_block() {
        return BuildResult::NoPermission { pos };
    }
    if state.id.hardness() < 0.0 {
        return BuildResult::Unbreakable { pos };
    }
    if world.player.stands_on(pos) {
        return BuildResult::PlayerOnTop { pos };
    }

    if cfg.build.handle_fluids {
        // Opening this position must not let fluid pour in.
        let mut sources: SmallVec<[BlockPos; 4]> = SmallVec::new();
        let mut dirs: SmallVec<[Direction; 5]> = SmallVec::from_slice(&Direction::HORIZONTAL);
        dirs.push(Direction::Up);
        for dir in dirs {
            let neighbor = pos.offset(dir);
            if world.get(neighbor).id.fluid().is_some() {
                sources.push(neighbor);
            }
        }
        if !sources.is_empty() {
            return BuildResult::BlockedByFluid { pos, sources };
        }
    }

    let slot = best_mining_slot(world, state.id, view.server_slot);
    let held = world.player.inventory.slot(slot);
    if state.id.preferred_tool().is_some() && !held.item.is_suitable_for(state.id) {
        let selection = StackSelection::one(StackMatcher::ToolFor(state.id));
        let in_main = world
            .player
            .inventory
            .find_main(|s| selection.matcher.matches(s, &cfg.build))
            .is_some();
        if in_main {
            return BuildResult::WrongItem {
                pos,
                selection,
                held,
            };
        }
        if state.id.requires_tool() {
            return BuildResult::ItemCantMine { pos, held };
        }
        // Mining bare-handed is slow but legal.
    }

    let eye = world.player.eye_pos();
    let hit = match scan_faces(world, eye, pos, cfg.reach.block_reach) {
        Ok(hit) => hit,
        Err(FaceScanMiss::NotExposed) => return BuildResult::NotExposed { pos },
        Err(FaceScanMiss::OutOfReach(distance)) => {
            return BuildResult::OutOfReach { pos, distance }
        }
        Err(FaceScanMiss::NotVisible) => return BuildResult::NotVisible { pos },
    };

    let break_ticks = state.id.break_ticks(held.item).unwrap_or(0);
    BuildResult::Break(BreakContext {
        pos,
        hit: HitInfo {
            point: hit.point,
            block: pos,
            face: hit.face,
        },
        rotation: Rotation::looking_at(eye, hit.point),
        slot,
        state: state.clone(),
        instant: break_ticks == 0,
        break_ticks,
        distance: hit.distance,
        jitter,
    })
}

/// A pure use click: the right interactive block is present but its
/// properties miss the target (e.g. a lever in the wrong position).
fn use_click_sim(
    world: &WorldView,
    pos: BlockPos,
    target: &TargetState,
    state: &BlockState,
    cfg: &PlannerConfig,
    view: &RankView,
    jitter: f64,
) -> Option<BuildResult> {
    let TargetState::State {
        state: wanted,
        ignored: _,
    } = target
    else {
        return None;
    };
    if wanted.id != state.id || !state.id.is_interactive() || state.id.is_operator_block() {
        return None;
    }

    let eye = world.player.eye_pos();
    let result = match scan_faces(world, eye, pos, cfg.reach.block_reach) {
        Ok(hit) => BuildResult::Place(InteractContext {
            pos,
            hit: HitInfo {
                point: hit.point,
                block: pos,
                face: hit.face,
            },
            rotation: Rotation::looking_at(eye, hit.point),
            slot: view.server_slot,
            state: state.clone(),
            expected: wanted.clone(),
            placing: false,
            sneak: false,
            fluid: None,
            fluid_level: 0,
            distance: hit.distance,
            jitter,
        }),
        Err(FaceScanMiss::NotExposed) => BuildResult::NotExposed { pos },
        Err(FaceScanMiss::OutOfReach(distance)) => BuildResult::OutOfReach { pos, distance },
        Err(FaceScanMiss::NotVisible) => BuildResult::NotVisible { pos },
    };
    Some(result)
}

/// Face of `pos` most directly facing the eye, for support-free clicks.
fn face_toward(eye: Vec3, pos: BlockPos) -> Direction {
    let d = eye - pos.center();
    let (ax, ay, az) = (d.x.abs(), d.y.abs(), d.z.abs());
    if ax >= ay && ax >= az {
        if d.x > 0.0 { Direction::East } else { Direction::West }
    } else if ay >= az {
        if d.y > 0.0 { Direction::Up } else { Direction::Down }
    } else if d.z > 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}

fn interact_sim(
    world: &WorldView,
    pos: BlockPos,
    target: &TargetState,
    state: &BlockState,
    cfg: &PlannerConfig,
    view: &RankView,
    jitter: f64,
) -> BuildResult {
    let fluid = state.id.fluid();
    let fluid_level = state.fluid_level().unwrap_or(0);
    if fluid.is_some() && !cfg.build.handle_fluids {
        return BuildResult::CantReplace { pos };
    }

    let Some(selection) = target.stack_for() else {
        return BuildResult::NoMatch { pos };
    };
    let Some(expected) = target.state_for(&cfg.build) else {
        return BuildResult::NoMatch { pos };
    };
    let item = ItemId::Block(expected.id);
    if cfg.build.disabled_items.contains(&item) {
        return BuildResult::FeatureDisabled { pos, item };
    }
    if expected.id.is_operator_block() {
        return BuildResult::IllegalUsage { pos };
    }

    let slot = world
        .player
        .inventory
        .find_hotbar(|s| selection.matcher.matches(s, &cfg.build));
    let Some(slot) = slot else {
        return BuildResult::WrongItem {
            pos,
            selection,
            held: world.player.inventory.slot(view.server_slot),
        };
    };

    if expected.id.is_solid() {
        if world.player.intersects_block(pos) {
            return BuildResult::BlockedByPlayer { pos };
        }
        let entities: SmallVec<[u64; 2]> = world
            .entities
            .iter()
            .filter(|e| e.intersects_block(pos))
            .map(|e| e.id)
            .collect();
        if !entities.is_empty() {
            return BuildResult::BlockedByEntity { pos, entities };
        }
    }

    // Settle check: the placed state must actually stay what the target
    // wants.
    let below_solid = world.get(pos.down()).id.is_solid();
    if (expected.id.is_falling() || expected.id == BlockId::Torch) && !below_solid {
        return BuildResult::NoIntegrity {
            pos,
            expected,
            would_be: BlockState::of(BlockId::Air),
        };
    }

    let eye = world.player.eye_pos();
    let reach = cfg.reach.block_reach;
    let mut nearest_any = f64::INFINITY;
    let mut support: Option<(Vec3, BlockPos, Direction, f64)> = None;
    for dir in Direction::ALL {
        let neighbor = pos.offset(dir);
        if !world.get(neighbor).id.is_solid() {
            continue;
        }
        // Click the neighbor's face that borders the target position.
        let face = dir.opposite();
        let point = neighbor.center() + face.unit() * 0.5;
        let distance = eye.distance_to(point);
        nearest_any = nearest_any.min(distance);
        if distance > reach || !world.can_see(eye, point, neighbor) {
            continue;
        }
        if support.is_none_or(|s| distance < s.3) {
            support = Some((point, neighbor, face, distance));
        }
    }

    let (point, clicked, face, distance) = match support {
        Some(s) => s,
        None => {
            if nearest_any.is_finite() {
                return if nearest_any > reach {
                    BuildResult::OutOfReach {
                        pos,
                        distance: nearest_any,
                    }
                } else {
                    BuildResult::NotVisible { pos }
                };
            }
            if !cfg.build.air_place {
                return BuildResult::ScaffoldExceeded { pos };
            }
            if fluid.is_some() && fluid_level != 0 {
                // A support-free click into flowing fluid commits against
                // the surface below instead of the intended position.
                return BuildResult::UnexpectedPosition {
                    pos,
                    actual: pos.down(),
                };
            }
            let point = pos.center();
            let distance = eye.distance_to(point);
            if distance > reach {
                return BuildResult::OutOfReach { pos, distance };
            }
            if !world.can_see(eye, point, pos) {
                return BuildResult::NotVisible { pos };
            }
            (point, pos, face_toward(eye, pos), distance)
        }
    };

    let sneak = world.get(clicked).id.is_interactive();
    BuildResult::Place(InteractContext {
        pos,
        hit: HitInfo {
            point,
            block: clicked,
            face,
        },
        rotation: Rotation::looking_at(eye, point),
        slot,
        state: state.clone(),
        expected,
        placing: true,
        sneak,
        fluid,
        fluid_level,
        distance,
        jitter,
    })
}
