// gridwright_sim — pure Rust construction-planning library.
//
// This crate contains all planning logic for Gridwright: the voxel world
// snapshot, target matching, the planning pass, ranking, resource
// arbitration, and the multi-tick task substrate. It has no frontend
// dependencies and can be tested, benchmarked, and run headless.
//
// Module overview:
// - `sim.rs`:       Top-level SimState, the tick loop and its phase order.
// - `world.rs`:     Dense 3D voxel grid snapshot, player, inventory, raycast.
// - `blueprint.rs`: Position -> target mappings (static, layered, tracking).
// - `target.rs`:    TargetState — what a position should become, and matching.
// - `planner.rs`:   The planning pass — classify every blueprint position.
// - `rank.rs`:      Rank bands, BuildResult, and the tie-break comparator.
// - `context.rs`:   Break/interact contexts and their comparator keys.
// - `build.rs`:     The build task — plan, rank, act on the best candidate.
// - `rotation.rs`:  Aim ownership (one view direction at a time).
// - `hotbar.rs`:    Active-slot ownership and silent-swap restoration.
// - `inventory.rs`: Inventory click queue (swaps and throws).
// - `interact.rs`:  The single world action per tick; progressive mining.
// - `transfer.rs`:  SlotTransfer — restock a slot region from the inventory.
// - `task.rs`:      Polled task state machines, chaining, sub-tasks.
// - `request.rs`:   The resource-claim protocol shared by the managers.
// - `event.rs`:     Narrative PlanEvents emitted by every tick.
// - `config.rs`:    PlannerConfig — all tunable parameters.
// - `prng`:         Re-exported from `gridwright_prng` — xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:     BlockPos, blocks, items, rotations, sort policies.
//
// **Critical constraint: determinism.** Planning is a pure function:
// `(world, structure, config, seed) -> results`. All randomness comes from
// a seeded xoshiro256++ PRNG (re-exported from `gridwright_prng`), forked
// per position so parallel evaluation stays order-independent. No
// `HashMap` iteration, no system time, no OS entropy. Use `BTreeMap` for
// ordered collections.

pub mod blueprint;
pub mod build;
pub mod config;
pub mod context;
pub mod event;
pub mod hotbar;
pub mod interact;
pub mod inventory;
pub mod planner;
pub use gridwright_prng as prng;
pub mod rank;
pub mod request;
pub mod rotation;
pub mod sim;
pub mod target;
pub mod task;
pub mod transfer;
pub mod types;
pub mod world;
