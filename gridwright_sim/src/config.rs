// All tunable parameters for the planner, grouped by subsystem.
//
// Everything derives `Serialize`/`Deserialize` with per-field defaults so a
// partial JSON config overrides only what it names. `PlannerConfig::default()`
// is the reference configuration the tests run against.

use serde::{Deserialize, Serialize};

use crate::types::{BlockId, ItemId, SortMode};

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PlannerConfig {
    #[serde(default)]
    pub reach: ReachConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub hotbar: HotbarConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReachConfig {
    /// Maximum distance from the eye to a clickable point.
    pub block_reach: f64,
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self { block_reach: 4.5 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Maximum combined angular movement per tick, in degrees.
    pub turn_speed: f64,
    /// Angular distance below which a rotation request counts as settled.
    pub settle_epsilon: f64,
    /// Ticks an accepted request stays claimed without resubmission.
    pub keep_ticks: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            turn_speed: 40.0,
            settle_epsilon: 0.001,
            keep_ticks: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HotbarConfig {
    /// Slot changes allowed within one tick.
    pub swaps_per_tick: u32,
    /// Ticks to wait after a swap before the next one.
    pub swap_delay: u32,
    /// Ticks the new slot must be held before actions use it.
    pub swap_pause: u32,
    /// Ticks an accepted request stays claimed without resubmission.
    pub keep_ticks: u32,
}

impl Default for HotbarConfig {
    fn default() -> Self {
        Self {
            swaps_per_tick: 1,
            swap_delay: 0,
            swap_pause: 1,
            keep_ticks: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Slot click actions executed per tick.
    pub clicks_per_tick: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { clicks_per_tick: 2 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Tie-break policy applied to candidate distance.
    pub sort: SortMode,
    /// Upper bound on positions with an in-flight action.
    pub max_pending: usize,
    /// Finish the build task once every position satisfies its target.
    /// When false the task keeps monitoring and repairs regressions.
    pub finish_on_done: bool,
    /// Allow placement clicks with no supporting neighbor face.
    pub air_place: bool,
    /// Refuse to mine blocks adjacent to fluid sources.
    pub handle_fluids: bool,
    /// Blocks never mined when the goal is clearing.
    pub ignored_blocks: Vec<BlockId>,
    /// Filler items considered expendable by transfers and scaffolding.
    pub disposable: Vec<ItemId>,
    /// Items the planner must never place or equip.
    pub disabled_items: Vec<ItemId>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sort: SortMode::Closest,
            max_pending: 4,
            finish_on_done: true,
            air_place: false,
            handle_fluids: true,
            ignored_blocks: vec![BlockId::TallGrass],
            disposable: vec![
                ItemId::Block(BlockId::Cobblestone),
                ItemId::Block(BlockId::Dirt),
                ItemId::Block(BlockId::Gravel),
            ],
            disabled_items: Vec::new(),
        }
    }
}
