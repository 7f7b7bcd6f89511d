// Build contexts: one proposed world action at one position.
//
// A context is constructed fresh each planning pass from the current world
// state and discarded after the pass. It bundles everything execution will
// need — the click point, the aim, the hotbar slot, the observed and
// expected states — plus the precomputed keys the ranking comparator reads.
// Contexts never mutate anything; they are descriptions.

use serde::{Deserialize, Serialize};

use crate::types::{BlockPos, BlockState, Direction, FluidKind, Rotation, SortMode, Vec3};

/// Per-block height bias applied to falling-block break candidates.
const FALLING_SORT_BIAS: f64 = 0.01;

/// Where a click lands: the exact point, the block it is on, and the face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitInfo {
    pub point: Vec3,
    pub block: BlockPos,
    pub face: Direction,
}

/// A proposed mining action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakContext {
    pub pos: BlockPos,
    pub hit: HitInfo,
    pub rotation: Rotation,
    /// Hotbar slot holding the chosen tool.
    pub slot: usize,
    /// State observed at the position this pass.
    pub state: BlockState,
    /// Zero-duration break.
    pub instant: bool,
    /// Total mining duration in ticks.
    pub break_ticks: u32,
    pub distance: f64,
    /// Stable per-candidate random tie-break key.
    pub jitter: f64,
}

/// A proposed placement or use action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractContext {
    pub pos: BlockPos,
    pub hit: HitInfo,
    pub rotation: Rotation,
    /// Hotbar slot holding the item to place or use.
    pub slot: usize,
    /// State observed at the position this pass.
    pub state: BlockState,
    /// State the action is expected to produce.
    pub expected: BlockState,
    /// True for placements, false for pure use clicks.
    pub placing: bool,
    /// The click must be made while crouching.
    pub sneak: bool,
    /// Fluid being displaced by the placement, if any.
    pub fluid: Option<FluidKind>,
    pub fluid_level: u8,
    pub distance: f64,
    pub jitter: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BuildContext {
    Break(BreakContext),
    Interact(InteractContext),
}

/// Snapshot of the shared-resource state the comparator judges contexts
/// against: current aim, acknowledged slot, crouch state, and the
/// configured sort policy.
#[derive(Clone, Copy, Debug)]
pub struct RankView {
    pub active_rotation: Rotation,
    pub server_slot: usize,
    pub sneaking: bool,
    pub sort: SortMode,
}

impl BuildContext {
    pub fn pos(&self) -> BlockPos {
        match self {
            BuildContext::Break(c) => c.pos,
            BuildContext::Interact(c) => c.pos,
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            BuildContext::Break(c) => c.rotation,
            BuildContext::Interact(c) => c.rotation,
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            BuildContext::Break(c) => c.slot,
            BuildContext::Interact(c) => c.slot,
        }
    }

    pub fn hit(&self) -> HitInfo {
        match self {
            BuildContext::Break(c) => c.hit,
            BuildContext::Interact(c) => c.hit,
        }
    }

    pub fn distance(&self) -> f64 {
        match self {
            BuildContext::Break(c) => c.distance,
            BuildContext::Interact(c) => c.distance,
        }
    }

    /// Distance as the sort policies see it. Falling blocks get a height
    /// bias so columns are mined top-down instead of triggering cascades.
    fn sort_distance(&self) -> f64 {
        match self {
            BuildContext::Break(c) if c.state.id.is_falling() => {
                c.distance - c.pos.y as f64 * FALLING_SORT_BIAS
            }
            _ => self.distance(),
        }
    }

    fn jitter(&self) -> f64 {
        match self {
            BuildContext::Break(c) => c.jitter,
            BuildContext::Interact(c) => c.jitter,
        }
    }

    fn fluid(&self) -> Option<FluidKind> {
        match self {
            BuildContext::Break(_) => None,
            BuildContext::Interact(c) => c.fluid,
        }
    }

    fn fluid_level(&self) -> u8 {
        match self {
            BuildContext::Break(_) => 0,
            BuildContext::Interact(c) => c.fluid_level,
        }
    }

    /// Comparator key 1: water first, lava next, dry contexts last.
    pub(crate) fn fluid_class(&self) -> u8 {
        match self.fluid() {
            Some(FluidKind::Water) => 0,
            Some(FluidKind::Lava) => 1,
            None => 2,
        }
    }

    /// Comparator key 2a: elevation, only meaningful for flowing fluid.
    pub(crate) fn displace_elevation(&self) -> i64 {
        if self.fluid().is_some() && self.fluid_level() != 0 {
            self.pos().y as i64
        } else {
            i64::MIN
        }
    }

    /// Comparator key 2b: flowing-fluid level.
    pub(crate) fn displace_level(&self) -> u8 {
        if self.fluid().is_some() {
            self.fluid_level()
        } else {
            0
        }
    }

    /// Comparator key 3: the required tool is already the active slot.
    pub(crate) fn tool_already_active(&self, view: &RankView) -> bool {
        view.sort == SortMode::Tool && self.slot() == view.server_slot
    }

    /// Comparator key 4: the configured sort policy's scalar, smaller is
    /// better.
    pub(crate) fn sort_key(&self, view: &RankView) -> f64 {
        match view.sort {
            SortMode::Closest | SortMode::Tool => self.sort_distance(),
            SortMode::Farthest => -self.sort_distance(),
            SortMode::Rotation => self.rotation().dist(view.active_rotation),
            SortMode::Random => self.jitter(),
        }
    }

    /// Comparator key 5: the action's crouch requirement matches the
    /// player's current crouch state.
    pub(crate) fn sneak_matches(&self, view: &RankView) -> bool {
        match self {
            BuildContext::Break(_) => false,
            BuildContext::Interact(c) => c.sneak == view.sneaking,
        }
    }

    /// Comparator key 6: no slot switch needed.
    pub(crate) fn slot_matches(&self, view: &RankView) -> bool {
        self.slot() == view.server_slot
    }

    /// Comparator key 7: instant break.
    pub(crate) fn instant_break(&self) -> bool {
        matches!(self, BuildContext::Break(c) if c.instant)
    }

    /// Render description: position plus fill and outline colors.
    pub fn visual(&self) -> (BlockPos, [f32; 4], [f32; 4]) {
        match self {
            BuildContext::Break(c) => {
                (c.pos, [0.9, 0.2, 0.2, 0.3], [0.9, 0.2, 0.2, 0.9])
            }
            BuildContext::Interact(c) if c.placing => {
                (c.pos, [0.2, 0.8, 0.3, 0.3], [0.2, 0.8, 0.3, 0.9])
            }
            BuildContext::Interact(c) => {
                (c.pos, [0.9, 0.8, 0.2, 0.3], [0.9, 0.8, 0.2, 0.9])
            }
        }
    }
}
