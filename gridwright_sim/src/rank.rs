// Outcome taxonomy and candidate ranking.
//
// Every planning pass classifies each blueprint position into a
// `BuildResult`, whose `Rank` falls into one of four bands:
//
// - success:    an executable action was found (break or place),
// - solvable:   transient obstacle, the position is retried next pass,
// - unsolvable: permanent, the position must be dropped by the caller,
// - non-issue:  nothing to do (already satisfied, ignored, no action).
//
// `Rank`'s declaration order *is* the primary comparison key; the derived
// `Ord` is load-bearing. When two results both carry a context, a fixed
// tie-break chain refines the ordering. The chain's key sequence is part
// of the observable behavior — reordering "equivalent" keys changes which
// candidate wins — so it must not be rearranged.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::context::{BreakContext, BuildContext, InteractContext, RankView};
use crate::transfer::StackSelection;
use crate::types::{BlockPos, BlockState, FluidKind, ItemId, ItemStack};

/// Closed, explicitly ordered outcome classification. Smaller is better.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rank {
    // Success band.
    BreakSuccess,
    PlaceSuccess,
    // Solvable band: retry next pass.
    WrongItem,
    ItemCantMine,
    Submerge,
    BlockedByFluid,
    PlayerOnTop,
    BlockedByPlayer,
    BlockedByEntity,
    NotExposed,
    NotVisible,
    OutOfReach,
    ChunkNotLoaded,
    // Unsolvable band: drop the position.
    OutOfWorld,
    Restricted,
    NoPermission,
    Unbreakable,
    CantReplace,
    ScaffoldExceeded,
    FeatureDisabled,
    UnexpectedPosition,
    IllegalUsage,
    NoIntegrity,
    // Non-issue band: nothing to do.
    Done,
    Ignored,
    NoMatch,
}

impl Rank {
    pub fn is_success(&self) -> bool {
        matches!(self, Rank::BreakSuccess | Rank::PlaceSuccess)
    }

    pub fn is_solvable(&self) -> bool {
        (Rank::WrongItem..=Rank::ChunkNotLoaded).contains(self)
    }

    pub fn is_unsolvable(&self) -> bool {
        (Rank::OutOfWorld..=Rank::NoIntegrity).contains(self)
    }

    pub fn is_non_issue(&self) -> bool {
        (Rank::Done..=Rank::NoMatch).contains(self)
    }
}

/// Outcome of evaluating one blueprint position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BuildResult {
    /// Executable mining action.
    Break(BreakContext),
    /// Executable placement or use action.
    Place(InteractContext),
    /// The needed item is not in the hotbar; a transfer can fix this.
    WrongItem {
        pos: BlockPos,
        selection: StackSelection,
        held: ItemStack,
    },
    /// No item anywhere can mine this block.
    ItemCantMine { pos: BlockPos, held: ItemStack },
    /// The position itself is a fluid that must be displaced.
    Submerge { pos: BlockPos, fluid: FluidKind },
    /// Mining would let adjacent fluid flood the opened space.
    BlockedByFluid {
        pos: BlockPos,
        sources: SmallVec<[BlockPos; 4]>,
    },
    /// The player stands on the block to be mined.
    PlayerOnTop { pos: BlockPos },
    BlockedByPlayer { pos: BlockPos },
    BlockedByEntity {
        pos: BlockPos,
        entities: SmallVec<[u64; 2]>,
    },
    /// No non-solid neighbor exposes a face to click.
    NotExposed { pos: BlockPos },
    NotVisible { pos: BlockPos },
    OutOfReach { pos: BlockPos, distance: f64 },
    ChunkNotLoaded { pos: BlockPos },
    OutOfWorld { pos: BlockPos },
    /// The player may not modify the world at all.
    Restricted { pos: BlockPos },
    /// Operator-only block.
    NoPermission { pos: BlockPos },
    Unbreakable { pos: BlockPos },
    /// The occupying state cannot be replaced by a placement.
    CantReplace { pos: BlockPos },
    /// No supporting face to place against.
    ScaffoldExceeded { pos: BlockPos },
    FeatureDisabled { pos: BlockPos, item: ItemId },
    /// The click would commit at a different position than intended.
    UnexpectedPosition { pos: BlockPos, actual: BlockPos },
    IllegalUsage { pos: BlockPos },
    /// The placement would settle into a state that misses the target.
    NoIntegrity {
        pos: BlockPos,
        expected: BlockState,
        would_be: BlockState,
    },
    Done { pos: BlockPos },
    Ignored { pos: BlockPos },
    NoMatch { pos: BlockPos },
}

impl BuildResult {
    pub fn rank(&self) -> Rank {
        match self {
            BuildResult::Break(_) => Rank::BreakSuccess,
            BuildResult::Place(_) => Rank::PlaceSuccess,
            BuildResult::WrongItem { .. } => Rank::WrongItem,
            BuildResult::ItemCantMine { .. } => Rank::ItemCantMine,
            BuildResult::Submerge { .. } => Rank::Submerge,
            BuildResult::BlockedByFluid { .. } => Rank::BlockedByFluid,
            BuildResult::PlayerOnTop { .. } => Rank::PlayerOnTop,
            BuildResult::BlockedByPlayer { .. } => Rank::BlockedByPlayer,
            BuildResult::BlockedByEntity { .. } => Rank::BlockedByEntity,
            BuildResult::NotExposed { .. } => Rank::NotExposed,
            BuildResult::NotVisible { .. } => Rank::NotVisible,
            BuildResult::OutOfReach { .. } => Rank::OutOfReach,
            BuildResult::ChunkNotLoaded { .. } => Rank::ChunkNotLoaded,
            BuildResult::OutOfWorld { .. } => Rank::OutOfWorld,
            BuildResult::Restricted { .. } => Rank::Restricted,
            BuildResult::NoPermission { .. } => Rank::NoPermission,
            BuildResult::Unbreakable { .. } => Rank::Unbreakable,
            BuildResult::CantReplace { .. } => Rank::CantReplace,
            BuildResult::ScaffoldExceeded { .. } => Rank::ScaffoldExceeded,
            BuildResult::FeatureDisabled { .. } => Rank::FeatureDisabled,
            BuildResult::UnexpectedPosition { .. } => Rank::UnexpectedPosition,
            BuildResult::IllegalUsage { .. } => Rank::IllegalUsage,
            BuildResult::NoIntegrity { .. } => Rank::NoIntegrity,
            BuildResult::Done { .. } => Rank::Done,
            BuildResult::Ignored { .. } => Rank::Ignored,
            BuildResult::NoMatch { .. } => Rank::NoMatch,
        }
    }

    pub fn pos(&self) -> BlockPos {
        match self {
            BuildResult::Break(c) => c.pos,
            BuildResult::Place(c) => c.pos,
            BuildResult::WrongItem { pos, .. }
            | BuildResult::ItemCantMine { pos, .. }
            | BuildResult::Submerge { pos, .. }
            | BuildResult::BlockedByFluid { pos, .. }
            | BuildResult::PlayerOnTop { pos }
            | BuildResult::BlockedByPlayer { pos }
            | BuildResult::BlockedByEntity { pos, .. }
            | BuildResult::NotExposed { pos }
            | BuildResult::NotVisible { pos }
            | BuildResult::OutOfReach { pos, .. }
            | BuildResult::ChunkNotLoaded { pos }
            | BuildResult::OutOfWorld { pos }
            | BuildResult::Restricted { pos }
            | BuildResult::NoPermission { pos }
            | BuildResult::Unbreakable { pos }
            | BuildResult::CantReplace { pos }
            | BuildResult::ScaffoldExceeded { pos }
            | BuildResult::FeatureDisabled { pos, .. }
            | BuildResult::UnexpectedPosition { pos, .. }
            | BuildResult::IllegalUsage { pos }
            | BuildResult::NoIntegrity { pos, .. }
            | BuildResult::Done { pos }
            | BuildResult::Ignored { pos }
            | BuildResult::NoMatch { pos } => *pos,
        }
    }

    /// The executable context, for success results.
    pub fn context(&self) -> Option<BuildContext> {
        match self {
            BuildResult::Break(c) => Some(BuildContext::Break(c.clone())),
            BuildResult::Place(c) => Some(BuildContext::Interact(c.clone())),
            _ => None,
        }
    }

    /// Solvable by moving items, rather than by waiting.
    pub fn is_resolvable(&self) -> bool {
        matches!(self, BuildResult::WrongItem { .. })
    }

    /// Movement that would unblock this result. Advisory data for an
    /// external navigator; nothing in this crate moves the player.
    pub fn nav_hint(&self, reach: f64) -> Option<NavHint> {
        match self {
            BuildResult::OutOfReach { pos, .. } | BuildResult::NotVisible { pos } => {
                Some(NavHint::Approach { pos: *pos, within: reach })
            }
            BuildResult::PlayerOnTop { pos } | BuildResult::BlockedByPlayer { pos } => {
                Some(NavHint::StepOff { pos: *pos })
            }
            _ => None,
        }
    }
}

/// A movement suggestion attached to a solvable result.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NavHint {
    /// Get within `within` blocks of the position.
    Approach { pos: BlockPos, within: f64 },
    /// Stop standing on or inside the position.
    StepOff { pos: BlockPos },
}

/// Total order over results; smaller sorts first and wins the pass.
///
/// When both results carry a context the tie-break chain below applies in
/// strict sequence. The order of keys is deliberate and observable — do
/// not reorder.
pub fn compare_results(a: &BuildResult, b: &BuildResult, view: &RankView) -> Ordering {
    match (a.context(), b.context()) {
        (Some(ca), Some(cb)) => compare_contexts(&ca, &cb, view)
            .then_with(|| a.pos().cmp(&b.pos())),
        _ => a
            .rank()
            .cmp(&b.rank())
            .then_with(|| secondary_key(a, b))
            .then_with(|| a.pos().cmp(&b.pos())),
    }
}

fn compare_contexts(a: &BuildContext, b: &BuildContext, view: &RankView) -> Ordering {
    // 1. Fluid class: water, lava, then dry.
    a.fluid_class()
        .cmp(&b.fluid_class())
        // 2. Flowing-fluid displacement: higher elevation, higher level.
        .then_with(|| b.displace_elevation().cmp(&a.displace_elevation()))
        .then_with(|| b.displace_level().cmp(&a.displace_level()))
        // 3. Required tool already in the active slot (Tool policy only).
        .then_with(|| b.tool_already_active(view).cmp(&a.tool_already_active(view)))
        // 4. Configured sort policy over the distance metric.
        .then_with(|| a.sort_key(view).total_cmp(&b.sort_key(view)))
        // 5. Crouch state matches.
        .then_with(|| b.sneak_matches(view).cmp(&a.sneak_matches(view)))
        // 6. No slot switch needed.
        .then_with(|| b.slot_matches(view).cmp(&a.slot_matches(view)))
        // 7. Instant breaks first.
        .then_with(|| b.instant_break().cmp(&a.instant_break()))
}

/// Within-rank refinement for non-context results.
fn secondary_key(a: &BuildResult, b: &BuildResult) -> Ordering {
    match (a, b) {
        (
            BuildResult::OutOfReach { distance: da, .. },
            BuildResult::OutOfReach { distance: db, .. },
        ) => da.total_cmp(db),
        _ => Ordering::Equal,
    }
}
