// Target states: what a blueprint position should become.
//
// A `TargetState` is a pure predicate over the position's current block
// state (plus, for `Support`, one neighbor) and a recipe for realizing the
// target: which item to hold and which concrete state satisfies it. The
// closed variant set is matched exhaustively everywhere; adding a variant
// is a compile-visible change.

use serde::{Deserialize, Serialize};

use crate::config::BuildConfig;
use crate::transfer::{StackMatcher, StackSelection};
use crate::types::{BlockId, BlockPos, BlockState, Direction, ItemId};
use crate::world::WorldView;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetState {
    /// Nothing may occupy the position; replaceables count as nothing.
    Empty,
    /// Strictly air. Unlike `Empty`, fluids and grass must be cleared.
    Air,
    /// Any solid block except the excluded identities.
    Solid { exclude: Vec<BlockId> },
    /// Satisfied if the position or its neighbor toward `direction` is
    /// solid — a prerequisite that may already hold for free.
    Support { direction: Direction },
    /// An exact state, compared modulo the ignored property keys.
    State {
        state: BlockState,
        ignored: Vec<String>,
    },
    /// A block identity, properties ignored.
    Block(BlockId),
    /// Any block realizable from an item matching the selection.
    Stack(StackSelection),
}

impl TargetState {
    /// Whether the current state at `pos` already satisfies this target.
    pub fn matches(&self, world: &WorldView, pos: BlockPos, state: &BlockState, cfg: &BuildConfig) -> bool {
        match self {
            TargetState::Empty => state.id.is_replaceable(),
            TargetState::Air => state.id.is_air(),
            TargetState::Solid { exclude } => {
                state.id.is_solid() && !exclude.contains(&state.id)
            }
            TargetState::Support { direction } => {
                state.id.is_solid() || world.get(pos.offset(*direction)).id.is_solid()
            }
            TargetState::State {
                state: expected,
                ignored,
            } => expected.matches_ignoring(state, ignored),
            TargetState::Block(id) => state.id == *id,
            TargetState::Stack(selection) => selection
                .matcher
                .matches(&crate::types::ItemStack::new(ItemId::Block(state.id), 1), cfg),
        }
    }

    /// True iff this target means "nothing should occupy the position".
    /// Distinguishes demolition goals from placement goals.
    pub fn is_empty(&self) -> bool {
        matches!(self, TargetState::Empty | TargetState::Air)
    }

    /// The item selection the agent needs in hand to realize this target,
    /// or `None` for demolition-only targets.
    pub fn stack_for(&self) -> Option<StackSelection> {
        match self {
            TargetState::Empty | TargetState::Air => None,
            TargetState::Solid { exclude } => Some(StackSelection::one(StackMatcher::SolidBlock {
                exclude: exclude.clone(),
            })),
            TargetState::Support { .. } => Some(StackSelection::one(StackMatcher::SolidBlock {
                exclude: Vec::new(),
            })),
            TargetState::State { state, .. } => {
                Some(StackSelection::one(StackMatcher::Item(ItemId::Block(state.id))))
            }
            TargetState::Block(id) => {
                Some(StackSelection::one(StackMatcher::Item(ItemId::Block(*id))))
            }
            TargetState::Stack(selection) => Some(selection.clone()),
        }
    }

    /// The concrete state that will satisfy this target, picked
    /// deterministically where the target admits several.
    pub fn state_for(&self, cfg: &BuildConfig) -> Option<BlockState> {
        match self {
            TargetState::Empty | TargetState::Air => None,
            TargetState::Solid { exclude } => {
                Some(BlockState::of(pick_filler(cfg, exclude)))
            }
            TargetState::Support { .. } => Some(BlockState::of(pick_filler(cfg, &[]))),
            TargetState::State { state, .. } => Some(state.clone()),
            TargetState::Block(id) => Some(BlockState::of(*id)),
            TargetState::Stack(selection) => {
                selection.matcher.example_block(cfg).map(BlockState::of)
            }
        }
    }
}

/// First configured disposable item that is a solid block outside the
/// exclusion set. Falls back to cobblestone so `Solid` targets always have
/// a concrete answer.
fn pick_filler(cfg: &BuildConfig, exclude: &[BlockId]) -> BlockId {
    cfg.disposable
        .iter()
        .filter_map(|item| item.as_block())
        .find(|b| b.is_solid() && !exclude.contains(b))
        .unwrap_or(BlockId::Cobblestone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldView {
        WorldView::new(8, 8, 8)
    }

    fn cfg() -> BuildConfig {
        BuildConfig::default()
    }

    #[test]
    fn empty_matches_exactly_replaceables() {
        let w = world();
        let p = BlockPos::new(0, 0, 0);
        let cases = [
            (BlockId::Air, true),
            (BlockId::Water, true),
            (BlockId::TallGrass, true),
            (BlockId::Stone, false),
            (BlockId::Torch, false),
        ];
        for (id, expected) in cases {
            let state = BlockState::of(id);
            assert_eq!(
                TargetState::Empty.matches(&w, p, &state, &cfg()),
                expected,
                "{id:?}"
            );
        }
    }

    #[test]
    fn air_matches_only_air() {
        let w = world();
        let p = BlockPos::new(0, 0, 0);
        for id in [BlockId::Air, BlockId::Water, BlockId::TallGrass, BlockId::Stone] {
            let state = BlockState::of(id);
            assert_eq!(
                TargetState::Air.matches(&w, p, &state, &cfg()),
                id == BlockId::Air,
                "{id:?}"
            );
        }
    }

    #[test]
    fn support_satisfied_by_neighbor() {
        let mut w = world();
        let p = BlockPos::new(3, 3, 3);
        let target = TargetState::Support {
            direction: Direction::Down,
        };
        let air = BlockState::of(BlockId::Air);
        assert!(!target.matches(&w, p, &air, &cfg()));
        w.set(p.down(), BlockState::of(BlockId::Stone));
        // Prerequisite holds for free via the neighbor.
        assert!(target.matches(&w, p, &air, &cfg()));
    }

    #[test]
    fn solid_respects_exclusions() {
        let w = world();
        let p = BlockPos::new(0, 0, 0);
        let target = TargetState::Solid {
            exclude: vec![BlockId::Gravel],
        };
        assert!(target.matches(&w, p, &BlockState::of(BlockId::Stone), &cfg()));
        assert!(!target.matches(&w, p, &BlockState::of(BlockId::Gravel), &cfg()));
    }

    #[test]
    fn state_target_honors_ignored_props() {
        let w = world();
        let p = BlockPos::new(0, 0, 0);
        let target = TargetState::State {
            state: BlockState::of(BlockId::Lever).with_prop("powered", "true"),
            ignored: vec![],
        };
        let off = BlockState::of(BlockId::Lever).with_prop("powered", "false");
        assert!(!target.matches(&w, p, &off, &cfg()));
        let loose = TargetState::State {
            state: BlockState::of(BlockId::Lever).with_prop("powered", "true"),
            ignored: vec!["powered".to_string()],
        };
        assert!(loose.matches(&w, p, &off, &cfg()));
    }

    #[test]
    fn demolition_targets_have_no_stack() {
        assert!(TargetState::Empty.stack_for().is_none());
        assert!(TargetState::Air.stack_for().is_none());
        assert!(TargetState::Block(BlockId::Stone).stack_for().is_some());
    }

    #[test]
    fn state_for_solid_prefers_configured_filler() {
        let target = TargetState::Solid { exclude: vec![] };
        let state = target.state_for(&cfg()).unwrap();
        assert_eq!(state.id, BlockId::Cobblestone);
        let excluding = TargetState::Solid {
            exclude: vec![BlockId::Cobblestone],
        };
        assert_eq!(excluding.state_for(&cfg()).unwrap().id, BlockId::Dirt);
    }
}
