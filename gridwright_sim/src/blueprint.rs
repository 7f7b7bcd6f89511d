// Blueprints: position -> target mappings the build task works through.
//
// Three behaviors behind one trait:
// - `StaticBlueprint`: a fixed mapping.
// - `LayeredBlueprint`: stages applied in order; the next stage starts
//   only once the current one is complete.
// - `TrackingBlueprint`: a template re-anchored to the player every tick.
//
// Mappings are `BTreeMap` so planning passes iterate deterministically.
// Bounds are cached and recomputed only when the mapping changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::target::TargetState;
use crate::types::BlockPos;
use crate::world::WorldView;

/// Inclusive bounding box over a set of positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Bounds {
    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }
}

/// Bounding box of a mapping, `None` when empty.
pub fn bounds_of(structure: &BTreeMap<BlockPos, TargetState>) -> Option<Bounds> {
    let mut iter = structure.keys();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    for pos in iter {
        min.x = min.x.min(pos.x);
        min.y = min.y.min(pos.y);
        min.z = min.z.min(pos.z);
        max.x = max.x.max(pos.x);
        max.y = max.y.max(pos.y);
        max.z = max.z.max(pos.z);
    }
    Some(Bounds { min, max })
}

/// A source of target positions for the build task.
pub trait Blueprint {
    fn structure(&self) -> &BTreeMap<BlockPos, TargetState>;

    fn bounds(&self) -> Option<Bounds>;

    /// Per-tick update hook; dynamic blueprints regenerate here.
    fn tick(&mut self, _world: &WorldView) {}

    /// Called when every position satisfies its target. Returns true if
    /// the blueprint produced a new stage of work.
    fn advance(&mut self) -> bool {
        false
    }

    /// Drop a position permanently (unsolvable outcome).
    fn remove(&mut self, pos: BlockPos);
}

/// Fixed mapping; never changes except for removals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticBlueprint {
    structure: BTreeMap<BlockPos, TargetState>,
    bounds: Option<Bounds>,
}

impl StaticBlueprint {
    pub fn from_map(structure: BTreeMap<BlockPos, TargetState>) -> Self {
        let bounds = bounds_of(&structure);
        Self { structure, bounds }
    }

    /// Every position in the inclusive box `[a, b]` gets `target`.
    pub fn filled_box(a: BlockPos, b: BlockPos, target: TargetState) -> Self {
        let mut structure = BTreeMap::new();
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    structure.insert(BlockPos::new(x, y, z), target.clone());
                }
            }
        }
        Self::from_map(structure)
    }

    /// Demolition blueprint: clear the inclusive box `[a, b]`.
    pub fn clear_region(a: BlockPos, b: BlockPos) -> Self {
        Self::filled_box(a, b, TargetState::Empty)
    }
}

impl Blueprint for StaticBlueprint {
    fn structure(&self) -> &BTreeMap<BlockPos, TargetState> {
        &self.structure
    }

    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn remove(&mut self, pos: BlockPos) {
        if self.structure.remove(&pos).is_some() {
            self.bounds = bounds_of(&self.structure);
        }
    }
}

/// Stages applied strictly in order. `advance` swaps in the next stage
/// once the current one completes; returning false freezes the blueprint
/// with no work left.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayeredBlueprint {
    stages: Vec<BTreeMap<BlockPos, TargetState>>,
    current: usize,
    active: BTreeMap<BlockPos, TargetState>,
    bounds: Option<Bounds>,
}

impl LayeredBlueprint {
    pub fn new(stages: Vec<BTreeMap<BlockPos, TargetState>>) -> Self {
        let active = stages.first().cloned().unwrap_or_default();
        let bounds = bounds_of(&active);
        Self {
            stages,
            current: 0,
            active,
            bounds,
        }
    }

    pub fn stages_remaining(&self) -> usize {
        self.stages.len().saturating_sub(self.current + 1)
    }
}

impl Blueprint for LayeredBlueprint {
    fn structure(&self) -> &BTreeMap<BlockPos, TargetState> {
        &self.active
    }

    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn advance(&mut self) -> bool {
        if self.current + 1 >= self.stages.len() {
            return false;
        }
        self.current += 1;
        self.active = self.stages[self.current].clone();
        self.bounds = bounds_of(&self.active);
        true
    }

    fn remove(&mut self, pos: BlockPos) {
        if self.active.remove(&pos).is_some() {
            self.bounds = bounds_of(&self.active);
        }
    }
}

/// A template of offsets re-anchored to the player's feet every tick.
/// Positions removed as unsolvable stay removed until the anchor moves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingBlueprint {
    template: Vec<(BlockPos, TargetState)>,
    anchor: BlockPos,
    active: BTreeMap<BlockPos, TargetState>,
    bounds: Option<Bounds>,
}

impl TrackingBlueprint {
    pub fn new(template: Vec<(BlockPos, TargetState)>) -> Self {
        Self {
            template,
            anchor: BlockPos::new(i32::MIN, i32::MIN, i32::MIN),
            active: BTreeMap::new(),
            bounds: None,
        }
    }

    fn rebuild(&mut self) {
        self.active = self
            .template
            .iter()
            .map(|(offset, target)| {
                (
                    BlockPos::new(
                        self.anchor.x + offset.x,
                        self.anchor.y + offset.y,
                        self.anchor.z + offset.z,
                    ),
                    target.clone(),
                )
            })
            .collect();
        self.bounds = bounds_of(&self.active);
    }
}

impl Blueprint for TrackingBlueprint {
    fn structure(&self) -> &BTreeMap<BlockPos, TargetState> {
        &self.active
    }

    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn tick(&mut self, world: &WorldView) {
        let feet = world.player.pos;
        let anchor = BlockPos::new(
            feet.x.floor() as i32,
            feet.y.floor() as i32,
            feet.z.floor() as i32,
        );
        if anchor != self.anchor {
            self.anchor = anchor;
            self.rebuild();
        }
    }

    fn remove(&mut self, pos: BlockPos) {
        if self.active.remove(&pos).is_some() {
            self.bounds = bounds_of(&self.active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockId, Vec3};

    #[test]
    fn filled_box_covers_inclusive_range() {
        let bp = StaticBlueprint::filled_box(
            BlockPos::new(0, 0, 0),
            BlockPos::new(2, 1, 2),
            TargetState::Block(BlockId::Stone),
        );
        assert_eq!(bp.structure().len(), 18);
        assert_eq!(
            bp.bounds(),
            Some(Bounds {
                min: BlockPos::new(0, 0, 0),
                max: BlockPos::new(2, 1, 2),
            })
        );
    }

    #[test]
    fn removal_shrinks_bounds() {
        let mut bp = StaticBlueprint::filled_box(
            BlockPos::new(0, 0, 0),
            BlockPos::new(3, 0, 0),
            TargetState::Block(BlockId::Stone),
        );
        bp.remove(BlockPos::new(3, 0, 0));
        assert_eq!(bp.bounds().unwrap().max, BlockPos::new(2, 0, 0));
        for x in 0..3 {
            bp.remove(BlockPos::new(x, 0, 0));
        }
        assert_eq!(bp.bounds(), None);
    }

    #[test]
    fn layered_blueprint_advances_through_stages() {
        let mut first = BTreeMap::new();
        first.insert(BlockPos::new(0, 0, 0), TargetState::Block(BlockId::Stone));
        let mut second = BTreeMap::new();
        second.insert(BlockPos::new(0, 1, 0), TargetState::Block(BlockId::Stone));
        let mut bp = LayeredBlueprint::new(vec![first, second.clone()]);
        assert_eq!(bp.stages_remaining(), 1);
        assert!(bp.advance());
        assert_eq!(bp.structure(), &second);
        // Exhausted: freezes instead of tearing down.
        assert!(!bp.advance());
        assert_eq!(bp.structure(), &second);
    }

    #[test]
    fn tracking_blueprint_follows_the_player() {
        let mut world = WorldView::new(16, 16, 16);
        world.player.pos = Vec3::new(4.5, 2.0, 4.5);
        let mut bp = TrackingBlueprint::new(vec![(
            BlockPos::new(0, -1, 0),
            TargetState::Solid { exclude: vec![] },
        )]);
        bp.tick(&world);
        assert!(bp.structure().contains_key(&BlockPos::new(4, 1, 4)));
        world.player.pos = Vec3::new(8.5, 2.0, 4.5);
        bp.tick(&world);
        assert!(bp.structure().contains_key(&BlockPos::new(8, 1, 4)));
        assert!(!bp.structure().contains_key(&BlockPos::new(4, 1, 4)));
    }
}
