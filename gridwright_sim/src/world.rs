// Read-mostly snapshot of the world the planner operates on: a dense 3D
// block grid, the controlled player, nearby entities, and the open
// container screen.
//
// ## Grid layout
// Blocks are stored in a flat `Vec` indexed `x + z*size_x + y*size_x*size_z`.
// Reads outside the grid return air; writes outside are silently dropped.
// Chunk columns (16x16 in x/z) can be marked unloaded, which the planner
// reports as a distinct outcome rather than treating the column as air.
//
// ## Visibility
// `first_solid_along` is an Amanatides & Woo voxel traversal used for both
// reach raycasts and line-of-sight checks against candidate click points.
//
// **Critical constraint: determinism.** All queries are pure functions of
// the stored state. No caching across ticks, no system time, no entropy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{BlockId, BlockPos, BlockState, ItemStack, Vec3};

/// Number of hotbar slots at the front of the player inventory.
pub const HOTBAR_SIZE: usize = 9;
/// Total player inventory slots (hotbar + main).
pub const INVENTORY_SIZE: usize = 36;

const EYE_HEIGHT: f64 = 1.62;
const EYE_HEIGHT_SNEAKING: f64 = 1.27;
const PLAYER_HALF_WIDTH: f64 = 0.3;
const PLAYER_HEIGHT: f64 = 1.8;

/// The player's item slots. Slots `0..9` are the hotbar, `9..36` the main
/// inventory. `selected` is the hotbar slot the player themselves chose;
/// the acknowledged active slot lives in the hotbar manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<ItemStack>,
    pub selected: usize,
}

impl Inventory {
    pub fn empty() -> Self {
        Self {
            slots: vec![ItemStack::EMPTY; INVENTORY_SIZE],
            selected: 0,
        }
    }

    pub fn slot(&self, index: usize) -> ItemStack {
        self.slots.get(index).copied().unwrap_or(ItemStack::EMPTY)
    }

    pub fn set_slot(&mut self, index: usize, stack: ItemStack) {
        if index < self.slots.len() {
            self.slots[index] = stack;
        }
    }

    /// First hotbar slot whose stack satisfies `pred`.
    pub fn find_hotbar(&self, pred: impl Fn(&ItemStack) -> bool) -> Option<usize> {
        (0..HOTBAR_SIZE).find(|&i| pred(&self.slot(i)))
    }

    /// First main-inventory (non-hotbar) slot whose stack satisfies `pred`.
    pub fn find_main(&self, pred: impl Fn(&ItemStack) -> bool) -> Option<usize> {
        (HOTBAR_SIZE..self.slots.len()).find(|&i| pred(&self.slot(i)))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Inventory::empty()
    }
}

/// The controlled player: feet position, crouch state, permissions and
/// inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec3,
    pub sneaking: bool,
    pub allow_modify_world: bool,
    pub inventory: Inventory,
}

impl PlayerState {
    pub fn at(pos: Vec3) -> Self {
        Self {
            pos,
            sneaking: false,
            allow_modify_world: true,
            inventory: Inventory::empty(),
        }
    }

    pub fn eye_pos(&self) -> Vec3 {
        let h = if self.sneaking {
            EYE_HEIGHT_SNEAKING
        } else {
            EYE_HEIGHT
        };
        Vec3::new(self.pos.x, self.pos.y + h, self.pos.z)
    }

    /// Whether the player's bounding box overlaps the unit cube at `pos`.
    pub fn intersects_block(&self, pos: BlockPos) -> bool {
        aabb_intersects_block(
            self.pos,
            PLAYER_HALF_WIDTH,
            PLAYER_HEIGHT,
            pos,
        )
    }

    /// Whether the player is supported by the block at `pos`.
    pub fn stands_on(&self, pos: BlockPos) -> bool {
        let top = pos.y as f64 + 1.0;
        if (self.pos.y - top).abs() > 1e-3 {
            return false;
        }
        horizontal_overlap(self.pos, PLAYER_HALF_WIDTH, pos)
    }
}

/// A non-player entity whose hitbox can obstruct placements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub pos: Vec3,
    pub half_width: f64,
    pub height: f64,
}

impl Entity {
    pub fn intersects_block(&self, pos: BlockPos) -> bool {
        aabb_intersects_block(self.pos, self.half_width, self.height, pos)
    }
}

fn horizontal_overlap(feet: Vec3, half_width: f64, pos: BlockPos) -> bool {
    feet.x + half_width > pos.x as f64
        && feet.x - half_width < pos.x as f64 + 1.0
        && feet.z + half_width > pos.z as f64
        && feet.z - half_width < pos.z as f64 + 1.0
}

fn aabb_intersects_block(feet: Vec3, half_width: f64, height: f64, pos: BlockPos) -> bool {
    horizontal_overlap(feet, half_width, pos)
        && feet.y + height > pos.y as f64
        && feet.y < pos.y as f64 + 1.0
}

/// Identity and revision of the open container screen. Every inventory
/// click bumps `revision`; opening a different container changes `sync_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Screen {
    pub sync_id: u32,
    pub revision: u32,
}

impl Screen {
    pub fn bump(&mut self) {
        self.revision += 1;
    }
}

/// The full world snapshot the planner reads and the interaction layer
/// writes back into.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldView {
    size_x: i32,
    size_y: i32,
    size_z: i32,
    blocks: Vec<BlockState>,
    /// Chunk columns `(x >> 4, z >> 4)` currently not loaded.
    unloaded: BTreeSet<(i32, i32)>,
    pub player: PlayerState,
    pub entities: Vec<Entity>,
    pub screen: Screen,
}

impl WorldView {
    /// An all-air world of the given dimensions with the player at origin.
    pub fn new(size_x: i32, size_y: i32, size_z: i32) -> Self {
        let len = (size_x * size_y * size_z) as usize;
        Self {
            size_x,
            size_y,
            size_z,
            blocks: vec![BlockState::of(BlockId::Air); len],
            unloaded: BTreeSet::new(),
            player: PlayerState::at(Vec3::new(
                size_x as f64 / 2.0,
                0.0,
                size_z as f64 / 2.0,
            )),
            entities: Vec::new(),
            screen: Screen::default(),
        }
    }

    pub fn size(&self) -> (i32, i32, i32) {
        (self.size_x, self.size_y, self.size_z)
    }

    pub fn in_bounds(&self, pos: BlockPos) -> bool {
        pos.x >= 0
            && pos.x < self.size_x
            && pos.y >= 0
            && pos.y < self.size_y
            && pos.z >= 0
            && pos.z < self.size_z
    }

    fn index(&self, pos: BlockPos) -> usize {
        (pos.x + pos.z * self.size_x + pos.y * self.size_x * self.size_z) as usize
    }

    /// Block state at `pos`. Out-of-bounds reads return air.
    pub fn get(&self, pos: BlockPos) -> BlockState {
        if !self.in_bounds(pos) {
            return BlockState::of(BlockId::Air);
        }
        self.blocks[self.index(pos)].clone()
    }

    /// Set the block state at `pos`. Out-of-bounds writes are dropped.
    pub fn set(&mut self, pos: BlockPos, state: BlockState) {
        if self.in_bounds(pos) {
            let i = self.index(pos);
            self.blocks[i] = state;
        }
    }

    /// Fill the inclusive box `[a, b]` with copies of `state`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, state: &BlockState) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(BlockPos::new(x, y, z), state.clone());
                }
            }
        }
    }

    pub fn is_loaded(&self, pos: BlockPos) -> bool {
        !self.unloaded.contains(&(pos.x >> 4, pos.z >> 4))
    }

    pub fn set_chunk_loaded(&mut self, cx: i32, cz: i32, loaded: bool) {
        if loaded {
            self.unloaded.remove(&(cx, cz));
        } else {
            self.unloaded.insert((cx, cz));
        }
    }

    /// First solid block strictly between `from` and `to`, excluding the
    /// voxels containing either endpoint and the `ignore` position.
    ///
    /// Amanatides & Woo traversal: step one voxel boundary at a time along
    /// the segment, tracking the next crossing per axis.
    pub fn first_solid_along(
        &self,
        from: Vec3,
        to: Vec3,
        ignore: BlockPos,
    ) -> Option<BlockPos> {
        let d = to - from;
        let len = d.length();
        if len < 1e-9 {
            return None;
        }

        let mut voxel = BlockPos::new(
            from.x.floor() as i32,
            from.y.floor() as i32,
            from.z.floor() as i32,
        );
        let end = BlockPos::new(
            to.x.floor() as i32,
            to.y.floor() as i32,
            to.z.floor() as i32,
        );
        let start = voxel;

        let step_x = if d.x > 0.0 { 1 } else { -1 };
        let step_y = if d.y > 0.0 { 1 } else { -1 };
        let step_z = if d.z > 0.0 { 1 } else { -1 };

        // Parametric distance to the next voxel boundary on each axis.
        let next_boundary = |p: f64, dir: f64| -> f64 {
            if dir > 0.0 {
                (p.floor() + 1.0 - p) / dir
            } else if dir < 0.0 {
                (p - p.floor()) / -dir
            } else {
                f64::INFINITY
            }
        };
        let mut t_max_x = next_boundary(from.x, d.x);
        let mut t_max_y = next_boundary(from.y, d.y);
        let mut t_max_z = next_boundary(from.z, d.z);
        let t_delta_x = if d.x != 0.0 { 1.0 / d.x.abs() } else { f64::INFINITY };
        let t_delta_y = if d.y != 0.0 { 1.0 / d.y.abs() } else { f64::INFINITY };
        let t_delta_z = if d.z != 0.0 { 1.0 / d.z.abs() } else { f64::INFINITY };

        loop {
            if voxel == end {
                return None;
            }
            if t_max_x <= t_max_y && t_max_x <= t_max_z {
                if t_max_x > 1.0 {
                    return None;
                }
                voxel.x += step_x;
                t_max_x += t_delta_x;
            } else if t_max_y <= t_max_z {
                if t_max_y > 1.0 {
                    return None;
                }
                voxel.y += step_y;
                t_max_y += t_delta_y;
            } else {
                if t_max_z > 1.0 {
                    return None;
                }
                voxel.z += step_z;
                t_max_z += t_delta_z;
            }
            if voxel == end || voxel == start || voxel == ignore {
                continue;
            }
            if self.get(voxel).id.is_solid() {
                return Some(voxel);
            }
        }
    }

    /// Whether `point` (on or just inside the block `target`) is visible
    /// from `eye` with no other solid block in the way.
    pub fn can_see(&self, eye: Vec3, point: Vec3, target: BlockPos) -> bool {
        self.first_solid_along(eye, point, target).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, ItemId};

    fn stone() -> BlockState {
        BlockState::of(BlockId::Stone)
    }

    #[test]
    fn out_of_bounds_reads_are_air() {
        let w = WorldView::new(8, 8, 8);
        assert!(w.get(BlockPos::new(-1, 0, 0)).id.is_air());
        assert!(w.get(BlockPos::new(0, 8, 0)).id.is_air());
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut w = WorldView::new(8, 8, 8);
        w.set(BlockPos::new(0, -1, 0), stone());
        assert!(w.get(BlockPos::new(0, 0, 0)).id.is_air());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut w = WorldView::new(8, 8, 8);
        let p = BlockPos::new(3, 4, 5);
        w.set(p, stone());
        assert_eq!(w.get(p).id, BlockId::Stone);
        for dir in Direction::ALL {
            assert!(w.get(p.offset(dir)).id.is_air());
        }
    }

    #[test]
    fn chunk_loading_flags() {
        let mut w = WorldView::new(32, 8, 32);
        assert!(w.is_loaded(BlockPos::new(20, 0, 3)));
        w.set_chunk_loaded(1, 0, false);
        assert!(!w.is_loaded(BlockPos::new(20, 0, 3)));
        assert!(w.is_loaded(BlockPos::new(3, 0, 3)));
    }

    #[test]
    fn raycast_clear_path() {
        let w = WorldView::new(16, 16, 16);
        let hit = w.first_solid_along(
            Vec3::new(1.5, 1.5, 1.5),
            Vec3::new(10.5, 1.5, 1.5),
            BlockPos::new(10, 1, 1),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn raycast_reports_obstruction() {
        let mut w = WorldView::new(16, 16, 16);
        w.set(BlockPos::new(5, 1, 1), stone());
        let hit = w.first_solid_along(
            Vec3::new(1.5, 1.5, 1.5),
            Vec3::new(10.5, 1.5, 1.5),
            BlockPos::new(10, 1, 1),
        );
        assert_eq!(hit, Some(BlockPos::new(5, 1, 1)));
    }

    #[test]
    fn raycast_skips_ignored_block() {
        let mut w = WorldView::new(16, 16, 16);
        w.set(BlockPos::new(5, 1, 1), stone());
        let hit = w.first_solid_along(
            Vec3::new(1.5, 1.5, 1.5),
            Vec3::new(10.5, 1.5, 1.5),
            BlockPos::new(5, 1, 1),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn player_standing_detection() {
        let mut p = PlayerState::at(Vec3::new(4.5, 3.0, 4.5));
        assert!(p.stands_on(BlockPos::new(4, 2, 4)));
        assert!(!p.stands_on(BlockPos::new(4, 1, 4)));
        p.pos = Vec3::new(4.5, 3.5, 4.5);
        assert!(!p.stands_on(BlockPos::new(4, 2, 4)));
    }

    #[test]
    fn player_block_intersection() {
        let p = PlayerState::at(Vec3::new(4.5, 2.0, 4.5));
        assert!(p.intersects_block(BlockPos::new(4, 2, 4)));
        assert!(p.intersects_block(BlockPos::new(4, 3, 4)));
        assert!(!p.intersects_block(BlockPos::new(4, 4, 4)));
        assert!(!p.intersects_block(BlockPos::new(6, 2, 4)));
    }

    #[test]
    fn inventory_search_regions() {
        let mut inv = Inventory::empty();
        inv.set_slot(4, ItemStack::new(ItemId::Block(BlockId::Stone), 12));
        inv.set_slot(20, ItemStack::new(ItemId::Block(BlockId::Dirt), 3));
        assert_eq!(inv.find_hotbar(|s| !s.is_empty()), Some(4));
        assert_eq!(inv.find_main(|s| !s.is_empty()), Some(20));
        assert_eq!(inv.find_hotbar(|s| s.item == ItemId::Block(BlockId::Dirt)), None);
    }
}
