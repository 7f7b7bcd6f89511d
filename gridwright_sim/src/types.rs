// Core value types shared across the planner: positions, directions,
// rotations, block and item identities.
//
// Everything here is a small, cheap-to-copy value with derived ordering
// where deterministic iteration matters. `BlockPos` ordering is the final
// tie-break key of the candidate ranker, so its derived `Ord` (x, then y,
// then z) is load-bearing — do not reorder the fields.

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A discrete position in the voxel grid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dir: Direction) -> BlockPos {
        let (dx, dy, dz) = dir.offset();
        BlockPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn down(&self) -> BlockPos {
        self.offset(Direction::Down)
    }

    /// Center of the block as a continuous point.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }

    /// Pack into a single `u64`, used to fork a per-position PRNG stream.
    ///
    /// 26 bits for x and z, 12 bits for y. Collisions would only occur for
    /// positions further apart than any reachable blueprint spans.
    pub fn key(&self) -> u64 {
        ((self.x as u64 & 0x3ff_ffff) << 38)
            | ((self.z as u64 & 0x3ff_ffff) << 12)
            | (self.y as u64 & 0xfff)
    }
}

/// A continuous point or offset in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(&self, other: Vec3) -> f64 {
        (other - *self).length()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// The six axis-aligned face directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four horizontal directions, used for fluid neighbor scans.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    pub fn unit(&self) -> Vec3 {
        let (x, y, z) = self.offset();
        Vec3::new(x as f64, y as f64, z as f64)
    }
}

/// A view direction in degrees. Yaw is unbounded (wrapped on comparison),
/// pitch is clamped to [-90, 90] by construction sites.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Rotation {
    pub yaw: f64,
    pub pitch: f64,
}

impl Rotation {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// The rotation that looks from `from` toward `to`.
    pub fn looking_at(from: Vec3, to: Vec3) -> Rotation {
        let d = to - from;
        let horiz = (d.x * d.x + d.z * d.z).sqrt();
        Rotation {
            yaw: d.z.atan2(d.x).to_degrees() - 90.0,
            pitch: (-d.y).atan2(horiz).to_degrees(),
        }
    }

    /// Angular distance in degrees, yaw wrapped to the shorter arc.
    pub fn dist(&self, other: Rotation) -> f64 {
        let dy = wrap_degrees(self.yaw - other.yaw);
        let dp = self.pitch - other.pitch;
        (dy * dy + dp * dp).sqrt()
    }

    /// Move toward `target` by at most `max_step` degrees of combined
    /// angular distance. Reaching the target snaps exactly onto it.
    pub fn step_toward(&self, target: Rotation, max_step: f64) -> Rotation {
        let d = self.dist(target);
        if d <= max_step {
            return target;
        }
        let t = max_step / d;
        Rotation {
            yaw: self.yaw + wrap_degrees(target.yaw - self.yaw) * t,
            pitch: self.pitch + (target.pitch - self.pitch) * t,
        }
    }
}

/// Wrap an angle difference into [-180, 180).
pub fn wrap_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d >= 180.0 {
        d -= 360.0;
    }
    if d < -180.0 {
        d += 360.0;
    }
    d
}

/// Fluid classification. Ordering matters: water-logged positions are
/// handled before lava-logged ones when ranking candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FluidKind {
    Water,
    Lava,
}

/// Tool families recognized by the mining-speed model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Pickaxe,
    Shovel,
    Axe,
}

/// Closed set of block identities the planner understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockId {
    Air,
    Water,
    Lava,
    Stone,
    Cobblestone,
    Dirt,
    Sand,
    Gravel,
    Obsidian,
    Bedrock,
    CommandBlock,
    Chest,
    Lever,
    Torch,
    TallGrass,
}

impl BlockId {
    pub fn is_air(&self) -> bool {
        matches!(self, BlockId::Air)
    }

    pub fn fluid(&self) -> Option<FluidKind> {
        match self {
            BlockId::Water => Some(FluidKind::Water),
            BlockId::Lava => Some(FluidKind::Lava),
            _ => None,
        }
    }

    /// Placing into a replaceable block does not require clearing it first.
    pub fn is_replaceable(&self) -> bool {
        matches!(
            self,
            BlockId::Air | BlockId::Water | BlockId::Lava | BlockId::TallGrass
        )
    }

    /// Full-cube blocks whose faces can support a placement click.
    pub fn is_solid(&self) -> bool {
        !matches!(
            self,
            BlockId::Air
                | BlockId::Water
                | BlockId::Lava
                | BlockId::TallGrass
                | BlockId::Torch
                | BlockId::Lever
        )
    }

    /// Blocks that open or toggle on a bare click. Placing against one of
    /// their faces requires crouching.
    pub fn is_interactive(&self) -> bool {
        matches!(self, BlockId::Chest | BlockId::Lever | BlockId::CommandBlock)
    }

    /// Blocks only editable with elevated permissions.
    pub fn is_operator_block(&self) -> bool {
        matches!(self, BlockId::CommandBlock)
    }

    /// Blocks that fall when unsupported.
    pub fn is_falling(&self) -> bool {
        matches!(self, BlockId::Sand | BlockId::Gravel)
    }

    /// Negative means unbreakable, zero means instant.
    pub fn hardness(&self) -> f64 {
        match self {
            BlockId::Air | BlockId::TallGrass | BlockId::Torch => 0.0,
            BlockId::Water | BlockId::Lava => -1.0,
            BlockId::Stone => 1.5,
            BlockId::Cobblestone => 2.0,
            BlockId::Dirt => 0.5,
            BlockId::Sand => 0.5,
            BlockId::Gravel => 0.6,
            BlockId::Obsidian => 50.0,
            BlockId::Bedrock => -1.0,
            BlockId::CommandBlock => -1.0,
            BlockId::Chest => 2.5,
            BlockId::Lever => 0.5,
        }
    }

    pub fn preferred_tool(&self) -> Option<ToolKind> {
        match self {
            BlockId::Stone | BlockId::Cobblestone | BlockId::Obsidian => Some(ToolKind::Pickaxe),
            BlockId::Dirt | BlockId::Sand | BlockId::Gravel => Some(ToolKind::Shovel),
            BlockId::Chest => Some(ToolKind::Axe),
            _ => None,
        }
    }

    /// Blocks that cannot realistically be mined without their tool.
    pub fn requires_tool(&self) -> bool {
        matches!(self, BlockId::Obsidian)
    }

    /// Ticks to break with `item`, or `None` if unbreakable.
    ///
    /// Zero-hardness blocks break instantly. Otherwise the duration scales
    /// with hardness over the item's mining speed.
    pub fn break_ticks(&self, item: ItemId) -> Option<u32> {
        let hardness = self.hardness();
        if hardness < 0.0 {
            return None;
        }
        if hardness == 0.0 {
            return Some(0);
        }
        let speed = item.mining_speed(*self);
        Some((hardness * 30.0 / speed).ceil() as u32)
    }
}

/// Closed set of item identities: block items plus bare tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemId {
    Block(BlockId),
    Tool(ToolKind),
}

impl ItemId {
    pub fn as_block(&self) -> Option<BlockId> {
        match self {
            ItemId::Block(b) => Some(*b),
            ItemId::Tool(_) => None,
        }
    }

    /// Speed multiplier when mining `block` with this item.
    pub fn mining_speed(&self, block: BlockId) -> f64 {
        match self {
            ItemId::Tool(kind) if Some(*kind) == block.preferred_tool() => 8.0,
            _ => 1.0,
        }
    }

    /// Whether this item is the right tool family for `block`.
    pub fn is_suitable_for(&self, block: BlockId) -> bool {
        match block.preferred_tool() {
            None => true,
            Some(kind) => matches!(self, ItemId::Tool(k) if *k == kind),
        }
    }
}

/// A counted stack of one item. `count == 0` is the empty stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

impl ItemStack {
    pub const EMPTY: ItemStack = ItemStack {
        item: ItemId::Block(BlockId::Air),
        count: 0,
    };

    pub fn new(item: ItemId, count: u32) -> Self {
        Self { item, count }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item == ItemId::Block(BlockId::Air)
    }
}

impl Default for ItemStack {
    fn default() -> Self {
        ItemStack::EMPTY
    }
}

/// How candidate distance feeds into the ranking comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortMode {
    /// Nearest candidate first.
    #[default]
    Closest,
    /// Farthest candidate first.
    Farthest,
    /// Nearest first, but prefer candidates whose tool is already equipped.
    Tool,
    /// Smallest aim adjustment first.
    Rotation,
    /// Stable per-candidate random order.
    Random,
}

/// A block identity plus its sub-properties (fluid level, powered, ...).
///
/// Properties are a sorted map so state comparison and serialization are
/// deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub id: BlockId,
    pub props: BTreeMap<String, String>,
}

impl BlockState {
    pub fn of(id: BlockId) -> Self {
        Self {
            id,
            props: BTreeMap::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// State equality modulo the `ignored` property keys.
    pub fn matches_ignoring(&self, other: &BlockState, ignored: &[String]) -> bool {
        if self.id != other.id {
            return false;
        }
        let keys: std::collections::BTreeSet<&str> = self
            .props
            .keys()
            .chain(other.props.keys())
            .map(String::as_str)
            .filter(|k| !ignored.iter().any(|i| i == k))
            .collect();
        keys.iter()
            .all(|k| self.props.get(*k) == other.props.get(*k))
    }

    /// Fluid level for fluid blocks: 0 is a source, 1..=7 flow away from it.
    pub fn fluid_level(&self) -> Option<u8> {
        self.id.fluid()?;
        Some(
            self.prop("level")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        )
    }
}
