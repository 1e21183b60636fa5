//! Lane Items
//!
//! Obstacles, platforms, vehicles and coins that sit on or move along a lane.
//! Items live in their own pools; a lane only keeps handles to them.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_HALF, TILE_SIZE, fixed_mul, from_int, wrap_into};
use crate::map::catalog::AssetId;
use crate::map::lane::Direction;
use crate::map::pool::{Pool, PoolHandle};

/// What an item does to the character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Blocks the tile it stands on.
    Obstacle,
    /// Can be stood on over water.
    Platform,
    /// Kills on contact.
    Vehicle,
    /// Collectible.
    Coin,
}

/// Concrete item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemKind {
    /// Grass obstacle
    Tree = 0,
    /// Grass obstacle
    Rock = 1,
    /// Drifting river platform
    Log = 2,
    /// Still river platform
    LilyPad = 3,
    /// Road vehicle
    Car = 4,
    /// Long road vehicle
    Truck = 5,
    /// Railroad vehicle
    Train = 6,
    /// Pickup
    Coin = 7,
}

impl ItemKind {
    /// Every kind, in pool order.
    pub const ALL: [ItemKind; 8] = [
        ItemKind::Tree,
        ItemKind::Rock,
        ItemKind::Log,
        ItemKind::LilyPad,
        ItemKind::Car,
        ItemKind::Truck,
        ItemKind::Train,
        ItemKind::Coin,
    ];

    /// Category of this kind.
    pub fn category(self) -> ItemCategory {
        match self {
            ItemKind::Tree | ItemKind::Rock => ItemCategory::Obstacle,
            ItemKind::Log | ItemKind::LilyPad => ItemCategory::Platform,
            ItemKind::Car | ItemKind::Truck | ItemKind::Train => ItemCategory::Vehicle,
            ItemKind::Coin => ItemCategory::Coin,
        }
    }

    /// Default length in tiles. Logs override this per spawn.
    pub fn length_tiles(self) -> i32 {
        match self {
            ItemKind::Truck => 2,
            ItemKind::Log => 3,
            ItemKind::Train => 8,
            _ => 1,
        }
    }
}

/// Generation-checked reference to a pooled item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemHandle {
    /// Pool the item came from.
    pub kind: ItemKind,
    /// Slot within that pool.
    pub handle: PoolHandle,
}

/// Where and how a fresh item is placed.
#[derive(Clone, Copy, Debug)]
pub struct ItemPlacement {
    /// Lane row.
    pub row: i32,
    /// Centre x in world units.
    pub x: Fixed,
    /// Length along the lane in world units.
    pub length: Fixed,
    /// Travel direction, `Direction::None` for static items.
    pub direction: Direction,
    /// Speed in world units per second.
    pub speed: Fixed,
}

impl ItemPlacement {
    /// Static single-tile item centred on `column`.
    pub fn fixed_at(row: i32, column: i32) -> Self {
        Self {
            row,
            x: from_int(column),
            length: TILE_SIZE,
            direction: Direction::None,
            speed: 0,
        }
    }
}

/// Pooled item record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    kind: ItemKind,
    asset: AssetId,
    row: i32,
    x: Fixed,
    length: Fixed,
    direction: Direction,
    speed: Fixed,
}

impl Item {
    /// Blank record of `kind`, drawn with `asset`.
    pub fn new(kind: ItemKind, asset: AssetId) -> Self {
        Self {
            kind,
            asset,
            row: 0,
            x: 0,
            length: from_int(kind.length_tiles()),
            direction: Direction::None,
            speed: 0,
        }
    }

    fn place(&mut self, placement: &ItemPlacement) {
        self.row = placement.row;
        self.x = placement.x;
        self.length = placement.length;
        self.direction = placement.direction;
        self.speed = placement.speed;
    }

    /// Item kind.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Asset handle for the current skin.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Lane row.
    pub fn row(&self) -> i32 {
        self.row
    }

    /// Centre x in world units.
    pub fn x(&self) -> Fixed {
        self.x
    }

    /// Length in world units.
    pub fn length(&self) -> Fixed {
        self.length
    }

    /// Travel direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Signed velocity along the lane.
    pub fn velocity(&self) -> Fixed {
        self.speed.wrapping_mul(self.direction.sign())
    }

    /// Whether the span `[x - reach, x + reach]` touches this item.
    pub fn overlaps(&self, x: Fixed, reach: Fixed) -> bool {
        let half = fixed_mul(self.length, FIXED_HALF);
        let dx = (x as i64 - self.x as i64).abs();
        dx <= half as i64 + reach as i64
    }

    /// Whether this item is on a lane of half-width `half_width`, or heading
    /// into it with its leading end no more than `warning` outside the edge.
    pub fn approaches(&self, half_width: Fixed, warning: Fixed) -> bool {
        if self.overlaps(0, half_width) {
            return true;
        }
        let velocity = self.velocity();
        let inbound = (velocity > 0 && self.x < 0) || (velocity < 0 && self.x > 0);
        if !inbound {
            return false;
        }
        let half = fixed_mul(self.length, FIXED_HALF) as i64;
        let gap = (self.x as i64).abs() - half - half_width as i64;
        gap <= warning as i64
    }

    fn advance(&mut self, dt: Fixed, min_x: Fixed, span: Fixed) {
        if self.speed == 0 || self.direction == Direction::None {
            return;
        }
        let step = fixed_mul(self.velocity(), dt);
        self.x = wrap_into(self.x.wrapping_add(step), min_x, span);
    }
}

/// One pool per item kind.
#[derive(Default)]
pub struct ItemPools {
    pools: BTreeMap<ItemKind, Pool<Item>>,
}

impl ItemPools {
    pub(crate) fn insert(&mut self, kind: ItemKind, pool: Pool<Item>) {
        self.pools.insert(kind, pool);
    }

    /// Pool for one kind.
    pub fn pool(&self, kind: ItemKind) -> Option<&Pool<Item>> {
        self.pools.get(&kind)
    }

    /// Take an item of `kind` and place it.
    pub fn spawn(&mut self, kind: ItemKind, placement: &ItemPlacement) -> Option<ItemHandle> {
        let pool = self.pools.get_mut(&kind)?;
        let handle = pool.get()?;
        pool.get_mut(handle)?.place(placement);
        Some(ItemHandle { kind, handle })
    }

    /// Return an item to its pool. Stale handles are ignored.
    pub fn release(&mut self, item: ItemHandle) -> bool {
        self.pools
            .get_mut(&item.kind)
            .and_then(|pool| pool.release(item.handle))
            .is_some()
    }

    /// Item behind a handle, if it is still live.
    pub fn get(&self, item: ItemHandle) -> Option<&Item> {
        let pool = self.pools.get(&item.kind)?;
        if !pool.is_live(item.handle) {
            return None;
        }
        pool.get_ref(item.handle)
    }

    /// Move one item, wrapping it around the lane span.
    pub fn advance(&mut self, item: ItemHandle, dt: Fixed, min_x: Fixed, span: Fixed) {
        if let Some(record) = self.pools.get_mut(&item.kind).and_then(|pool| pool.get_mut(item.handle)) {
            record.advance(dt, min_x, span);
        }
    }

    /// Drop every pooled item.
    pub fn clear_all(&mut self) -> usize {
        self.pools.values_mut().map(Pool::clear_all).sum()
    }

    /// Wraps that landed on live items.
    pub fn live_reuse_count(&self) -> u64 {
        self.pools.values().map(Pool::live_reuse_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};

    fn pools_with(kind: ItemKind, capacity: usize) -> ItemPools {
        let mut pool = Pool::with_capacity(capacity);
        while pool.add(Item::new(kind, AssetId(1))) {}
        let mut pools = ItemPools::default();
        pools.insert(kind, pool);
        pools
    }

    #[test]
    fn test_categories() {
        assert_eq!(ItemKind::Rock.category(), ItemCategory::Obstacle);
        assert_eq!(ItemKind::LilyPad.category(), ItemCategory::Platform);
        assert_eq!(ItemKind::Train.category(), ItemCategory::Vehicle);
        assert_eq!(ItemKind::Coin.category(), ItemCategory::Coin);
    }

    #[test]
    fn test_spawn_and_release() {
        let mut pools = pools_with(ItemKind::Coin, 2);
        let coin = pools.spawn(ItemKind::Coin, &ItemPlacement::fixed_at(4, -1)).unwrap();

        let record = pools.get(coin).unwrap();
        assert_eq!(record.row(), 4);
        assert_eq!(record.x(), -FIXED_ONE);

        assert!(pools.release(coin));
        assert!(pools.get(coin).is_none());
        assert!(!pools.release(coin));
    }

    #[test]
    fn test_missing_pool_spawns_nothing() {
        let mut pools = pools_with(ItemKind::Coin, 1);
        assert!(pools.spawn(ItemKind::Log, &ItemPlacement::fixed_at(0, 0)).is_none());
    }

    #[test]
    fn test_moving_item_wraps() {
        let mut pools = pools_with(ItemKind::Car, 1);
        let placement = ItemPlacement {
            row: 2,
            x: from_int(4),
            length: TILE_SIZE,
            direction: Direction::Right,
            speed: from_int(2),
        };
        let car = pools.spawn(ItemKind::Car, &placement).unwrap();

        // One second at 2 tiles/s carries it past +5 and back in at -5
        pools.advance(car, FIXED_ONE, from_int(-5), from_int(10));
        assert_eq!(pools.get(car).unwrap().x(), from_int(-4));
    }

    #[test]
    fn test_static_item_does_not_move() {
        let mut pools = pools_with(ItemKind::Tree, 1);
        let tree = pools.spawn(ItemKind::Tree, &ItemPlacement::fixed_at(1, 3)).unwrap();
        pools.advance(tree, FIXED_ONE, from_int(-5), from_int(10));
        assert_eq!(pools.get(tree).unwrap().x(), from_int(3));
    }

    #[test]
    fn test_overlaps() {
        let mut item = Item::new(ItemKind::Log, AssetId(0));
        item.place(&ItemPlacement {
            row: 0,
            x: 0,
            length: from_int(3),
            direction: Direction::Left,
            speed: FIXED_ONE,
        });

        assert!(item.overlaps(to_fixed(1.4), 0));
        assert!(!item.overlaps(to_fixed(1.6), 0));
        assert!(item.overlaps(to_fixed(1.6), to_fixed(0.2)));
        assert_eq!(item.velocity(), -FIXED_ONE);
    }

    #[test]
    fn test_train_approach() {
        let train_at = |x: i32, direction: Direction| {
            let mut train = Item::new(ItemKind::Train, AssetId(0));
            train.place(&ItemPlacement {
                row: 0,
                x: from_int(x),
                length: from_int(8),
                direction,
                speed: from_int(18),
            });
            train
        };
        let half_width = to_fixed(8.5);
        let warning = from_int(6);

        // Far off the lane, heading in
        assert!(!train_at(-40, Direction::Right).approaches(half_width, warning));
        assert!(!train_at(40, Direction::Left).approaches(half_width, warning));
        // Leading end 5.5 tiles out, heading in
        assert!(train_at(-18, Direction::Right).approaches(half_width, warning));
        // Same spot, heading away
        assert!(!train_at(-18, Direction::Left).approaches(half_width, warning));
        // On the lane in either direction
        assert!(train_at(0, Direction::Left).approaches(half_width, warning));
        assert!(train_at(12, Direction::Right).approaches(half_width, warning));
        // Tail just cleared the edge
        assert!(!train_at(13, Direction::Right).approaches(half_width, warning));
    }
}
