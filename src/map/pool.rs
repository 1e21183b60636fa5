//! Fixed-Capacity Pools
//!
//! Lanes and items are value records held in arenas that are filled once per
//! skin. [`Pool::get`] hands slots out round-robin and wraps instead of
//! allocating. Each hand-out bumps the slot generation, so a handle kept by a
//! previous owner goes stale rather than aliasing the new occupant.
//!
//! Capacities come from the window size (see [`required_lane_capacity`]).
//! With those minimums a wrap never lands on a live slot; if tuning
//! overrides break that, the wrap is logged and counted.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::fixed::Fixed;
use crate::core::rng::DeterministicRng;
use crate::map::catalog::{MapSkin, SkinCatalog};
use crate::map::config::MapConfig;
use crate::map::error::MapError;
use crate::map::item::{Item, ItemKind, ItemPools};
use crate::map::lane::{Lane, LaneHandle, LaneResource, LaneStyle, Seam};

/// Generation-checked reference to a pool slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolHandle {
    slot: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index inside the pool.
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct PoolSlot<T> {
    value: T,
    generation: u32,
    live: bool,
}

/// Round-robin pool of pre-built records.
pub struct Pool<T> {
    slots: Vec<PoolSlot<T>>,
    capacity: usize,
    cursor: usize,
    live_reuse: u64,
}

impl<T> Pool<T> {
    /// Create an empty pool with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            live_reuse: 0,
        }
    }

    /// Change the capacity. Shrinking drops the records past the new end.
    pub fn resize(&mut self, capacity: usize) {
        if capacity < self.slots.len() {
            self.slots.truncate(capacity);
        } else {
            self.slots.reserve(capacity - self.slots.len());
        }
        self.capacity = capacity;
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }
    }

    /// Append a pre-built record. Only used while populating.
    ///
    /// Returns false when the pool is already at capacity.
    pub fn add(&mut self, value: T) -> bool {
        if self.slots.len() >= self.capacity {
            return false;
        }
        self.slots.push(PoolSlot {
            value,
            generation: 0,
            live: false,
        });
        true
    }

    /// Hand out the record under the cursor and advance it.
    ///
    /// Wraps to the first slot when the cursor runs off the end. Returns
    /// `None` only for an empty pool.
    pub fn get(&mut self) -> Option<PoolHandle> {
        if self.slots.is_empty() {
            return None;
        }
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }

        let index = self.cursor;
        self.cursor += 1;

        let slot = &mut self.slots[index];
        if slot.live {
            self.live_reuse += 1;
            warn!(slot = index, "pool wrapped onto a live record");
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.live = true;

        Some(PoolHandle {
            slot: index as u32,
            generation: slot.generation,
        })
    }

    /// Mark a record free. Stale handles are ignored.
    ///
    /// Returns the record so the caller can reset it.
    pub fn release(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.slot())?;
        if slot.generation != handle.generation || !slot.live {
            return None;
        }
        slot.live = false;
        Some(&mut slot.value)
    }

    /// Record behind a handle, if the handle is current.
    pub fn get_ref(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.slot())
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &slot.value)
    }

    /// Mutable record behind a handle, if the handle is current.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.slot())
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &mut slot.value)
    }

    /// Whether the handle is current and its record handed out.
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.slot())
            .is_some_and(|slot| slot.generation == handle.generation && slot.live)
    }

    /// Drop every record and reset the cursor.
    ///
    /// Returns how many records were dropped.
    pub fn clear_all(&mut self) -> usize {
        let dropped = self.slots.len();
        self.slots.clear();
        self.cursor = 0;
        self.live_reuse = 0;
        dropped
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no records are held.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records currently handed out.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.live).count()
    }

    /// How often `get` handed out a record that was still live.
    pub fn live_reuse_count(&self) -> u64 {
        self.live_reuse
    }
}

// =============================================================================
// CAPACITY RULES
// =============================================================================

/// Minimum number of lanes of `resource` that can be active at once in a
/// window of `window` lanes.
///
/// - Grass lanes alternate Dark/Light, so each variant takes at most every
///   other row.
/// - A single-lane road is always followed by a different kind, so it too
///   takes at most every other row.
/// - A multi-lane road has one Bottom and one Top, and the next road set is
///   at least one row away: at most one of each per three rows.
pub fn required_lane_capacity(resource: LaneResource, window: usize) -> usize {
    match resource {
        LaneResource::GrassDark | LaneResource::GrassLight | LaneResource::RoadSingle => {
            window.div_ceil(2)
        }
        LaneResource::RoadBottom | LaneResource::RoadTop => window.div_ceil(3),
        LaneResource::RoadMiddle | LaneResource::Railroad | LaneResource::River => window,
    }
}

/// Minimum number of `kind` items active at once.
pub fn required_item_capacity(kind: ItemKind, config: &MapConfig) -> usize {
    let window = config.active_lane_count;
    let tuning = &config.tuning;
    let per_lane = match kind {
        ItemKind::Tree | ItemKind::Rock | ItemKind::LilyPad => config.lane_width,
        ItemKind::Log => tuning.max_logs_per_lane as usize,
        ItemKind::Car | ItemKind::Truck => tuning.max_vehicles_per_lane as usize,
        ItemKind::Train | ItemKind::Coin => 1,
    };
    window * per_lane
}

// =============================================================================
// MAP POOLS
// =============================================================================

/// Every pool the generator draws from, for one skin.
pub struct MapPools {
    skin: MapSkin,
    lanes: BTreeMap<LaneResource, Pool<Lane>>,
    items: ItemPools,
}

impl MapPools {
    /// Build and fill all pools for `skin`.
    ///
    /// Fails if a capacity override in `config` is below the derived minimum.
    pub fn populate(
        config: &MapConfig,
        catalog: &dyn SkinCatalog,
        skin: MapSkin,
    ) -> Result<Self, MapError> {
        let geometry = config.geometry();
        let mut lanes = BTreeMap::new();

        for resource in LaneResource::ALL {
            let required = required_lane_capacity(resource, config.active_lane_count);
            let capacity = match config.lane_pool_capacity.get(&resource) {
                Some(&capacity) if capacity < required => {
                    return Err(MapError::LanePoolTooSmall { resource, capacity, required });
                }
                Some(&capacity) => capacity,
                None => required,
            };

            let asset = catalog.lane_asset(skin, resource);
            let mut pool = Pool::with_capacity(capacity);
            while pool.add(Lane::new(resource, asset, geometry, config.max_items_per_lane())) {}
            lanes.insert(resource, pool);
        }

        let mut items = ItemPools::default();
        for kind in ItemKind::ALL {
            let required = required_item_capacity(kind, config);
            let capacity = match config.item_pool_capacity.get(&kind) {
                Some(&capacity) if capacity < required => {
                    return Err(MapError::ItemPoolTooSmall { kind, capacity, required });
                }
                Some(&capacity) => capacity,
                None => required,
            };

            let asset = catalog.item_asset(skin, kind);
            let mut pool = Pool::with_capacity(capacity);
            while pool.add(Item::new(kind, asset)) {}
            items.insert(kind, pool);
        }

        debug!(skin = skin.name(), "populated map pools");

        Ok(Self { skin, lanes, items })
    }

    /// Skin the pooled records were built for.
    pub fn skin(&self) -> MapSkin {
        self.skin
    }

    /// Drop every pooled record. Returns how many were dropped.
    pub fn clear_all(&mut self) -> usize {
        let lanes: usize = self.lanes.values_mut().map(Pool::clear_all).sum();
        lanes + self.items.clear_all()
    }

    /// Take a lane of `resource` from its pool.
    pub fn fetch_lane(&mut self, resource: LaneResource) -> Option<LaneHandle> {
        let handle = self.lanes.get_mut(&resource)?.get()?;
        Some(LaneHandle { resource, handle })
    }

    /// Activate a fetched lane at `row`, returning the seam for the next lane.
    pub fn activate_lane(
        &mut self,
        lane: LaneHandle,
        row: i32,
        seam: &Seam,
        style: LaneStyle,
        rng: &mut DeterministicRng,
        config: &MapConfig,
    ) -> Option<Seam> {
        let record = self.lanes.get_mut(&lane.resource)?.get_mut(lane.handle)?;
        Some(record.activate(row, seam, style, rng, &mut self.items, config))
    }

    /// Deactivate a lane and return it and its items to their pools.
    ///
    /// A stale handle (the slot was already reused) is a no-op.
    pub fn deactivate_lane(&mut self, lane: LaneHandle) -> bool {
        let Some(pool) = self.lanes.get_mut(&lane.resource) else {
            return false;
        };
        match pool.release(lane.handle) {
            Some(record) => {
                record.deactivate(&mut self.items);
                true
            }
            None => false,
        }
    }

    /// Lane record behind a handle.
    pub fn lane(&self, lane: LaneHandle) -> Option<&Lane> {
        self.lanes.get(&lane.resource)?.get_ref(lane.handle)
    }

    /// Pool for one lane resource.
    pub fn lane_pool(&self, resource: LaneResource) -> Option<&Pool<Lane>> {
        self.lanes.get(&resource)
    }

    /// Item pools.
    pub fn items(&self) -> &ItemPools {
        &self.items
    }

    /// Mutable item pools.
    pub fn items_mut(&mut self) -> &mut ItemPools {
        &mut self.items
    }

    /// Advance every moving item on `lane` by `dt`.
    pub fn advance_lane_items(&mut self, lane: LaneHandle, dt: Fixed) {
        let Some(record) = self.lanes.get(&lane.resource).and_then(|pool| pool.get_ref(lane.handle)) else {
            return;
        };
        let (min_x, span) = record.wrap_span();
        for item in record.items() {
            self.items.advance(*item, dt, min_x, span);
        }
    }

    /// Collect the coin on `column` of `lane`, if there is one.
    pub fn take_coin(&mut self, lane: LaneHandle, column: i32) -> bool {
        let Some(record) = self.lanes.get_mut(&lane.resource).and_then(|pool| pool.get_mut(lane.handle)) else {
            return false;
        };
        record.take_coin(column, &mut self.items)
    }

    /// Wraps that landed on live records, across all pools.
    pub fn live_reuse_count(&self) -> u64 {
        let lanes: u64 = self.lanes.values().map(Pool::live_reuse_count).sum();
        lanes + self.items.live_reuse_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::catalog::DefaultCatalog;

    #[test]
    fn test_round_robin_wraps() {
        let mut pool = Pool::with_capacity(3);
        for value in 0..3 {
            assert!(pool.add(value));
        }
        assert!(!pool.add(99));

        let first = pool.get().unwrap();
        pool.get().unwrap();
        pool.get().unwrap();
        let wrapped = pool.get().unwrap();

        assert_eq!(first.slot(), wrapped.slot());
        assert_eq!(pool.get_ref(wrapped), Some(&0));
    }

    #[test]
    fn test_wrap_invalidates_previous_handle() {
        let mut pool = Pool::with_capacity(1);
        pool.add("lane");

        let old = pool.get().unwrap();
        let new = pool.get().unwrap();

        assert!(pool.get_ref(old).is_none());
        assert!(!pool.is_live(old));
        assert!(pool.is_live(new));
        assert_eq!(pool.live_reuse_count(), 1);

        // Releasing through the stale handle must not free the new owner
        assert!(pool.release(old).is_none());
        assert!(pool.is_live(new));
    }

    #[test]
    fn test_release_then_reuse_is_not_counted() {
        let mut pool = Pool::with_capacity(1);
        pool.add(0u8);

        let handle = pool.get().unwrap();
        assert!(pool.release(handle).is_some());
        assert!(pool.release(handle).is_none());

        pool.get().unwrap();
        assert_eq!(pool.live_reuse_count(), 0);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool: Pool<u8> = Pool::with_capacity(0);
        assert!(pool.get().is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_resize_and_clear() {
        let mut pool = Pool::with_capacity(4);
        for value in 0..4 {
            pool.add(value);
        }
        pool.get();
        pool.get();
        pool.get();

        pool.resize(2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), 2);
        // Cursor was past the new end, so it restarts at slot 0
        assert_eq!(pool.get().map(|h| h.slot()), Some(0));

        assert_eq!(pool.clear_all(), 2);
        assert!(pool.is_empty());
        assert!(pool.add(7));
    }

    #[test]
    fn test_required_lane_capacity() {
        assert_eq!(required_lane_capacity(LaneResource::GrassDark, 20), 10);
        assert_eq!(required_lane_capacity(LaneResource::RoadSingle, 21), 11);
        assert_eq!(required_lane_capacity(LaneResource::RoadBottom, 20), 7);
        assert_eq!(required_lane_capacity(LaneResource::RoadTop, 21), 7);
        assert_eq!(required_lane_capacity(LaneResource::River, 20), 20);
    }

    #[test]
    fn test_populate_fills_to_capacity() {
        let config = MapConfig::default();
        let pools = MapPools::populate(&config, &DefaultCatalog, MapSkin::Classic).unwrap();

        for resource in LaneResource::ALL {
            let pool = pools.lane_pool(resource).unwrap();
            assert_eq!(pool.len(), required_lane_capacity(resource, config.active_lane_count));
        }
    }

    #[test]
    fn test_populate_rejects_small_override() {
        let mut config = MapConfig::default();
        config.lane_pool_capacity.insert(LaneResource::RoadTop, 1);

        let result = MapPools::populate(&config, &DefaultCatalog, MapSkin::Classic);
        assert!(matches!(
            result,
            Err(MapError::LanePoolTooSmall { resource: LaneResource::RoadTop, capacity: 1, required: 7 })
        ));
    }

    #[test]
    fn test_populate_accepts_larger_override() {
        let mut config = MapConfig::default();
        config.item_pool_capacity.insert(ItemKind::Coin, 64);

        let pools = MapPools::populate(&config, &DefaultCatalog, MapSkin::Winter).unwrap();
        assert_eq!(pools.items().pool(ItemKind::Coin).map(Pool::len), Some(64));
        assert_eq!(pools.skin(), MapSkin::Winter);
    }
}
