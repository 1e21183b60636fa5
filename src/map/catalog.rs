//! Skin Catalog
//!
//! Maps lane resources and item kinds to the asset handles of the current
//! visual skin. The renderer owns the assets; the generator only carries
//! the ids around so pooled records can be drawn without a lookup.

use serde::{Serialize, Deserialize};

use crate::map::item::ItemKind;
use crate::map::lane::LaneResource;

/// Opaque asset handle understood by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AssetId(pub u32);

/// Visual theme of a map. Switching skin repopulates every pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MapSkin {
    /// Default summer look.
    #[default]
    Classic = 0,
    /// Snow and ice.
    Winter = 1,
    /// Sand and cacti.
    Desert = 2,
}

impl MapSkin {
    /// Stable name, also used for seed derivation.
    pub fn name(self) -> &'static str {
        match self {
            MapSkin::Classic => "classic",
            MapSkin::Winter => "winter",
            MapSkin::Desert => "desert",
        }
    }
}

/// Effects shared by every lane type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SharedEffect {
    /// Bird that carries off an idle or retreating character.
    Eagle = 0,
    /// Splash played when the character lands in water.
    WaterSplash = 1,
}

/// Per-skin resource lookup.
pub trait SkinCatalog {
    /// Asset for a lane resource.
    fn lane_asset(&self, skin: MapSkin, resource: LaneResource) -> AssetId;

    /// Asset for an item kind.
    fn item_asset(&self, skin: MapSkin, kind: ItemKind) -> AssetId;

    /// Asset for a shared effect.
    fn effect_asset(&self, skin: MapSkin, effect: SharedEffect) -> AssetId;
}

/// Numbered asset table: `skin * 1000 + group * 100 + variant`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCatalog;

impl DefaultCatalog {
    const LANE_GROUP: u32 = 1;
    const ITEM_GROUP: u32 = 2;
    const EFFECT_GROUP: u32 = 3;

    fn compose(skin: MapSkin, group: u32, variant: u8) -> AssetId {
        AssetId(skin as u32 * 1000 + group * 100 + variant as u32)
    }
}

impl SkinCatalog for DefaultCatalog {
    fn lane_asset(&self, skin: MapSkin, resource: LaneResource) -> AssetId {
        Self::compose(skin, Self::LANE_GROUP, resource as u8)
    }

    fn item_asset(&self, skin: MapSkin, kind: ItemKind) -> AssetId {
        Self::compose(skin, Self::ITEM_GROUP, kind as u8)
    }

    fn effect_asset(&self, skin: MapSkin, effect: SharedEffect) -> AssetId {
        Self::compose(skin, Self::EFFECT_GROUP, effect as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_unique_per_skin() {
        let catalog = DefaultCatalog;
        let classic = catalog.lane_asset(MapSkin::Classic, LaneResource::River);
        let winter = catalog.lane_asset(MapSkin::Winter, LaneResource::River);
        assert_ne!(classic, winter);

        let lane = catalog.lane_asset(MapSkin::Desert, LaneResource::GrassDark);
        let item = catalog.item_asset(MapSkin::Desert, ItemKind::Tree);
        let effect = catalog.effect_asset(MapSkin::Desert, SharedEffect::Eagle);
        assert_ne!(lane, item);
        assert_ne!(item, effect);
    }
}
