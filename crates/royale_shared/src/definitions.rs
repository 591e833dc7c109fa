//! # Game Definitions
//!
//! The closed collections the protocol references by index: obstacles, loot
//! items, explosions, emotes, buildings and decals.
//!
//! Only the attributes that change the wire layout live here (rotation mode,
//! obstacle role, variation count, item type). Gameplay stats belong to the
//! simulation and are not needed by the codec.
//!
//! ## Loading
//!
//! ```rust,ignore
//! let definitions = Arc::new(Definitions::from_file("data/definitions.toml")?);
//! ```
//!
//! Definitions are loaded once at startup and never mutated afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DefinitionResult;
use crate::registry::{Definition, DefinitionIndex, Registry};

/// How an object's rotation is sent on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Any angle, 16-bit fixed float.
    #[default]
    Full,
    /// One of four right-angle orientations, 2 bits.
    Limited,
    /// Either of two orientations, 1 bit.
    Binary,
    /// Never rotated, nothing sent.
    None,
}

impl RotationMode {
    /// Number of discrete orientations, or `None` for free rotation.
    #[inline]
    #[must_use]
    pub const fn orientations(self) -> Option<u8> {
        match self {
            Self::Full => None,
            Self::Limited => Some(4),
            Self::Binary => Some(2),
            Self::None => Some(1),
        }
    }
}

/// Special behaviour of an obstacle that adds creation fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleRole {
    /// Plain destructible obstacle.
    #[default]
    Normal,
    /// Door with a 2-bit open offset.
    Door,
    /// Button, lever or similar with an activated flag.
    Activatable,
    /// Breakable window.
    Window,
}

/// Kind of loot item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Firearm.
    Gun,
    /// Melee weapon.
    Melee,
    /// Grenade or similar.
    Throwable,
    /// Ammunition.
    Ammo,
    /// Bandages, medkits, drinks.
    Healing,
    /// Helmet or vest.
    Armor,
    /// Backpack.
    Backpack,
    /// Zoom scope.
    Scope,
    /// Cosmetic player skin.
    Skin,
}

impl ItemType {
    /// True if a loot pile of this type carries a count.
    #[inline]
    #[must_use]
    pub const fn is_stackable(self) -> bool {
        matches!(self, Self::Ammo | Self::Healing | Self::Throwable)
    }

    /// True if this type is counted in the player's inventory.
    #[inline]
    #[must_use]
    pub const fn is_inventory_item(self) -> bool {
        matches!(self, Self::Ammo | Self::Healing | Self::Throwable | Self::Scope)
    }

    /// True if a weapon slot holding this item tracks ammo.
    #[inline]
    #[must_use]
    pub const fn has_ammo(self) -> bool {
        matches!(self, Self::Gun)
    }
}

/// Obstacle definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
    /// Special behaviour.
    #[serde(default)]
    pub role: ObstacleRole,
    /// Number of art variations, if any.
    #[serde(default)]
    pub variations: Option<u8>,
    /// How rotation is sent.
    #[serde(default)]
    pub rotation_mode: RotationMode,
}

/// Loot item definition (weapons, consumables, cosmetics).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
    /// Item kind.
    pub item_type: ItemType,
}

/// Explosion definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplosionDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
}

/// Emote definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmoteDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
}

/// Building definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
}

/// Ground decal definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecalDefinition {
    /// Unique id string.
    pub id_string: String,
    /// Display name.
    pub name: String,
    /// How rotation is sent.
    #[serde(default)]
    pub rotation_mode: RotationMode,
}

macro_rules! impl_definition {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Definition for $ty {
                fn id_string(&self) -> &str {
                    &self.id_string
                }
            }
        )*
    };
}

impl_definition!(
    ObstacleDefinition,
    LootDefinition,
    ExplosionDefinition,
    EmoteDefinition,
    BuildingDefinition,
    DecalDefinition,
);

/// On-disk layout of a definition file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DefinitionFile {
    obstacles: Vec<ObstacleDefinition>,
    loots: Vec<LootDefinition>,
    explosions: Vec<ExplosionDefinition>,
    emotes: Vec<EmoteDefinition>,
    buildings: Vec<BuildingDefinition>,
    decals: Vec<DecalDefinition>,
}

/// Every registry the protocol needs, built once at startup.
#[derive(Debug)]
pub struct Definitions {
    /// Obstacles.
    pub obstacles: Registry<ObstacleDefinition>,
    /// Loot items.
    pub loots: Registry<LootDefinition>,
    /// Explosions.
    pub explosions: Registry<ExplosionDefinition>,
    /// Emotes.
    pub emotes: Registry<EmoteDefinition>,
    /// Buildings.
    pub buildings: Registry<BuildingDefinition>,
    /// Decals.
    pub decals: Registry<DecalDefinition>,
    /// Loot entries counted in a player's inventory, in registry order.
    inventory_items: Vec<DefinitionIndex<LootDefinition>>,
}

impl Definitions {
    /// Parses and registers a TOML definition file.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or if any collection is empty or repeats an id.
    pub fn from_toml_str(source: &str) -> DefinitionResult<Self> {
        let file: DefinitionFile = toml::from_str(source)?;
        Self::from_parts(file)
    }

    /// Reads, parses and registers a TOML definition file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, or as [`Definitions::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> DefinitionResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn from_parts(file: DefinitionFile) -> DefinitionResult<Self> {
        let loots = Registry::new("loots", file.loots)?;
        let inventory_items = loots
            .iter()
            .filter(|(_, definition)| definition.item_type.is_inventory_item())
            .map(|(index, _)| index)
            .collect();

        let definitions = Self {
            obstacles: Registry::new("obstacles", file.obstacles)?,
            loots,
            explosions: Registry::new("explosions", file.explosions)?,
            emotes: Registry::new("emotes", file.emotes)?,
            buildings: Registry::new("buildings", file.buildings)?,
            decals: Registry::new("decals", file.decals)?,
            inventory_items,
        };

        tracing::info!(
            obstacles = definitions.obstacles.len(),
            loots = definitions.loots.len(),
            explosions = definitions.explosions.len(),
            emotes = definitions.emotes.len(),
            buildings = definitions.buildings.len(),
            decals = definitions.decals.len(),
            "definitions loaded"
        );

        Ok(definitions)
    }

    /// Loot entries that appear in the inventory item counts, in wire order.
    #[inline]
    #[must_use]
    pub fn inventory_items(&self) -> &[DefinitionIndex<LootDefinition>] {
        &self.inventory_items
    }
}
