//! # Player-Own State
//!
//! The viewer's own player block. Every field group carries its own dirty
//! bit, so an unchanged group costs exactly one bit:
//!
//! ```text
//! [bounds?][health?][adrenaline?][zoom?][identity?][weapons?][items?]
//!     │        │          │
//!     │        └──────────┴── quantized over the bounds in force
//!     └── max health, min/max adrenaline as raw f32
//! ```
//!
//! Health and adrenaline are quantized over bounds that are only resent when
//! they change. Both ends keep a [`PlayerStateCache`] holding the last bounds
//! so a value can be read without its bounds in the same message.

use royale_shared::constants::{DEFAULT_MAX_ADRENALINE, DEFAULT_MAX_HEALTH, MAX_ITEM_COUNT, WEAPON_SLOTS};
use royale_shared::{bits_for, DefinitionIndex, Definitions, LootDefinition};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::protocol::objects::ObjectId;
use crate::protocol::stream::{BitReader, BitWriter};
use crate::protocol::variant::{resolve, VariantStream};

/// Bits for a quantized health value.
pub const HEALTH_BITS: u8 = 12;
/// Bits for a quantized adrenaline value.
pub const ADRENALINE_BITS: u8 = 10;

const ZOOM_BITS: u8 = 8;
const AMMO_BITS: u8 = 8;
const WEAPON_KILLS_BITS: u8 = 7;
const ITEM_COUNT_BITS: u8 = 9;
const ACTIVE_SLOT_BITS: u8 = bits_for(WEAPON_SLOTS);

/// Ranges health and adrenaline are quantized over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthBounds {
    /// Upper bound of health; the lower bound is 0.
    pub max_health: f32,
    /// Lower bound of adrenaline.
    pub min_adrenaline: f32,
    /// Upper bound of adrenaline.
    pub max_adrenaline: f32,
}

impl Default for HealthBounds {
    fn default() -> Self {
        Self {
            max_health: DEFAULT_MAX_HEALTH,
            min_adrenaline: 0.0,
            max_adrenaline: DEFAULT_MAX_ADRENALINE,
        }
    }
}

impl HealthBounds {
    /// Checks that the bounds form usable quantization ranges: all finite,
    /// `max_health >= 0` and `min_adrenaline <= max_adrenaline`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::ConstraintViolation`] otherwise.
    pub fn validate(self) -> DecodeResult<Self> {
        let finite = self.max_health.is_finite() && self.min_adrenaline.is_finite() && self.max_adrenaline.is_finite();
        if finite && self.max_health >= 0.0 && self.min_adrenaline <= self.max_adrenaline {
            Ok(self)
        } else {
            Err(DecodeError::ConstraintViolation {
                what: "health bounds",
                detail: format!(
                    "max health {}, adrenaline [{}, {}]",
                    self.max_health, self.min_adrenaline, self.max_adrenaline
                ),
            })
        }
    }
}

/// Who the viewer is and whether they are watching someone else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    /// Object id of the player whose state this is.
    pub id: ObjectId,
    /// Viewer is spectating that player.
    pub spectating: bool,
}

/// One occupied weapon slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponSlot {
    /// Weapon kind.
    pub definition: DefinitionIndex<LootDefinition>,
    /// Loaded ammo; only sent for guns.
    pub ammo: u8,
    /// Kills made with this weapon.
    pub kills: u8,
}

/// The weapon slots and which one is in hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeaponLoadout {
    /// Index of the active slot.
    pub active_slot: u8,
    /// Slot contents.
    pub slots: [Option<WeaponSlot>; WEAPON_SLOTS],
}

/// Inventory counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Inventory {
    /// Count per inventory item, aligned with
    /// [`Definitions::inventory_items`]. Missing trailing entries are sent as
    /// 0, and a decoded inventory always has one entry per item, so a short
    /// list comes back zero-padded to full length.
    pub counts: Vec<u16>,
    /// Equipped scope.
    pub scope: DefinitionIndex<LootDefinition>,
}

/// Dirty-flagged own-player state. `None` means unchanged since last tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerData {
    /// Health and adrenaline ranges.
    pub bounds: Option<HealthBounds>,
    /// Current health.
    pub health: Option<f32>,
    /// Current adrenaline.
    pub adrenaline: Option<f32>,
    /// Camera zoom level.
    pub zoom: Option<u8>,
    /// Own id and spectating state.
    pub identity: Option<PlayerIdentity>,
    /// Weapon loadout.
    pub weapons: Option<WeaponLoadout>,
    /// Inventory counts and scope.
    pub items: Option<Inventory>,
}

impl PlayerData {
    /// Writes the block. Health and adrenaline use this block's bounds if
    /// present, otherwise `previous`.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow, a foreign registry index, or more inventory
    /// counts than inventory items.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions, previous: &PlayerStateCache) -> EncodeResult<()> {
        let bounds = self.bounds.unwrap_or(previous.bounds);

        writer.write_option(self.bounds.as_ref(), |w, bounds| {
            w.write_f32(bounds.max_health)?;
            w.write_f32(bounds.min_adrenaline)?;
            w.write_f32(bounds.max_adrenaline)
        })?;
        writer.write_option(self.health.as_ref(), |w, &health| {
            w.write_float(health, 0.0, bounds.max_health, HEALTH_BITS)
        })?;
        writer.write_option(self.adrenaline.as_ref(), |w, &adrenaline| {
            w.write_float(adrenaline, bounds.min_adrenaline, bounds.max_adrenaline, ADRENALINE_BITS)
        })?;
        writer.write_option(self.zoom.as_ref(), |w, &zoom| w.write_bits(u32::from(zoom), ZOOM_BITS))?;
        writer.write_option(self.identity.as_ref(), |w, identity| {
            w.write_object_id(identity.id)?;
            w.write_bool(identity.spectating)
        })?;
        writer.write_option(self.weapons.as_ref(), |w, weapons| write_weapons(w, definitions, weapons))?;
        writer.write_option(self.items.as_ref(), |w, items| write_items(w, definitions, items))
    }

    /// Reads the block. Health and adrenaline are dequantized over this
    /// block's bounds if present, otherwise `previous`.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input, including bounds that do not form
    /// a valid range.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions, previous: &PlayerStateCache) -> DecodeResult<Self> {
        let bounds = reader.read_option(|r| {
            HealthBounds {
                max_health: r.read_f32()?,
                min_adrenaline: r.read_f32()?,
                max_adrenaline: r.read_f32()?,
            }
            .validate()
        })?;
        let active = bounds.unwrap_or(previous.bounds);

        let health = reader.read_option(|r| r.read_float(0.0, active.max_health, HEALTH_BITS))?;
        let adrenaline = reader.read_option(|r| {
            r.read_float(active.min_adrenaline, active.max_adrenaline, ADRENALINE_BITS)
        })?;
        let zoom = reader.read_option(|r| Ok(r.read_bits(ZOOM_BITS)? as u8))?;
        let identity = reader.read_option(|r| {
            Ok(PlayerIdentity {
                id: r.read_object_id()?,
                spectating: r.read_bool()?,
            })
        })?;
        let weapons = reader.read_option(|r| read_weapons(r, definitions))?;
        let items = reader.read_option(|r| read_items(r, definitions))?;

        Ok(Self {
            bounds,
            health,
            adrenaline,
            zoom,
            identity,
            weapons,
            items,
        })
    }
}

fn write_weapons(writer: &mut BitWriter, definitions: &Definitions, weapons: &WeaponLoadout) -> EncodeResult<()> {
    writer.write_bits(u32::from(weapons.active_slot), ACTIVE_SLOT_BITS)?;
    for slot in &weapons.slots {
        writer.write_option(slot.as_ref(), |w, slot| {
            let definition = resolve(&definitions.loots, slot.definition)?;
            definitions.loots.write_to_stream(w, slot.definition)?;
            if definition.item_type.has_ammo() {
                w.write_bits(u32::from(slot.ammo), AMMO_BITS)?;
            }
            w.write_bits(u32::from(slot.kills), WEAPON_KILLS_BITS)
        })?;
    }
    Ok(())
}

fn read_weapons(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<WeaponLoadout> {
    let active_slot = reader.read_bits(ACTIVE_SLOT_BITS)? as u8;
    let mut slots = [None; WEAPON_SLOTS];
    for slot in &mut slots {
        *slot = reader.read_option(|r| {
            let (index, definition) = definitions.loots.read_definition(r)?;
            let ammo = if definition.item_type.has_ammo() {
                r.read_bits(AMMO_BITS)? as u8
            } else {
                0
            };
            Ok(WeaponSlot {
                definition: index,
                ammo,
                kills: r.read_bits(WEAPON_KILLS_BITS)? as u8,
            })
        })?;
    }
    Ok(WeaponLoadout { active_slot, slots })
}

fn write_items(writer: &mut BitWriter, definitions: &Definitions, items: &Inventory) -> EncodeResult<()> {
    let inventory = definitions.inventory_items();
    if items.counts.len() > inventory.len() {
        return Err(EncodeError::ListTooLong {
            list: "inventory counts",
            len: items.counts.len(),
            max: inventory.len(),
        });
    }

    for slot in 0..inventory.len() {
        let count = items.counts.get(slot).copied().unwrap_or(0).min(MAX_ITEM_COUNT);
        writer.write_bool(count > 0)?;
        if count > 0 {
            writer.write_bits(u32::from(count), ITEM_COUNT_BITS)?;
        }
    }
    definitions.loots.write_to_stream(writer, items.scope)
}

fn read_items(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Inventory> {
    let inventory = definitions.inventory_items();
    let mut counts = Vec::with_capacity(inventory.len());
    for _ in inventory {
        let count = if reader.read_bool()? {
            reader.read_bits(ITEM_COUNT_BITS)? as u16
        } else {
            0
        };
        counts.push(count);
    }

    Ok(Inventory {
        counts,
        scope: definitions.loots.read_from_stream(reader)?,
    })
}

// =============================================================================
// CROSS-TICK CACHE
// =============================================================================

/// Last known own-player values, kept by both ends across ticks.
///
/// Apply a decoded [`PlayerData`] only once its whole message decoded, so a
/// dropped message leaves the cache untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStateCache {
    /// Bounds in force.
    pub bounds: HealthBounds,
    /// Last health.
    pub health: f32,
    /// Last adrenaline.
    pub adrenaline: f32,
    /// Last zoom.
    pub zoom: u8,
    /// Own id, once known.
    pub id: Option<ObjectId>,
    /// Spectating flag.
    pub spectating: bool,
}

impl Default for PlayerStateCache {
    fn default() -> Self {
        Self {
            bounds: HealthBounds::default(),
            health: DEFAULT_MAX_HEALTH,
            adrenaline: 0.0,
            zoom: 0,
            id: None,
            spectating: false,
        }
    }
}

impl PlayerStateCache {
    /// Creates a cache with default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the fields present in `data`, keeping the rest.
    pub fn apply(&mut self, data: &PlayerData) {
        if let Some(bounds) = data.bounds {
            self.bounds = bounds;
        }
        if let Some(health) = data.health {
            self.health = health;
        }
        if let Some(adrenaline) = data.adrenaline {
            self.adrenaline = adrenaline;
        }
        if let Some(zoom) = data.zoom {
            self.zoom = zoom;
        }
        if let Some(identity) = data.identity {
            self.id = Some(identity.id);
            self.spectating = identity.spectating;
        }
    }
}
