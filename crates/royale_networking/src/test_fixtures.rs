//! Definitions shared by unit tests.

use royale_shared::Definitions;

pub(crate) const DEFINITIONS_TOML: &str = r#"
    [[obstacles]]
    id_string = "oak_tree"
    name = "Oak Tree"
    variations = 3

    [[obstacles]]
    id_string = "rock"
    name = "Rock"

    [[obstacles]]
    id_string = "house_door"
    name = "House Door"
    role = "door"
    rotation_mode = "limited"

    [[obstacles]]
    id_string = "button"
    name = "Button"
    role = "activatable"
    rotation_mode = "binary"

    [[obstacles]]
    id_string = "barrel"
    name = "Barrel"
    rotation_mode = "none"

    [[loots]]
    id_string = "fists"
    name = "Fists"
    item_type = "melee"

    [[loots]]
    id_string = "ak47"
    name = "AK-47"
    item_type = "gun"

    [[loots]]
    id_string = "12g"
    name = "12 Gauge Shells"
    item_type = "ammo"

    [[loots]]
    id_string = "gauze"
    name = "Gauze"
    item_type = "healing"

    [[loots]]
    id_string = "frag_grenade"
    name = "Frag Grenade"
    item_type = "throwable"

    [[loots]]
    id_string = "1x_scope"
    name = "1x Scope"
    item_type = "scope"

    [[loots]]
    id_string = "2x_scope"
    name = "2x Scope"
    item_type = "scope"

    [[loots]]
    id_string = "basic_helmet"
    name = "Basic Helmet"
    item_type = "armor"

    [[loots]]
    id_string = "hazel_jumpsuit"
    name = "Hazel Jumpsuit"
    item_type = "skin"

    [[explosions]]
    id_string = "frag_explosion"
    name = "Frag Grenade"

    [[explosions]]
    id_string = "barrel_explosion"
    name = "Barrel"

    [[emotes]]
    id_string = "happy_face"
    name = "Happy Face"

    [[emotes]]
    id_string = "thumbs_up"
    name = "Thumbs Up"

    [[emotes]]
    id_string = "sad_face"
    name = "Sad Face"

    [[buildings]]
    id_string = "warehouse"
    name = "Warehouse"

    [[buildings]]
    id_string = "shed"
    name = "Shed"

    [[decals]]
    id_string = "explosion_decal"
    name = "Scorch Mark"

    [[decals]]
    id_string = "floor_tile"
    name = "Floor Tile"
    rotation_mode = "none"
"#;

pub(crate) fn definitions() -> Definitions {
    Definitions::from_toml_str(DEFINITIONS_TOML).unwrap()
}
