//! Raw master: named data records for items, members, tables, props and
//! tiles.
//!
//! Records are plain values deserialised by the content crate. Building a
//! [`RawMaster`] indexes them by name and enforces integrity:
//!
//! - no duplicate names within a kind
//! - every referenced name resolves
//! - every sprite key exists in its sprite sheet
//! - table weights are positive
//!
//! Any violation is a [`RawError`], fatal at load time.

use std::collections::{BTreeSet, HashMap};

use crate::components::{ActivationRange, ActivationWay, AiBehavior, Door, DoorOrientation, EquipBonus, EquipSlot, Rgba};
use crate::error::{ErrorSeverity, GameError};
use crate::level::TileKind;
use crate::rng::GameRng;
use crate::weighted::{self, Weighted};

/// Reference into a sprite sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpriteRef {
    pub sheet: String,
    pub key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawLight {
    pub radius: i32,
    #[cfg_attr(feature = "serde", serde(default = "default_light_color"))]
    pub color: Rgba,
}

#[cfg(feature = "serde")]
fn default_light_color() -> Rgba {
    Rgba::new(255, 220, 170, 255)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawWearable {
    pub slot: EquipSlot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defense: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bonus: EquipBonus,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawItem {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stackable: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub wearable: Option<RawWearable>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sprite: Option<SpriteRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub light: Option<RawLight>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawAttributes {
    pub vitality: i32,
    pub strength: i32,
    pub sensation: i32,
    pub dexterity: i32,
    pub agility: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defense: i32,
}

/// A character template: enemies, townsfolk and the player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawMember {
    pub name: String,
    pub attributes: RawAttributes,
    /// Absent for the player template.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ai: Option<AiBehavior>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sprite: Option<SpriteRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub drop_table: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub light: Option<RawLight>,
}

/// Weighted reference to another record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawEntry {
    pub name: String,
    pub weight: f64,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

impl Weighted for RawEntry {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Named list of weighted entries.
///
/// Drop and item tables reference items; enemy tables reference members.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTable {
    pub name: String,
    pub entries: Vec<RawEntry>,
}

impl RawTable {
    /// Weighted pick; `None` for an empty or zero-weight table.
    pub fn choose(&self, rng: &mut GameRng) -> Option<&str> {
        weighted::choose(rng, &self.entries).map(|entry| entry.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawInteraction {
    pub range: ActivationRange,
    pub way: ActivationWay,
    #[cfg_attr(feature = "serde", serde(default))]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawProp {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub block_pass: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub block_view: bool,
    /// Doors toggle between open and closed sprites.
    #[cfg_attr(feature = "serde", serde(default))]
    pub door: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sprite: Option<SpriteRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub light: Option<RawLight>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interaction: Option<RawInteraction>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTile {
    pub name: String,
    pub kind: TileKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sprite_sheet: Option<String>,
}

/// Frame keys of one sprite sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpriteSheet {
    pub name: String,
    pub keys: BTreeSet<String>,
}

impl SpriteSheet {
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Unvalidated record collections, as read from data files.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RawData {
    pub items: Vec<RawItem>,
    pub members: Vec<RawMember>,
    pub drop_tables: Vec<RawTable>,
    pub enemy_tables: Vec<RawTable>,
    pub item_tables: Vec<RawTable>,
    pub props: Vec<RawProp>,
    pub tiles: Vec<RawTile>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub sprite_sheets: Vec<SpriteSheet>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RawError {
    #[error("duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("{kind} '{owner}' references unknown {target} '{name}'")]
    Unresolved {
        kind: &'static str,
        owner: String,
        target: &'static str,
        name: String,
    },

    #[error("{owner} uses unknown sprite sheet '{sheet}'")]
    MissingSpriteSheet { owner: String, sheet: String },

    #[error("{owner} uses sprite key '{key}' missing from sheet '{sheet}'")]
    MissingSpriteKey {
        owner: String,
        sheet: String,
        key: String,
    },

    #[error("table '{table}' entry '{name}' has non-positive weight {weight}")]
    InvalidWeight {
        table: String,
        name: String,
        weight: String,
    },

    #[error("unknown {kind} '{name}'")]
    NotFound { kind: &'static str, name: String },
}

impl GameError for RawError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Integrity
    }

    fn error_code(&self) -> &'static str {
        match self {
            RawError::Duplicate { .. } => "RAW_DUPLICATE",
            RawError::Unresolved { .. } => "RAW_UNRESOLVED",
            RawError::MissingSpriteSheet { .. } => "RAW_MISSING_SHEET",
            RawError::MissingSpriteKey { .. } => "RAW_MISSING_SPRITE_KEY",
            RawError::InvalidWeight { .. } => "RAW_INVALID_WEIGHT",
            RawError::NotFound { .. } => "RAW_NOT_FOUND",
        }
    }
}

fn index_by_name<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, RawError> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name.to_string(), i).is_some() {
            return Err(RawError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(index)
}

/// Validated, indexed raw records.
#[derive(Clone, Debug, Default)]
pub struct RawMaster {
    data: RawData,
    items: HashMap<String, usize>,
    members: HashMap<String, usize>,
    drop_tables: HashMap<String, usize>,
    enemy_tables: HashMap<String, usize>,
    item_tables: HashMap<String, usize>,
    props: HashMap<String, usize>,
    tiles: HashMap<String, usize>,
    sheets: HashMap<String, usize>,
}

impl RawMaster {
    /// Indexes and validates `data`.
    pub fn new(data: RawData) -> Result<Self, RawError> {
        let master = Self {
            items: index_by_name("item", data.items.iter().map(|r| r.name.as_str()))?,
            members: index_by_name("member", data.members.iter().map(|r| r.name.as_str()))?,
            drop_tables: index_by_name("drop table", data.drop_tables.iter().map(|r| r.name.as_str()))?,
            enemy_tables: index_by_name("enemy table", data.enemy_tables.iter().map(|r| r.name.as_str()))?,
            item_tables: index_by_name("item table", data.item_tables.iter().map(|r| r.name.as_str()))?,
            props: index_by_name("prop", data.props.iter().map(|r| r.name.as_str()))?,
            tiles: index_by_name("tile", data.tiles.iter().map(|r| r.name.as_str()))?,
            sheets: index_by_name("sprite sheet", data.sprite_sheets.iter().map(|s| s.name.as_str()))?,
            data,
        };
        master.check_references()?;
        master.check_sprites()?;
        tracing::debug!(
            items = master.data.items.len(),
            members = master.data.members.len(),
            props = master.data.props.len(),
            tiles = master.data.tiles.len(),
            "raw master indexed"
        );
        Ok(master)
    }

    fn check_table(
        kind: &'static str,
        table: &RawTable,
        target: &'static str,
        index: &HashMap<String, usize>,
    ) -> Result<(), RawError> {
        for entry in &table.entries {
            if !(entry.weight > 0.0) {
                return Err(RawError::InvalidWeight {
                    table: table.name.clone(),
                    name: entry.name.clone(),
                    weight: entry.weight.to_string(),
                });
            }
            if !index.contains_key(&entry.name) {
                return Err(RawError::Unresolved {
                    kind,
                    owner: table.name.clone(),
                    target,
                    name: entry.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_references(&self) -> Result<(), RawError> {
        for table in &self.data.drop_tables {
            Self::check_table("drop table", table, "item", &self.items)?;
        }
        for table in &self.data.item_tables {
            Self::check_table("item table", table, "item", &self.items)?;
        }
        for table in &self.data.enemy_tables {
            Self::check_table("enemy table", table, "member", &self.members)?;
        }
        for member in &self.data.members {
            if let Some(drop) = &member.drop_table {
                if !self.drop_tables.contains_key(drop) {
                    return Err(RawError::Unresolved {
                        kind: "member",
                        owner: member.name.clone(),
                        target: "drop table",
                        name: drop.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_sprite(&self, owner: &str, sheet: &str, key: &str) -> Result<(), RawError> {
        let sheet_data = self
            .sheet(sheet)
            .ok_or_else(|| RawError::MissingSpriteSheet {
                owner: owner.to_string(),
                sheet: sheet.to_string(),
            })?;
        if sheet_data.contains(key) {
            Ok(())
        } else {
            Err(RawError::MissingSpriteKey {
                owner: owner.to_string(),
                sheet: sheet.to_string(),
                key: key.to_string(),
            })
        }
    }

    fn check_sprites(&self) -> Result<(), RawError> {
        for item in &self.data.items {
            if let Some(sprite) = &item.sprite {
                self.check_sprite(&format!("item '{}'", item.name), &sprite.sheet, &sprite.key)?;
            }
        }
        for member in &self.data.members {
            if let Some(sprite) = &member.sprite {
                self.check_sprite(&format!("member '{}'", member.name), &sprite.sheet, &sprite.key)?;
            }
        }
        for prop in &self.data.props {
            let owner = format!("prop '{}'", prop.name);
            let Some(sprite) = &prop.sprite else {
                continue;
            };
            if prop.door {
                for orientation in [DoorOrientation::Horizontal, DoorOrientation::Vertical] {
                    for is_open in [false, true] {
                        let key = Door { is_open, orientation }.sprite_key();
                        self.check_sprite(&owner, &sprite.sheet, key)?;
                    }
                }
            } else {
                self.check_sprite(&owner, &sprite.sheet, &sprite.key)?;
            }
        }
        for tile in &self.data.tiles {
            if let Some(sheet) = &tile.sprite_sheet {
                if self.sheet(sheet).is_none() {
                    return Err(RawError::MissingSpriteSheet {
                        owner: format!("tile '{}'", tile.name),
                        sheet: sheet.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn data(&self) -> &RawData {
        &self.data
    }

    pub fn item(&self, name: &str) -> Option<&RawItem> {
        self.items.get(name).map(|&i| &self.data.items[i])
    }

    pub fn member(&self, name: &str) -> Option<&RawMember> {
        self.members.get(name).map(|&i| &self.data.members[i])
    }

    pub fn drop_table(&self, name: &str) -> Option<&RawTable> {
        self.drop_tables.get(name).map(|&i| &self.data.drop_tables[i])
    }

    pub fn enemy_table(&self, name: &str) -> Option<&RawTable> {
        self.enemy_tables.get(name).map(|&i| &self.data.enemy_tables[i])
    }

    pub fn item_table(&self, name: &str) -> Option<&RawTable> {
        self.item_tables.get(name).map(|&i| &self.data.item_tables[i])
    }

    pub fn prop(&self, name: &str) -> Option<&RawProp> {
        self.props.get(name).map(|&i| &self.data.props[i])
    }

    pub fn tile(&self, name: &str) -> Option<&RawTile> {
        self.tiles.get(name).map(|&i| &self.data.tiles[i])
    }

    pub fn sheet(&self, name: &str) -> Option<&SpriteSheet> {
        self.sheets.get(name).map(|&i| &self.data.sprite_sheets[i])
    }

    /// Resolves a terrain name to its tile kind. Raw tiles take precedence
    /// over the built-in kind names.
    pub fn tile_kind(&self, name: &str) -> Option<TileKind> {
        self.tile(name)
            .map(|tile| tile.kind)
            .or_else(|| name.parse().ok())
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawData {
        RawData {
            items: vec![RawItem {
                name: "potion".into(),
                description: String::new(),
                weight: 0.5,
                value: 10,
                stackable: true,
                wearable: None,
                sprite: Some(SpriteRef {
                    sheet: "items".into(),
                    key: "potion".into(),
                }),
                light: None,
            }],
            members: vec![RawMember {
                name: "slime".into(),
                attributes: RawAttributes {
                    vitality: 2,
                    strength: 2,
                    sensation: 1,
                    dexterity: 1,
                    agility: 1,
                    defense: 0,
                },
                ai: Some(AiBehavior::Hostile),
                sprite: None,
                drop_table: Some("slime_drops".into()),
                light: None,
            }],
            drop_tables: vec![RawTable {
                name: "slime_drops".into(),
                entries: vec![RawEntry::new("potion", 1.0)],
            }],
            enemy_tables: vec![RawTable {
                name: "dungeon".into(),
                entries: vec![RawEntry::new("slime", 1.0)],
            }],
            sprite_sheets: vec![SpriteSheet::new("items", ["potion"])],
            ..RawData::default()
        }
    }

    #[test]
    fn valid_data_indexes_by_name() {
        let master = RawMaster::new(sample()).unwrap();
        assert_eq!(master.item("potion").unwrap().value, 10);
        assert!(master.member("slime").is_some());
        assert_eq!(
            master.enemy_table("dungeon").unwrap().choose(&mut GameRng::new(1)),
            Some("slime")
        );
        assert_eq!(master.tile_kind("wall"), Some(TileKind::Wall));
        assert_eq!(master.tile_kind("lava"), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut data = sample();
        let copy = data.items[0].clone();
        data.items.push(copy);
        assert_eq!(
            RawMaster::new(data).unwrap_err(),
            RawError::Duplicate {
                kind: "item",
                name: "potion".into()
            }
        );
    }

    #[test]
    fn unresolved_reference_is_rejected() {
        let mut data = sample();
        data.enemy_tables[0].entries.push(RawEntry::new("dragon", 1.0));
        let err = RawMaster::new(data).unwrap_err();
        assert!(matches!(err, RawError::Unresolved { ref name, .. } if name == "dragon"));
        assert_eq!(err.severity(), ErrorSeverity::Integrity);
    }

    #[test]
    fn missing_sprite_key_is_rejected() {
        let mut data = sample();
        data.sprite_sheets = vec![SpriteSheet::new("items", ["sword"])];
        assert!(matches!(
            RawMaster::new(data).unwrap_err(),
            RawError::MissingSpriteKey { ref key, .. } if key == "potion"
        ));
    }

    #[test]
    fn zero_weight_entry_is_rejected() {
        let mut data = sample();
        data.drop_tables[0].entries[0].weight = 0.0;
        assert!(matches!(
            RawMaster::new(data).unwrap_err(),
            RawError::InvalidWeight { .. }
        ));
    }
}
