//! Raw master loader.
//!
//! Raw files are TOML documents with one array of tables per record kind;
//! any subset may appear in a file and files are merged before indexing.
//!
//! ```toml
//! [[items]]
//! name = "potion"
//! weight = 0.5
//! value = 10
//! stackable = true
//!
//! [[enemy_tables]]
//! name = "enemies"
//! entries = [{ name = "rat", weight = 3.0 }]
//! ```

use std::path::Path;

use anyhow::Context;
use game_core::raw::{RawData, SpriteSheet};
use game_core::{GameError, RawMaster};

use crate::loaders::{LoadResult, read_file};

/// Loader for raw master TOML files.
pub struct RawLoader;

impl RawLoader {
    pub fn parse(content: &str) -> LoadResult<RawData> {
        toml::from_str(content).context("Failed to parse raw TOML")
    }

    pub fn load(path: &Path) -> LoadResult<RawData> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Appends every record of `from` to `into`.
    pub fn merge(into: &mut RawData, from: RawData) {
        into.items.extend(from.items);
        into.members.extend(from.members);
        into.drop_tables.extend(from.drop_tables);
        into.enemy_tables.extend(from.enemy_tables);
        into.item_tables.extend(from.item_tables);
        into.props.extend(from.props);
        into.tiles.extend(from.tiles);
        into.sprite_sheets.extend(from.sprite_sheets);
    }

    /// Indexes `data` with its sprite sheets and runs every integrity check.
    pub fn build(mut data: RawData, sheets: Vec<SpriteSheet>) -> LoadResult<RawMaster> {
        data.sprite_sheets.extend(sheets);
        RawMaster::new(data).map_err(|err| {
            tracing::error!(code = err.error_code(), %err, "raw master rejected");
            anyhow::Error::new(err).context("raw master integrity check failed")
        })
    }
}

#[cfg(test)]
mod tests {
    use game_core::components::{AiBehavior, EquipSlot};

    use super::*;

    const RAWS: &str = r#"
[[items]]
name = "dagger"
weight = 1.0
value = 5
wearable = { slot = "weapon", bonus = { strength = 2 } }
sprite = { sheet = "items", key = "dagger" }

[[members]]
name = "rat"
ai = "hostile"
drop_table = "rat_drops"
attributes = { vitality = 1, strength = 2, sensation = 1, dexterity = 1, agility = 3 }

[[drop_tables]]
name = "rat_drops"
entries = [{ name = "dagger", weight = 1.0 }]

[[enemy_tables]]
name = "enemies"
entries = [{ name = "rat", weight = 3.0 }]
"#;

    #[test]
    fn parses_and_builds_master() {
        let data = RawLoader::parse(RAWS).unwrap();
        assert_eq!(data.items.len(), 1);
        let wearable = data.items[0].wearable.unwrap();
        assert_eq!(wearable.slot, EquipSlot::Weapon);
        assert_eq!(wearable.bonus.strength, 2);
        assert_eq!(data.members[0].ai, Some(AiBehavior::Hostile));
        assert_eq!(data.members[0].attributes.defense, 0);

        let master = RawLoader::build(data, vec![SpriteSheet::new("items", ["dagger"])]).unwrap();
        assert!(master.has_member("rat"));
        assert_eq!(master.enemy_table("enemies").unwrap().entries.len(), 1);
    }

    #[test]
    fn missing_sprite_sheet_fails_integrity() {
        let data = RawLoader::parse(RAWS).unwrap();
        let err = RawLoader::build(data, Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown sprite sheet 'items'"));
    }

    #[test]
    fn merge_keeps_duplicates_for_the_integrity_check() {
        let mut data = RawLoader::parse(RAWS).unwrap();
        let again = RawLoader::parse(RAWS).unwrap();
        RawLoader::merge(&mut data, again);
        let err = RawLoader::build(data, vec![SpriteSheet::new("items", ["dagger"])]).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate item name 'dagger'"));
    }
}
