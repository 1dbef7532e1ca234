use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::sheet::GridSpec;

/// First deck id in a custom deck; the save format reserves lower values.
pub const FIRST_DECK_ID: u32 = 100;

/// Object pose in the save file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    pub rot_x: f64,
    pub rot_y: f64,
    pub rot_z: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

impl Transform {
    /// Spawn pose for a single card, face down above the table.
    fn card_pose() -> Self {
        Self {
            pos_x: 0.0,
            pos_y: 1.0,
            pos_z: -1.0,
            rot_x: 0.0,
            rot_y: 180.0,
            rot_z: 180.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
        }
    }

    /// Spawn pose for a deck, offset so it does not overlap a lone card.
    fn deck_pose() -> Self {
        Self {
            pos_x: 0.5,
            ..Self::card_pose()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorDiffuse {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorDiffuse {
    fn white() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        }
    }
}

/// One card object inside a deck's `ContainedObjects`.
///
/// Field names and order mirror the external save format; the serializer
/// emits them verbatim, including the `GMNotes`/`IgnoreFoW`/`XmlUI` spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TtsCard {
    pub name: String,
    pub transform: Transform,
    pub nickname: String,
    pub description: String,
    #[serde(rename = "GMNotes")]
    pub gm_notes: String,
    pub color_diffuse: ColorDiffuse,
    pub locked: bool,
    pub grid: bool,
    pub snap: bool,
    #[serde(rename = "IgnoreFoW")]
    pub ignore_fow: bool,
    pub measure_movement: bool,
    pub drag_selectable: bool,
    pub autoraise: bool,
    pub sticky: bool,
    pub tooltip: bool,
    pub grid_projection: bool,
    pub hands: bool,
    #[serde(rename = "CardID")]
    pub card_id: String,
    pub sideways_card: bool,
    pub lua_script: String,
    pub lua_script_state: String,
    #[serde(rename = "XmlUI")]
    pub xml_ui: String,
    pub contained_objects: Vec<Value>,
    #[serde(rename = "GUID")]
    pub guid: String,
}

impl TtsCard {
    /// A card with the fixed pose and flags, `GUID` left blank.
    pub fn new(card_id: u32) -> Self {
        Self {
            name: "Card".to_string(),
            transform: Transform::card_pose(),
            nickname: String::new(),
            description: String::new(),
            gm_notes: String::new(),
            color_diffuse: ColorDiffuse::white(),
            locked: false,
            grid: true,
            snap: true,
            ignore_fow: false,
            measure_movement: false,
            drag_selectable: true,
            autoraise: true,
            sticky: true,
            tooltip: true,
            grid_projection: false,
            hands: true,
            card_id: card_id.to_string(),
            sideways_card: false,
            lua_script: String::new(),
            lua_script_state: String::new(),
            xml_ui: String::new(),
            contained_objects: Vec::new(),
            guid: String::new(),
        }
    }
}

/// Sheet references for one `CustomDeck` slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomDeckSpec {
    #[serde(rename = "FaceURL")]
    pub face_url: String,
    #[serde(rename = "BackURL")]
    pub back_url: String,
    pub num_width: u32,
    pub num_height: u32,
    pub back_is_hidden: bool,
    pub unique_back: bool,
    #[serde(rename = "Type")]
    pub kind: u32,
}

/// A custom deck object holding up to one sheet's worth of cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TtsDeck {
    pub name: String,
    pub transform: Transform,
    pub nickname: String,
    pub description: String,
    #[serde(rename = "GMNotes")]
    pub gm_notes: String,
    pub color_diffuse: ColorDiffuse,
    pub locked: bool,
    pub grid: bool,
    pub snap: bool,
    #[serde(rename = "IgnoreFoW")]
    pub ignore_fow: bool,
    pub measure_movement: bool,
    pub drag_selectable: bool,
    pub autoraise: bool,
    pub sticky: bool,
    pub tooltip: bool,
    pub grid_projection: bool,
    pub hide_when_face_down: bool,
    pub hands: bool,
    pub sideways_card: bool,
    #[serde(rename = "DeckIDs")]
    pub deck_ids: Vec<u32>,
    pub custom_deck: BTreeMap<String, CustomDeckSpec>,
    pub lua_script: String,
    pub lua_script_state: String,
    #[serde(rename = "XmlUI")]
    pub xml_ui: String,
    pub contained_objects: Vec<TtsCard>,
    #[serde(rename = "GUID")]
    pub guid: String,
}

impl TtsDeck {
    /// Build the deck object for one packed sheet pair.
    ///
    /// Deck ids run contiguously from [`FIRST_DECK_ID`]; each contained card
    /// carries the stringified id and its own derived `GUID`.
    pub fn assemble(
        face_url: &str,
        back_url: &str,
        num_cards: usize,
        grid: &GridSpec,
    ) -> Result<Self> {
        let deck_ids: Vec<u32> = (FIRST_DECK_ID..FIRST_DECK_ID + num_cards as u32).collect();
        let mut cards = Vec::with_capacity(num_cards);
        for id in &deck_ids {
            let mut card = TtsCard::new(*id);
            card.guid = derive_guid(&card)?;
            cards.push(card);
        }

        let mut custom_deck = BTreeMap::new();
        custom_deck.insert(
            "1".to_string(),
            CustomDeckSpec {
                face_url: face_url.to_string(),
                back_url: back_url.to_string(),
                num_width: grid.num_width,
                num_height: grid.num_height,
                back_is_hidden: true,
                unique_back: true,
                kind: 0,
            },
        );

        let mut deck = Self {
            name: "DeckCustom".to_string(),
            transform: Transform::deck_pose(),
            nickname: String::new(),
            description: String::new(),
            gm_notes: String::new(),
            color_diffuse: ColorDiffuse::white(),
            locked: false,
            grid: true,
            snap: true,
            ignore_fow: false,
            measure_movement: false,
            drag_selectable: true,
            autoraise: true,
            sticky: true,
            tooltip: true,
            grid_projection: false,
            hide_when_face_down: true,
            hands: false,
            sideways_card: false,
            deck_ids,
            custom_deck,
            lua_script: String::new(),
            lua_script_state: String::new(),
            xml_ui: String::new(),
            contained_objects: cards,
            guid: String::new(),
        };
        deck.guid = derive_guid(&deck)?;
        Ok(deck)
    }
}

/// Top-level save file wrapping the generated decks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GamePackage {
    pub save_name: String,
    pub game_mode: String,
    pub date: String,
    pub gravity: f64,
    pub play_area: f64,
    pub game_type: String,
    pub game_complexity: String,
    pub tags: Vec<String>,
    pub table: String,
    pub sky: String,
    pub note: String,
    pub rules: String,
    pub tab_states: BTreeMap<String, Value>,
    pub object_states: Vec<TtsDeck>,
    pub lua_script: String,
    pub lua_script_state: String,
    #[serde(rename = "XmlUI")]
    pub xml_ui: String,
    pub version_number: String,
}

impl GamePackage {
    pub fn new(decks: Vec<TtsDeck>) -> Self {
        Self {
            save_name: String::new(),
            game_mode: String::new(),
            date: String::new(),
            gravity: 0.5,
            play_area: 0.5,
            game_type: String::new(),
            game_complexity: String::new(),
            tags: Vec::new(),
            table: String::new(),
            sky: String::new(),
            note: String::new(),
            rules: String::new(),
            tab_states: BTreeMap::new(),
            object_states: decks,
            lua_script: String::new(),
            lua_script_state: String::new(),
            xml_ui: String::new(),
            version_number: String::new(),
        }
    }
}

/// Derive a six character object id from the object's canonical JSON form.
///
/// SHA-256 of the serialized object, uppercase hex, first six characters.
/// Serialization happens with the `GUID` field still blank, so the id is a
/// pure function of the object's content.
pub fn derive_guid<T: Serialize>(value: &T) -> Result<String> {
    let canonical =
        serde_json::to_string(value).context("failed to serialize object for guid derivation")?;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = format!("{digest:X}");
    hex.truncate(6);
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn guids_are_deterministic_and_content_sensitive() {
        let a = derive_guid(&TtsCard::new(100)).unwrap();
        let b = derive_guid(&TtsCard::new(100)).unwrap();
        let c = derive_guid(&TtsCard::new(101)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 6);
        assert!(a.chars().all(|ch| ch.is_ascii_digit() || ch.is_ascii_uppercase()));
    }

    #[test]
    fn assemble_numbers_cards_from_one_hundred() {
        let deck = TtsDeck::assemble("file:///f.png", "file:///b.png", 3, &GridSpec::default())
            .unwrap();
        assert_eq!(deck.deck_ids, vec![100, 101, 102]);
        let card_ids: Vec<&str> = deck
            .contained_objects
            .iter()
            .map(|c| c.card_id.as_str())
            .collect();
        assert_eq!(card_ids, vec!["100", "101", "102"]);
        for card in &deck.contained_objects {
            assert_eq!(card.guid.len(), 6);
        }
    }

    #[test]
    fn custom_deck_slot_carries_sheet_urls_and_grid() {
        let grid = GridSpec::default();
        let deck = TtsDeck::assemble("file:///face.png", "file:///back.png", 1, &grid).unwrap();
        let spec = &deck.custom_deck["1"];
        assert_eq!(spec.face_url, "file:///face.png");
        assert_eq!(spec.back_url, "file:///back.png");
        assert_eq!((spec.num_width, spec.num_height), (10, 7));
        assert!(spec.back_is_hidden);
        assert!(spec.unique_back);
        assert_eq!(spec.kind, 0);
    }

    #[test]
    fn serialized_field_names_match_the_save_format() {
        let deck = TtsDeck::assemble("f", "b", 1, &GridSpec::default()).unwrap();
        let json = serde_json::to_value(&deck).unwrap();
        for key in [
            "Name",
            "Transform",
            "GMNotes",
            "IgnoreFoW",
            "HideWhenFaceDown",
            "DeckIDs",
            "CustomDeck",
            "XmlUI",
            "GUID",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        let transform = &json["Transform"];
        assert_eq!(transform["posX"], 0.5);
        assert_eq!(transform["rotY"], 180.0);
        let card = &json["ContainedObjects"][0];
        assert_eq!(card["Name"], "Card");
        assert_eq!(card["CardID"], "100");
        assert_eq!(card["Hands"], true);
        let spec = &json["CustomDeck"]["1"];
        assert!(spec.get("FaceURL").is_some());
        assert_eq!(spec["Type"], 0);
    }

    #[test]
    fn package_wraps_decks_with_fixed_metadata() {
        let deck = TtsDeck::assemble("f", "b", 2, &GridSpec::default()).unwrap();
        let package = GamePackage::new(vec![deck]);
        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["Gravity"], 0.5);
        assert_eq!(json["PlayArea"], 0.5);
        assert_eq!(json["SaveName"], "");
        assert_eq!(json["ObjectStates"].as_array().unwrap().len(), 1);
        assert!(json["TabStates"].as_object().unwrap().is_empty());
    }
}
