use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{FieldMap, Record};
use crate::wrap::split_to_fields;

/// Errors raised while converting a record into template fields.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("record is missing required field '{0}'")]
    MissingRequiredField(String),
    #[error("no abbreviation known for resource '{0}'")]
    MissingAbbreviation(String),
    #[error("field '{field}' needs more lines; {available} available, {required} required")]
    CapacityExceeded {
        field: String,
        available: usize,
        required: usize,
    },
}

/// The card kinds this tool knows how to author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Asteroid,
    Module,
    Upgrade,
    Action,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Asteroid,
        EntityKind::Module,
        EntityKind::Upgrade,
        EntityKind::Action,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Asteroid => "asteroid",
            EntityKind::Module => "module",
            EntityKind::Upgrade => "upgrade",
            EntityKind::Action => "action",
        }
    }

    /// Resolve a kind by its manifest name (case-insensitive).
    pub fn parse(name: &str) -> Option<EntityKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// The face mapper for this kind of card.
    pub fn mapper(&self) -> Box<dyn FieldMapper> {
        match self {
            EntityKind::Asteroid => Box::new(AsteroidMapper),
            EntityKind::Module => Box::new(ModuleMapper),
            EntityKind::Upgrade => Box::new(UpgradeMapper),
            EntityKind::Action => Box::new(ActionMapper),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts one raw record into the flat string mapping a card template
/// expects. Every implementation fills its template's whole placeholder set,
/// defaulting absent values to `""`.
pub trait FieldMapper {
    fn map(&self, record: &Record) -> Result<FieldMap, MapError>;
}

/// Resource names recognised on asteroid records, with their two-letter
/// abbreviations, in declaration order.
const RESOURCES: [(&str, &str); 5] = [
    ("Iron", "Fe"),
    ("Silicates", "Si"),
    ("Ice", "Ic"),
    ("Uranium", "U"),
    ("Gold", "Au"),
];

const TIERS: [(&str, usize); 3] = [("3", 3), ("2", 2), ("1", 1)];

/// Asteroid faces: a name plus up to three resource badges, heaviest
/// deposits first.
pub struct AsteroidMapper;

impl FieldMapper for AsteroidMapper {
    fn map(&self, record: &Record) -> Result<FieldMap, MapError> {
        let name = record
            .get("Name")
            .ok_or_else(|| MapError::MissingRequiredField("Name".to_string()))?;

        for (field, value) in record.iter() {
            let is_tier = TIERS.iter().any(|(tier, _)| *tier == value);
            if is_tier && !RESOURCES.iter().any(|(resource, _)| *resource == field) {
                return Err(MapError::MissingAbbreviation(field.to_string()));
            }
        }

        let mut present: Vec<&str> = Vec::new();
        for (tier, weight) in TIERS {
            for (resource, abbreviation) in RESOURCES {
                if record.get(resource) == Some(tier) {
                    for _ in 0..weight {
                        present.push(abbreviation);
                    }
                }
            }
        }

        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), name.to_string());
        for (slot, abbreviation) in ["r1", "r2", "r3"].iter().zip(
            present
                .iter()
                .map(|a| a.to_string())
                .chain(std::iter::repeat(String::new())),
        ) {
            fields.insert(slot.to_string(), abbreviation);
        }
        Ok(fields)
    }
}

const MODULE_FIELDS: [&str; 11] = [
    "Rules Text",
    "Adjacent",
    "Anywhere 1",
    "Anywhere 2",
    "Not Adjacent",
    "Iron",
    "Ice",
    "Silicate",
    "VP",
    "Gold",
    "Uranium",
];

/// Module faces: a fixed slot set filled straight from the record.
pub struct ModuleMapper;

impl FieldMapper for ModuleMapper {
    fn map(&self, record: &Record) -> Result<FieldMap, MapError> {
        let mut fields = FieldMap::new();
        for slot in MODULE_FIELDS {
            fields.insert(slot.to_string(), String::new());
        }
        for (name, value) in record.iter() {
            fields.insert(name.to_string(), value.to_string());
        }
        Ok(fields)
    }
}

const UPGRADE_FIELDS: [&str; 9] = [
    "Rules Text",
    "Iron",
    "Ice",
    "Silicate",
    "VP",
    "Gold",
    "Gold Out",
    "Uranium",
    "Uranium Out",
];

const MOD_SLOTS: usize = 8;

/// Upgrade faces: fixed slots plus attached module references packed into
/// `Mod1..Mod8` in record order. References past the eighth slot are dropped.
pub struct UpgradeMapper;

impl UpgradeMapper {
    fn is_fixed_slot(name: &str) -> bool {
        UPGRADE_FIELDS.contains(&name)
            || (1..=MOD_SLOTS).any(|i| name == format!("Mod{}", i))
    }
}

impl FieldMapper for UpgradeMapper {
    fn map(&self, record: &Record) -> Result<FieldMap, MapError> {
        let mut fields = FieldMap::new();
        for slot in UPGRADE_FIELDS {
            fields.insert(slot.to_string(), String::new());
        }
        for i in 1..=MOD_SLOTS {
            fields.insert(format!("Mod{}", i), String::new());
        }

        let mut slot = 1;
        for (name, value) in record.iter() {
            if Self::is_fixed_slot(name) || value.trim().is_empty() {
                continue;
            }
            if slot <= MOD_SLOTS {
                fields.insert(format!("Mod{}", slot), format!("{} {}", value, name));
                slot += 1;
            }
        }

        for (name, value) in record.iter() {
            fields.insert(name.to_string(), value.to_string());
        }
        Ok(fields)
    }
}

const ACTION_FIELDS: [&str; 3] = ["Name", "Settlement", "Rules text"];

const ACTION_CHARS_PER_LINE: usize = 24;
const ACTION_MAX_LINES: usize = 7;

/// Action faces: name, settlement and rules text wrapped into seven
/// numbered line slots.
pub struct ActionMapper;

impl FieldMapper for ActionMapper {
    fn map(&self, record: &Record) -> Result<FieldMap, MapError> {
        let mut fields = FieldMap::new();
        for slot in ACTION_FIELDS {
            fields.insert(slot.to_string(), String::new());
        }
        for (name, value) in record.iter() {
            fields.insert(name.to_string(), value.to_string());
        }
        let rules_text = fields["Rules text"].clone();
        let lines = split_to_fields(
            &rules_text,
            "Rules text",
            ACTION_CHARS_PER_LINE,
            ACTION_MAX_LINES,
        )?;
        fields.extend(lines);
        Ok(fields)
    }
}

/// Constant back design: every record maps to the same single-name mapping
/// for the shared back template.
pub struct BackMapper {
    label: String,
}

impl BackMapper {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl FieldMapper for BackMapper {
    fn map(&self, _record: &Record) -> Result<FieldMap, MapError> {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), self.label.clone());
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn asteroid_orders_resources_heaviest_first() {
        let record = record(&[("Name", "Vesta"), ("Iron", "2"), ("Ice", "1")]);
        let fields = AsteroidMapper.map(&record).unwrap();
        assert_eq!(fields["name"], "Vesta");
        assert_eq!(fields["r1"], "Fe");
        assert_eq!(fields["r2"], "Fe");
        assert_eq!(fields["r3"], "Ic");
    }

    #[test]
    fn asteroid_defaults_unused_badges() {
        let record = record(&[("Name", "Hygiea"), ("Gold", "1")]);
        let fields = AsteroidMapper.map(&record).unwrap();
        assert_eq!(fields["r1"], "Au");
        assert_eq!(fields["r2"], "");
        assert_eq!(fields["r3"], "");
    }

    #[test]
    fn asteroid_ignores_zero_and_blank_deposits() {
        let record = record(&[
            ("Name", "Psyche"),
            ("Iron", "0"),
            ("Gold", "2"),
            ("Uranium", ""),
        ]);
        let fields = AsteroidMapper.map(&record).unwrap();
        assert_eq!(fields["r1"], "Au");
        assert_eq!(fields["r2"], "Au");
        assert_eq!(fields["r3"], "");
    }

    #[test]
    fn asteroid_requires_a_name() {
        let record = record(&[("Iron", "1")]);
        let err = AsteroidMapper.map(&record).unwrap_err();
        assert!(matches!(err, MapError::MissingRequiredField(field) if field == "Name"));
    }

    #[test]
    fn asteroid_rejects_unknown_resources_with_tier_markers() {
        let record = record(&[("Name", "X"), ("Unknown", "1")]);
        let err = AsteroidMapper.map(&record).unwrap_err();
        assert!(matches!(err, MapError::MissingAbbreviation(field) if field == "Unknown"));
    }

    #[test]
    fn module_defaults_every_slot() {
        let record = record(&[("Rules Text", "Rotate once"), ("VP", "2")]);
        let fields = ModuleMapper.map(&record).unwrap();
        assert_eq!(fields["Rules Text"], "Rotate once");
        assert_eq!(fields["VP"], "2");
        assert_eq!(fields["Adjacent"], "");
        assert_eq!(fields["Uranium"], "");
        assert_eq!(fields["Anywhere 2"], "");
    }

    #[test]
    fn upgrade_collects_module_references_in_record_order() {
        let record = record(&[
            ("Rules Text", "Install freely"),
            ("Habitat Ring", "2"),
            ("VP", "1"),
            ("Ore Crusher", "1x"),
        ]);
        let fields = UpgradeMapper.map(&record).unwrap();
        assert_eq!(fields["Mod1"], "2 Habitat Ring");
        assert_eq!(fields["Mod2"], "1x Ore Crusher");
        assert_eq!(fields["Mod3"], "");
        assert_eq!(fields["VP"], "1");
    }

    #[test]
    fn upgrade_drops_references_past_the_eighth() {
        let mut record = Record::new();
        for i in 1..=10 {
            record.insert(format!("Module {}", i), "1");
        }
        let fields = UpgradeMapper.map(&record).unwrap();
        assert_eq!(fields["Mod8"], "1 Module 8");
        assert!(!fields.values().any(|v| v.contains("Module 9")
            || v.contains("Module 10")));
    }

    #[test]
    fn upgrade_skips_blank_references() {
        let record = record(&[("Habitat Ring", "  "), ("Ore Crusher", "3")]);
        let fields = UpgradeMapper.map(&record).unwrap();
        assert_eq!(fields["Mod1"], "3 Ore Crusher");
        assert_eq!(fields["Mod2"], "");
    }

    #[test]
    fn action_wraps_rules_text_into_line_slots() {
        let record = record(&[
            ("Name", "Prospect"),
            ("Rules text", "Draw two asteroid cards and keep one"),
        ]);
        let fields = ActionMapper.map(&record).unwrap();
        assert_eq!(fields["Name"], "Prospect");
        assert_eq!(fields["Settlement"], "");
        assert_eq!(fields["Rules text#1"], "Drawtwoasteroidcardsand");
        assert_eq!(fields["Rules text#2"], "keepone");
        assert_eq!(fields["Rules text#7"], "");
    }

    #[test]
    fn back_mapper_is_constant_over_records() {
        let mapper = BackMapper::new("asteroid");
        let a = mapper.map(&record(&[("Name", "Vesta")])).unwrap();
        let b = mapper.map(&record(&[("Name", "Pallas")])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["name"], "asteroid");
    }
}
