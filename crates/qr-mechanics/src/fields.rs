//! Field requests and the fragments they produce.

use serde::{Deserialize, Serialize};

use crate::crit::CritDirective;
use crate::dice::RollOutcome;
use crate::error::{MechError, MechResult};
use crate::resolver::{MultiRoll, RollState};

/// Which damage slots a damage field rolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIndex", into = "RawIndex")]
pub enum DamageIndex {
    /// Every slot in ascending order.
    All,
    /// One slot.
    Single(usize),
    /// The listed slots, in list order.
    Many(Vec<usize>),
}

impl Default for DamageIndex {
    fn default() -> Self {
        Self::Single(0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Slot(usize),
    List(Vec<usize>),
    Word(String),
}

impl TryFrom<RawIndex> for DamageIndex {
    type Error = String;

    fn try_from(raw: RawIndex) -> Result<Self, Self::Error> {
        match raw {
            RawIndex::Slot(i) => Ok(Self::Single(i)),
            RawIndex::List(slots) => Ok(Self::Many(slots)),
            RawIndex::Word(w) if w.eq_ignore_ascii_case("all") => Ok(Self::All),
            RawIndex::Word(w) => w
                .parse::<usize>()
                .map(Self::Single)
                .map_err(|_| format!("invalid damage index \"{w}\"")),
        }
    }
}

impl From<DamageIndex> for RawIndex {
    fn from(index: DamageIndex) -> Self {
        match index {
            DamageIndex::All => Self::Word("all".to_string()),
            DamageIndex::Single(i) => Self::Slot(i),
            DamageIndex::Many(slots) => Self::List(slots),
        }
    }
}

fn yes() -> bool {
    true
}

fn default_custom_formula() -> String {
    "1d20".to_string()
}

fn one() -> u32 {
    1
}

/// One requested piece of a composite roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRequest {
    /// Roll the item's attack.
    Attack {
        /// Situational bonus formula.
        #[serde(default)]
        bonus: Option<String>,
        /// Whether a crit marks the action critical.
        #[serde(default = "yes")]
        triggers_crit: bool,
        /// Crit threshold override.
        #[serde(default)]
        crit_threshold: Option<u32>,
    },
    /// Roll the item's ability check.
    #[serde(alias = "tool")]
    Check {
        /// Situational bonus formula.
        #[serde(default)]
        bonus: Option<String>,
        /// Crit threshold override.
        #[serde(default)]
        crit_threshold: Option<u32>,
    },
    /// Roll one or all damage slots.
    Damage {
        /// Slot selection.
        #[serde(default)]
        index: DamageIndex,
        /// Use the versatile formula.
        #[serde(default)]
        versatile: bool,
        /// Crit override.
        #[serde(default)]
        crit: CritDirective,
        /// Context label replacing the stored one.
        #[serde(default)]
        context: Option<String>,
    },
    /// Show the save button.
    #[serde(alias = "savedc", alias = "save_dc")]
    SaveButton {
        /// Save override.
        #[serde(default)]
        save_id: Option<String>,
        /// DC override.
        #[serde(default)]
        dc: Option<i32>,
    },
    /// Roll the item's "other" formula.
    Other,
    /// Roll an arbitrary formula.
    Custom {
        /// Formula to roll.
        #[serde(default = "default_custom_formula")]
        formula: String,
        /// Number of evaluations.
        #[serde(default = "one")]
        roll_count: u32,
        /// Advantage or disadvantage.
        #[serde(default)]
        roll_state: Option<RollState>,
        /// Header for the roll.
        #[serde(default)]
        title: Option<String>,
    },
    /// Show the item description.
    #[serde(alias = "desc")]
    Description,
    /// Show free text.
    Text {
        /// The text.
        content: String,
    },
    /// Show the item's flavor line or the given text.
    Flavor {
        /// Text replacing the item's flavor.
        #[serde(default)]
        content: Option<String>,
    },
    /// Roll the item's extra crit damage slot.
    #[serde(alias = "crit")]
    CritExtra {
        /// Slot override.
        #[serde(default)]
        index: Option<usize>,
    },
}

impl FieldRequest {
    /// An attack with default options.
    pub fn attack() -> Self {
        Self::Attack {
            bonus: None,
            triggers_crit: true,
            crit_threshold: None,
        }
    }

    /// A check with default options.
    pub fn check() -> Self {
        Self::Check {
            bonus: None,
            crit_threshold: None,
        }
    }

    /// A damage field.
    pub fn damage(index: DamageIndex, versatile: bool) -> Self {
        Self::Damage {
            index,
            versatile,
            crit: CritDirective::Auto,
            context: None,
        }
    }

    /// A save button with the item's own save.
    pub fn save_button() -> Self {
        Self::SaveButton {
            save_id: None,
            dc: None,
        }
    }

    /// The field's kind name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Attack { .. } => "attack",
            Self::Check { .. } => "check",
            Self::Damage { .. } => "damage",
            Self::SaveButton { .. } => "save_button",
            Self::Other => "other",
            Self::Custom { .. } => "custom",
            Self::Description => "description",
            Self::Text { .. } => "text",
            Self::Flavor { .. } => "flavor",
            Self::CritExtra { .. } => "crit_extra",
        }
    }
}

/// Parse a JSON array of field requests.
///
/// Entries that are not valid field requests are skipped with a warning.
pub fn parse_fields(json: &str) -> MechResult<Vec<FieldRequest>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| MechError::InvalidFields(e.to_string()))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(MechError::InvalidFields("expected a JSON array".to_string()));
    };
    let mut fields = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<FieldRequest>(entry) {
            Ok(field) => fields.push(field),
            Err(e) => tracing::warn!(position = i, error = %e, "skipping malformed field"),
        }
    }
    Ok(fields)
}

/// A multi-roll with its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollFragment {
    /// Header, e.g. `Attack` or `Attack [Arrows]`.
    pub title: String,
    /// The resolved rolls.
    pub roll: MultiRoll,
    /// Crit threshold used for tagging.
    pub crit_threshold: Option<u32>,
}

/// A damage-style roll with an optional crit roll beside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageFragment {
    /// Damage slot, if any.
    pub index: Option<usize>,
    /// Header, e.g. `Damage`, `Healing`, or `Other`.
    pub title: String,
    /// Damage type key.
    pub damage_type: Option<String>,
    /// Context label.
    pub context: Option<String>,
    /// Whether the versatile formula was used.
    pub versatile: bool,
    /// The base roll.
    pub base: RollOutcome,
    /// Extra crit damage, reported beside the base roll.
    pub crit: Option<Box<RollOutcome>>,
}

/// A save button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFragment {
    /// Save key.
    pub save_id: String,
    /// Difficulty class.
    pub dc: i32,
    /// Whether the DC is hidden from players.
    pub hide_dc: bool,
}

/// One rendered piece of a composite roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultFragment {
    /// Attack roll.
    Attack(RollFragment),
    /// Ability check.
    Check(RollFragment),
    /// Damage roll.
    Damage(DamageFragment),
    /// Save button.
    SaveButton(SaveFragment),
    /// "Other" formula roll.
    Other(DamageFragment),
    /// Arbitrary formula roll.
    Custom(RollFragment),
    /// Item description.
    Description {
        /// Description text.
        text: String,
    },
    /// Free text.
    Text {
        /// The text.
        content: String,
    },
    /// Flavor line.
    Flavor {
        /// The text.
        content: String,
    },
    /// Extra crit damage slot.
    CritExtra(DamageFragment),
}

impl ResultFragment {
    /// Whether this fragment shows a crit.
    pub fn is_crit(&self) -> bool {
        match self {
            Self::Attack(r) | Self::Check(r) | Self::Custom(r) => r.roll.chosen_tag().is_crit(),
            Self::Damage(d) | Self::Other(d) | Self::CritExtra(d) => d.crit.is_some(),
            Self::SaveButton(_) | Self::Description { .. } | Self::Text { .. } | Self::Flavor { .. } => {
                false
            }
        }
    }

    /// The damage payload of damage-style fragments.
    pub fn as_damage(&self) -> Option<&DamageFragment> {
        match self {
            Self::Damage(d) | Self::CritExtra(d) => Some(d),
            _ => None,
        }
    }

    /// The fragment's kind name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Attack(_) => "attack",
            Self::Check(_) => "check",
            Self::Damage(_) => "damage",
            Self::SaveButton(_) => "save_button",
            Self::Other(_) => "other",
            Self::Custom(_) => "custom",
            Self::Description { .. } => "description",
            Self::Text { .. } => "text",
            Self::Flavor { .. } => "flavor",
            Self::CritExtra(_) => "crit_extra",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_kinds() {
        let fields = parse_fields(
            r#"[
                {"kind": "flavor"},
                {"kind": "description"},
                {"kind": "attack", "bonus": "2"},
                {"kind": "check"},
                {"kind": "save_button", "dc": 14},
                {"kind": "damage", "index": "all", "versatile": true},
                {"kind": "damage", "index": 1, "crit": "never", "context": "fire"},
                {"kind": "other"},
                {"kind": "custom", "formula": "2d6", "roll_state": "highest"},
                {"kind": "text", "content": "hello"},
                {"kind": "crit_extra", "index": 2},
                {"kind": "damage", "index": [0, 2]}
            ]"#,
        )
        .unwrap();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[11], FieldRequest::damage(DamageIndex::Many(vec![0, 2]), false));
        assert_eq!(
            fields[2],
            FieldRequest::Attack {
                bonus: Some("2".to_string()),
                triggers_crit: true,
                crit_threshold: None
            }
        );
        assert_eq!(fields[5], FieldRequest::damage(DamageIndex::All, true));
        assert_eq!(
            fields[6],
            FieldRequest::Damage {
                index: DamageIndex::Single(1),
                versatile: false,
                crit: CritDirective::Never,
                context: Some("fire".to_string())
            }
        );
        assert_eq!(
            fields[8],
            FieldRequest::Custom {
                formula: "2d6".to_string(),
                roll_count: 1,
                roll_state: Some(RollState::Highest),
                title: None
            }
        );
    }

    #[test]
    fn aliases_accepted() {
        let fields =
            parse_fields(r#"[{"kind": "desc"}, {"kind": "savedc"}, {"kind": "crit"}, {"kind": "tool"}]"#)
                .unwrap();
        assert_eq!(
            fields.iter().map(FieldRequest::kind_name).collect::<Vec<_>>(),
            vec!["description", "save_button", "crit_extra", "check"]
        );
    }

    #[test]
    fn malformed_entries_skipped() {
        let fields = parse_fields(
            r#"[{"kind": "attack"}, {"kind": "teleport"}, {"nope": 1}, 7, {"kind": "text"}, {"kind": "other"}]"#,
        )
        .unwrap();
        assert_eq!(fields, vec![FieldRequest::attack(), FieldRequest::Other]);
    }

    #[test]
    fn non_array_rejected() {
        assert!(matches!(
            parse_fields(r#"{"kind": "attack"}"#),
            Err(MechError::InvalidFields(_))
        ));
        assert!(matches!(parse_fields("["), Err(MechError::InvalidFields(_))));
    }

    #[test]
    fn damage_defaults_to_first_slot() {
        let fields = parse_fields(r#"[{"kind": "damage"}]"#).unwrap();
        assert_eq!(fields[0], FieldRequest::damage(DamageIndex::Single(0), false));
    }

    #[test]
    fn damage_index_round_trip_forms() {
        let all = serde_json::to_string(&DamageIndex::All).unwrap();
        assert_eq!(all, "\"all\"");
        let one: DamageIndex = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(one, DamageIndex::Single(3));
        let list: DamageIndex = serde_json::from_str("[1, 2, 4]").unwrap();
        assert_eq!(list, DamageIndex::Many(vec![1, 2, 4]));
        assert!(serde_json::from_str::<DamageIndex>("\"some\"").is_err());
    }
}
