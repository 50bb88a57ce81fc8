use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::ActionType;

/// Whether the actor is a player character or a non-player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A player character.
    #[default]
    Character,
    /// A non-player character.
    Npc,
}

/// A spendable resource pool such as mana or stamina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePool {
    /// Points left.
    pub remaining: u32,
    /// Largest amount that may be spent on a single action.
    pub limit: u32,
}

/// Situational bonuses for one action type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBonus {
    /// Formula added to attack rolls.
    pub attack: Option<String>,
    /// Formula added to damage slot 0.
    pub damage: Option<String>,
}

/// The character who owns the inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    /// Display name.
    pub name: String,
    /// Character or NPC.
    pub kind: ActorKind,
    /// Portrait path.
    pub img: Option<String>,
    /// Ability modifiers by key (`str`, `dex`, ...).
    pub abilities: HashMap<String, i64>,
    /// Proficiency bonus.
    pub proficiency: i64,
    /// Character level.
    pub level: u32,
    /// Bonuses by action type key (`mwak`, `rsak`, ...).
    pub bonuses: HashMap<String, ActionBonus>,
    /// Character-level crit threshold for weapon attacks.
    pub weapon_crit_threshold: Option<u32>,
    /// Roll one extra weapon die on melee crits.
    pub savage_attacks: bool,
    /// Reroll natural ones on d20 rolls once.
    pub halfling_luck: bool,
    /// Resource pools by name (`mana`, `stamina`).
    pub resources: HashMap<String, ResourcePool>,
}

impl Actor {
    /// Create a player character with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 1,
            ..Self::default()
        }
    }

    /// Ability modifier, zero if unknown.
    pub fn ability(&self, key: &str) -> i64 {
        self.abilities.get(key).copied().unwrap_or(0)
    }

    /// Bonuses for an action type, if any are set.
    pub fn bonus_for(&self, action: ActionType) -> Option<&ActionBonus> {
        self.bonuses.get(action.key())
    }

    /// Resource pool by name.
    pub fn pool(&self, name: &str) -> Option<&ResourcePool> {
        self.resources.get(name)
    }

    /// Returns true for non-player characters.
    pub fn is_npc(&self) -> bool {
        self.kind == ActorKind::Npc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ability_is_zero() {
        let mut actor = Actor::new("Aria");
        actor.abilities.insert("str".into(), 3);
        assert_eq!(actor.ability("str"), 3);
        assert_eq!(actor.ability("dex"), 0);
    }

    #[test]
    fn bonus_lookup_by_action_type() {
        let mut actor = Actor::new("Aria");
        actor.bonuses.insert(
            "mwak".into(),
            ActionBonus {
                attack: Some("1".into()),
                damage: Some("1d4".into()),
            },
        );
        assert!(actor.bonus_for(ActionType::MeleeWeaponAttack).is_some());
        assert!(actor.bonus_for(ActionType::RangedWeaponAttack).is_none());
    }

    #[test]
    fn actor_deserializes_from_partial_json() {
        let actor: Actor = serde_json::from_str(
            r#"{"name": "Goblin", "kind": "npc", "resources": {"mana": {"remaining": 4, "limit": 2}}}"#,
        )
        .unwrap();
        assert!(actor.is_npc());
        assert_eq!(actor.pool("mana").map(|p| p.remaining), Some(4));
    }
}
