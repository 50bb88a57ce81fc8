use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flags::ActionFlags;

/// Unique identifier for every item in an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new random item ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an item ID from its full hyphenated form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// The kind of an item. Determines default quick-roll flags and properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A melee or ranged weapon.
    Weapon,
    /// A spell or maneuver paid for from a mana or stamina pool.
    Superpower,
    /// Armor, shields, and worn gear.
    Equipment,
    /// A class or species feature.
    Feature,
    /// A tool used for ability checks.
    Tool,
    /// Potions, scrolls, ammunition, and other expendables.
    Consumable,
    /// Anything without quick-roll support.
    #[default]
    Loot,
}

impl ItemKind {
    /// Returns true for kinds that carry quick-roll flags.
    pub fn supports_quick_roll(self) -> bool {
        !matches!(self, Self::Loot)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weapon => "weapon",
            Self::Superpower => "superpower",
            Self::Equipment => "equipment",
            Self::Feature => "feature",
            Self::Tool => "tool",
            Self::Consumable => "consumable",
            Self::Loot => "loot",
        };
        write!(f, "{s}")
    }
}

/// How an item is used when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionType {
    /// No action.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Melee weapon attack.
    #[serde(rename = "mwak")]
    MeleeWeaponAttack,
    /// Ranged weapon attack.
    #[serde(rename = "rwak")]
    RangedWeaponAttack,
    /// Melee spell attack.
    #[serde(rename = "msak")]
    MeleeSpellAttack,
    /// Ranged spell attack.
    #[serde(rename = "rsak")]
    RangedSpellAttack,
    /// Forces a saving throw.
    #[serde(rename = "save")]
    Save,
    /// Restores hit points.
    #[serde(rename = "heal")]
    Heal,
    /// A utility effect.
    #[serde(rename = "util")]
    Utility,
    /// Anything else.
    #[serde(rename = "other")]
    Other,
}

impl ActionType {
    /// Returns true if this action makes an attack roll.
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            Self::MeleeWeaponAttack
                | Self::RangedWeaponAttack
                | Self::MeleeSpellAttack
                | Self::RangedSpellAttack
        )
    }

    /// Returns true for melee and ranged weapon attacks.
    pub fn is_weapon_attack(self) -> bool {
        matches!(self, Self::MeleeWeaponAttack | Self::RangedWeaponAttack)
    }

    /// The short key used for per-action-type actor bonuses (`mwak`, `rsak`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MeleeWeaponAttack => "mwak",
            Self::RangedWeaponAttack => "rwak",
            Self::MeleeSpellAttack => "msak",
            Self::RangedSpellAttack => "rsak",
            Self::Save => "save",
            Self::Heal => "heal",
            Self::Utility => "util",
            Self::Other => "other",
        }
    }
}

/// One damage formula slot with its damage type key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePart {
    /// The dice formula, e.g. `1d8 + @value`.
    pub formula: String,
    /// Damage type key, e.g. `slashing`, `fire`, `healing`.
    #[serde(default)]
    pub damage_type: String,
}

impl DamagePart {
    /// Create a damage part.
    pub fn new(formula: impl Into<String>, damage_type: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            damage_type: damage_type.into(),
        }
    }

    /// Returns true for healing-style damage types.
    pub fn is_healing(&self) -> bool {
        matches!(self.damage_type.as_str(), "healing" | "temphp" | "totalhp")
    }
}

/// The damage formulas of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Damage {
    /// Ordered damage formula slots.
    pub parts: Vec<DamagePart>,
    /// Replacement formula for slot 0 when wielded two-handed.
    pub versatile: Option<String>,
}

/// Limited uses of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Uses {
    /// Remaining uses.
    pub current: u32,
    /// Uses restored on recovery.
    pub max: u32,
    /// Recovery period, e.g. `day` or `sr`.
    pub per: Option<String>,
    /// Destroy the item when its quantity runs out.
    pub auto_destroy: bool,
}

/// "Action recharge" state for abilities like a dragon's breath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recharge {
    /// Minimum d6 result to recharge.
    pub value: Option<u32>,
    /// Whether the ability is currently charged.
    pub charged: bool,
}

/// What an item consumes from elsewhere when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeKind {
    /// Another item's quantity, rolled as ammunition.
    Ammo,
    /// One of the actor's resource pools.
    Attribute,
    /// Another item's quantity, not rolled.
    Material,
    /// Another item's uses.
    Charges,
}

/// A linked resource consumed by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consume {
    /// Kind of linked resource.
    pub kind: ConsumeKind,
    /// Item name/ID for item kinds, pool name for `attribute`.
    pub target: String,
    /// Amount consumed per use.
    #[serde(default = "default_consume_amount")]
    pub amount: u32,
}

fn default_consume_amount() -> u32 {
    1
}

fn default_quantity() -> i64 {
    1
}

/// A saving throw an item forces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    /// The save key, e.g. `fortitude`.
    pub save_id: String,
    /// The difficulty class.
    pub dc: i32,
}

/// How superpower damage scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// No scaling.
    #[default]
    None,
    /// Scales with character level.
    Cantrip,
    /// Scales with cost spent above the base cost.
    Augment,
    /// Same as augment, for enhancement powers.
    Enhance,
}

/// Damage scaling for superpowers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scaling {
    /// Scaling mode.
    pub mode: ScalingMode,
    /// Formula added per scaling step, e.g. `1d6`.
    pub formula: String,
}

/// Range of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    /// Normal range.
    pub value: Option<f64>,
    /// Long range.
    pub long: Option<f64>,
    /// Units, e.g. `ft`.
    pub units: Option<String>,
}

/// Area or creature targeting of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    /// Target type, e.g. `creature`, `cone`, `line`, `coneOrLine`.
    pub kind: Option<String>,
    /// Size of the area.
    pub value: Option<f64>,
    /// Units of the area size.
    pub units: Option<String>,
}

/// Target types that can be placed as a measured template.
const AREA_TARGETS: &[&str] = &[
    "cone",
    "line",
    "coneOrLine",
    "sphere",
    "cube",
    "cylinder",
    "radius",
    "square",
    "wall",
];

/// Every usable object in an inventory is an Item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Item kind.
    pub kind: ItemKind,
    /// Image path shown in the roll header.
    pub img: Option<String>,
    /// Free-text description.
    pub description: String,
    /// Short flavor line shown above the rolls.
    pub chat_flavor: String,
    /// How the item is activated.
    pub action_type: ActionType,
    /// Ability key used for attack and damage rolls.
    pub ability: Option<String>,
    /// Proficiency multiplier (0, 0.5, 1, 2).
    pub proficient: f64,
    /// Flat or formula bonus added to attack and check rolls.
    pub bonus: Option<String>,
    /// Damage formula slots.
    pub damage: Damage,
    /// The "other" formula.
    pub formula: Option<String>,
    /// Forced saving throw.
    pub save: Option<Save>,
    /// Limited uses.
    pub uses: Uses,
    /// Stack size.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Action recharge state.
    pub recharge: Option<Recharge>,
    /// Linked resource.
    pub consume: Option<Consume>,
    /// Base cost of a superpower.
    pub cost: Option<u32>,
    /// Superpower damage scaling.
    pub scaling: Scaling,
    /// Superpower paid with stamina instead of mana.
    pub maneuver: bool,
    /// Property keys, e.g. `fin`, `ver`, `hvy`.
    pub properties: Vec<String>,
    /// Weight in pounds.
    pub weight: Option<f64>,
    /// Activation type, e.g. `action`, `bonus`.
    pub activation: Option<String>,
    /// Duration, e.g. `1 minute`.
    pub duration: Option<String>,
    /// Range.
    pub range: Range,
    /// Targeting.
    pub target: Target,
    /// Whether the item is equipped.
    pub equipped: bool,
    /// Quick-roll flags; `None` until the item is first configured.
    pub flags: Option<ActionFlags>,
}

impl Item {
    /// Create a new item with a random ID and a quantity of one.
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind,
            quantity: 1,
            ..Self::default()
        }
    }

    /// Returns true if the item makes an attack roll.
    pub fn is_attack(&self) -> bool {
        self.action_type.is_attack()
    }

    /// Returns true if the item rolls an ability check.
    pub fn is_check(&self) -> bool {
        self.kind == ItemKind::Tool
    }

    /// Returns true if the item forces a saving throw.
    pub fn has_save(&self) -> bool {
        self.save.is_some()
    }

    /// Returns true if the item defines an "other" formula.
    pub fn has_other_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| !f.trim().is_empty())
    }

    /// Returns true if the item has the given property key.
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.eq_ignore_ascii_case(key))
    }

    /// Returns true if the item targets an area that can be drawn as a template.
    pub fn has_placeable_template(&self) -> bool {
        self.target
            .kind
            .as_deref()
            .is_some_and(|k| AREA_TARGETS.contains(&k))
            && self.target.value.is_some()
    }

    /// Name of the actor pool that pays for this superpower.
    pub fn cost_pool(&self) -> &'static str {
        if self.maneuver { "stamina" } else { "mana" }
    }
}
