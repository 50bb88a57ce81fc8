use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemKind};

/// Which column of the quick-roll flags an action reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetSelector {
    /// The normal quick roll.
    #[default]
    Primary,
    /// The alternate quick roll (shift-click).
    Alternate,
}

/// A toggle holding one value per preset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Toggle<T> {
    /// Value used by the primary quick roll.
    pub primary: T,
    /// Value used by the alternate quick roll.
    pub alternate: T,
}

impl<T: Clone> Toggle<T> {
    /// A toggle with the same value in both columns.
    pub fn both(value: T) -> Self {
        Self {
            primary: value.clone(),
            alternate: value,
        }
    }

    /// Read the column selected by `sel`.
    pub fn get(&self, sel: PresetSelector) -> &T {
        match sel {
            PresetSelector::Primary => &self.primary,
            PresetSelector::Alternate => &self.alternate,
        }
    }
}

/// Which resources an action consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionRequest {
    /// Spend one limited use.
    pub use_charge: bool,
    /// Spend one from the stack quantity.
    pub use_quantity: bool,
    /// Spend the linked resource (ammo, another item, or an actor pool).
    pub use_resource: bool,
    /// Spend the recharge.
    pub use_recharge: bool,
}

impl ConsumptionRequest {
    /// Returns true if nothing is consumed.
    pub fn is_empty(&self) -> bool {
        !(self.use_charge || self.use_quantity || self.use_resource || self.use_recharge)
    }
}

/// Per-damage-slot toggles, one entry per damage formula.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageToggles {
    /// Primary column, one entry per damage slot.
    pub primary: Vec<bool>,
    /// Alternate column, one entry per damage slot.
    pub alternate: Vec<bool>,
    /// Optional context label per damage slot.
    pub context: Vec<Option<String>>,
}

impl DamageToggles {
    /// Whether damage slot `index` is enabled in the selected column.
    pub fn enabled(&self, sel: PresetSelector, index: usize) -> bool {
        let column = match sel {
            PresetSelector::Primary => &self.primary,
            PresetSelector::Alternate => &self.alternate,
        };
        column.get(index).copied().unwrap_or(false)
    }

    /// Context label for damage slot `index`, if any.
    pub fn context_for(&self, index: usize) -> Option<&str> {
        self.context
            .get(index)
            .and_then(|c| c.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Resize every column to `len`, keeping existing values. New slots are enabled.
    pub fn resize(&mut self, len: usize) {
        self.primary.resize(len, true);
        self.alternate.resize(len, true);
        self.context.resize(len, None);
    }
}

/// Per-item quick-roll configuration. A `None` toggle is treated as off.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionFlags {
    /// Item-level crit threshold override for attacks and checks.
    pub crit_range: Option<u32>,
    /// Damage slot rolled as extra damage on a crit.
    pub crit_damage: Option<usize>,
    /// Show the description.
    pub quick_desc: Option<Toggle<bool>>,
    /// Roll the attack.
    pub quick_attack: Option<Toggle<bool>>,
    /// Show the save button.
    pub quick_save: Option<Toggle<bool>>,
    /// Roll the tool check.
    pub quick_check: Option<Toggle<bool>>,
    /// Damage slots to roll.
    pub quick_damage: Option<DamageToggles>,
    /// Use the versatile formula for damage slot 0.
    pub quick_versatile: Option<Toggle<bool>>,
    /// Show the properties footer.
    pub quick_properties: Option<Toggle<bool>>,
    /// Resources to consume.
    pub quick_charges: Option<Toggle<ConsumptionRequest>>,
    /// Place the area template.
    pub quick_template: Option<Toggle<bool>>,
    /// Roll the "other" formula.
    pub quick_other: Option<Toggle<bool>>,
    /// Context label for the "other" formula.
    pub other_context: String,
    /// Show the chat flavor.
    pub quick_flavor: Option<Toggle<bool>>,
    /// Ask for advantage before rolling.
    pub quick_prompt: Option<Toggle<bool>>,
}

/// Read an optional boolean toggle; a missing toggle is off.
pub fn toggle_on(toggle: &Option<Toggle<bool>>, sel: PresetSelector) -> bool {
    toggle.as_ref().is_some_and(|t| *t.get(sel))
}

impl ActionFlags {
    /// Default flags for an item kind. Returns `None` for kinds without quick rolls.
    ///
    /// `default_description` seeds the description toggle of weapons and tools.
    pub fn defaults_for(kind: ItemKind, default_description: bool) -> Option<Self> {
        let on = Some(Toggle::both(true));
        let off = Some(Toggle::both(false));
        let no_charges = Some(Toggle::both(ConsumptionRequest::default()));
        let flags = match kind {
            ItemKind::Weapon => Self {
                quick_desc: Some(Toggle::both(default_description)),
                quick_attack: on,
                quick_save: off,
                quick_damage: Some(DamageToggles::default()),
                quick_versatile: off,
                quick_properties: on,
                quick_charges: no_charges,
                quick_template: on,
                quick_other: on,
                quick_flavor: on,
                quick_prompt: off,
                ..Self::default()
            },
            ItemKind::Superpower => Self {
                quick_desc: on,
                quick_attack: on,
                quick_save: on,
                quick_damage: Some(DamageToggles::default()),
                quick_versatile: off,
                quick_properties: on,
                quick_charges: no_charges,
                quick_template: on,
                quick_other: on,
                quick_flavor: off,
                quick_prompt: off,
                ..Self::default()
            },
            ItemKind::Equipment => Self {
                quick_desc: on,
                quick_attack: on,
                quick_save: on,
                quick_damage: Some(DamageToggles::default()),
                quick_properties: on,
                quick_charges: no_charges,
                quick_other: on,
                quick_flavor: on,
                quick_prompt: off,
                ..Self::default()
            },
            ItemKind::Feature | ItemKind::Consumable => Self {
                quick_desc: on,
                quick_attack: on,
                quick_save: on,
                quick_damage: Some(DamageToggles::default()),
                quick_properties: on,
                quick_charges: no_charges,
                quick_template: off,
                quick_other: on,
                quick_flavor: on,
                quick_prompt: off,
                ..Self::default()
            },
            ItemKind::Tool => Self {
                quick_desc: Some(Toggle::both(default_description)),
                quick_check: on,
                quick_properties: on,
                quick_flavor: on,
                quick_prompt: off,
                ..Self::default()
            },
            ItemKind::Loot => return None,
        };
        Some(flags)
    }

    /// Fill every missing toggle from `defaults`, keeping stored values.
    fn merge_defaults(&mut self, defaults: Self) {
        self.crit_range = self.crit_range.or(defaults.crit_range);
        self.crit_damage = self.crit_damage.or(defaults.crit_damage);
        self.quick_desc = self.quick_desc.or(defaults.quick_desc);
        self.quick_attack = self.quick_attack.or(defaults.quick_attack);
        self.quick_save = self.quick_save.or(defaults.quick_save);
        self.quick_check = self.quick_check.or(defaults.quick_check);
        self.quick_versatile = self.quick_versatile.or(defaults.quick_versatile);
        self.quick_properties = self.quick_properties.or(defaults.quick_properties);
        self.quick_charges = self.quick_charges.or(defaults.quick_charges);
        self.quick_template = self.quick_template.or(defaults.quick_template);
        self.quick_other = self.quick_other.or(defaults.quick_other);
        self.quick_flavor = self.quick_flavor.or(defaults.quick_flavor);
        self.quick_prompt = self.quick_prompt.or(defaults.quick_prompt);
        if self.quick_damage.is_none() {
            self.quick_damage = defaults.quick_damage;
        }
    }
}

/// Bring an item's flags in line with its kind and damage slots.
///
/// Missing toggles take the kind's defaults and `quick_damage` is resized to
/// the number of damage formulas. Items whose kind has no quick rolls are left
/// untouched. Returns true if the item carries flags afterwards.
pub fn normalize_flags(item: &mut Item, default_description: bool) -> bool {
    let Some(defaults) = ActionFlags::defaults_for(item.kind, default_description) else {
        return item.flags.is_some();
    };
    let wants_damage = defaults.quick_damage.is_some();
    let flags = item.flags.get_or_insert_with(ActionFlags::default);
    flags.merge_defaults(defaults);
    if wants_damage {
        let slots = item.damage.parts.len();
        flags
            .quick_damage
            .get_or_insert_with(DamageToggles::default)
            .resize(slots);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DamagePart;

    fn weapon_with_parts(n: usize) -> Item {
        let mut item = Item::new(ItemKind::Weapon, "Longsword");
        for i in 0..n {
            item.damage
                .parts
                .push(DamagePart::new(format!("1d{}", 6 + i * 2), "slashing"));
        }
        item
    }

    #[test]
    fn toggle_reads_selected_column() {
        let t = Toggle {
            primary: true,
            alternate: false,
        };
        assert!(*t.get(PresetSelector::Primary));
        assert!(!*t.get(PresetSelector::Alternate));
    }

    #[test]
    fn normalize_creates_flags_and_damage_slots() {
        let mut item = weapon_with_parts(2);
        assert!(normalize_flags(&mut item, false));
        let flags = item.flags.as_ref().unwrap();
        let dmg = flags.quick_damage.as_ref().unwrap();
        assert_eq!(dmg.primary, vec![true, true]);
        assert_eq!(dmg.alternate, vec![true, true]);
        assert!(toggle_on(&flags.quick_attack, PresetSelector::Primary));
        assert!(!toggle_on(&flags.quick_desc, PresetSelector::Primary));
    }

    #[test]
    fn normalize_keeps_stored_values() {
        let mut item = weapon_with_parts(1);
        normalize_flags(&mut item, false);
        if let Some(flags) = item.flags.as_mut() {
            flags.quick_attack = Some(Toggle::both(false));
            if let Some(d) = flags.quick_damage.as_mut() {
                d.primary[0] = false;
            }
        }
        item.damage.parts.push(DamagePart::new("1d4", "fire"));
        normalize_flags(&mut item, false);

        let flags = item.flags.as_ref().unwrap();
        assert!(!toggle_on(&flags.quick_attack, PresetSelector::Primary));
        let dmg = flags.quick_damage.as_ref().unwrap();
        assert_eq!(dmg.primary, vec![false, true]);
        assert_eq!(dmg.context.len(), 2);
    }

    #[test]
    fn normalize_shrinks_damage_slots() {
        let mut item = weapon_with_parts(3);
        normalize_flags(&mut item, false);
        item.damage.parts.truncate(1);
        normalize_flags(&mut item, false);
        let dmg = item.flags.as_ref().unwrap().quick_damage.as_ref().unwrap();
        assert_eq!(dmg.primary.len(), 1);
    }

    #[test]
    fn tool_has_check_but_no_damage() {
        let mut item = Item::new(ItemKind::Tool, "Thieves' Tools");
        normalize_flags(&mut item, true);
        let flags = item.flags.as_ref().unwrap();
        assert!(toggle_on(&flags.quick_check, PresetSelector::Primary));
        assert!(toggle_on(&flags.quick_desc, PresetSelector::Alternate));
        assert!(flags.quick_damage.is_none());
        assert!(flags.quick_attack.is_none());
    }

    #[test]
    fn loot_gets_no_flags() {
        let mut item = Item::new(ItemKind::Loot, "Gold Ring");
        assert!(!normalize_flags(&mut item, true));
        assert!(item.flags.is_none());
    }

    #[test]
    fn damage_toggle_out_of_range_is_off() {
        let d = DamageToggles::default();
        assert!(!d.enabled(PresetSelector::Primary, 0));
        assert_eq!(d.context_for(3), None);
    }
}
