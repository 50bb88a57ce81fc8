//! Compiles an item's quick-roll flags into a field list.
//!
//! The same item produces a different list for the primary and the
//! alternate quick roll. Items without flags fall back to showing their
//! description and properties.

use qr_core::{ConsumptionRequest, Item, PresetSelector, Toggle, toggle_on};

use crate::fields::{DamageIndex, FieldRequest};

/// Everything a preset decides about an action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledPlan {
    /// Fields to run, in order.
    pub fields: Vec<FieldRequest>,
    /// Show the properties footer.
    pub show_properties: bool,
    /// Resources the action consumes.
    pub consumption: ConsumptionRequest,
    /// Place the area template.
    pub place_template: bool,
    /// Ask for advantage before rolling.
    pub prompt: bool,
}

/// Compile the flags of `item` for the selected column.
pub fn compile(item: &Item, selector: PresetSelector) -> CompiledPlan {
    let Some(flags) = item.flags.as_ref() else {
        tracing::debug!(item = %item.name, "no quick-roll flags, showing description");
        return CompiledPlan {
            fields: vec![FieldRequest::Description],
            show_properties: true,
            ..CompiledPlan::default()
        };
    };
    let on = |toggle: &Option<Toggle<bool>>| toggle_on(toggle, selector);

    let mut fields = Vec::new();
    if on(&flags.quick_flavor) && !item.chat_flavor.trim().is_empty() {
        fields.push(FieldRequest::Flavor { content: None });
    }
    if on(&flags.quick_desc) {
        fields.push(FieldRequest::Description);
    }
    if on(&flags.quick_attack) && item.is_attack() {
        fields.push(FieldRequest::attack());
    }
    if on(&flags.quick_check) && item.is_check() {
        fields.push(FieldRequest::check());
    }
    if on(&flags.quick_save) && item.has_save() {
        fields.push(FieldRequest::save_button());
    }
    if let Some(damage) = flags.quick_damage.as_ref() {
        let versatile = on(&flags.quick_versatile);
        let slots = match selector {
            PresetSelector::Primary => damage.primary.len(),
            PresetSelector::Alternate => damage.alternate.len(),
        };
        for i in (0..slots).filter(|i| damage.enabled(selector, *i)) {
            fields.push(FieldRequest::damage(
                DamageIndex::Single(i),
                i == 0 && versatile,
            ));
        }
    }
    if on(&flags.quick_other) && item.has_other_formula() {
        fields.push(FieldRequest::Other);
    }

    CompiledPlan {
        fields,
        show_properties: on(&flags.quick_properties),
        consumption: flags
            .quick_charges
            .as_ref()
            .map(|c| *c.get(selector))
            .unwrap_or_default(),
        place_template: on(&flags.quick_template),
        prompt: on(&flags.quick_prompt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qr_core::{ActionType, DamagePart, ItemKind, Save, normalize_flags};

    fn longsword() -> Item {
        let mut item = Item::new(ItemKind::Weapon, "Longsword");
        item.action_type = ActionType::MeleeWeaponAttack;
        item.damage.parts = vec![
            DamagePart::new("1d8 + @value", "slashing"),
            DamagePart::new("1d6", "fire"),
        ];
        item.damage.versatile = Some("1d10 + @value".to_string());
        normalize_flags(&mut item, false);
        item
    }

    #[test]
    fn no_flags_falls_back_to_description() {
        let item = Item::new(ItemKind::Weapon, "Club");
        let plan = compile(&item, PresetSelector::Primary);
        assert_eq!(plan.fields, vec![FieldRequest::Description]);
        assert!(plan.show_properties);
        assert!(plan.consumption.is_empty());
    }

    #[test]
    fn weapon_primary_order() {
        let mut item = longsword();
        item.chat_flavor = "Steel sings.".to_string();
        let plan = compile(&item, PresetSelector::Primary);
        assert_eq!(
            plan.fields,
            vec![
                FieldRequest::Flavor { content: None },
                FieldRequest::attack(),
                FieldRequest::damage(DamageIndex::Single(0), false),
                FieldRequest::damage(DamageIndex::Single(1), false),
            ]
        );
        assert!(plan.show_properties);
        assert!(plan.place_template);
        assert!(!plan.prompt);
    }

    #[test]
    fn flavor_needs_text() {
        let item = longsword();
        let plan = compile(&item, PresetSelector::Primary);
        assert!(!plan.fields.contains(&FieldRequest::Flavor { content: None }));
    }

    #[test]
    fn alternate_column_and_versatile_on_first_slot() {
        let mut item = longsword();
        if let Some(flags) = item.flags.as_mut() {
            flags.quick_versatile = Some(Toggle {
                primary: false,
                alternate: true,
            });
            if let Some(d) = flags.quick_damage.as_mut() {
                d.alternate[1] = false;
            }
            flags.quick_charges = Some(Toggle {
                primary: ConsumptionRequest::default(),
                alternate: ConsumptionRequest {
                    use_quantity: true,
                    ..ConsumptionRequest::default()
                },
            });
        }
        let plan = compile(&item, PresetSelector::Alternate);
        assert_eq!(
            plan.fields,
            vec![
                FieldRequest::attack(),
                FieldRequest::damage(DamageIndex::Single(0), true),
            ]
        );
        assert!(plan.consumption.use_quantity);
        assert!(compile(&item, PresetSelector::Primary).consumption.is_empty());
    }

    #[test]
    fn attack_toggle_needs_attack_item() {
        let mut item = Item::new(ItemKind::Feature, "Second Wind");
        item.action_type = ActionType::Heal;
        item.damage.parts = vec![DamagePart::new("1d10 + @level", "healing")];
        normalize_flags(&mut item, false);
        let plan = compile(&item, PresetSelector::Primary);
        assert_eq!(
            plan.fields,
            vec![
                FieldRequest::Description,
                FieldRequest::damage(DamageIndex::Single(0), false),
            ]
        );
    }

    #[test]
    fn save_and_other_need_item_support() {
        let mut item = Item::new(ItemKind::Superpower, "Fireball");
        item.action_type = ActionType::Save;
        item.save = Some(Save {
            save_id: "reflex".to_string(),
            dc: 15,
        });
        item.formula = Some("1d4".to_string());
        normalize_flags(&mut item, false);
        let plan = compile(&item, PresetSelector::Primary);
        assert_eq!(
            plan.fields,
            vec![
                FieldRequest::Description,
                FieldRequest::save_button(),
                FieldRequest::Other,
            ]
        );
    }

    #[test]
    fn tool_compiles_check() {
        let mut item = Item::new(ItemKind::Tool, "Lute");
        normalize_flags(&mut item, true);
        let plan = compile(&item, PresetSelector::Primary);
        assert_eq!(
            plan.fields,
            vec![FieldRequest::Description, FieldRequest::check()]
        );
    }
}
