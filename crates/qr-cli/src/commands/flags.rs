use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use qr_core::{ActionFlags, ConsumptionRequest, Item, PresetSelector, Toggle};
use qr_mechanics::{DamageIndex, FieldRequest, compile};

pub fn run(
    inventory: &Path,
    item: Option<&str>,
    default_description: bool,
    commit: bool,
) -> Result<(), String> {
    let mut store = super::load_inventory(inventory)?;
    let configured = store.normalize_all(default_description);

    match item {
        Some(reference) => {
            let item = store.resolve(reference).map_err(|e| e.to_string())?;
            show_item(item);
        }
        None => show_all(store.items()),
    }

    if commit {
        super::save_inventory(&store, inventory)?;
        println!();
        println!("  Saved flags for {configured} item(s) to {}", inventory.display());
    }

    Ok(())
}

fn show_all<'a>(items: impl Iterator<Item = &'a Item>) {
    let mut items: Vec<_> = items.collect();
    if items.is_empty() {
        println!("  No items found.");
        return;
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Kind", "Quick roll", "Alternate"]);
    for item in &items {
        table.add_row(vec![
            item.name.clone(),
            item.kind.to_string(),
            plan_summary(item, PresetSelector::Primary),
            plan_summary(item, PresetSelector::Alternate),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} items", items.len());
}

fn plan_summary(item: &Item, selector: PresetSelector) -> String {
    let plan = compile(item, selector);
    let mut parts: Vec<String> = plan.fields.iter().map(field_label).collect();
    if plan.show_properties {
        parts.push("properties".to_string());
    }
    if parts.is_empty() {
        "—".to_string()
    } else {
        parts.join(", ")
    }
}

fn field_label(field: &FieldRequest) -> String {
    match field {
        FieldRequest::Damage {
            index, versatile, ..
        } => {
            let slot = match index {
                DamageIndex::All => "all".to_string(),
                DamageIndex::Single(i) => i.to_string(),
                DamageIndex::Many(slots) => slots
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join("+"),
            };
            if *versatile {
                format!("damage {slot} (versatile)")
            } else {
                format!("damage {slot}")
            }
        }
        other => other.kind_name().replace('_', " "),
    }
}

fn show_item(item: &Item) {
    println!("  {} ({})", item.name.bold(), item.kind);
    let Some(flags) = item.flags.as_ref() else {
        println!("  {}", "No quick-roll flags for this kind of item.".dimmed());
        return;
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Toggle", "Quick roll", "Alternate"]);
    for (label, toggle) in bool_toggles(flags) {
        table.add_row(toggle_row(label, toggle));
    }
    if let Some(damage) = flags.quick_damage.as_ref() {
        for (i, part) in item.damage.parts.iter().enumerate() {
            let mut label = format!("Damage {i}: {}", part.formula);
            if let Some(context) = damage.context_for(i) {
                label.push_str(&format!(" [{context}]"));
            }
            table.add_row(vec![
                label,
                on_off(damage.primary.get(i).copied()),
                on_off(damage.alternate.get(i).copied()),
            ]);
        }
    }
    if let Some(charges) = flags.quick_charges.as_ref() {
        for (label, pick) in CHARGE_COLUMNS {
            table.add_row(vec![
                label.to_string(),
                on_off(Some(pick(&charges.primary))),
                on_off(Some(pick(&charges.alternate))),
            ]);
        }
    }
    println!("{table}");

    if let Some(range) = flags.crit_range {
        println!("  Crit range: {range}+");
    }
    if let Some(slot) = flags.crit_damage {
        println!("  Extra crit damage: slot {slot}");
    }
    if !flags.other_context.is_empty() {
        println!("  Other context: {}", flags.other_context);
    }
}

type ChargeColumn = (&'static str, fn(&ConsumptionRequest) -> bool);

const CHARGE_COLUMNS: [ChargeColumn; 4] = [
    ("Use charge", |c| c.use_charge),
    ("Use quantity", |c| c.use_quantity),
    ("Use resource", |c| c.use_resource),
    ("Use recharge", |c| c.use_recharge),
];

fn bool_toggles(flags: &ActionFlags) -> [(&'static str, &Option<Toggle<bool>>); 10] {
    [
        ("Flavor", &flags.quick_flavor),
        ("Description", &flags.quick_desc),
        ("Attack", &flags.quick_attack),
        ("Check", &flags.quick_check),
        ("Save", &flags.quick_save),
        ("Versatile", &flags.quick_versatile),
        ("Other", &flags.quick_other),
        ("Properties", &flags.quick_properties),
        ("Template", &flags.quick_template),
        ("Ask advantage", &flags.quick_prompt),
    ]
}

fn toggle_row(label: &str, toggle: &Option<Toggle<bool>>) -> Vec<String> {
    vec![
        label.to_string(),
        on_off(toggle.as_ref().map(|t| t.primary)),
        on_off(toggle.as_ref().map(|t| t.alternate)),
    ]
}

fn on_off(value: Option<bool>) -> String {
    match value {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "—".to_string(),
    }
}
