//! The properties footer shown under a composite roll.

use qr_core::{Item, ItemKind};

/// Properties of an item as footer labels, empty labels removed.
pub fn list_properties(item: &Item) -> Vec<String> {
    let range = range_label(item);
    let target = target_label(item);
    let activation = item.activation.clone().filter(|a| a != "none");
    let duration = item.duration.clone();
    let weight = item.weight.filter(|w| *w > 0.0).map(|w| format!("{} lbs.", number(w)));

    let mut properties = match item.kind {
        ItemKind::Weapon => {
            let mut labels = vec![
                range,
                target,
                (item.proficient <= 0.0).then(|| "Not Proficient".to_string()),
                weight,
            ];
            labels.extend(item.properties.iter().cloned().map(Some));
            labels
        }
        ItemKind::Superpower => vec![
            item.cost
                .map(|c| format!("{c} {}", item.cost_pool())),
            activation,
            duration,
            range,
            target,
        ],
        ItemKind::Feature | ItemKind::Consumable => {
            let mut labels = Vec::new();
            if item.kind == ItemKind::Consumable {
                labels.push(weight);
            }
            labels.extend([activation, duration, range, target]);
            labels
        }
        ItemKind::Equipment => vec![item.equipped.then(|| "Equipped".to_string()), weight],
        ItemKind::Tool => vec![
            Some(proficiency_label(item.proficient).to_string()),
            item.ability.clone(),
            weight,
        ],
        ItemKind::Loot => vec![weight],
    };

    properties.retain(|p| p.as_deref().is_some_and(|s| !s.trim().is_empty()));
    properties.into_iter().flatten().collect()
}

fn range_label(item: &Item) -> Option<String> {
    let r = &item.range;
    if r.value.is_none() && r.units.is_none() {
        return None;
    }
    let mut label = r.value.map(number).unwrap_or_default();
    if let Some(long) = r.long.filter(|l| *l != 0.0 && Some(*l) != r.value) {
        label.push_str(&format!("/{}", number(long)));
    }
    if let Some(units) = r.units.as_deref() {
        label.push(' ');
        label.push_str(units);
    }
    Some(label)
}

fn target_label(item: &Item) -> Option<String> {
    let kind = item.target.kind.as_deref()?;
    let mut label = format!("Target: {kind}");
    if let Some(units) = item.target.units.as_deref().filter(|u| *u != "none") {
        let value = item.target.value.map(number).unwrap_or_default();
        label.push_str(&format!(" ({value} {units})"));
    }
    Some(label)
}

fn proficiency_label(proficient: f64) -> &'static str {
    if proficient >= 2.0 {
        "Expertise"
    } else if proficient >= 1.0 {
        "Proficient"
    } else if proficient > 0.0 {
        "Half Proficient"
    } else {
        "Not Proficient"
    }
}

/// Whole numbers without a trailing `.0`.
fn number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}
