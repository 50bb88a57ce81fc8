//! Validation of an inventory's roll data.
//!
//! Checks that every formula an action could roll parses, that stored
//! damage toggles match the item's damage slots, and that linked resources
//! point at items that exist.

use qr_core::{ConsumeKind, Item, Store};

use crate::dice::Formula;

/// A warning or error found during inventory validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The item where the issue was found.
    pub item: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Whether this is an error (true) or a warning (false).
    pub is_error: bool,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{level}: {}: {}", self.item, self.message)
    }
}

/// Validate every item in the store.
pub fn validate_inventory(store: &Store) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for item in store.items() {
        validate_formulas(item, &mut issues);
        validate_flags(item, &mut issues);
        validate_links(item, store, &mut issues);
    }
    issues
}

fn validate_formulas(item: &Item, issues: &mut Vec<ValidationIssue>) {
    let mut check = |label: String, source: &str| {
        if source.trim().is_empty() {
            return;
        }
        if let Err(e) = Formula::parse(source) {
            issues.push(ValidationIssue {
                item: item.name.clone(),
                message: format!("{label} formula \"{source}\": {e}"),
                is_error: true,
            });
        }
    };

    for (i, part) in item.damage.parts.iter().enumerate() {
        check(format!("damage {i}"), &part.formula);
    }
    if let Some(v) = item.damage.versatile.as_deref() {
        check("versatile".to_string(), v);
    }
    if let Some(f) = item.formula.as_deref() {
        check("other".to_string(), f);
    }
    if let Some(b) = item.bonus.as_deref() {
        check("bonus".to_string(), b);
    }
    check("scaling".to_string(), &item.scaling.formula);
}

fn validate_flags(item: &Item, issues: &mut Vec<ValidationIssue>) {
    let Some(flags) = item.flags.as_ref() else {
        return;
    };
    let slots = item.damage.parts.len();
    if let Some(damage) = flags.quick_damage.as_ref() {
        if damage.primary.len() != slots || damage.alternate.len() != slots {
            issues.push(ValidationIssue {
                item: item.name.clone(),
                message: format!(
                    "damage toggles ({}/{}) out of sync with {slots} damage slot(s), run `qr flags`",
                    damage.primary.len(),
                    damage.alternate.len()
                ),
                is_error: false,
            });
        }
    }
    if let Some(index) = flags.crit_damage.filter(|i| *i >= slots) {
        issues.push(ValidationIssue {
            item: item.name.clone(),
            message: format!("crit damage slot {index} does not exist"),
            is_error: true,
        });
    }
}

fn validate_links(item: &Item, store: &Store, issues: &mut Vec<ValidationIssue>) {
    let Some(consume) = item.consume.as_ref() else {
        return;
    };
    if consume.target.trim().is_empty() {
        return;
    }
    let found = match consume.kind {
        ConsumeKind::Attribute => store.actor().pool(&consume.target).is_some(),
        ConsumeKind::Ammo | ConsumeKind::Material | ConsumeKind::Charges => {
            store.resolve(&consume.target).is_ok()
        }
    };
    if !found {
        let what = match consume.kind {
            ConsumeKind::Ammo => "ammunition",
            ConsumeKind::Attribute => "resource pool",
            ConsumeKind::Material => "material",
            ConsumeKind::Charges => "charge source",
        };
        issues.push(ValidationIssue {
            item: item.name.clone(),
            message: format!("{what} \"{}\" not found", consume.target),
            is_error: true,
        });
    }
}
