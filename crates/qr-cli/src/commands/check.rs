use std::path::Path;

use qr_mechanics::validate_inventory;

pub fn run(inventory: &Path) -> Result<(), String> {
    let store = super::load_inventory(inventory)?;
    let issues = validate_inventory(&store);

    for issue in &issues {
        eprintln!("  {issue}");
    }

    let errors = issues.iter().filter(|i| i.is_error).count();
    let warnings = issues.len() - errors;
    if errors > 0 {
        return Err(format!("{errors} error(s), {warnings} warning(s)"));
    }

    println!("  All checks passed for '{}'.", store.actor().name);
    println!("  {} items, {warnings} warning(s)", store.item_count());

    Ok(())
}
