pub mod check;
pub mod flags;
pub mod formula;
pub mod roll;

use std::path::Path;

use qr_core::Store;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Load an inventory file, prefixing errors with its path.
fn load_inventory(path: &Path) -> Result<Store, String> {
    let store = Store::load(path).map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), items = store.item_count(), "loaded inventory");
    Ok(store)
}

/// Write an inventory file, prefixing errors with its path.
fn save_inventory(store: &Store, path: &Path) -> Result<(), String> {
    store
        .save(path)
        .map_err(|e| format!("{}: {e}", path.display()))
}

/// A seeded RNG, or one seeded from the OS.
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
