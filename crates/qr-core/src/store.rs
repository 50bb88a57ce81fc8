use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::{CoreError, CoreResult};
use crate::flags::normalize_flags;
use crate::item::{Item, ItemId};

/// A single change to an item's consumable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemUpdate {
    /// Set the remaining uses.
    UsesCurrent(u32),
    /// Set the stack quantity.
    Quantity(i64),
    /// Set the recharge flag.
    RechargeCharged(bool),
    /// Remove the item from the inventory.
    Destroy,
}

/// A single change to the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorUpdate {
    /// Set the remaining points of a resource pool.
    PoolRemaining {
        /// Pool name.
        pool: String,
        /// New remaining points.
        remaining: u32,
    },
}

/// On-disk shape of an inventory.
#[derive(Debug, Default, Serialize, Deserialize)]
struct InventoryDocument {
    #[serde(default)]
    actor: Actor,
    #[serde(default)]
    items: Vec<Item>,
}

/// An actor and the items they carry.
#[derive(Debug, Clone, Default)]
pub struct Store {
    actor: Actor,
    items: HashMap<ItemId, Item>,

    // Indexes
    by_name_lower: HashMap<String, ItemId>,
    order: Vec<ItemId>,
}

impl Store {
    /// Create an empty inventory for `actor`.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Add an item. Names are unique case-insensitively.
    pub fn add_item(&mut self, item: Item) -> CoreResult<ItemId> {
        let name_lower = item.name.to_lowercase();
        if self.by_name_lower.contains_key(&name_lower) {
            return Err(CoreError::DuplicateName(item.name.clone()));
        }
        let id = item.id;
        self.by_name_lower.insert(name_lower, id);
        self.order.push(id);
        self.items.insert(id, item);
        Ok(id)
    }

    /// Get an item by ID.
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Find an item by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        self.by_name_lower
            .get(&name.to_lowercase())
            .and_then(|id| self.items.get(id))
    }

    /// Resolve a reference that is either a full item ID or an item name.
    pub fn resolve(&self, reference: &str) -> CoreResult<&Item> {
        ItemId::parse(reference)
            .and_then(|id| self.items.get(&id))
            .or_else(|| self.find_by_name(reference))
            .ok_or_else(|| CoreError::UnknownItem(reference.to_string()))
    }

    /// Remove an item.
    pub fn remove_item(&mut self, id: ItemId) -> CoreResult<Item> {
        let item = self.items.remove(&id).ok_or(CoreError::ItemNotFound(id))?;
        self.by_name_lower.remove(&item.name.to_lowercase());
        self.order.retain(|i| *i != id);
        Ok(item)
    }

    /// All items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // -----------------------------------------------------------------------
    // Actor
    // -----------------------------------------------------------------------

    /// The owning actor.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Mutable access to the owning actor.
    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Apply a batch of updates to one item. Returns true if the item was destroyed.
    ///
    /// Quantities are clamped at zero. `Destroy` is applied after the other updates.
    pub fn apply_update(&mut self, id: ItemId, updates: &[ItemUpdate]) -> CoreResult<bool> {
        let item = self.items.get_mut(&id).ok_or(CoreError::ItemNotFound(id))?;
        let mut destroy = false;
        for update in updates {
            match *update {
                ItemUpdate::UsesCurrent(n) => item.uses.current = n,
                ItemUpdate::Quantity(q) => item.quantity = q.max(0),
                ItemUpdate::RechargeCharged(charged) => {
                    item.recharge.get_or_insert_with(Default::default).charged = charged;
                }
                ItemUpdate::Destroy => destroy = true,
            }
        }
        tracing::debug!(item = %item.name, ?updates, "applied item update");
        if destroy {
            let removed = self.remove_item(id)?;
            tracing::info!(item = %removed.name, "item destroyed");
        }
        Ok(destroy)
    }

    /// Apply an update to the owning actor.
    pub fn apply_actor_update(&mut self, update: &ActorUpdate) -> CoreResult<()> {
        match update {
            ActorUpdate::PoolRemaining { pool, remaining } => {
                let entry = self
                    .actor
                    .resources
                    .get_mut(pool)
                    .ok_or_else(|| CoreError::UnknownPool(pool.clone()))?;
                entry.remaining = *remaining;
                tracing::debug!(pool = %pool, remaining, "applied pool update");
            }
        }
        Ok(())
    }

    /// Normalize the quick-roll flags of every item. Returns how many items carry flags.
    pub fn normalize_all(&mut self, default_description: bool) -> usize {
        self.items
            .values_mut()
            .map(|item| normalize_flags(item, default_description))
            .filter(|has_flags| *has_flags)
            .count()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Parse an inventory from its JSON document.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let doc: InventoryDocument = serde_json::from_str(json)?;
        let mut store = Self::new(doc.actor);
        for item in doc.items {
            store.add_item(item)?;
        }
        Ok(store)
    }

    /// Serialize the inventory to a pretty-printed JSON document.
    pub fn to_json(&self) -> CoreResult<String> {
        let doc = InventoryDocument {
            actor: self.actor.clone(),
            items: self.items().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Load an inventory from a JSON file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), items = store.item_count(), "loaded inventory");
        Ok(store)
    }

    /// Write the inventory to a JSON file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Thread-safe handle to a [`Store`].
///
/// Reads share the lock; [`SharedStore::write`] holds it exclusively for the
/// whole closure, so a check-then-update inside one call is atomic.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<RwLock<Store>>);

impl SharedStore {
    /// Wrap a store.
    pub fn new(store: Store) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> CoreResult<R> {
        let guard = self.0.read().map_err(|_| CoreError::Poisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Store) -> R) -> CoreResult<R> {
        let mut guard = self.0.write().map_err(|_| CoreError::Poisoned)?;
        Ok(f(&mut guard))
    }

    /// Clone the current store contents.
    pub fn snapshot(&self) -> CoreResult<Store> {
        self.read(Store::clone)
    }
}
