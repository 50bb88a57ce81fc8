//! Core types for Quickroll: items, actors, quick-roll flags, and the inventory store.
//!
//! This crate holds the data the roll pipeline reads. It knows nothing about
//! dice; it only owns item and actor state and applies committed updates
//! atomically per item.

/// The character that owns an inventory.
pub mod actor;
/// Error types used throughout the crate.
pub mod error;
/// Per-item quick-roll toggles with primary and alternate columns.
pub mod flags;
/// Item types, identifiers, and item sub-records.
pub mod item;
/// The inventory store and its thread-safe handle.
pub mod store;

/// Re-export actor types.
pub use actor::{ActionBonus, Actor, ActorKind, ResourcePool};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export flag types.
pub use flags::{
    ActionFlags, ConsumptionRequest, DamageToggles, PresetSelector, Toggle, normalize_flags,
    toggle_on,
};
/// Re-export item types.
pub use item::{
    ActionType, Consume, ConsumeKind, Damage, DamagePart, Item, ItemId, ItemKind, Range, Recharge,
    Save, Scaling, ScalingMode, Target, Uses,
};
/// Re-export store types.
pub use store::{ActorUpdate, ItemUpdate, SharedStore, Store};
