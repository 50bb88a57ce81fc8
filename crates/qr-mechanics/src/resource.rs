//! The resource gate: whether an action may proceed and what it consumes.
//!
//! Evaluation is pure. The gate proposes a [`Mutation`] computed from a
//! [`ResourceState`] snapshot; nothing changes until the caller commits it.

use std::fmt;

use qr_core::{ActorUpdate, ConsumeKind, ConsumptionRequest, Item, ItemId, ItemUpdate, Store};
use serde::Serialize;

/// Where a linked resource lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkedTarget {
    /// Another item's quantity (ammunition or materials).
    ItemQuantity {
        /// The linked item, if it exists.
        id: Option<ItemId>,
        /// Name used in messages.
        name: String,
    },
    /// Another item's uses.
    ItemUses {
        /// The linked item, if it exists.
        id: Option<ItemId>,
        /// Name used in messages.
        name: String,
    },
    /// An actor resource pool.
    Pool(String),
}

impl LinkedTarget {
    /// Name used in messages.
    pub fn name(&self) -> &str {
        match self {
            Self::ItemQuantity { name, .. } | Self::ItemUses { name, .. } => name,
            Self::Pool(pool) => pool,
        }
    }
}

/// A linked resource and how much of it an action needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedResource {
    /// Where the resource lives.
    pub target: LinkedTarget,
    /// Amount currently available.
    pub available: i64,
    /// Amount consumed per use.
    pub amount: u32,
}

/// Consumable state of an item at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceState {
    /// Remaining uses.
    pub uses_current: u32,
    /// Uses restored on refill.
    pub uses_max: u32,
    /// Stack size.
    pub quantity: i64,
    /// Destroy the item when its stack runs out.
    pub auto_destroy: bool,
    /// Whether the recharge is ready.
    pub recharge_charged: bool,
    /// The linked resource, if the item has one.
    pub linked: Option<LinkedResource>,
}

impl ResourceState {
    /// Capture the state of `item` and its linked resource from `store`.
    pub fn capture(item: &Item, store: &Store) -> Self {
        Self {
            uses_current: item.uses.current,
            uses_max: item.uses.max,
            quantity: item.quantity,
            auto_destroy: item.uses.auto_destroy,
            recharge_charged: item.recharge.as_ref().is_some_and(|r| r.charged),
            linked: item.consume.as_ref().map(|consume| {
                let linked_item = store.resolve(&consume.target).ok();
                let name = linked_item.map_or_else(|| consume.target.clone(), |i| i.name.clone());
                let id = linked_item.map(|i| i.id);
                let (target, available) = match consume.kind {
                    ConsumeKind::Ammo | ConsumeKind::Material => (
                        LinkedTarget::ItemQuantity { id, name },
                        linked_item.map_or(0, |i| i.quantity),
                    ),
                    ConsumeKind::Charges => (
                        LinkedTarget::ItemUses { id, name },
                        linked_item.map_or(0, |i| i64::from(i.uses.current)),
                    ),
                    ConsumeKind::Attribute => (
                        LinkedTarget::Pool(consume.target.clone()),
                        store
                            .actor()
                            .pool(&consume.target)
                            .map_or(0, |p| i64::from(p.remaining)),
                    ),
                };
                LinkedResource {
                    target,
                    available,
                    amount: consume.amount,
                }
            }),
        }
    }
}

/// Why the gate refused an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No uses left.
    NoUses,
    /// Nothing left in the stack.
    NoQuantity,
    /// No uses left and no spare item to refill from.
    Exhausted,
    /// The recharge is not ready.
    NotCharged,
    /// The linked resource cannot cover the cost.
    InsufficientResource {
        /// Resource name.
        resource: String,
        /// Amount needed.
        needed: u32,
        /// Amount available.
        available: i64,
    },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUses => write!(f, "no uses left"),
            Self::NoQuantity => write!(f, "none left"),
            Self::Exhausted => write!(f, "no uses left and nothing to refill from"),
            Self::NotCharged => write!(f, "not recharged"),
            Self::InsufficientResource {
                resource,
                needed,
                available,
            } => write!(f, "needs {needed} {resource}, has {available}"),
        }
    }
}

/// An update to the linked resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedUpdate {
    /// Update another item.
    Item {
        /// The linked item.
        id: ItemId,
        /// The update.
        update: ItemUpdate,
    },
    /// Update the actor.
    Actor(ActorUpdate),
}

/// The side effects of a permitted action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Mutation {
    /// Updates to the acting item.
    pub item_updates: Vec<ItemUpdate>,
    /// Update to the linked resource.
    pub linked: Option<LinkedUpdate>,
}

impl Mutation {
    /// Returns true if the mutation destroys the acting item.
    pub fn destroys(&self) -> bool {
        self.item_updates.contains(&ItemUpdate::Destroy)
    }

    /// Returns true if nothing changes.
    pub fn is_empty(&self) -> bool {
        self.item_updates.is_empty() && self.linked.is_none()
    }
}

/// The gate's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Proceed, then commit the mutation.
    Permit(Mutation),
    /// Refuse.
    Deny(DenyReason),
}

/// Decide whether `request` can be paid from `state`. The first failing check wins.
pub fn evaluate(state: &ResourceState, request: &ConsumptionRequest) -> GateDecision {
    match check(state, request) {
        Some(reason) => GateDecision::Deny(reason),
        None => GateDecision::Permit(mutation_for(state, request)),
    }
}

fn check(state: &ResourceState, request: &ConsumptionRequest) -> Option<DenyReason> {
    if request.use_charge && !request.use_quantity && state.uses_current == 0 {
        return Some(DenyReason::NoUses);
    }
    if request.use_quantity && !request.use_charge && state.quantity <= 0 {
        return Some(DenyReason::NoQuantity);
    }
    if request.use_charge
        && request.use_quantity
        && state.uses_current == 0
        && state.quantity <= 1
    {
        return Some(DenyReason::Exhausted);
    }
    if request.use_recharge && !state.recharge_charged {
        return Some(DenyReason::NotCharged);
    }
    if request.use_resource {
        if let Some(linked) = state.linked.as_ref() {
            if linked.available < i64::from(linked.amount) {
                return Some(DenyReason::InsufficientResource {
                    resource: linked.target.name().to_string(),
                    needed: linked.amount,
                    available: linked.available,
                });
            }
        }
    }
    None
}

fn mutation_for(state: &ResourceState, request: &ConsumptionRequest) -> Mutation {
    let mut updates = Vec::new();
    let mut destroy = false;

    match (request.use_charge, request.use_quantity) {
        (true, false) => {
            updates.push(ItemUpdate::UsesCurrent(state.uses_current.saturating_sub(1)));
        }
        (false, true) => {
            let quantity = state.quantity - 1;
            updates.push(ItemUpdate::Quantity(quantity.max(0)));
            destroy = quantity <= 0 && state.auto_destroy;
        }
        (true, true) => {
            if state.uses_current == 0 {
                let quantity = state.quantity - 1;
                let uses = if quantity >= 1 { state.uses_max } else { 0 };
                updates.push(ItemUpdate::Quantity(quantity.max(0)));
                updates.push(ItemUpdate::UsesCurrent(uses));
                destroy = quantity <= 0 && state.auto_destroy;
            } else {
                updates.push(ItemUpdate::UsesCurrent(state.uses_current - 1));
            }
        }
        (false, false) => {}
    }

    if request.use_recharge {
        updates.push(ItemUpdate::RechargeCharged(false));
    }
    if destroy {
        updates.push(ItemUpdate::Destroy);
    }

    let linked = if request.use_resource {
        state.linked.as_ref().and_then(linked_update)
    } else {
        None
    };

    Mutation {
        item_updates: updates,
        linked,
    }
}

fn linked_update(linked: &LinkedResource) -> Option<LinkedUpdate> {
    let left = (linked.available - i64::from(linked.amount)).max(0);
    match &linked.target {
        LinkedTarget::ItemQuantity { id, .. } => id.map(|id| LinkedUpdate::Item {
            id,
            update: ItemUpdate::Quantity(left),
        }),
        LinkedTarget::ItemUses { id, .. } => id.map(|id| LinkedUpdate::Item {
            id,
            update: ItemUpdate::UsesCurrent(u32::try_from(left).unwrap_or(u32::MAX)),
        }),
        LinkedTarget::Pool(pool) => Some(LinkedUpdate::Actor(ActorUpdate::PoolRemaining {
            pool: pool.clone(),
            remaining: u32::try_from(left).unwrap_or(u32::MAX),
        })),
    }
}
