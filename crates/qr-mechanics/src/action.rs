//! Action orchestration: preset, prompts, gate, pipeline, commit.

use std::fmt;

use chrono::{DateTime, Utc};
use qr_core::{
    ActorUpdate, ConsumeKind, ConsumptionRequest, Item, ItemId, ItemKind, PresetSelector,
    ResourcePool, SharedStore, Store,
};
use serde::Serialize;

use crate::config::RollConfig;
use crate::dice::{DieResult, DieRoller};
use crate::error::MechResult;
use crate::fields::{FieldRequest, ResultFragment};
use crate::pipeline::{ActionContext, RollParameters, execute};
use crate::preset::{CompiledPlan, compile};
use crate::prompt::{PromptService, needs_augment_dialog};
use crate::properties::list_properties;
use crate::resource::{
    DenyReason, GateDecision, LinkedTarget, LinkedUpdate, Mutation, ResourceState, evaluate,
};

/// Why an action stopped before producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The resource gate refused the action.
    ResourceDenied(DenyReason),
    /// A prompt was cancelled.
    InteractionCancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceDenied(reason) => write!(f, "denied: {reason}"),
            Self::InteractionCancelled => write!(f, "cancelled"),
        }
    }
}

/// A completed action, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    /// The acting item.
    pub item: ItemId,
    /// Header title.
    pub title: String,
    /// Header image.
    pub img: Option<String>,
    /// Whether the action is critical.
    pub is_crit: bool,
    /// Crit label shown in the header.
    pub crit_label: Option<String>,
    /// Fragments in output order.
    pub fragments: Vec<ResultFragment>,
    /// Properties footer.
    pub properties: Vec<String>,
    /// Every die rolled, flattened.
    pub dice_pool: Vec<DieResult>,
    /// Committed resource changes.
    pub mutation: Mutation,
    /// Cost debited from the actor's pool.
    pub pool_debit: Option<PoolDebit>,
    /// Whether the acting item was destroyed.
    pub destroyed: bool,
    /// Whether to place the area template.
    pub place_template: bool,
    /// Target type chosen in the augmentation dialog.
    pub target_type: Option<String>,
    /// When the action was rolled.
    pub rolled_at: DateTime<Utc>,
}

/// Points taken from an actor pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolDebit {
    /// Pool name.
    pub pool: String,
    /// Points spent.
    pub amount: u32,
}

/// How an action ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action rolled and its mutation was committed.
    Completed(Box<ActionReport>),
    /// Nothing was rolled or changed.
    Aborted(AbortReason),
}

impl ActionOutcome {
    /// The report of a completed action.
    pub fn report(&self) -> Option<&ActionReport> {
        match self {
            Self::Completed(r) => Some(r),
            Self::Aborted(_) => None,
        }
    }
}

/// Superpower spending decided before the roll.
#[derive(Debug, Clone, Default)]
struct Spending {
    spent_cost: Option<u32>,
    debit: Option<PoolDebit>,
    place_template: Option<bool>,
    target_type: Option<String>,
}

enum Commit {
    Applied { mutation: Mutation, destroyed: bool },
    Denied(DenyReason),
}

/// Run one action of the item named by `item_ref`.
///
/// The store is read once up front. Resource changes are re-checked and
/// committed under the write lock after every field has rolled.
pub fn run_action(
    store: &SharedStore,
    item_ref: &str,
    params: &RollParameters,
    explicit_fields: &[FieldRequest],
    config: &RollConfig,
    prompts: &mut dyn PromptService,
    roller: &mut dyn DieRoller,
) -> MechResult<ActionOutcome> {
    let config = config.clone();
    let snapshot = store.snapshot()?;
    let item = snapshot.resolve(item_ref)?.clone();
    let actor = snapshot.actor().clone();

    let plan = match params.preset {
        Some(PresetSelector::Alternate) if !config.alt_secondary_enabled => {
            tracing::warn!(item = %item.name, "alternate quick roll disabled, using primary");
            compile(&item, PresetSelector::Primary)
        }
        Some(selector) => compile(&item, selector),
        None => CompiledPlan::default(),
    };
    let mut fields = plan.fields.clone();
    fields.extend_from_slice(explicit_fields);

    let mut params = params.clone();
    let consumption = mask_consumption(&item, params.consumption.unwrap_or(plan.consumption));
    let show_properties = params.show_properties.unwrap_or(plan.show_properties);
    let mut place_template = params.place_template.unwrap_or(plan.place_template);

    let ammo = ammunition(&item, &consumption, &snapshot);

    if wants_advantage_prompt(&item, &params, &config, &plan) {
        let Some(choice) = prompts.ask_advantage(&item) else {
            tracing::warn!(item = %item.name, "advantage prompt cancelled");
            return Ok(ActionOutcome::Aborted(AbortReason::InteractionCancelled));
        };
        params.advantage = choice.advantage;
        params.disadvantage = choice.disadvantage;
    }

    let spending = if item.kind == ItemKind::Superpower {
        let pool_name = item.cost_pool();
        let pool = actor.pool(pool_name).copied().unwrap_or_default();
        let Some(spending) = superpower_spending(&item, &params, &pool, prompts) else {
            tracing::warn!(item = %item.name, "augmentation dialog cancelled");
            return Ok(ActionOutcome::Aborted(AbortReason::InteractionCancelled));
        };
        spending
    } else {
        Spending::default()
    };
    if let Some(cost) = spending.spent_cost {
        params.spent_cost = Some(cost);
    }
    if let Some(place) = spending.place_template {
        place_template = place;
    }

    let state = ResourceState::capture(&item, &snapshot);
    let gate = match evaluate(&state, &consumption) {
        GateDecision::Permit(mutation) => {
            debit_pool(&snapshot, &state, &consumption, spending.debit.as_ref(), mutation)
        }
        GateDecision::Deny(reason) => Err(reason),
    };
    if let Err(reason) = gate {
        tracing::warn!(item = %item.name, %reason, "action denied");
        return Ok(ActionOutcome::Aborted(AbortReason::ResourceDenied(reason)));
    }

    let mut ctx = ActionContext::new(&item, &actor, &config, &params, roller).with_ammo(ammo);
    let fragments = execute(&mut ctx, &fields)?;
    let is_crit = ctx.is_crit();
    let dice_pool = ctx.into_dice_pool();

    let committed = store.write(|s| commit(s, item.id, &consumption, spending.debit.as_ref()))??;
    let (mutation, destroyed) = match committed {
        Commit::Applied {
            mutation,
            destroyed,
        } => (mutation, destroyed),
        Commit::Denied(reason) => {
            tracing::warn!(item = %item.name, %reason, "action denied at commit");
            return Ok(ActionOutcome::Aborted(AbortReason::ResourceDenied(reason)));
        }
    };

    let report = ActionReport {
        item: item.id,
        title: params
            .title
            .clone()
            .unwrap_or_else(|| header_title(&item, params.spent_cost)),
        img: item.img.clone(),
        is_crit,
        crit_label: is_crit.then(|| config.crit_string.clone()),
        fragments,
        properties: if show_properties {
            list_properties(&item)
        } else {
            Vec::new()
        },
        dice_pool,
        mutation,
        pool_debit: spending.debit,
        destroyed,
        place_template,
        target_type: spending.target_type,
        rolled_at: Utc::now(),
    };
    tracing::info!(
        item = %item.name,
        fragments = report.fragments.len(),
        dice = report.dice_pool.len(),
        is_crit,
        destroyed,
        "action completed"
    );
    Ok(ActionOutcome::Completed(Box::new(report)))
}

/// Drop consumption the item cannot pay: charges without configured uses
/// and linked resources without a target.
fn mask_consumption(item: &Item, mut request: ConsumptionRequest) -> ConsumptionRequest {
    let has_uses = item.uses.current > 0 || item.uses.max > 0 || item.uses.per.is_some();
    let has_resource = item
        .consume
        .as_ref()
        .is_some_and(|c| !c.target.trim().is_empty());
    request.use_charge &= has_uses;
    request.use_resource &= has_resource;
    request
}

fn ammunition<'s>(item: &Item, request: &ConsumptionRequest, store: &'s Store) -> Option<&'s Item> {
    let consume = item.consume.as_ref()?;
    if !request.use_resource || consume.kind != ConsumeKind::Ammo {
        return None;
    }
    store.resolve(&consume.target).ok()
}

fn wants_advantage_prompt(
    item: &Item,
    params: &RollParameters,
    config: &RollConfig,
    plan: &CompiledPlan,
) -> bool {
    params.advantage == 0
        && params.disadvantage == 0
        && (item.is_check() || item.kind == ItemKind::Weapon)
        && (config.query_advantage || plan.prompt)
}

/// Decide how much a superpower costs. `None` when the dialog was cancelled.
fn superpower_spending(
    item: &Item,
    params: &RollParameters,
    pool: &ResourcePool,
    prompts: &mut dyn PromptService,
) -> Option<Spending> {
    let cost = item.cost.unwrap_or(0);
    let pool_name = item.cost_pool().to_string();
    let debit = |amount: u32| {
        (amount > 0).then(|| PoolDebit {
            pool: pool_name.clone(),
            amount,
        })
    };

    // A preset spent cost skips the dialog and leaves the pool alone.
    if let Some(spent) = params.spent_cost {
        return Some(Spending {
            spent_cost: Some(spent.max(cost)),
            ..Spending::default()
        });
    }
    if !needs_augment_dialog(item, pool) {
        return Some(Spending {
            spent_cost: Some(cost),
            debit: debit(cost),
            ..Spending::default()
        });
    }

    let choice = prompts.ask_resource_augment(item, pool)?;
    let spent = choice.spent_cost.max(cost);
    Some(Spending {
        spent_cost: Some(spent),
        debit: if choice.consume_resources {
            debit(spent)
        } else {
            None
        },
        place_template: Some(choice.place_template),
        target_type: choice.target_type,
    })
}

/// Re-check the gate against the current store and apply the mutation.
fn commit(
    store: &mut Store,
    id: ItemId,
    request: &ConsumptionRequest,
    debit: Option<&PoolDebit>,
) -> MechResult<Commit> {
    let item = store
        .get_item(id)
        .ok_or(qr_core::CoreError::ItemNotFound(id))?;
    let state = ResourceState::capture(item, store);
    let (mutation, debit_update) = match evaluate(&state, request) {
        GateDecision::Permit(m) => match debit_pool(store, &state, request, debit, m) {
            Ok(planned) => planned,
            Err(reason) => return Ok(Commit::Denied(reason)),
        },
        GateDecision::Deny(reason) => return Ok(Commit::Denied(reason)),
    };

    match mutation.linked.as_ref() {
        Some(LinkedUpdate::Item { id, update }) => {
            store.apply_update(*id, std::slice::from_ref(update))?;
        }
        Some(LinkedUpdate::Actor(update)) => store.apply_actor_update(update)?,
        None => {}
    }
    if let Some(update) = debit_update.as_ref() {
        store.apply_actor_update(update)?;
    }
    let destroyed = if mutation.item_updates.is_empty() {
        false
    } else {
        store.apply_update(id, &mutation.item_updates)?
    };
    Ok(Commit::Applied {
        mutation,
        destroyed,
    })
}

/// Plan the superpower debit on top of a permitted mutation.
///
/// When the linked resource is the debited pool, both costs are checked
/// together and folded into the mutation's single pool update.
fn debit_pool(
    store: &Store,
    state: &ResourceState,
    request: &ConsumptionRequest,
    debit: Option<&PoolDebit>,
    mut mutation: Mutation,
) -> Result<(Mutation, Option<ActorUpdate>), DenyReason> {
    let Some(debit) = debit else {
        return Ok((mutation, None));
    };
    let shared = state
        .linked
        .as_ref()
        .filter(|l| request.use_resource && l.target == LinkedTarget::Pool(debit.pool.clone()));
    let linked = shared.map_or(0, |l| l.amount);
    let needed = debit.amount.saturating_add(linked);
    let remaining = store.actor().pool(&debit.pool).map_or(0, |p| p.remaining);
    if remaining < needed {
        return Err(DenyReason::InsufficientResource {
            resource: debit.pool.clone(),
            needed,
            available: i64::from(remaining),
        });
    }

    let update = ActorUpdate::PoolRemaining {
        pool: debit.pool.clone(),
        remaining: remaining - needed,
    };
    if shared.is_some() {
        mutation.linked = Some(LinkedUpdate::Actor(update));
        Ok((mutation, None))
    } else {
        Ok((mutation, Some(update)))
    }
}

/// Item name, with the spent cost when a superpower was augmented.
fn header_title(item: &Item, spent_cost: Option<u32>) -> String {
    match (item.kind, item.cost, spent_cost) {
        (ItemKind::Superpower, Some(cost), Some(spent)) if spent != cost => {
            format!("{} ({spent} {})", item.name, item.cost_pool())
        }
        _ => item.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::prompt::{AdvantageChoice, AugmentChoice, FixedPrompt, NoPrompt};
    use qr_core::{ActionType, Actor, Consume, DamagePart, Toggle, normalize_flags};

    fn store_with(items: Vec<Item>) -> SharedStore {
        let mut actor = Actor::new("Brenna");
        actor.abilities.insert("str".to_string(), 3);
        actor.proficiency = 2;
        actor.resources.insert(
            "mana".to_string(),
            ResourcePool {
                remaining: 6,
                limit: 4,
            },
        );
        let mut store = Store::new(actor);
        for item in items {
            store.add_item(item).unwrap();
        }
        SharedStore::new(store)
    }

    fn potion(uses: u32, quantity: i64) -> Item {
        let mut item = Item::new(ItemKind::Consumable, "Healing Potion");
        item.action_type = ActionType::Heal;
        item.damage.parts = vec![DamagePart::new("2d4 + 2", "healing")];
        item.uses.current = uses;
        item.uses.max = 1;
        item.uses.auto_destroy = true;
        item.quantity = quantity;
        normalize_flags(&mut item, false);
        if let Some(flags) = item.flags.as_mut() {
            flags.quick_charges = Some(Toggle::both(ConsumptionRequest {
                use_charge: true,
                use_quantity: true,
                ..ConsumptionRequest::default()
            }));
        }
        item
    }

    fn quick() -> RollParameters {
        RollParameters::quick(PresetSelector::Primary)
    }

    fn run(store: &SharedStore, name: &str, params: &RollParameters, faces: &[u32]) -> ActionOutcome {
        let mut roller = ScriptedRoller::new(faces.iter().copied());
        run_action(
            store,
            name,
            params,
            &[],
            &RollConfig::default(),
            &mut NoPrompt,
            &mut roller,
        )
        .unwrap()
    }

    #[test]
    fn potion_refills_from_stack() {
        let store = store_with(vec![potion(0, 2)]);
        let outcome = run(&store, "healing potion", &quick(), &[3, 4]);
        let report = outcome.report().unwrap();
        assert_eq!(report.fragments.len(), 1);
        let after = store.read(|s| s.find_by_name("Healing Potion").cloned()).unwrap().unwrap();
        assert_eq!(after.quantity, 1);
        assert_eq!(after.uses.current, 1);
    }

    #[test]
    fn last_potion_exhausted() {
        let store = store_with(vec![potion(1, 1)]);
        let outcome = run(&store, "Healing Potion", &quick(), &[1, 1]);
        assert!(!outcome.report().unwrap().destroyed);

        let outcome = run(&store, "Healing Potion", &quick(), &[1, 1]);
        assert_eq!(
            outcome,
            ActionOutcome::Aborted(AbortReason::ResourceDenied(DenyReason::Exhausted))
        );
    }

    #[test]
    fn denied_action_changes_nothing() {
        let mut wand = Item::new(ItemKind::Equipment, "Wand");
        wand.uses.max = 3;
        wand.formula = Some("1d6".to_string());
        normalize_flags(&mut wand, false);
        if let Some(flags) = wand.flags.as_mut() {
            flags.quick_charges = Some(Toggle::both(ConsumptionRequest {
                use_charge: true,
                ..ConsumptionRequest::default()
            }));
        }
        let store = store_with(vec![wand]);
        let outcome = run(&store, "Wand", &quick(), &[4]);
        assert_eq!(
            outcome,
            ActionOutcome::Aborted(AbortReason::ResourceDenied(DenyReason::NoUses))
        );
    }

    #[test]
    fn charges_masked_without_uses() {
        let mut sword = Item::new(ItemKind::Weapon, "Sword");
        sword.action_type = ActionType::MeleeWeaponAttack;
        normalize_flags(&mut sword, false);
        if let Some(flags) = sword.flags.as_mut() {
            flags.quick_charges = Some(Toggle::both(ConsumptionRequest {
                use_charge: true,
                use_resource: true,
                ..ConsumptionRequest::default()
            }));
        }
        let store = store_with(vec![sword]);
        let outcome = run(&store, "Sword", &quick(), &[11]);
        assert!(outcome.report().unwrap().mutation.is_empty());
    }

    #[test]
    fn cancelled_advantage_prompt_aborts() {
        let mut sword = Item::new(ItemKind::Weapon, "Sword");
        sword.action_type = ActionType::MeleeWeaponAttack;
        normalize_flags(&mut sword, false);
        let store = store_with(vec![sword]);
        let config = RollConfig::default().with_query_advantage(true);
        let mut prompts = FixedPrompt::default();
        let outcome = run_action(
            &store,
            "Sword",
            &quick(),
            &[],
            &config,
            &mut prompts,
            &mut ScriptedRoller::default(),
        )
        .unwrap();
        assert_eq!(outcome, ActionOutcome::Aborted(AbortReason::InteractionCancelled));
    }

    #[test]
    fn advantage_prompt_sets_roll_state() {
        let mut sword = Item::new(ItemKind::Weapon, "Sword");
        sword.action_type = ActionType::MeleeWeaponAttack;
        normalize_flags(&mut sword, false);
        let store = store_with(vec![sword]);
        let config = RollConfig::default().with_query_advantage(true);
        let mut prompts = FixedPrompt {
            advantage: Some(AdvantageChoice {
                advantage: 1,
                disadvantage: 0,
            }),
            augment: None,
        };
        let outcome = run_action(
            &store,
            "Sword",
            &quick(),
            &[],
            &config,
            &mut prompts,
            &mut ScriptedRoller::new([4, 16]),
        )
        .unwrap();
        let report = outcome.report().unwrap();
        let ResultFragment::Attack(a) = &report.fragments[0] else {
            panic!("expected attack");
        };
        assert_eq!(a.roll.outcomes.len(), 2);
        assert_eq!(a.roll.chosen, 1);
    }

    #[test]
    fn augmented_superpower_debits_pool() {
        let mut bolt = Item::new(ItemKind::Superpower, "Arc Bolt");
        bolt.action_type = ActionType::RangedSpellAttack;
        bolt.cost = Some(1);
        bolt.damage.parts = vec![DamagePart::new("1d6", "lightning")];
        normalize_flags(&mut bolt, false);
        let store = store_with(vec![bolt]);
        let mut prompts = FixedPrompt {
            advantage: None,
            augment: Some(AugmentChoice {
                spent_cost: 3,
                consume_resources: true,
                place_template: false,
                target_type: None,
            }),
        };
        let outcome = run_action(
            &store,
            "Arc Bolt",
            &quick(),
            &[],
            &RollConfig::default(),
            &mut prompts,
            &mut ScriptedRoller::new([10, 2]),
        )
        .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.title, "Arc Bolt (3 mana)");
        assert_eq!(
            report.pool_debit,
            Some(PoolDebit {
                pool: "mana".to_string(),
                amount: 3
            })
        );
        let remaining = store
            .read(|s| s.actor().pool("mana").map(|p| p.remaining))
            .unwrap();
        assert_eq!(remaining, Some(3));
    }

    fn mana_linked_power(cost: u32, linked: u32) -> Item {
        let mut spike = Item::new(ItemKind::Superpower, "Mind Spike");
        spike.cost = Some(cost);
        spike.consume = Some(Consume {
            kind: ConsumeKind::Attribute,
            target: "mana".to_string(),
            amount: linked,
        });
        normalize_flags(&mut spike, false);
        spike
    }

    fn spend_resource() -> RollParameters {
        RollParameters {
            consumption: Some(ConsumptionRequest {
                use_resource: true,
                ..ConsumptionRequest::default()
            }),
            ..quick()
        }
    }

    fn mana(store: &SharedStore) -> Option<u32> {
        store
            .read(|s| s.actor().pool("mana").map(|p| p.remaining))
            .unwrap()
    }

    #[test]
    fn linked_pool_and_cost_debit_combine() {
        let store = store_with(vec![mana_linked_power(2, 1)]);
        let outcome = run(&store, "Mind Spike", &spend_resource(), &[]);
        let report = outcome.report().unwrap();
        assert_eq!(
            report.mutation.linked,
            Some(LinkedUpdate::Actor(ActorUpdate::PoolRemaining {
                pool: "mana".to_string(),
                remaining: 3
            }))
        );
        assert_eq!(report.pool_debit.as_ref().map(|d| d.amount), Some(2));
        assert_eq!(mana(&store), Some(3));
    }

    #[test]
    fn linked_pool_and_cost_checked_together() {
        let store = store_with(vec![mana_linked_power(2, 5)]);
        let outcome = run(&store, "Mind Spike", &spend_resource(), &[]);
        assert_eq!(
            outcome,
            ActionOutcome::Aborted(AbortReason::ResourceDenied(
                DenyReason::InsufficientResource {
                    resource: "mana".to_string(),
                    needed: 7,
                    available: 6
                }
            ))
        );
        assert_eq!(mana(&store), Some(6));
    }

    #[test]
    fn preset_spent_cost_leaves_pool_alone() {
        let mut bolt = Item::new(ItemKind::Superpower, "Arc Bolt");
        bolt.cost = Some(1);
        normalize_flags(&mut bolt, false);
        let store = store_with(vec![bolt]);
        let params = RollParameters {
            spent_cost: Some(3),
            ..quick()
        };
        let outcome = run(&store, "Arc Bolt", &params, &[]);
        let report = outcome.report().unwrap();
        assert_eq!(report.title, "Arc Bolt (3 mana)");
        assert_eq!(report.pool_debit, None);
        assert_eq!(mana(&store), Some(6));
    }

    #[test]
    fn cancelled_augment_dialog_aborts_without_debit() {
        let mut bolt = Item::new(ItemKind::Superpower, "Arc Bolt");
        bolt.cost = Some(1);
        normalize_flags(&mut bolt, false);
        let store = store_with(vec![bolt]);
        let outcome = run_action(
            &store,
            "Arc Bolt",
            &quick(),
            &[],
            &RollConfig::default(),
            &mut FixedPrompt::default(),
            &mut ScriptedRoller::default(),
        )
        .unwrap();
        assert_eq!(outcome, ActionOutcome::Aborted(AbortReason::InteractionCancelled));
        let remaining = store
            .read(|s| s.actor().pool("mana").map(|p| p.remaining))
            .unwrap();
        assert_eq!(remaining, Some(6));
    }

    #[test]
    fn crit_label_and_properties() {
        let mut sword = Item::new(ItemKind::Weapon, "Sword");
        sword.action_type = ActionType::MeleeWeaponAttack;
        sword.proficient = 1.0;
        sword.weight = Some(3.0);
        sword.damage.parts = vec![DamagePart::new("1d8 + @value", "slashing")];
        normalize_flags(&mut sword, false);
        let store = store_with(vec![sword]);
        let outcome = run(&store, "Sword", &quick(), &[20, 3, 5]);
        let report = outcome.report().unwrap();
        assert!(report.is_crit);
        assert_eq!(report.crit_label.as_deref(), Some("Critical!"));
        assert_eq!(report.properties, vec!["3 lbs."]);
        assert_eq!(report.dice_pool.len(), 3);
    }

    #[test]
    fn alternate_disabled_falls_back_to_primary() {
        let mut sword = Item::new(ItemKind::Weapon, "Sword");
        sword.action_type = ActionType::MeleeWeaponAttack;
        normalize_flags(&mut sword, false);
        if let Some(flags) = sword.flags.as_mut() {
            flags.quick_attack = Some(Toggle {
                primary: true,
                alternate: false,
            });
        }
        let store = store_with(vec![sword]);
        let config = RollConfig::default().with_alt_secondary(false);
        let outcome = run_action(
            &store,
            "Sword",
            &RollParameters::quick(PresetSelector::Alternate),
            &[],
            &config,
            &mut NoPrompt,
            &mut ScriptedRoller::new([9]),
        )
        .unwrap();
        assert_eq!(outcome.report().unwrap().fragments.len(), 1);
    }

    #[test]
    fn unknown_item_is_an_error() {
        let store = store_with(vec![]);
        let err = run_action(
            &store,
            "Nothing",
            &quick(),
            &[],
            &RollConfig::default(),
            &mut NoPrompt,
            &mut ScriptedRoller::default(),
        );
        assert!(err.is_err());
    }
}
