//! Action pipeline integration tests.
use qr_core::{ConsumptionRequest, ItemUpdate, PresetSelector, SharedStore, Store};
use qr_mechanics::resource::LinkedUpdate;
use qr_mechanics::{
    AbortReason, ActionOutcome, CritBehavior, DamageIndex, DenyReason, FieldRequest, MechError,
    NoPrompt, ResultFragment, RollConfig, RollParameters, ScriptedRoller, parse_fields, run_action,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const INVENTORY: &str = r#"{
  "actor": {
    "name": "Brenna",
    "abilities": { "str": 3, "dex": 2 },
    "proficiency": 2,
    "level": 5
  },
  "items": [
    {
      "name": "Flame Tongue",
      "kind": "weapon",
      "action_type": "mwak",
      "proficient": 1,
      "damage": {
        "parts": [
          { "formula": "1d8 + @value", "damage_type": "slashing" },
          { "formula": "2d6", "damage_type": "fire" },
          { "formula": "1d4", "damage_type": "radiant" }
        ]
      }
    },
    {
      "name": "Greatclub",
      "kind": "weapon",
      "action_type": "mwak",
      "damage": { "parts": [{ "formula": "2d6", "damage_type": "bludgeoning" }] }
    },
    {
      "name": "Elixir",
      "kind": "consumable",
      "action_type": "heal",
      "quantity": 1,
      "uses": { "current": 1, "max": 1 },
      "damage": { "parts": [{ "formula": "1d4", "damage_type": "healing" }] },
      "flags": { "quick_charges": { "primary": { "use_charge": true }, "alternate": { "use_charge": true } } }
    },
    {
      "name": "Wand of Sparks",
      "kind": "consumable",
      "quantity": 1,
      "uses": { "current": 2, "max": 2 },
      "damage": {
        "parts": [
          { "formula": "1d6", "damage_type": "lightning" },
          { "formula": "1d6 +", "damage_type": "thunder" }
        ]
      }
    },
    {
      "name": "Longbow",
      "kind": "weapon",
      "action_type": "rwak",
      "consume": { "kind": "ammo", "target": "Arrows", "amount": 1 },
      "damage": { "parts": [{ "formula": "1d8", "damage_type": "piercing" }] }
    },
    {
      "name": "Arrows",
      "kind": "consumable",
      "quantity": 20,
      "damage": { "parts": [{ "formula": "1d4", "damage_type": "piercing" }] }
    }
  ]
}"#;

fn store() -> SharedStore {
    let mut store = Store::from_json(INVENTORY).unwrap();
    store.normalize_all(false);
    SharedStore::new(store)
}

fn roll(
    store: &SharedStore,
    item: &str,
    params: &RollParameters,
    fields: &[FieldRequest],
    config: &RollConfig,
    faces: &[u32],
) -> ActionOutcome {
    let mut roller = ScriptedRoller::new(faces.iter().copied());
    run_action(store, item, params, fields, config, &mut NoPrompt, &mut roller).unwrap()
}

fn forced_crit() -> RollParameters {
    RollParameters {
        force_crit: true,
        ..RollParameters::default()
    }
}

#[test]
fn damage_all_rolls_every_slot_in_order() {
    let store = store();
    let outcome = roll(
        &store,
        "Flame Tongue",
        &RollParameters::default(),
        &[FieldRequest::damage(DamageIndex::All, false)],
        &RollConfig::default(),
        &[5, 1, 2, 3],
    );
    let report = outcome.report().unwrap();
    let slots: Vec<_> = report
        .fragments
        .iter()
        .map(|f| f.as_damage().unwrap().index.unwrap())
        .collect();
    assert_eq!(slots, vec![0, 1, 2]);
    assert_eq!(report.dice_pool.len(), 4);
}

#[test]
fn natural_twenty_attack_rolls_crit_damage() {
    let store = store();
    let outcome = roll(
        &store,
        "Flame Tongue",
        &RollParameters::quick(PresetSelector::Primary),
        &[],
        &RollConfig::default(),
        &[20, 4, 1, 6, 3, 2, 5, 4, 1],
    );
    let report = outcome.report().unwrap();
    assert!(report.is_crit);

    let ResultFragment::Attack(attack) = &report.fragments[0] else {
        panic!("expected attack first");
    };
    assert!(attack.roll.is_crit);

    let damage: Vec<_> = report.fragments.iter().filter_map(|f| f.as_damage()).collect();
    assert_eq!(damage.len(), 3);
    let first = damage[0];
    assert_eq!(first.base.total, 7);
    assert_eq!(first.crit.as_ref().unwrap().formula, "1d8");
    assert_eq!(first.crit.as_ref().unwrap().total, 1);
    assert!(damage.iter().all(|d| d.crit.is_some()));
}

#[test]
fn off_never_rolls_crit_damage() {
    let store = store();
    let config = RollConfig::default().with_crit_behavior(CritBehavior::Off);
    let outcome = roll(
        &store,
        "Flame Tongue",
        &forced_crit(),
        &[FieldRequest::damage(DamageIndex::All, false)],
        &config,
        &[5, 1, 2, 3],
    );
    let report = outcome.report().unwrap();
    assert!(report.fragments.iter().all(|f| !f.is_crit()));
}

#[test]
fn maximize_both_tops_up_the_base_roll() {
    let store = store();
    let config = RollConfig::default().with_crit_behavior(CritBehavior::MaximizeBoth);
    let outcome = roll(
        &store,
        "Greatclub",
        &forced_crit(),
        &[FieldRequest::damage(DamageIndex::Single(0), false)],
        &config,
        &[3, 4],
    );
    let report = outcome.report().unwrap();
    let damage = report.fragments[0].as_damage().unwrap();
    assert_eq!(damage.base.total, 7);
    assert_eq!(damage.crit.as_ref().unwrap().total, 17);
}

#[test]
fn explicit_fields_follow_the_preset() {
    let store = store();
    let fields = parse_fields(
        r#"[{"kind": "text", "content": "A blaze of light"}, {"kind": "bogus"}]"#,
    )
    .unwrap();
    let outcome = roll(
        &store,
        "Greatclub",
        &RollParameters::quick(PresetSelector::Primary),
        &fields,
        &RollConfig::default(),
        &[9, 2, 2],
    );
    let kinds: Vec<_> = outcome
        .report()
        .unwrap()
        .fragments
        .iter()
        .map(ResultFragment::kind_name)
        .collect();
    assert_eq!(kinds, vec!["attack", "damage", "text"]);
}

#[test]
fn spent_charge_denies_the_next_use() {
    let store = store();
    let params = RollParameters::quick(PresetSelector::Primary);
    let first = roll(&store, "Elixir", &params, &[], &RollConfig::default(), &[3]);
    assert!(first.report().is_some());

    let second = roll(&store, "Elixir", &params, &[], &RollConfig::default(), &[3]);
    assert_eq!(
        second,
        ActionOutcome::Aborted(AbortReason::ResourceDenied(DenyReason::NoUses))
    );
}

#[test]
fn concurrent_actions_cannot_share_the_last_use() {
    let store = store();
    let params = RollParameters::quick(PresetSelector::Primary);
    let config = RollConfig::default();

    let outcomes: Vec<ActionOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let store = store.clone();
                let params = params.clone();
                let config = config.clone();
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    run_action(&store, "Elixir", &params, &[], &config, &mut NoPrompt, &mut rng)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let completed = outcomes.iter().filter(|o| o.report().is_some()).count();
    assert_eq!(completed, 1);
    let uses = store
        .read(|s| s.find_by_name("Elixir").map(|i| i.uses.current))
        .unwrap();
    assert_eq!(uses, Some(0));
}

fn consuming(request: ConsumptionRequest) -> RollParameters {
    RollParameters {
        consumption: Some(request),
        ..RollParameters::default()
    }
}

#[test]
fn broken_formula_fails_without_spending() {
    let store = store();
    let params = consuming(ConsumptionRequest {
        use_charge: true,
        ..ConsumptionRequest::default()
    });
    let mut roller = ScriptedRoller::new([4]);
    let result = run_action(
        &store,
        "Wand of Sparks",
        &params,
        &[FieldRequest::damage(DamageIndex::All, false)],
        &RollConfig::default(),
        &mut NoPrompt,
        &mut roller,
    );
    assert!(matches!(result, Err(MechError::Formula(_))));

    let wand = store
        .read(|s| s.find_by_name("Wand of Sparks").cloned())
        .unwrap()
        .unwrap();
    assert_eq!(wand.uses.current, 2);
    assert_eq!(wand.quantity, 1);
}

#[test]
fn bow_spends_arrows_and_rolls_their_damage_last() {
    let store = store();
    let params = consuming(ConsumptionRequest {
        use_resource: true,
        ..ConsumptionRequest::default()
    });
    let outcome = roll(
        &store,
        "Longbow",
        &params,
        &[
            FieldRequest::attack(),
            FieldRequest::damage(DamageIndex::Single(0), false),
        ],
        &RollConfig::default(),
        &[12, 5, 3],
    );
    let report = outcome.report().unwrap();

    let kinds: Vec<_> = report.fragments.iter().map(ResultFragment::kind_name).collect();
    assert_eq!(kinds, vec!["attack", "damage", "damage"]);
    let ammo = report.fragments.last().and_then(|f| f.as_damage()).unwrap();
    assert_eq!(ammo.context.as_deref(), Some("[Arrows]"));
    assert_eq!(ammo.base.total, 3);

    let arrows = store
        .read(|s| s.find_by_name("Arrows").cloned())
        .unwrap()
        .unwrap();
    assert_eq!(arrows.quantity, 19);
    assert_eq!(
        report.mutation.linked,
        Some(LinkedUpdate::Item {
            id: arrows.id,
            update: ItemUpdate::Quantity(19)
        })
    );
}
