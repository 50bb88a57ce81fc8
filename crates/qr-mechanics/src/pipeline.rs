//! The field pipeline: runs field requests in order and collects fragments.
//!
//! Every field kind has one producer. Ammunition damage and the extra crit
//! damage slot are appended after the requested fields.

use qr_core::{
    ActionType, Actor, ConsumptionRequest, Item, ItemKind, PresetSelector, ScalingMode,
};

use crate::config::RollConfig;
use crate::crit::{CritBehavior, CritDirective, CritState, crit_roll, crit_threshold, should_expand};
use crate::dice::{Bindings, DieResult, DieRoller, Formula, RollOutcome};
use crate::error::{MechError, MechResult};
use crate::fields::{
    DamageFragment, DamageIndex, FieldRequest, ResultFragment, RollFragment, SaveFragment,
};
use crate::resolver::{CritFaces, MultiRoll, MultiRollRequest, RollState, resolve};

/// Options for one action, as signalled by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollParameters {
    /// Sources of advantage. Compared against `disadvantage`.
    pub advantage: u32,
    /// Sources of disadvantage.
    pub disadvantage: u32,
    /// Roll attacks and checks three times.
    pub triple: bool,
    /// Treat the action as critical from the start.
    pub force_crit: bool,
    /// Attack crit threshold override.
    pub crit_threshold: Option<u32>,
    /// Cost spent on a superpower. Skips the augmentation dialog.
    pub spent_cost: Option<u32>,
    /// Consumption override. Replaces the preset's request.
    pub consumption: Option<ConsumptionRequest>,
    /// Preset column to compile. `None` runs only explicit fields.
    pub preset: Option<PresetSelector>,
    /// Use the versatile formula for the first damage slot.
    pub versatile: bool,
    /// Properties footer override.
    pub show_properties: Option<bool>,
    /// Template placement override.
    pub place_template: Option<bool>,
    /// Header title override.
    pub title: Option<String>,
    /// Crit behavior override for this action.
    pub crit_behavior: Option<CritBehavior>,
}

impl RollParameters {
    /// Parameters for a quick roll of the given preset column.
    pub fn quick(preset: PresetSelector) -> Self {
        Self {
            preset: Some(preset),
            ..Self::default()
        }
    }

    /// The roll state for attacks and checks.
    pub fn roll_state(&self) -> Option<RollState> {
        RollState::from_counts(self.advantage, self.disadvantage)
    }
}

/// Mutable state of one action while its fields run.
pub struct ActionContext<'a> {
    subject: &'a Item,
    wielder: &'a Item,
    actor: &'a Actor,
    ammo: Option<&'a Item>,
    config: &'a RollConfig,
    params: &'a RollParameters,
    behavior: CritBehavior,
    crit: CritState,
    has_damage: bool,
    ammo_done: bool,
    ammo_crit: Option<CritDirective>,
    crit_extra_done: bool,
    dice_pool: Vec<DieResult>,
    roller: &'a mut dyn DieRoller,
}

impl<'a> ActionContext<'a> {
    /// Create a context for `item` owned by `actor`.
    pub fn new(
        item: &'a Item,
        actor: &'a Actor,
        config: &'a RollConfig,
        params: &'a RollParameters,
        roller: &'a mut dyn DieRoller,
    ) -> Self {
        Self {
            subject: item,
            wielder: item,
            actor,
            ammo: None,
            config,
            params,
            behavior: params.crit_behavior.unwrap_or(config.crit_behavior),
            crit: if params.force_crit {
                CritState::forced()
            } else {
                CritState::default()
            },
            has_damage: false,
            ammo_done: false,
            ammo_crit: None,
            crit_extra_done: false,
            dice_pool: Vec::new(),
            roller,
        }
    }

    /// Attach the ammunition fired by the item.
    pub fn with_ammo(mut self, ammo: Option<&'a Item>) -> Self {
        self.ammo = ammo;
        self
    }

    /// Whether the action is critical.
    pub fn is_crit(&self) -> bool {
        self.crit.is_crit()
    }

    /// Every die rolled so far.
    pub fn dice_pool(&self) -> &[DieResult] {
        &self.dice_pool
    }

    /// Consume the context, returning the dice pool.
    pub fn into_dice_pool(self) -> Vec<DieResult> {
        self.dice_pool
    }

    /// Make `item` the subject of the following fields. Returns the previous subject.
    fn push_subject(&mut self, item: &'a Item) -> &'a Item {
        std::mem::replace(&mut self.subject, item)
    }

    fn pop_subject(&mut self, previous: &'a Item) {
        self.subject = previous;
    }

    fn pool_outcome(&mut self, outcome: &RollOutcome) {
        self.dice_pool.extend(outcome.dice.iter().copied());
    }

    fn pool_multi(&mut self, roll: &MultiRoll) {
        for o in &roll.outcomes {
            self.dice_pool.extend(o.outcome.dice.iter().copied());
        }
    }

    // -----------------------------------------------------------------------
    // Bindings
    // -----------------------------------------------------------------------

    fn base_bindings(&self) -> Bindings {
        let mut b = Bindings::new();
        for (key, value) in &self.actor.abilities {
            b.set_number(format!("abilities.{key}"), *value);
        }
        b.set_number("prof", self.actor.proficiency);
        b.set_number("level", i64::from(self.actor.level));
        b.set_number("item.cost", i64::from(self.wielder.cost.unwrap_or(0)));
        b.set_number("item.spent_cost", i64::from(self.spent_cost()));
        b
    }

    fn spent_cost(&self) -> u32 {
        self.params
            .spent_cost
            .or(self.wielder.cost)
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn dispatch(&mut self, field: &FieldRequest, out: &mut Vec<ResultFragment>) -> MechResult<()> {
        match field {
            FieldRequest::Attack {
                bonus,
                triggers_crit,
                crit_threshold,
            } => {
                let fragment = self.attack(bonus.as_deref(), *triggers_crit, *crit_threshold)?;
                out.push(ResultFragment::Attack(fragment));
            }
            FieldRequest::Check {
                bonus,
                crit_threshold,
            } => {
                let fragment = self.check(bonus.as_deref(), *crit_threshold)?;
                out.push(ResultFragment::Check(fragment));
            }
            FieldRequest::Damage {
                index,
                versatile,
                crit,
                context,
            } => {
                // Ammunition follows the crit rule of the first damage field.
                self.ammo_crit = self.ammo_crit.or(Some(*crit));
                match index {
                    DamageIndex::All => {
                        for i in 0..self.subject.damage.parts.len() {
                            let fragment =
                                self.damage(i, *versatile && i == 0, *crit, context.as_deref())?;
                            out.push(ResultFragment::Damage(fragment));
                        }
                    }
                    DamageIndex::Single(i) => {
                        let fragment = self.damage(*i, *versatile, *crit, context.as_deref())?;
                        out.push(ResultFragment::Damage(fragment));
                    }
                    DamageIndex::Many(slots) => {
                        for &i in slots {
                            let fragment = self.damage(i, *versatile, *crit, context.as_deref())?;
                            out.push(ResultFragment::Damage(fragment));
                        }
                    }
                }
            }
            FieldRequest::SaveButton { save_id, dc } => {
                if let Some(fragment) = self.save_button(save_id.as_deref(), *dc) {
                    out.push(ResultFragment::SaveButton(fragment));
                }
            }
            FieldRequest::Other => {
                if let Some(fragment) = self.other()? {
                    out.push(ResultFragment::Other(fragment));
                }
            }
            FieldRequest::Custom {
                formula,
                roll_count,
                roll_state,
                title,
            } => {
                let fragment = self.custom(formula, *roll_count, *roll_state, title.as_deref())?;
                out.push(ResultFragment::Custom(fragment));
            }
            FieldRequest::Description => {
                let text = self.subject.description.trim();
                if !text.is_empty() {
                    out.push(ResultFragment::Description {
                        text: text.to_string(),
                    });
                }
            }
            FieldRequest::Text { content } => {
                if !content.trim().is_empty() {
                    out.push(ResultFragment::Text {
                        content: content.clone(),
                    });
                }
            }
            FieldRequest::Flavor { content } => {
                let text = content.as_deref().unwrap_or(&self.subject.chat_flavor);
                if !text.trim().is_empty() {
                    out.push(ResultFragment::Flavor {
                        content: text.to_string(),
                    });
                }
            }
            FieldRequest::CritExtra { index } => {
                let slot = index.or_else(|| self.subject.flags.as_ref().and_then(|f| f.crit_damage));
                if let Some(i) = slot {
                    let fragment = self.damage(i, false, CritDirective::Never, None)?;
                    self.crit_extra_done = true;
                    out.push(ResultFragment::CritExtra(fragment));
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Producers
    // -----------------------------------------------------------------------

    fn d20(&self) -> &'static str {
        if self.actor.halfling_luck { "1d20r<2" } else { "1d20" }
    }

    fn attack(
        &mut self,
        situational: Option<&str>,
        triggers_crit: bool,
        threshold_override: Option<u32>,
    ) -> MechResult<RollFragment> {
        let item = self.subject;
        let mut bindings = self.base_bindings();
        let mut terms = vec!["@abl".to_string()];
        bindings.set_number(
            "abl",
            attack_ability(item, self.actor).map_or(0, |a| self.actor.ability(&a)),
        );

        if matches!(item.kind, ItemKind::Superpower | ItemKind::Feature) || item.proficient > 0.0 {
            terms.push("@prof".to_string());
        }
        if let Some(bonus) = item.bonus.as_deref().filter(|b| !b.trim().is_empty()) {
            bindings.set_formula("bonus", bonus);
            terms.push("@bonus".to_string());
        }

        let mut title = "Attack".to_string();
        if let Some(ammo) = self.ammo {
            if let Some(bonus) = ammo.bonus.as_deref().filter(|b| !b.trim().is_empty()) {
                title = format!("{title} [{}]", ammo.name);
                bindings.set_formula("ammo", bonus);
                terms.push("@ammo".to_string());
            }
        }
        if let Some(extra) = situational.filter(|b| !b.trim().is_empty()) {
            terms.push(extra.to_string());
        }
        if let Some(bonus) = self
            .actor
            .bonus_for(item.action_type)
            .and_then(|b| b.attack.as_deref())
            .filter(|b| !b.trim().is_empty())
        {
            let key = item.action_type.key();
            bindings.set_formula(key, bonus);
            terms.push(format!("@{key}"));
        }

        let threshold = crit_threshold(
            threshold_override.or(self.params.crit_threshold),
            item.flags.as_ref().and_then(|f| f.crit_range),
            self.actor.weapon_crit_threshold,
            item.action_type,
        );
        let roll = resolve(
            &MultiRollRequest {
                roll_count: self.config.base_roll_count(),
                formula: self.d20(),
                extra_terms: &terms,
                bindings: &bindings,
                state: self.params.roll_state(),
                triple: self.params.triple,
                crit_threshold: Some(threshold),
                crit_faces: CritFaces::d20(),
                triggers_crit,
            },
            &mut *self.roller,
        )?;

        if triggers_crit {
            self.crit.seed_from_attack(roll.is_crit);
        }
        self.pool_multi(&roll);
        Ok(RollFragment {
            title,
            roll,
            crit_threshold: Some(threshold),
        })
    }

    fn check(
        &mut self,
        situational: Option<&str>,
        threshold: Option<u32>,
    ) -> MechResult<RollFragment> {
        let item = self.subject;
        let mut bindings = self.base_bindings();
        let mut terms = Vec::new();

        let value = item.ability.as_deref().map_or(0, |a| self.actor.ability(a));
        if value != 0 {
            bindings.set_number("value", value);
            terms.push("@value".to_string());
        }
        let prof = (item.proficient * self.actor.proficiency as f64).floor() as i64;
        if prof != 0 {
            bindings.set_number("prof", prof);
            terms.push("@prof".to_string());
        }
        if let Some(bonus) = item.bonus.as_deref().filter(|b| !b.trim().is_empty()) {
            bindings.set_formula("bonus", bonus);
            terms.push("@bonus".to_string());
        }
        if let Some(extra) = situational.filter(|b| !b.trim().is_empty()) {
            terms.push(extra.to_string());
        }

        let roll = resolve(
            &MultiRollRequest {
                roll_count: self.config.base_roll_count(),
                formula: self.d20(),
                extra_terms: &terms,
                bindings: &bindings,
                state: self.params.roll_state(),
                triple: self.params.triple,
                crit_threshold: threshold,
                crit_faces: CritFaces::d20(),
                triggers_crit: false,
            },
            &mut *self.roller,
        )?;
        self.pool_multi(&roll);
        Ok(RollFragment {
            title: "Check".to_string(),
            roll,
            crit_threshold: threshold,
        })
    }

    fn damage(
        &mut self,
        index: usize,
        force_versatile: bool,
        directive: CritDirective,
        context: Option<&str>,
    ) -> MechResult<DamageFragment> {
        let item = self.subject;
        let part = item
            .damage
            .parts
            .get(index)
            .ok_or_else(|| MechError::NoDamageSlot {
                item: item.name.clone(),
                index,
            })?;

        let versatile_formula = item
            .damage
            .versatile
            .as_deref()
            .filter(|v| !v.trim().is_empty());
        let wants_versatile = force_versatile || (self.params.versatile && index == 0);
        let (source, versatile) = match versatile_formula {
            Some(v) if wants_versatile => (v, true),
            _ => (part.formula.as_str(), false),
        };

        let mut bindings = self.base_bindings();
        bindings.set_number(
            "value",
            damage_ability(item, index, self.actor).map_or(0, |a| self.actor.ability(&a)),
        );
        let mut formula = Formula::parse(source)?;

        if index == 0 {
            if let Some(scaling) = self.scaling_formula(item)? {
                formula.extend(scaling);
            }
            if item.is_attack() {
                if let Some(bonus) = self
                    .actor
                    .bonus_for(item.action_type)
                    .and_then(|b| b.damage.as_deref())
                    .filter(|b| !b.trim().is_empty())
                {
                    formula.extend(Formula::parse(bonus)?);
                }
            }
        }

        let base = formula.evaluate(&bindings, &mut *self.roller)?;
        let crit = if should_expand(self.behavior, directive, self.crit.is_crit()) {
            let savage = u32::from(self.actor.savage_attacks && item.kind == ItemKind::Weapon);
            let rolled = Formula::parse(&base.formula)?;
            crit_roll(&rolled, &base, savage, self.behavior, &mut *self.roller)?.map(Box::new)
        } else {
            None
        };

        self.pool_outcome(&base);
        if let Some(c) = crit.as_ref() {
            self.pool_outcome(c);
        }
        self.has_damage = true;

        let context = context.map(str::to_string).or_else(|| {
            item.flags
                .as_ref()
                .and_then(|f| f.quick_damage.as_ref())
                .and_then(|d| d.context_for(index))
                .map(str::to_string)
        });
        let title = if part.is_healing() { "Healing" } else { "Damage" };
        Ok(DamageFragment {
            index: Some(index),
            title: title.to_string(),
            damage_type: Some(part.damage_type.clone()).filter(|t| !t.is_empty()),
            context,
            versatile,
            base,
            crit,
        })
    }

    /// Extra dice added to the first damage slot of a scaling superpower.
    fn scaling_formula(&self, item: &Item) -> MechResult<Option<Formula>> {
        if item.kind != ItemKind::Superpower || item.scaling.formula.trim().is_empty() {
            return Ok(None);
        }
        let steps = match item.scaling.mode {
            ScalingMode::None => 0,
            ScalingMode::Cantrip => (self.actor.level + 1) / 6,
            ScalingMode::Augment | ScalingMode::Enhance => {
                self.spent_cost().saturating_sub(item.cost.unwrap_or(0))
            }
        };
        if steps == 0 {
            return Ok(None);
        }
        tracing::debug!(item = %item.name, steps, "scaling superpower damage");
        Ok(Some(Formula::parse(&item.scaling.formula)?.alter(steps, 0)))
    }

    fn other(&mut self) -> MechResult<Option<DamageFragment>> {
        let item = self.subject;
        let Some(source) = item.formula.as_deref().filter(|f| !f.trim().is_empty()) else {
            tracing::debug!(item = %item.name, "no other formula, skipping");
            return Ok(None);
        };
        let bindings = self.base_bindings();
        let formula = Formula::parse(source)?;
        let base = formula.evaluate(&bindings, &mut *self.roller)?;
        let crit = if should_expand(self.behavior, CritDirective::Auto, self.crit.is_crit()) {
            let rolled = Formula::parse(&base.formula)?;
            crit_roll(&rolled, &base, 0, self.behavior, &mut *self.roller)?.map(Box::new)
        } else {
            None
        };
        self.pool_outcome(&base);
        if let Some(c) = crit.as_ref() {
            self.pool_outcome(c);
        }
        let context = item
            .flags
            .as_ref()
            .map(|f| f.other_context.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(Some(DamageFragment {
            index: None,
            title: "Other".to_string(),
            damage_type: None,
            context,
            versatile: false,
            base,
            crit,
        }))
    }

    fn save_button(&self, save_id: Option<&str>, dc: Option<i32>) -> Option<SaveFragment> {
        let stored = self.subject.save.as_ref();
        let save_id = save_id
            .map(str::to_string)
            .or_else(|| stored.map(|s| s.save_id.clone()))
            .filter(|s| !s.is_empty());
        let Some(save_id) = save_id else {
            tracing::debug!(item = %self.subject.name, "no save to show, skipping");
            return None;
        };
        Some(SaveFragment {
            save_id,
            dc: dc.or_else(|| stored.map(|s| s.dc)).unwrap_or(0),
            hide_dc: self.config.hide_dc.hides(self.actor.is_npc()),
        })
    }

    fn custom(
        &mut self,
        formula: &str,
        roll_count: u32,
        state: Option<RollState>,
        title: Option<&str>,
    ) -> MechResult<RollFragment> {
        let bindings = self.base_bindings();
        let roll = resolve(
            &MultiRollRequest {
                roll_count,
                formula,
                extra_terms: &[],
                bindings: &bindings,
                state,
                triple: false,
                crit_threshold: None,
                crit_faces: CritFaces::d20(),
                triggers_crit: false,
            },
            &mut *self.roller,
        )?;
        self.pool_multi(&roll);
        Ok(RollFragment {
            title: title.unwrap_or("Custom").to_string(),
            roll,
            crit_threshold: None,
        })
    }

    // -----------------------------------------------------------------------
    // Appended fragments
    // -----------------------------------------------------------------------

    fn ammo_damage(&mut self, out: &mut Vec<ResultFragment>) -> MechResult<()> {
        let Some(ammo) = self.ammo else {
            return Ok(());
        };
        if self.ammo_done || !self.has_damage || ammo.damage.parts.is_empty() {
            return Ok(());
        }
        self.ammo_done = true;
        tracing::debug!(ammo = %ammo.name, "rolling ammunition damage");
        let directive = self.ammo_crit.unwrap_or_default();
        let previous = self.push_subject(ammo);
        let result = self.all_damage(&format!("[{}]", ammo.name), directive, out);
        self.pop_subject(previous);
        result
    }

    fn all_damage(
        &mut self,
        context: &str,
        directive: CritDirective,
        out: &mut Vec<ResultFragment>,
    ) -> MechResult<()> {
        for i in 0..self.subject.damage.parts.len() {
            let fragment = self.damage(i, false, directive, Some(context))?;
            out.push(ResultFragment::Damage(fragment));
        }
        Ok(())
    }

    fn crit_extra(&mut self, out: &mut Vec<ResultFragment>) -> MechResult<()> {
        if !self.crit.is_crit() || !self.has_damage || self.crit_extra_done {
            return Ok(());
        }
        let Some(index) = self.wielder.flags.as_ref().and_then(|f| f.crit_damage) else {
            return Ok(());
        };
        if index >= self.wielder.damage.parts.len() {
            tracing::warn!(item = %self.wielder.name, index, "crit damage slot out of range");
            return Ok(());
        }
        let fragment = self.damage(index, false, CritDirective::Never, None)?;
        self.crit_extra_done = true;
        out.push(ResultFragment::CritExtra(fragment));
        Ok(())
    }
}

/// Run `fields` in order.
///
/// Ammunition damage and the extra crit damage slot follow the requested
/// fields, in that order.
pub fn execute(ctx: &mut ActionContext<'_>, fields: &[FieldRequest]) -> MechResult<Vec<ResultFragment>> {
    let mut out = Vec::with_capacity(fields.len() + 2);
    for field in fields {
        tracing::debug!(kind = field.kind_name(), item = %ctx.subject.name, "dispatching field");
        ctx.dispatch(field, &mut out)?;
    }
    ctx.ammo_damage(&mut out)?;
    ctx.crit_extra(&mut out)?;
    Ok(out)
}

fn finesse_ability(item: &Item, actor: &Actor) -> Option<String> {
    let ability = if item.has_property("fin") || item.has_property("finesse") {
        if actor.ability("dex") > actor.ability("str") { "dex" } else { "str" }
    } else {
        match item.action_type {
            ActionType::MeleeWeaponAttack => "str",
            ActionType::RangedWeaponAttack => "dex",
            _ => return None,
        }
    };
    Some(ability.to_string())
}

/// Ability used for the attack roll.
fn attack_ability(item: &Item, actor: &Actor) -> Option<String> {
    item.ability
        .clone()
        .filter(|a| !a.is_empty())
        .or_else(|| finesse_ability(item, actor))
}

/// Ability bound to `@value` for one damage slot.
fn damage_ability(item: &Item, index: usize, actor: &Actor) -> Option<String> {
    if let Some(a) = item.ability.clone().filter(|a| !a.is_empty()) {
        return Some(a);
    }
    if index == 0 && matches!(item.kind, ItemKind::Weapon | ItemKind::Feature) {
        return finesse_ability(item, actor);
    }
    None
}
