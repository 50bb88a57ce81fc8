//! Formula evaluation against variable bindings.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use rand::rngs::StdRng;

use super::formula::{Formula, SignedTerm, Term};
use super::roll::{DieResult, RollOutcome};
use crate::error::{FormulaError, FormulaResult};

/// Upper bound on dice rolled by one evaluation.
const MAX_DICE: u64 = 10_000;

/// How deep string bindings may nest.
const MAX_BINDING_DEPTH: usize = 8;

/// Source of die faces.
pub trait DieRoller {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl DieRoller for StdRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides.max(1))
    }
}

/// A roller that returns pre-arranged faces, then ones once exhausted.
///
/// Faces larger than the die are clamped to its highest face.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    faces: VecDeque<u32>,
}

impl ScriptedRoller {
    /// Create a roller that yields `faces` in order.
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    /// Faces not yet consumed.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DieRoller for ScriptedRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.faces.pop_front().unwrap_or(1).clamp(1, sides.max(1))
    }
}

/// The value of an `@variable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A plain number.
    Number(i64),
    /// A sub-formula, expanded in place (`"1d4 + 2"`).
    Formula(String),
}

/// Variable bindings for a formula.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Binding>,
}

impl Bindings {
    /// Create an empty binding map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a number.
    pub fn set_number(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), Binding::Number(value));
    }

    /// Bind `name` to a sub-formula. Purely numeric text is stored as a number.
    pub fn set_formula(&mut self, name: impl Into<String>, formula: impl Into<String>) {
        let formula = formula.into();
        let binding = match formula.trim().parse::<i64>() {
            Ok(n) => Binding::Number(n),
            Err(_) => Binding::Formula(formula),
        };
        self.values.insert(name.into(), binding);
    }

    /// Builder form of [`Bindings::set_number`].
    pub fn with_number(mut self, name: impl Into<String>, value: i64) -> Self {
        self.set_number(name, value);
        self
    }

    /// Builder form of [`Bindings::set_formula`].
    pub fn with_formula(mut self, name: impl Into<String>, formula: impl Into<String>) -> Self {
        self.set_formula(name, formula);
        self
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }
}

impl Formula {
    /// Replace every variable with its binding.
    ///
    /// Unbound variables are dropped with a warning.
    pub fn resolve(&self, bindings: &Bindings) -> FormulaResult<Formula> {
        self.resolve_at(bindings, 0)
    }

    fn resolve_at(&self, bindings: &Bindings, depth: usize) -> FormulaResult<Formula> {
        let mut out = Formula::default();
        for SignedTerm { negative, term } in &self.terms {
            match term {
                Term::Var(name) => match bindings.get(name) {
                    None => {
                        tracing::warn!(variable = %name, "unbound formula variable, treated as zero");
                    }
                    Some(Binding::Number(n)) => {
                        out.push(*negative ^ (*n < 0), Term::Number(n.saturating_abs()));
                    }
                    Some(Binding::Formula(text)) => {
                        if depth >= MAX_BINDING_DEPTH {
                            return Err(FormulaError::RecursiveBinding(name.clone()));
                        }
                        if text.trim().is_empty() {
                            continue;
                        }
                        let sub = Formula::parse(text)?.resolve_at(bindings, depth + 1)?;
                        for t in sub.terms {
                            out.push(*negative ^ t.negative, t.term);
                        }
                    }
                },
                other => out.push(*negative, other.clone()),
            }
        }
        Ok(out)
    }

    /// Roll the formula.
    pub fn evaluate(
        &self,
        bindings: &Bindings,
        roller: &mut dyn DieRoller,
    ) -> FormulaResult<RollOutcome> {
        let resolved = self.resolve(bindings)?;
        check_dice_count(&resolved)?;

        let mut total = 0i64;
        let mut dice = Vec::new();
        for t in &resolved.terms {
            let value = match &t.term {
                Term::Dice {
                    count,
                    die,
                    reroll_below,
                } => {
                    let mut sum = 0i64;
                    for _ in 0..*count {
                        let mut face = roller.roll_die(die.sides());
                        if reroll_below.is_some_and(|n| face < n) {
                            face = roller.roll_die(die.sides());
                        }
                        dice.push(DieResult { die: *die, value: face });
                        sum += i64::from(face);
                    }
                    sum
                }
                Term::Number(n) => *n,
                Term::Var(_) => 0,
            };
            total = accumulate(total, value, t.negative)?;
        }

        Ok(RollOutcome {
            total,
            dice,
            formula: resolved.to_string(),
            ignored: false,
        })
    }

    /// Evaluate with every die showing its highest face. Consumes no randomness.
    pub fn maximized(&self, bindings: &Bindings) -> FormulaResult<RollOutcome> {
        let resolved = self.resolve(bindings)?;
        check_dice_count(&resolved)?;

        let mut total = 0i64;
        let mut dice = Vec::new();
        for t in &resolved.terms {
            let value = match &t.term {
                Term::Dice { count, die, .. } => {
                    for _ in 0..*count {
                        dice.push(DieResult {
                            die: *die,
                            value: die.sides(),
                        });
                    }
                    i64::from(*count) * i64::from(die.sides())
                }
                Term::Number(n) => *n,
                Term::Var(_) => 0,
            };
            total = accumulate(total, value, t.negative)?;
        }

        Ok(RollOutcome {
            total,
            dice,
            formula: resolved.to_string(),
            ignored: false,
        })
    }
}

fn accumulate(total: i64, value: i64, negative: bool) -> FormulaResult<i64> {
    let next = if negative {
        total.checked_sub(value)
    } else {
        total.checked_add(value)
    };
    next.ok_or_else(|| {
        let op = if negative { '-' } else { '+' };
        FormulaError::NumberOutOfRange(format!("{total} {op} {value}"))
    })
}

fn check_dice_count(formula: &Formula) -> FormulaResult<()> {
    let count: u64 = formula
        .terms
        .iter()
        .map(|t| match t.term {
            Term::Dice { count, .. } => u64::from(count),
            _ => 0,
        })
        .sum();
    if count > MAX_DICE {
        return Err(FormulaError::TooManyDice(count));
    }
    Ok(())
}

/// Parse and roll `formula`.
pub fn evaluate(
    formula: &str,
    bindings: &Bindings,
    roller: &mut dyn DieRoller,
) -> FormulaResult<RollOutcome> {
    Formula::parse(formula)?.evaluate(bindings, roller)
}

/// The highest total `formula` can produce.
pub fn maximize(formula: &str, bindings: &Bindings) -> FormulaResult<i64> {
    Ok(Formula::parse(formula)?.maximized(bindings)?.total)
}
