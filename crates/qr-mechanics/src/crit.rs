//! Critical-hit state and crit damage expansion.

use std::fmt;

use qr_core::ActionType;
use serde::{Deserialize, Serialize};

use crate::dice::{Bindings, DieRoller, Formula, RollOutcome, Term};
use crate::error::FormulaResult;

/// The natural d20 maximum.
pub const NATURAL_MAX: u32 = 20;

/// How extra crit damage is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritBehavior {
    /// Never roll crit damage.
    Off,
    /// Roll the damage dice a second time.
    #[default]
    Default,
    /// The crit dice deal their maximum.
    MaximizeBase,
    /// Both the base dice and the crit dice deal their maximum.
    MaximizeBoth,
}

impl fmt::Display for CritBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Default => "default",
            Self::MaximizeBase => "maximize_base",
            Self::MaximizeBoth => "maximize_both",
        };
        write!(f, "{s}")
    }
}

/// Per-field crit override. Serialized as `null`, `true`, or `"never"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDirective", into = "RawDirective")]
pub enum CritDirective {
    /// Follow the action's crit state.
    #[default]
    Auto,
    /// Roll crit damage even without a crit.
    Force,
    /// Never roll crit damage for this field.
    Never,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDirective {
    Flag(Option<bool>),
    Word(String),
}

impl TryFrom<RawDirective> for CritDirective {
    type Error = String;

    fn try_from(raw: RawDirective) -> Result<Self, Self::Error> {
        match raw {
            RawDirective::Flag(Some(true)) => Ok(Self::Force),
            RawDirective::Flag(_) => Ok(Self::Auto),
            RawDirective::Word(w) if w.eq_ignore_ascii_case("never") => Ok(Self::Never),
            RawDirective::Word(w) => Err(format!("unknown crit directive \"{w}\"")),
        }
    }
}

impl From<CritDirective> for RawDirective {
    fn from(d: CritDirective) -> Self {
        match d {
            CritDirective::Auto => Self::Flag(None),
            CritDirective::Force => Self::Flag(Some(true)),
            CritDirective::Never => Self::Word("never".to_string()),
        }
    }
}

/// The single crit flag of an action.
///
/// Seeded once, either up front by a forced crit or by the first attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CritState {
    is_crit: bool,
    seeded: bool,
}

impl CritState {
    /// A state that is critical from the start.
    pub fn forced() -> Self {
        Self {
            is_crit: true,
            seeded: true,
        }
    }

    /// Record an attack's crit result. Only the first call has any effect.
    pub fn seed_from_attack(&mut self, is_crit: bool) {
        if !self.seeded {
            self.is_crit = is_crit;
            self.seeded = true;
        }
    }

    /// Whether the action is critical.
    pub fn is_crit(&self) -> bool {
        self.is_crit
    }

    /// Whether the state has been seeded.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }
}

/// The attack crit threshold.
///
/// An explicit override wins. Otherwise the lowest of the natural maximum,
/// the item override, and for weapon attacks the character override.
pub fn crit_threshold(
    explicit: Option<u32>,
    item: Option<u32>,
    character: Option<u32>,
    action: ActionType,
) -> u32 {
    if let Some(t) = explicit.filter(|t| *t > 0) {
        return t;
    }
    let character = character.filter(|_| action.is_weapon_attack());
    [item, character]
        .into_iter()
        .flatten()
        .filter(|t| *t > 0)
        .fold(NATURAL_MAX, u32::min)
}

/// Whether a field rolls crit damage.
pub fn should_expand(behavior: CritBehavior, directive: CritDirective, is_crit: bool) -> bool {
    if behavior == CritBehavior::Off {
        return false;
    }
    match directive {
        CritDirective::Force => true,
        CritDirective::Never => false,
        CritDirective::Auto => is_crit,
    }
}

/// Roll crit damage for a base roll.
///
/// Only the dice of `formula` are rolled again, each dice term gaining
/// `extra_dice` more dice. Returns `None` when the formula has no dice or
/// the behavior is [`CritBehavior::Off`].
pub fn crit_roll(
    formula: &Formula,
    base: &RollOutcome,
    extra_dice: u32,
    behavior: CritBehavior,
    roller: &mut dyn DieRoller,
) -> FormulaResult<Option<RollOutcome>> {
    let crit_dice = formula.dice_only().alter(1, extra_dice);
    if !crit_dice.has_dice() {
        return Ok(None);
    }
    let empty = Bindings::new();
    let outcome = match behavior {
        CritBehavior::Off => return Ok(None),
        CritBehavior::Default => crit_dice.evaluate(&empty, roller)?,
        CritBehavior::MaximizeBase => crit_dice.maximized(&empty)?,
        CritBehavior::MaximizeBoth => {
            let base_max = Formula::parse(&base.formula)?.maximized(&empty)?.total;
            let delta = base_max - base.total;
            let mut boosted = crit_dice;
            if delta != 0 {
                boosted.push(delta < 0, Term::Number(delta.abs()));
            }
            boosted.maximized(&empty)?
        }
    };
    tracing::debug!(
        behavior = %behavior,
        formula = %outcome.formula,
        total = outcome.total,
        "rolled crit damage"
    );
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;

    fn base_roll(formula: &str, faces: &[u32]) -> (Formula, RollOutcome) {
        let f = Formula::parse(formula).unwrap();
        let mut roller = ScriptedRoller::new(faces.iter().copied());
        let outcome = f.evaluate(&Bindings::new(), &mut roller).unwrap();
        (f, outcome)
    }

    #[test]
    fn first_attack_seeds_state() {
        let mut s = CritState::default();
        assert!(!s.is_seeded());
        s.seed_from_attack(false);
        s.seed_from_attack(true);
        assert!(!s.is_crit());

        let mut forced = CritState::forced();
        forced.seed_from_attack(false);
        assert!(forced.is_crit());
    }

    #[test]
    fn threshold_intersection() {
        let mwak = ActionType::MeleeWeaponAttack;
        let msak = ActionType::MeleeSpellAttack;
        assert_eq!(crit_threshold(None, None, None, mwak), 20);
        assert_eq!(crit_threshold(None, Some(19), None, mwak), 19);
        assert_eq!(crit_threshold(None, Some(19), Some(18), mwak), 18);
        assert_eq!(crit_threshold(None, None, Some(18), msak), 20);
        assert_eq!(crit_threshold(Some(15), Some(19), Some(18), mwak), 15);
        assert_eq!(crit_threshold(None, Some(25), None, mwak), 20);
    }

    #[test]
    fn expansion_rules() {
        use CritDirective::{Auto, Force, Never};
        assert!(!should_expand(CritBehavior::Off, Force, true));
        assert!(should_expand(CritBehavior::Default, Auto, true));
        assert!(!should_expand(CritBehavior::Default, Auto, false));
        assert!(should_expand(CritBehavior::MaximizeBase, Force, false));
        assert!(!should_expand(CritBehavior::MaximizeBoth, Never, true));
    }

    #[test]
    fn directive_serde_forms() {
        let parse = |s: &str| serde_json::from_str::<CritDirective>(s);
        assert_eq!(parse("null").unwrap(), CritDirective::Auto);
        assert_eq!(parse("false").unwrap(), CritDirective::Auto);
        assert_eq!(parse("true").unwrap(), CritDirective::Force);
        assert_eq!(parse("\"never\"").unwrap(), CritDirective::Never);
        assert!(parse("\"always\"").is_err());
        assert_eq!(
            serde_json::to_string(&CritDirective::Never).unwrap(),
            "\"never\""
        );
    }

    #[test]
    fn default_rolls_dice_only() {
        let (f, base) = base_roll("2d6 + 3", &[2, 4]);
        let mut roller = ScriptedRoller::new([5, 6]);
        let crit = crit_roll(&f, &base, 0, CritBehavior::Default, &mut roller)
            .unwrap()
            .unwrap();
        assert_eq!(crit.formula, "2d6");
        assert_eq!(crit.total, 11);
        assert_eq!(base.total, 9);
    }

    #[test]
    fn extra_dice_added_per_term() {
        let (f, base) = base_roll("1d12 + 1d6", &[4, 4]);
        let mut roller = ScriptedRoller::new([1, 1, 1, 1]);
        let crit = crit_roll(&f, &base, 1, CritBehavior::Default, &mut roller)
            .unwrap()
            .unwrap();
        assert_eq!(crit.formula, "2d12 + 2d6");
    }

    #[test]
    fn maximize_base_uses_max_faces() {
        let (f, base) = base_roll("2d8 + 2", &[3, 3]);
        let crit = crit_roll(&f, &base, 0, CritBehavior::MaximizeBase, &mut ScriptedRoller::default())
            .unwrap()
            .unwrap();
        assert_eq!(crit.total, 16);
    }

    #[test]
    fn maximize_both_adds_base_shortfall() {
        let (f, base) = base_roll("2d6", &[3, 4]);
        assert_eq!(base.total, 7);
        let crit = crit_roll(&f, &base, 0, CritBehavior::MaximizeBoth, &mut ScriptedRoller::default())
            .unwrap()
            .unwrap();
        assert_eq!(crit.total, 17);
    }

    #[test]
    fn dice_free_formula_has_no_crit() {
        let (f, base) = base_roll("5", &[]);
        let crit = crit_roll(&f, &base, 1, CritBehavior::Default, &mut ScriptedRoller::default())
            .unwrap();
        assert!(crit.is_none());
    }

    #[test]
    fn off_never_rolls() {
        let (f, base) = base_roll("1d8", &[8]);
        let crit = crit_roll(&f, &base, 0, CritBehavior::Off, &mut ScriptedRoller::default())
            .unwrap();
        assert!(crit.is_none());
    }
}
