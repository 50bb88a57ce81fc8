//! Multi-roll resolution with advantage, disadvantage, and crit tagging.
//!
//! A field that rolls a d20 may roll it several times. Each roll is tagged
//! by its natural faces, and one roll is chosen according to the roll state.

use serde::{Deserialize, Serialize};

use crate::dice::{Bindings, DieRoller, Formula, RollOutcome};
use crate::error::{FormulaError, FormulaResult};

/// Upper bound on evaluations in one multi-roll.
pub const MAX_ROLLS: u32 = 20;

/// Which of several rolls counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollState {
    /// Advantage: keep the highest total.
    Highest,
    /// Disadvantage: keep the lowest total.
    Lowest,
}

impl RollState {
    /// Derive the state from advantage and disadvantage counts.
    ///
    /// Equal counts cancel out.
    pub fn from_counts(advantage: u32, disadvantage: u32) -> Option<Self> {
        match advantage.cmp(&disadvantage) {
            std::cmp::Ordering::Greater => Some(Self::Highest),
            std::cmp::Ordering::Less => Some(Self::Lowest),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Number of evaluations for a multi-roll.
///
/// Triple always rolls three. A comparing state never rolls fewer than two.
pub fn roll_count(requested: u32, state: Option<RollState>, triple: bool) -> u32 {
    if triple {
        return 3;
    }
    let count = requested.max(1);
    if state.is_some() && count == 1 { 2 } else { count }
}

/// Crit or fumble classification of one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritTag {
    /// At least one high face and no ones.
    Success,
    /// At least one natural one and no high faces.
    Failure,
    /// Both high faces and ones.
    Mixed,
    /// Neither.
    #[default]
    None,
}

impl CritTag {
    /// Returns true for tags that make a crit.
    pub fn is_crit(self) -> bool {
        matches!(self, Self::Success | Self::Mixed)
    }
}

/// Which dice count toward crit tagging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CritFaces {
    /// Every die with more than one face.
    #[default]
    All,
    /// Only dice with these face counts.
    Only(Vec<u32>),
}

impl CritFaces {
    /// The d20-only rule used for attacks and checks.
    pub fn d20() -> Self {
        Self::Only(vec![20])
    }

    fn eligible(&self, sides: u32) -> bool {
        sides > 1
            && match self {
                Self::All => true,
                Self::Only(faces) => faces.contains(&sides),
            }
    }
}

/// Tag one outcome. `threshold` defaults to each die's face count.
pub fn tag_outcome(outcome: &RollOutcome, threshold: Option<u32>, faces: &CritFaces) -> CritTag {
    let mut high = 0;
    let mut low = 0;
    for d in outcome.dice.iter().filter(|d| faces.eligible(d.die.sides())) {
        let limit = threshold.unwrap_or_else(|| d.die.sides());
        if d.value >= limit {
            high += 1;
        } else if d.value == 1 {
            low += 1;
        }
    }
    match (high > 0, low > 0) {
        (true, false) => CritTag::Success,
        (false, true) => CritTag::Failure,
        (true, true) => CritTag::Mixed,
        (false, false) => CritTag::None,
    }
}

/// A request to the multi-roll resolver.
#[derive(Debug, Clone)]
pub struct MultiRollRequest<'a> {
    /// Requested number of evaluations before triple and state adjustments.
    pub roll_count: u32,
    /// Base formula, e.g. `1d20`.
    pub formula: &'a str,
    /// Terms added to the base formula.
    pub extra_terms: &'a [String],
    /// Variable bindings.
    pub bindings: &'a Bindings,
    /// Advantage or disadvantage.
    pub state: Option<RollState>,
    /// Force exactly three evaluations.
    pub triple: bool,
    /// Lowest face that counts as a crit.
    pub crit_threshold: Option<u32>,
    /// Dice eligible for tagging.
    pub crit_faces: CritFaces,
    /// Whether a crit here marks the whole action critical.
    pub triggers_crit: bool,
}

/// One evaluation with its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedOutcome {
    /// The evaluation.
    pub outcome: RollOutcome,
    /// Its crit tag.
    pub tag: CritTag,
}

/// The result of a multi-roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRoll {
    /// Every evaluation in order. All but the chosen one are ignored under a roll state.
    pub outcomes: Vec<TaggedOutcome>,
    /// Index of the chosen outcome.
    pub chosen: usize,
    /// The roll state used.
    pub state: Option<RollState>,
    /// Whether this roll makes the action critical.
    pub is_crit: bool,
}

impl MultiRoll {
    /// The chosen outcome.
    pub fn chosen_outcome(&self) -> Option<&TaggedOutcome> {
        self.outcomes.get(self.chosen)
    }

    /// Total of the chosen outcome.
    pub fn chosen_total(&self) -> i64 {
        self.chosen_outcome().map_or(0, |o| o.outcome.total)
    }

    /// Tag of the chosen outcome.
    pub fn chosen_tag(&self) -> CritTag {
        self.chosen_outcome().map_or(CritTag::None, |o| o.tag)
    }
}

/// Roll a formula several times and pick one result.
pub fn resolve(req: &MultiRollRequest<'_>, roller: &mut dyn DieRoller) -> FormulaResult<MultiRoll> {
    let count = roll_count(req.roll_count, req.state, req.triple);
    if count > MAX_ROLLS {
        return Err(FormulaError::TooManyRolls(count));
    }

    let mut formula = Formula::parse(req.formula)?;
    for extra in req.extra_terms.iter().filter(|e| !e.trim().is_empty()) {
        formula.extend(Formula::parse(extra)?);
    }

    let mut outcomes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let outcome = formula.evaluate(req.bindings, roller)?;
        let tag = tag_outcome(&outcome, req.crit_threshold, &req.crit_faces);
        outcomes.push(TaggedOutcome { outcome, tag });
    }

    let chosen = choose(&outcomes, req.state);
    if req.state.is_some() {
        for (i, o) in outcomes.iter_mut().enumerate() {
            o.outcome.ignored = i != chosen;
        }
    }

    let is_crit = req.triggers_crit && outcomes.get(chosen).is_some_and(|o| o.tag.is_crit());
    tracing::debug!(
        formula = %formula,
        count,
        chosen,
        is_crit,
        "resolved multi-roll"
    );

    Ok(MultiRoll {
        outcomes,
        chosen,
        state: req.state,
        is_crit,
    })
}

/// Index of the kept outcome. Ties go to the earliest roll.
fn choose(outcomes: &[TaggedOutcome], state: Option<RollState>) -> usize {
    let mut best = 0;
    for (i, o) in outcomes.iter().enumerate().skip(1) {
        let current = outcomes[best].outcome.total;
        let better = match state {
            Some(RollState::Highest) => o.outcome.total > current,
            Some(RollState::Lowest) => o.outcome.total < current,
            None => false,
        };
        if better {
            best = i;
        }
    }
    best
}
