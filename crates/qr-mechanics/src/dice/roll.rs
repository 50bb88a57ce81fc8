//! Results of evaluating a formula.

use serde::{Deserialize, Serialize};

use super::Die;

/// The result of rolling a single die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    /// The type of die that was rolled.
    pub die: Die,
    /// The value kept (1 to `die.sides()`).
    pub value: u32,
}

impl DieResult {
    /// Returns true if the die shows its highest face.
    pub fn is_max(&self) -> bool {
        self.value == self.die.sides()
    }
}

/// One evaluation of a formula.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// Sum of all terms.
    pub total: i64,
    /// Every die kept, in formula order.
    pub dice: Vec<DieResult>,
    /// The formula with variables expanded.
    pub formula: String,
    /// Set when an advantage or disadvantage selection discarded this outcome.
    pub ignored: bool,
}

impl RollOutcome {
    /// Dice with the given number of faces.
    pub fn dice_with_sides(&self, sides: u32) -> impl Iterator<Item = &DieResult> {
        self.dice.iter().filter(move |d| d.die.sides() == sides)
    }

    /// Number of dice rolled.
    pub fn count(&self) -> usize {
        self.dice.len()
    }
}

impl std::fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.dice.iter().map(|d| d.value.to_string()).collect();
        write!(f, "{} [{}] = {}", self.formula, values.join(", "), self.total)
    }
}
