//! Dice types, formulas, and evaluation.
//!
//! Formulas are signed sums of dice terms (`2d6`, `1d20r<2`), integer
//! constants, and `@variables`. Variables are looked up in a [`Bindings`]
//! map and may themselves expand to sub-formulas.

pub mod evaluator;
pub mod formula;
pub mod roll;

pub use evaluator::{Binding, Bindings, DieRoller, ScriptedRoller, evaluate, maximize};
pub use formula::{Formula, SignedTerm, Term};
pub use roll::{DieResult, RollOutcome};

use serde::{Deserialize, Serialize};

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with any other number of faces.
    Custom(u32),
}

impl Die {
    /// Returns the number of faces on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// The die with `n` faces. Standard sizes map to their named variant.
    pub fn from_sides(n: u32) -> Self {
        match n {
            4 => Self::D4,
            6 => Self::D6,
            8 => Self::D8,
            10 => Self::D10,
            12 => Self::D12,
            20 => Self::D20,
            100 => Self::D100,
            other => Self::Custom(other),
        }
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}
