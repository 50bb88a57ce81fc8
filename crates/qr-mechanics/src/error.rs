//! Error types for roll resolution.

use qr_core::CoreError;

/// Errors raised while parsing or evaluating a dice formula.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    /// The formula has no terms.
    #[error("empty formula")]
    Empty,

    /// A character the lexer does not recognise.
    #[error("unexpected {text:?} at offset {offset} in \"{formula}\"")]
    UnexpectedCharacter {
        /// The whole formula.
        formula: String,
        /// Byte offset of the offending text.
        offset: usize,
        /// The offending text.
        text: String,
    },

    /// Two terms without an operator between them, or a dangling operator.
    #[error("malformed formula \"{0}\"")]
    Malformed(String),

    /// A number that does not fit.
    #[error("number out of range: {0}")]
    NumberOutOfRange(String),

    /// A die with fewer than one face.
    #[error("invalid die: {0}")]
    InvalidDie(String),

    /// A variable whose binding refers back to itself.
    #[error("variable @{0} expands too deeply")]
    RecursiveBinding(String),

    /// More dice than a single evaluation may roll.
    #[error("too many dice: {0}")]
    TooManyDice(u64),

    /// More evaluations than a single multi-roll may make.
    #[error("too many rolls: {0}")]
    TooManyRolls(u32),
}

/// Convenience result type for formula operations.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// Errors that can occur while running an action.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A store lookup or update failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A formula failed to parse or evaluate.
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    /// A damage slot that the item does not have.
    #[error("item \"{item}\" has no damage slot {index}")]
    NoDamageSlot {
        /// Item name.
        item: String,
        /// Requested slot.
        index: usize,
    },

    /// The field list is not a JSON array.
    #[error("invalid field list: {0}")]
    InvalidFields(String),

    /// The roll configuration could not be read.
    #[error("invalid roll config: {0}")]
    InvalidConfig(String),
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
