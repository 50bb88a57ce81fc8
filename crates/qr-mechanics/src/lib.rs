//! Roll resolution and action pipeline for Quickroll.
//!
//! Turns an item and its quick-roll flags into one composite roll: dice
//! formulas with advantage and crit tagging, a single crit flag shared by
//! every damage field, and resource consumption that is checked before
//! rolling and committed after.

pub mod action;
pub mod config;
pub mod crit;
pub mod dice;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod preset;
pub mod prompt;
pub mod properties;
pub mod resolver;
pub mod resource;
pub mod validate;

pub use action::{AbortReason, ActionOutcome, ActionReport, PoolDebit, run_action};
pub use config::{HideDc, RollConfig};
pub use crit::{CritBehavior, CritDirective, CritState};
pub use dice::{DieResult, DieRoller, Formula, RollOutcome, ScriptedRoller};
pub use error::{FormulaError, FormulaResult, MechError, MechResult};
pub use fields::{DamageIndex, FieldRequest, ResultFragment, parse_fields};
pub use pipeline::{ActionContext, RollParameters, execute};
pub use preset::{CompiledPlan, compile};
pub use prompt::{AdvantageChoice, AugmentChoice, FixedPrompt, NoPrompt, PromptService};
pub use resolver::{CritTag, MultiRoll, RollState};
pub use resource::{DenyReason, GateDecision, Mutation, ResourceState};
pub use validate::{ValidationIssue, validate_inventory};
