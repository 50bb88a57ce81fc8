//! Roll configuration, snapshotted once per action.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crit::CritBehavior;
use crate::error::{MechError, MechResult};

/// When a save button hides its DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideDc {
    /// Always show the DC.
    #[default]
    Never,
    /// Hide the DC on saves forced by NPCs.
    Npc,
    /// Always hide the DC.
    Always,
}

impl HideDc {
    /// Whether the DC is hidden for an actor.
    pub fn hides(self, actor_is_npc: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Npc => actor_is_npc,
            Self::Always => true,
        }
    }
}

/// Settings that shape every roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    /// How crit damage is rolled.
    pub crit_behavior: CritBehavior,
    /// Base number of d20s rolled for attacks and checks (1-3).
    pub d20_mode: u32,
    /// Ask for advantage when none was signalled.
    pub query_advantage: bool,
    /// When save DCs are hidden.
    pub hide_dc: HideDc,
    /// Label added to the header of a critical action.
    pub crit_string: String,
    /// Default description toggle for weapons and tools.
    pub default_description: bool,
    /// Whether the alternate quick roll is reachable.
    pub alt_secondary_enabled: bool,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            crit_behavior: CritBehavior::Default,
            d20_mode: 1,
            query_advantage: false,
            hide_dc: HideDc::Never,
            crit_string: "Critical!".to_string(),
            default_description: false,
            alt_secondary_enabled: true,
        }
    }
}

impl RollConfig {
    /// Set the crit behavior.
    pub fn with_crit_behavior(mut self, behavior: CritBehavior) -> Self {
        self.crit_behavior = behavior;
        self
    }

    /// Set the base d20 count (clamped to 1-3).
    pub fn with_d20_mode(mut self, mode: u32) -> Self {
        self.d20_mode = mode.clamp(1, 3);
        self
    }

    /// Enable or disable the advantage prompt.
    pub fn with_query_advantage(mut self, enabled: bool) -> Self {
        self.query_advantage = enabled;
        self
    }

    /// Set when save DCs are hidden.
    pub fn with_hide_dc(mut self, hide: HideDc) -> Self {
        self.hide_dc = hide;
        self
    }

    /// Set the crit header label.
    pub fn with_crit_string(mut self, label: impl Into<String>) -> Self {
        self.crit_string = label.into();
        self
    }

    /// Set the default description toggle.
    pub fn with_default_description(mut self, enabled: bool) -> Self {
        self.default_description = enabled;
        self
    }

    /// Enable or disable the alternate quick roll.
    pub fn with_alt_secondary(mut self, enabled: bool) -> Self {
        self.alt_secondary_enabled = enabled;
        self
    }

    /// Base d20 count, clamped to 1-3 however the value was set.
    pub fn base_roll_count(&self) -> u32 {
        self.d20_mode.clamp(1, 3)
    }

    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> MechResult<Self> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| MechError::InvalidConfig(e.to_string()))?;
        config.d20_mode = config.base_roll_count();
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> MechResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MechError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = RollConfig::default();
        assert_eq!(cfg.crit_behavior, CritBehavior::Default);
        assert_eq!(cfg.d20_mode, 1);
        assert!(!cfg.query_advantage);
        assert_eq!(cfg.hide_dc, HideDc::Never);
    }

    #[test]
    fn builder_methods() {
        let cfg = RollConfig::default()
            .with_crit_behavior(CritBehavior::MaximizeBoth)
            .with_d20_mode(2)
            .with_query_advantage(true)
            .with_hide_dc(HideDc::Npc)
            .with_crit_string("Crit!");
        assert_eq!(cfg.crit_behavior, CritBehavior::MaximizeBoth);
        assert_eq!(cfg.d20_mode, 2);
        assert!(cfg.query_advantage);
        assert_eq!(cfg.crit_string, "Crit!");
    }

    #[test]
    fn d20_mode_clamped() {
        assert_eq!(RollConfig::default().with_d20_mode(0).d20_mode, 1);
        assert_eq!(RollConfig::default().with_d20_mode(9).d20_mode, 3);
        let cfg = RollConfig::from_json(r#"{"d20_mode": 7}"#).unwrap();
        assert_eq!(cfg.d20_mode, 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RollConfig::from_json(r#"{"crit_behavior": "maximize_base"}"#).unwrap();
        assert_eq!(cfg.crit_behavior, CritBehavior::MaximizeBase);
        assert_eq!(cfg.crit_string, "Critical!");
    }

    #[test]
    fn bad_json_is_config_error() {
        assert!(matches!(
            RollConfig::from_json("{"),
            Err(MechError::InvalidConfig(_))
        ));
    }

    #[test]
    fn hide_dc_rules() {
        assert!(!HideDc::Never.hides(true));
        assert!(HideDc::Npc.hides(true));
        assert!(!HideDc::Npc.hides(false));
        assert!(HideDc::Always.hides(false));
    }
}
