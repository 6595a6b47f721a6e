// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planner configuration

use crate::error::{PlanningError, PlanningResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs of the pattern optimizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Detach independent and leaf fragments around joins, and rewrite join
    /// attributes to match through already fetched neighbours
    pub rearrange_joins: bool,

    /// Upper bound on elements popped from the relaxation frontier
    pub max_relaxation_steps: usize,

    /// Order in which anchor fragments are folded into joins
    pub anchor_order: AnchorOrder,

    /// Record a plan trace
    pub trace: bool,
}

/// Fold order of anchor fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorOrder {
    /// Ascending best estimate, then element id
    #[default]
    Cheapest,
    /// Ascending element id
    Creation,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            rearrange_joins: true,
            max_relaxation_steps: 100_000,
            anchor_order: AnchorOrder::Cheapest,
            trace: true,
        }
    }
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> PlanningResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PlanningError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PlanningResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlanningError::InvalidConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PlanningResult<()> {
        if self.max_relaxation_steps == 0 {
            return Err(PlanningError::InvalidConfig(
                "max_relaxation_steps must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = PlannerConfig::from_json_str(r#"{"rearrange_joins": false}"#).unwrap();
        assert!(!config.rearrange_joins);
        assert_eq!(config.max_relaxation_steps, 100_000);
        assert_eq!(config.anchor_order, AnchorOrder::Cheapest);
        assert!(config.trace);

        let config = PlannerConfig::from_json_str(r#"{"anchor_order": "Creation"}"#).unwrap();
        assert_eq!(config.anchor_order, AnchorOrder::Creation);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PlannerConfig::from_json_str(r#"{"max_relaxation_steps": 0}"#),
            Err(PlanningError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlannerConfig::from_json_str("not json"),
            Err(PlanningError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlannerConfig::from_json_file("/nonexistent/planner.json"),
            Err(PlanningError::InvalidConfig(_))
        ));
    }
}
