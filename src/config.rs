use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::ScoringError;
use crate::types::Signal;

/// Per-signal weights for the surprise score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalWeights {
    pub qualifying_strength: f64,
    pub teammate_quali_delta: f64,
    pub teammate_race_delta: f64,
    pub positions_gained: f64,
    pub competitiveness_adjusted_finish: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            qualifying_strength: 0.25,
            teammate_quali_delta: 0.20,
            teammate_race_delta: 0.25,
            positions_gained: 0.15,
            competitiveness_adjusted_finish: 0.15,
        }
    }
}

impl SignalWeights {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::QualifyingStrength => self.qualifying_strength,
            Signal::TeammateQualiDelta => self.teammate_quali_delta,
            Signal::TeammateRaceDelta => self.teammate_race_delta,
            Signal::PositionsGained => self.positions_gained,
            Signal::CompetitivenessAdjustedFinish => self.competitiveness_adjusted_finish,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// N: size of each of the breakout and bust sets.
    pub classification_size: usize,
    pub weights: SignalWeights,
    /// Qualifying positions at or above this make the cutoff.
    pub cutoff_position: usize,
    pub cutoff_bonus: f64,
    /// Positions gained are clipped to +/- this before normalizing.
    pub positions_gained_clip: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            classification_size: 5,
            weights: SignalWeights::default(),
            cutoff_position: 10,
            cutoff_bonus: 0.25,
            positions_gained_clip: 10,
        }
    }
}

impl ScoringConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read scoring config at {}", path.display()))?;
        let cfg: ScoringConfig = serde_json::from_str(&data)
            .with_context(|| format!("invalid scoring config JSON in {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads from `SCORING_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var("SCORING_CONFIG") {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Rejects values that would push a signal outside [0,1] or make the
    /// weighted score meaningless.
    pub fn validate(&self) -> std::result::Result<(), ScoringError> {
        let mut total = 0.0;
        for signal in Signal::ALL {
            let w = self.weights.get(signal);
            if !w.is_finite() || w < 0.0 {
                return Err(invalid(format!(
                    "weight for {:?} must be a non-negative number, got {}",
                    signal, w
                )));
            }
            total += w;
        }
        if total <= 0.0 {
            return Err(invalid("at least one signal weight must be positive".to_string()));
        }
        if self.positions_gained_clip <= 0 {
            return Err(invalid(format!(
                "positions_gained_clip must be positive, got {}",
                self.positions_gained_clip
            )));
        }
        if !(0.0..=1.0).contains(&self.cutoff_bonus) {
            return Err(invalid(format!(
                "cutoff_bonus must be within [0, 1], got {}",
                self.cutoff_bonus
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ScoringError {
    ScoringError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ScoringConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.classification_size, 5);
        let sum: f64 = Signal::ALL.iter().map(|s| cfg.weights.get(*s)).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "classification_size": 3, "weights": { "positions_gained": 0.5 } }"#;
        let cfg: ScoringConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.classification_size, 3);
        assert_eq!(cfg.weights.positions_gained, 0.5);
        assert_eq!(cfg.weights.qualifying_strength, 0.25);
        assert_eq!(cfg.cutoff_position, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.teammate_race_delta = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.positions_gained_clip = 0;
        assert!(matches!(cfg.validate(), Err(ScoringError::InvalidConfig(_))));

        let mut cfg = ScoringConfig::default();
        cfg.positions_gained_clip = -1;
        assert!(matches!(cfg.validate(), Err(ScoringError::InvalidConfig(_))));

        let mut cfg = ScoringConfig::default();
        cfg.weights = SignalWeights {
            qualifying_strength: 0.0,
            teammate_quali_delta: 0.0,
            teammate_race_delta: 0.0,
            positions_gained: 0.0,
            competitiveness_adjusted_finish: 0.0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/scoring.example.json");
        let cfg = ScoringConfig::load(path).unwrap();
        assert_eq!(cfg, ScoringConfig::default());
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = ScoringConfig::load("/nonexistent/scoring.json").unwrap_err();
        assert!(err.to_string().contains("failed to read scoring config"));
    }
}
