use crate::errors::Result;
use crate::evaluation::{MaterialEvaluator, PieceValues};
use crate::{config_error, validation_error, Score};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the move selector uses a negative guardrail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailMode {
    /// Drop rejected moves unless nothing else is left
    Filter,
    /// Keep every move but subtract `guardrail_penalty` from rejected ones
    Penalize,
}

/// One component of the pyramid tie-break, compared in descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieBreakKey {
    GivesCheck,
    IsCapture,
    AttackerCount,
    Score,
    CapturedValue,
}

/// Search and selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Core search limits
    pub search_depth: u32,
    pub max_extensions: u32,
    pub quiescence_max_depth: u32,

    // Evaluation
    pub material_weight: Score,
    pub piece_values: PieceValues,

    // Guardrails
    pub hang_threshold: Score,
    pub blunder_depth: u32,
    pub guardrail_mode: GuardrailMode,
    pub guardrail_penalty: Score,

    // Final selection
    pub repetition_tolerance: Score,
    pub tie_break_order: Vec<TieBreakKey>,
    pub score_jitter: Score,
    pub jitter_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let piece_values = PieceValues::default();
        Self {
            search_depth: 3,
            max_extensions: 6,
            quiescence_max_depth: 16,

            material_weight: 1,
            hang_threshold: piece_values.rook,
            piece_values,

            blunder_depth: 2,
            guardrail_mode: GuardrailMode::Filter,
            guardrail_penalty: 300,

            repetition_tolerance: 60,
            tie_break_order: vec![
                TieBreakKey::GivesCheck,
                TieBreakKey::IsCapture,
                TieBreakKey::AttackerCount,
                TieBreakKey::Score,
                TieBreakKey::CapturedValue,
            ],
            score_jitter: 0,
            jitter_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Shallow search for bullet time controls
    pub fn fast() -> Self {
        Self {
            search_depth: 2,
            max_extensions: 3,
            quiescence_max_depth: 8,
            blunder_depth: 2,
            ..Default::default()
        }
    }

    /// Deeper search when the clock allows it
    pub fn strong() -> Self {
        Self {
            search_depth: 4,
            max_extensions: 8,
            quiescence_max_depth: 24,
            blunder_depth: 3,
            ..Default::default()
        }
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "fast" => Ok(Self::fast()),
            "strong" => Ok(Self::strong()),
            other => Err(config_error!(
                "unknown preset '{}' (expected default, fast or strong)",
                other
            )),
        }
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_depth == 0 {
            return Err(validation_error!(
                "search_depth",
                self.search_depth,
                "at least 1"
            ));
        }
        if self.blunder_depth == 0 {
            return Err(validation_error!(
                "blunder_depth",
                self.blunder_depth,
                "at least 1"
            ));
        }
        if self.material_weight < 1 {
            return Err(validation_error!(
                "material_weight",
                self.material_weight,
                "at least 1"
            ));
        }
        for (field, value) in [
            ("repetition_tolerance", self.repetition_tolerance),
            ("guardrail_penalty", self.guardrail_penalty),
            ("score_jitter", self.score_jitter),
        ] {
            if value < 0 {
                return Err(validation_error!(field, value, "non-negative"));
            }
        }
        if self.tie_break_order.is_empty() {
            return Err(validation_error!(
                "tie_break_order",
                "[]",
                "at least one key"
            ));
        }
        Ok(())
    }

    pub fn evaluator(&self) -> MaterialEvaluator {
        MaterialEvaluator::new(self.piece_values, self.material_weight)
    }
}
