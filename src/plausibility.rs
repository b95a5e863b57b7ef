//! Plausibility strategies.
//!
//! Both strategies read the same [`PlausibilityInput`] and are swapped by
//! configuration. Stored scores are always on [0, 1]; `score_raw` keeps each
//! strategy's native scale for calibration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexicon::LexiconBank;
use crate::text::{is_blank, normalize, proper_noun_density};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Groundedness-weighted sum.
    #[default]
    V1,
    /// Scenario-bank matching.
    V2,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::V1 => "v1",
            StrategyKind::V2 => "v2",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v1" => Ok(StrategyKind::V1),
            "v2" => Ok(StrategyKind::V2),
            other => Err(format!("unknown plausibility strategy '{other}' (expected v1 or v2)")),
        }
    }
}

/// Everything a strategy may look at for one text.
#[derive(Debug, Clone, Copy)]
pub struct PlausibilityInput<'a> {
    pub text: &'a str,
    pub polarity: Option<f64>,
    pub strength: Option<f64>,
    pub grounding: f64,
    pub entity_count: usize,
}

pub trait PlausibilityModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upper bound of `score_raw`.
    fn max_raw(&self) -> f64;

    /// Score on the strategy's native scale, `None` when inputs are missing.
    fn score_raw(&self, input: &PlausibilityInput<'_>) -> Option<f64>;

    /// Canonical [0, 1] score.
    fn score(&self, input: &PlausibilityInput<'_>) -> Option<f64> {
        let raw = self.score_raw(input)?;
        Some((raw / self.max_raw()).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundednessWeights {
    pub realism: f64,    // 0.6, (1-|p|)(1-s)
    pub entity: f64,     // 0.15
    pub detachment: f64, // 0.15, 1-s
    pub neutrality: f64, // 0.1, 1-|p|
}

impl Default for GroundednessWeights {
    fn default() -> Self {
        Self {
            realism: 0.6,
            entity: 0.15,
            detachment: 0.15,
            neutrality: 0.1,
        }
    }
}

/// v1: calm, detached text that names real things reads as grounded.
#[derive(Debug, Clone)]
pub struct GroundednessModel {
    weights: GroundednessWeights,
}

impl GroundednessModel {
    pub fn new(weights: GroundednessWeights) -> Self {
        Self { weights }
    }
}

impl PlausibilityModel for GroundednessModel {
    fn name(&self) -> &'static str {
        "v1"
    }

    fn max_raw(&self) -> f64 {
        1.0
    }

    fn score_raw(&self, input: &PlausibilityInput<'_>) -> Option<f64> {
        let p = input.polarity?.abs();
        let s = input.strength?;
        let w = &self.weights;
        let realism = (1.0 - p) * (1.0 - s);
        let raw = w.realism * realism + w.entity * input.grounding + w.detachment * (1.0 - s) + w.neutrality * (1.0 - p);
        Some(raw.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioWeights {
    pub tech_term: f64,                  // 0.5 per hit
    pub logical_phrase: f64,             // 0.4 per hit
    pub fantasy_flag: f64,               // 0.7 per hit, subtracted
    pub entity: f64,                     // 0.3 per entity
    pub entity_cap: usize,               // 3
    pub proper_noun_density: f64,        // 0.5
    pub real_world_actor: f64,           // 0.3
    pub sarcasm: f64,                    // 0.3
    pub sarcasm_strength_threshold: f64, // 0.4
    pub soft_realism: f64,               // 0.3
    pub floor_bump: f64,                 // 0.25
    pub floor_min_signal: f64,           // 0.1
    pub max_score: f64,                  // 5.0
}

impl Default for ScenarioWeights {
    fn default() -> Self {
        Self {
            tech_term: 0.5,
            logical_phrase: 0.4,
            fantasy_flag: 0.7,
            entity: 0.3,
            entity_cap: 3,
            proper_noun_density: 0.5,
            real_world_actor: 0.3,
            sarcasm: 0.3,
            sarcasm_strength_threshold: 0.4,
            soft_realism: 0.3,
            floor_bump: 0.25,
            floor_min_signal: 0.1,
            max_score: 5.0,
        }
    }
}

/// Per-term contributions of one v2 evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTerms {
    pub tech_hits: usize,
    pub logical_hits: usize,
    pub fantasy_hits: usize,
    pub entities: f64,
    pub proper_nouns: f64,
    pub real_world_actor: f64,
    pub sarcasm: f64,
    pub soft_realism: f64,
    pub floor_bump: f64,
    pub raw: f64,
}

/// v2: match the text against banks of real-tech, reasoning and fantasy terms.
#[derive(Debug, Clone)]
pub struct ScenarioModel {
    lexicon: Arc<LexiconBank>,
    weights: ScenarioWeights,
}

impl ScenarioModel {
    pub fn new(lexicon: Arc<LexiconBank>, weights: ScenarioWeights) -> Self {
        Self { lexicon, weights }
    }

    pub fn terms(&self, input: &PlausibilityInput<'_>) -> Option<ScenarioTerms> {
        let polarity = input.polarity?;
        let strength = input.strength?;
        if is_blank(input.text) {
            return None;
        }
        let w = &self.weights;
        let banks = &self.lexicon.scenarios;
        let text = normalize(input.text);

        let tech_hits = banks.tech_reality.count(&text);
        let logical_hits = banks.logical_inference.count(&text);
        let fantasy_hits = banks.fantasy_flags.count(&text);
        let entities = input.entity_count.min(w.entity_cap) as f64 * w.entity;
        let proper_nouns = proper_noun_density(&text) * w.proper_noun_density;
        let real_world_actor = if banks.real_world_actors.contains_any(&text) {
            w.real_world_actor
        } else {
            0.0
        };
        let sarcasm = if polarity < 0.0
            && strength > w.sarcasm_strength_threshold
            && banks.sarcasm_markers.contains_any(&text)
        {
            w.sarcasm
        } else {
            0.0
        };
        let soft_realism = if banks.soft_realism.contains_any(&text) {
            w.soft_realism
        } else {
            0.0
        };

        let mut raw = tech_hits as f64 * w.tech_term + logical_hits as f64 * w.logical_phrase
            - fantasy_hits as f64 * w.fantasy_flag
            + entities
            + proper_nouns
            + real_world_actor
            + sarcasm
            + soft_realism;

        // Emotional text with no scenario signal at all still gets a small floor.
        let mut floor_bump = 0.0;
        if raw == 0.0 && polarity.abs() > w.floor_min_signal && strength > w.floor_min_signal {
            floor_bump = w.floor_bump;
            raw += floor_bump;
        }

        Some(ScenarioTerms {
            tech_hits,
            logical_hits,
            fantasy_hits,
            entities,
            proper_nouns,
            real_world_actor,
            sarcasm,
            soft_realism,
            floor_bump,
            raw: raw.clamp(0.0, w.max_score),
        })
    }
}

impl PlausibilityModel for ScenarioModel {
    fn name(&self) -> &'static str {
        "v2"
    }

    fn max_raw(&self) -> f64 {
        self.weights.max_score
    }

    fn score_raw(&self, input: &PlausibilityInput<'_>) -> Option<f64> {
        self.terms(input).map(|t| t.raw)
    }
}

pub fn build_model(
    strategy: StrategyKind,
    lexicon: Arc<LexiconBank>,
    groundedness: GroundednessWeights,
    scenario: ScenarioWeights,
) -> Arc<dyn PlausibilityModel> {
    match strategy {
        StrategyKind::V1 => Arc::new(GroundednessModel::new(groundedness)),
        StrategyKind::V2 => Arc::new(ScenarioModel::new(lexicon, scenario)),
    }
}
