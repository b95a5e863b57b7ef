//! Scoring configuration.
//!
//! Resolution order (highest priority first):
//! 1. `--config <path>`
//! 2. `MIRROR_VIBES_CONFIG=<path>`
//! 3. Compiled defaults
//!
//! After the file layer, `MIRROR_VIBES_STRATEGY`, `MIRROR_VIBES_LEXICON_DIR` and
//! `MIRROR_VIBES_NER_ENDPOINT` override single fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::evaluate::LabelThresholds;
use crate::opinion::OpinionWeights;
use crate::plausibility::{GroundednessWeights, ScenarioWeights, StrategyKind};
use crate::sentiment::SentimentParams;

pub const CONFIG_ENV: &str = "MIRROR_VIBES_CONFIG";
pub const STRATEGY_ENV: &str = "MIRROR_VIBES_STRATEGY";
pub const LEXICON_DIR_ENV: &str = "MIRROR_VIBES_LEXICON_DIR";
pub const NER_ENDPOINT_ENV: &str = "MIRROR_VIBES_NER_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub sentiment: SentimentParams,
    pub opinion: OpinionWeights,
    pub plausibility: PlausibilityConfig,
    pub ner: NerConfig,
    pub pipeline: PipelineConfig,
    pub labels: LabelThresholds,
    /// Directory whose `*.v1.tsv` files replace the embedded tables.
    pub lexicon_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityConfig {
    pub strategy: StrategyKind,
    pub groundedness: GroundednessWeights,
    pub scenario: ScenarioWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NerProvider {
    #[default]
    Gazetteer,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    pub provider: NerProvider,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            provider: NerProvider::Gazetteer,
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub parallel: bool,
    /// Posts kept per topic.
    pub max_posts: usize,
    /// Comments kept per post.
    pub max_comments: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_posts: 100,
            max_comments: 50,
        }
    }
}

impl ScoringConfig {
    /// Resolve, apply environment overrides and validate.
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = cli_path.map(Path::to_path_buf).or(env_path);

        let mut config = match path {
            Some(p) => {
                debug!("Loading config - path={}", p.display());
                Self::from_file(&p)?
            }
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(strategy) = lookup(STRATEGY_ENV) {
            self.plausibility.strategy = strategy.parse().map_err(|reason| ConfigError::InvalidValue {
                field: STRATEGY_ENV.to_string(),
                reason,
            })?;
        }
        if let Some(dir) = lookup(LEXICON_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.lexicon_dir = Some(PathBuf::from(dir));
        }
        if let Some(endpoint) = lookup(NER_ENDPOINT_ENV).filter(|e| !e.trim().is_empty()) {
            self.ner.provider = NerProvider::Http;
            self.ner.endpoint = Some(endpoint);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sentiment;
        let o = &self.opinion;
        let g = &self.plausibility.groundedness;
        let v = &self.plausibility.scenario;
        let l = &self.labels;

        let weights: &[(&str, f64)] = &[
            ("sentiment.negation_scalar", s.negation_scalar),
            ("sentiment.booster_increment", s.booster_increment),
            ("sentiment.caps_increment", s.caps_increment),
            ("sentiment.alpha", s.alpha),
            ("sentiment.but_before", s.but_before),
            ("sentiment.but_after", s.but_after),
            ("sentiment.exclamation_increment", s.exclamation_increment),
            ("sentiment.question_increment", s.question_increment),
            ("sentiment.question_cap", s.question_cap),
            ("opinion.certainty_per_booster", o.certainty_per_booster),
            ("opinion.hedge_per_phrase", o.hedge_per_phrase),
            ("opinion.shouting_bonus", o.shouting_bonus),
            ("opinion.exclamation_bonus", o.exclamation_bonus),
            ("opinion.emoji_per_net", o.emoji_per_net),
            ("opinion.emoji_fallback_nudge", o.emoji_fallback_nudge),
            ("opinion.high_polarity_threshold", o.high_polarity_threshold),
            ("opinion.high_polarity_bonus", o.high_polarity_bonus),
            ("opinion.certainty_superlative_bonus", o.certainty_superlative_bonus),
            ("opinion.contrast_bonus", o.contrast_bonus),
            ("opinion.negated_opinion_bonus", o.negated_opinion_bonus),
            ("opinion.booster_subjectivity_scale", o.booster_subjectivity_scale),
            ("plausibility.groundedness.realism", g.realism),
            ("plausibility.groundedness.entity", g.entity),
            ("plausibility.groundedness.detachment", g.detachment),
            ("plausibility.groundedness.neutrality", g.neutrality),
            ("plausibility.scenario.tech_term", v.tech_term),
            ("plausibility.scenario.logical_phrase", v.logical_phrase),
            ("plausibility.scenario.fantasy_flag", v.fantasy_flag),
            ("plausibility.scenario.entity", v.entity),
            ("plausibility.scenario.proper_noun_density", v.proper_noun_density),
            ("plausibility.scenario.real_world_actor", v.real_world_actor),
            ("plausibility.scenario.sarcasm", v.sarcasm),
            ("plausibility.scenario.sarcasm_strength_threshold", v.sarcasm_strength_threshold),
            ("plausibility.scenario.soft_realism", v.soft_realism),
            ("plausibility.scenario.floor_bump", v.floor_bump),
            ("plausibility.scenario.floor_min_signal", v.floor_min_signal),
            ("labels.sentiment_positive", l.sentiment_positive),
            ("labels.sentiment_negative", l.sentiment_negative),
            ("labels.opinion_moderate", l.opinion_moderate),
            ("labels.opinion_strong", l.opinion_strong),
            ("labels.plausibility_implausible", l.plausibility_implausible),
            ("labels.plausibility_plausible", l.plausibility_plausible),
        ];
        for &(field, value) in weights {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }

        if !(1..=3).contains(&s.lookbehind) {
            return Err(invalid("sentiment.lookbehind", format!("must be 1..=3, got {}", s.lookbehind)));
        }
        if s.alpha <= 0.0 {
            return Err(invalid("sentiment.alpha", "must be greater than 0"));
        }
        if !(v.max_score.is_finite() && v.max_score > 0.0) {
            return Err(invalid("plausibility.scenario.max_score", "must be a finite value greater than 0"));
        }
        if l.sentiment_negative > l.sentiment_positive {
            return Err(invalid("labels.sentiment_negative", "must not exceed labels.sentiment_positive"));
        }
        if l.opinion_moderate > l.opinion_strong {
            return Err(invalid("labels.opinion_moderate", "must not exceed labels.opinion_strong"));
        }
        if l.plausibility_implausible > l.plausibility_plausible {
            return Err(invalid(
                "labels.plausibility_implausible",
                "must not exceed labels.plausibility_plausible",
            ));
        }
        if self.ner.provider == NerProvider::Http && self.ner.endpoint.is_none() {
            return Err(invalid("ner.endpoint", "required when ner.provider is http"));
        }
        if self.ner.timeout_secs == 0 {
            return Err(invalid("ner.timeout_secs", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = ScoringConfig::default();
        config.validate().unwrap();
        assert_eq!(config.plausibility.strategy, StrategyKind::V1);
        assert_eq!(config.pipeline.max_posts, 100);
        assert_eq!(config.opinion.hedge_per_phrase, 0.15);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "plausibility:\n  strategy: v2\n  scenario:\n    tech_term: 0.6\nopinion:\n  contrast_bonus: 0.0\n";
        let config = ScoringConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.plausibility.strategy, StrategyKind::V2);
        assert_eq!(config.plausibility.scenario.tech_term, 0.6);
        assert_eq!(config.plausibility.scenario.fantasy_flag, 0.7);
        assert_eq!(config.opinion.contrast_bonus, 0.0);
        assert_eq!(config.sentiment, SentimentParams::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ScoringConfig::from_yaml("").unwrap(), ScoringConfig::default());
    }

    #[test]
    fn file_layer_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoring.yaml");
        std::fs::write(&path, "pipeline:\n  parallel: true\n").unwrap();
        let config = ScoringConfig::from_file(&path).unwrap();
        assert!(config.pipeline.parallel);

        let missing = ScoringConfig::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
        std::fs::write(&path, "pipeline: [").unwrap();
        assert!(matches!(ScoringConfig::from_file(&path).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            (STRATEGY_ENV, "v2"),
            (LEXICON_DIR_ENV, "/tmp/lex"),
            (NER_ENDPOINT_ENV, "http://localhost:8080/ner"),
        ]);
        let mut config = ScoringConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.plausibility.strategy, StrategyKind::V2);
        assert_eq!(config.lexicon_dir, Some(PathBuf::from("/tmp/lex")));
        assert_eq!(config.ner.provider, NerProvider::Http);
        config.validate().unwrap();
    }

    #[test]
    fn bad_strategy_env_is_rejected() {
        let mut config = ScoringConfig::default();
        let err = config
            .apply_env_overrides(|k| (k == STRATEGY_ENV).then(|| "v9".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ScoringConfig::default();
        config.sentiment.lookbehind = 4;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.opinion.hedge_per_phrase = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.ner.provider = NerProvider::Http;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.labels.opinion_moderate = 0.9;
        assert!(config.validate().is_err());
    }
}
