//! Opinion strength: how committed and subjective the writer sounds.
//!
//! `strength = |polarity| * subjectivity * (1 + certainty + emoji + emphasis - hedge) + contextual`,
//! clamped to [0, 1]. Contextual bumps sit outside the product so they still
//! register on texts with zero polarity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexicon::{EmojiClass, LexiconBank};
use crate::subjectivity;
use crate::text::{is_blank, is_shouting, normalize, tokenize, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionWeights {
    pub certainty_per_booster: f64,       // 0.10
    pub hedge_per_phrase: f64,            // 0.15
    pub shouting_bonus: f64,              // 0.15
    pub exclamation_bonus: f64,           // 0.10
    pub emoji_per_net: f64,               // 0.05
    pub emoji_fallback_nudge: f64,        // 0.03
    pub high_polarity_threshold: f64,     // 0.75
    pub high_polarity_bonus: f64,         // 0.10
    pub certainty_superlative_bonus: f64, // 0.10
    pub contrast_bonus: f64,              // 0.05
    pub negated_opinion_bonus: f64,       // 0.20
    pub booster_subjectivity_scale: f64,  // 1.3
}

impl Default for OpinionWeights {
    fn default() -> Self {
        Self {
            certainty_per_booster: 0.10,
            hedge_per_phrase: 0.15,
            shouting_bonus: 0.15,
            exclamation_bonus: 0.10,
            emoji_per_net: 0.05,
            emoji_fallback_nudge: 0.03,
            high_polarity_threshold: 0.75,
            high_polarity_bonus: 0.10,
            certainty_superlative_bonus: 0.10,
            contrast_bonus: 0.05,
            negated_opinion_bonus: 0.20,
            booster_subjectivity_scale: 1.3,
        }
    }
}

/// Every intermediate term of one opinion-strength computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpinionBreakdown {
    pub polarity: f64,
    pub subjectivity: f64,
    pub base: f64,
    pub booster_hits: usize,
    pub certainty: f64,
    pub hedge_hits: usize,
    pub hedge: f64,
    pub emphasis: f64,
    pub emoji: f64,
    pub contextual: f64,
    pub multiplier: f64,
    /// Value before clamping.
    pub raw: f64,
    pub strength: f64,
}

#[derive(Debug, Clone)]
pub struct OpinionStrengthCalculator {
    lexicon: Arc<LexiconBank>,
    weights: OpinionWeights,
}

impl OpinionStrengthCalculator {
    pub fn new(lexicon: Arc<LexiconBank>, weights: OpinionWeights) -> Self {
        Self { lexicon, weights }
    }

    /// Strength in [0, 1]; `None` for empty text.
    pub fn compute(&self, text: &str, polarity: f64) -> Option<f64> {
        self.explain(text, polarity).map(|b| b.strength)
    }

    pub fn explain(&self, text: &str, polarity: f64) -> Option<OpinionBreakdown> {
        if is_blank(text) {
            return None;
        }
        let w = &self.weights;
        let lex = &self.lexicon;
        let normalized = normalize(text);
        // Words inside a hedge ("not sure", "i don't know") are hedging, not
        // subjective vocabulary or certainty.
        let unhedged = lex.hedges.mask(&normalized);

        // 1) base
        let subjectivity = subjectivity::estimate(lex, &unhedged, w.booster_subjectivity_scale);
        let base = polarity.abs() * subjectivity;

        // 2) certainty and hedging
        let booster_hits = lex.amplifiers.count(&unhedged);
        let certainty = w.certainty_per_booster * booster_hits as f64;
        let hedge_hits = lex.hedges.count(&normalized);
        let hedge = w.hedge_per_phrase * hedge_hits as f64;

        // 3) emphasis
        let mut emphasis = 0.0;
        if is_shouting(&normalized) {
            emphasis += w.shouting_bonus;
        }
        if normalized.contains('!') {
            emphasis += w.exclamation_bonus;
        }

        // 4) emoji
        let emoji = self.emoji_term(&normalized);

        // 5) contextual bumps
        let mut contextual = 0.0;
        if polarity.abs() > w.high_polarity_threshold {
            contextual += w.high_polarity_bonus;
        }
        if lex.certainty_verbs.contains_any(&unhedged) && lex.superlatives.contains_any(&normalized) {
            contextual += w.certainty_superlative_bonus;
        }
        if lex.contrastives.contains_any(&normalized) {
            contextual += w.contrast_bonus;
        }
        if polarity == 0.0 && lex.negated_opinions.contains_any(&normalized) {
            contextual += w.negated_opinion_bonus;
        }

        let multiplier = 1.0 + certainty + emoji + emphasis - hedge;
        let raw = base * multiplier + contextual;
        let strength = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

        Some(OpinionBreakdown {
            polarity,
            subjectivity,
            base,
            booster_hits,
            certainty,
            hedge_hits,
            hedge,
            emphasis,
            emoji,
            contextual,
            multiplier,
            raw,
            strength,
        })
    }

    fn emoji_term(&self, text: &str) -> f64 {
        let w = &self.weights;
        let mut positive = 0i64;
        let mut negative = 0i64;
        let mut strong_negative = false;
        for token in tokenize(text, |c| self.lexicon.is_emoji(c)) {
            let TokenKind::Emoji(c) = token.kind else {
                continue;
            };
            match self.lexicon.emoji(c).map(|e| e.class) {
                Some(EmojiClass::Positive) => positive += 1,
                Some(EmojiClass::StrongNegative) => {
                    negative += 1;
                    strong_negative = true;
                }
                Some(EmojiClass::Negative) => negative += 1,
                Some(EmojiClass::Neutral) | None => {}
            }
        }

        let net = positive - negative;
        if net != 0 {
            w.emoji_per_net * net as f64
        } else if strong_negative {
            -w.emoji_fallback_nudge
        } else if positive > 0 {
            w.emoji_fallback_nudge
        } else {
            0.0
        }
    }
}
