//! Valence-lexicon polarity estimation.
//!
//! Tokens pick up valence from the lexicon, get nudged by boosters, flipped
//! and damped by negations in a short look-behind window, re-weighted around
//! "but", and the sum is squashed into (-1, 1).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexicon::LexiconBank;
use crate::text::{is_blank, normalize, tokenize, Token, TokenKind};

/// Distance decay for boosters 1, 2 and 3 tokens back.
const BOOSTER_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentParams {
    pub negation_scalar: f64,     // -0.74
    pub booster_increment: f64,   // 0.293
    pub caps_increment: f64,      // 0.733
    pub alpha: f64,               // 15.0, normalization constant
    pub lookbehind: usize,        // 3
    pub but_before: f64,          // 0.5
    pub but_after: f64,           // 1.5
    pub exclamation_increment: f64,
    pub exclamation_cap: usize,
    pub question_increment: f64,
    pub question_cap: f64,
}

impl Default for SentimentParams {
    fn default() -> Self {
        Self {
            negation_scalar: -0.74,
            booster_increment: 0.293,
            caps_increment: 0.733,
            alpha: 15.0,
            lookbehind: 3,
            but_before: 0.5,
            but_after: 1.5,
            exclamation_increment: 0.292,
            exclamation_cap: 4,
            question_increment: 0.18,
            question_cap: 0.96,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: Arc<LexiconBank>,
    params: SentimentParams,
}

impl SentimentScorer {
    pub fn new(lexicon: Arc<LexiconBank>, params: SentimentParams) -> Self {
        Self { lexicon, params }
    }

    /// Polarity in [-1, 1]; `None` for empty or whitespace-only text.
    pub fn analyze(&self, text: &str) -> Option<f64> {
        if is_blank(text) {
            return None;
        }
        let p = &self.params;
        let text = normalize(text);
        let tokens = tokenize(&text, |c| self.lexicon.is_emoji(c));
        let cap_diff = has_cap_differential(&tokens);
        let but_at = tokens.iter().position(|t| t.is_word() && t.lower == "but");

        let mut sum = 0.0;
        for i in 0..tokens.len() {
            let Some(mut v) = self.base_valence(&tokens[i]) else {
                continue;
            };
            if v == 0.0 {
                continue;
            }
            let direction = v.signum();
            if cap_diff && tokens[i].is_shouted() {
                v += p.caps_increment * direction;
            }

            let window = i.min(p.lookbehind).min(BOOSTER_DECAY.len());
            let mut negated = false;
            for back in 1..=window {
                let prev = &tokens[i - back];
                if !prev.is_word() {
                    continue;
                }
                if let Some(kind) = self.lexicon.booster(&prev.lower) {
                    let mut scalar = p.booster_increment * kind.sign() * direction;
                    if cap_diff && prev.is_shouted() {
                        scalar += p.caps_increment * direction;
                    }
                    v += scalar * BOOSTER_DECAY[back - 1];
                }
                if self.lexicon.is_negation(&prev.lower) {
                    negated = true;
                }
            }
            if negated {
                v *= p.negation_scalar;
            }

            if let Some(b) = but_at {
                if i < b {
                    v *= p.but_before;
                } else if i > b {
                    v *= p.but_after;
                }
            }
            sum += v;
        }

        if sum != 0.0 {
            sum += self.punctuation_emphasis(&text) * sum.signum();
        }
        Some((sum / (sum * sum + p.alpha).sqrt()).clamp(-1.0, 1.0))
    }

    fn base_valence(&self, token: &Token) -> Option<f64> {
        match token.kind {
            TokenKind::Word => self.lexicon.valence(&token.lower),
            TokenKind::Emoji(c) => self.lexicon.emoji(c).map(|e| e.valence),
        }
    }

    fn punctuation_emphasis(&self, text: &str) -> f64 {
        let p = &self.params;
        let bangs = text.matches('!').count().min(p.exclamation_cap);
        let questions = text.matches('?').count();
        let question_amp = match questions {
            0 | 1 => 0.0,
            2 | 3 => questions as f64 * p.question_increment,
            _ => p.question_cap,
        };
        bangs as f64 * p.exclamation_increment + question_amp
    }
}

/// Caps only carry emphasis when shouted words sit next to ordinary ones.
fn has_cap_differential(tokens: &[Token]) -> bool {
    let mut shouted = 0usize;
    let mut plain = 0usize;
    for t in tokens.iter().filter(|t| t.is_word()) {
        if t.text.chars().filter(|c| c.is_alphabetic()).count() < 2 {
            continue;
        }
        if t.is_shouted() {
            shouted += 1;
        } else {
            plain += 1;
        }
    }
    shouted > 0 && plain > 0
}
