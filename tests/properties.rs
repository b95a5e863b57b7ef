use std::sync::{Arc, OnceLock};

use mirror_vibes::lexicon::banks::HEDGES;
use mirror_vibes::opinion::OpinionWeights;
use mirror_vibes::sentiment::SentimentParams;
use mirror_vibes::text::is_shouting;
use mirror_vibes::{LexiconBank, OpinionStrengthCalculator, ScoringConfig, ScoringPipeline, SentimentScorer, StrategyKind};
use proptest::prelude::*;

fn lexicon() -> Arc<LexiconBank> {
    static LEX: OnceLock<Arc<LexiconBank>> = OnceLock::new();
    LEX.get_or_init(|| Arc::new(LexiconBank::builtin().unwrap())).clone()
}

fn pipelines() -> &'static [ScoringPipeline; 2] {
    static P: OnceLock<[ScoringPipeline; 2]> = OnceLock::new();
    P.get_or_init(|| {
        let make = |strategy| {
            let mut config = ScoringConfig::default();
            config.plausibility.strategy = strategy;
            ScoringPipeline::from_config(&config).unwrap()
        };
        [make(StrategyKind::V1), make(StrategyKind::V2)]
    })
}

const VOCAB: &[&str] = &[
    "the", "show", "episode", "was", "is", "not", "never", "very", "so", "slightly", "love", "hated", "great",
    "awful", "but", "maybe", "I", "think", "believe", "best", "worst", "ever", "AI", "drone", "soul", "Google",
    "Elon", "Musk", "didn't", "like", "GREAT", "really", "creepy", "because", "oh", "sure", "!", "?", "😍", "🤬",
    "💀", "🙄", "totally", "immortal", "realistic",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 0..14).prop_map(|words| words.join(" "))
}

fn amplifier() -> impl Strategy<Value = String> {
    prop::sample::select(lexicon().amplifiers.phrases().to_vec())
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![sentence(), ".{0,60}"]
}

proptest! {
    #[test]
    fn polarity_is_bounded_and_none_only_for_blank(text in any_text()) {
        let scorer = SentimentScorer::new(lexicon(), SentimentParams::default());
        match scorer.analyze(&text) {
            None => prop_assert!(text.trim().is_empty()),
            Some(p) => prop_assert!((-1.0..=1.0).contains(&p)),
        }
    }

    #[test]
    fn strength_is_bounded(text in any_text(), polarity in -1.0f64..=1.0) {
        let calc = OpinionStrengthCalculator::new(lexicon(), OpinionWeights::default());
        if let Some(s) = calc.compute(&text, polarity) {
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn scores_are_bounded_and_deterministic(text in any_text()) {
        for pipeline in pipelines() {
            let first = pipeline.score_text(&text).unwrap();
            let second = pipeline.score_text(&text).unwrap();
            prop_assert_eq!(first, second);
            match first {
                None => prop_assert!(text.trim().is_empty()),
                Some(s) => {
                    prop_assert!((-1.0..=1.0).contains(&s.sentiment_polarity));
                    prop_assert!((0.0..=1.0).contains(&s.opinion_strength));
                    prop_assert!((0.0..=1.0).contains(&s.entity_grounding_score));
                    prop_assert!((0.0..=1.0).contains(&s.plausibility_score));
                }
            }
        }
    }

    #[test]
    fn adding_a_booster_never_weakens(text in sentence(), booster in amplifier(), polarity in -1.0f64..=1.0) {
        prop_assume!(!text.trim().is_empty());
        let calc = OpinionStrengthCalculator::new(lexicon(), OpinionWeights::default());
        let booster = if is_shouting(&text) { booster.to_uppercase() } else { booster };
        let before = calc.compute(&text, polarity).unwrap();
        let after = calc.compute(&format!("{text} {booster}"), polarity).unwrap();
        prop_assert!(after >= before, "{} -> {}", before, after);
    }

    #[test]
    fn adding_a_hedge_never_strengthens(
        text in sentence(),
        hedge in prop::sample::select(HEDGES),
        polarity in -1.0f64..=1.0,
    ) {
        prop_assume!(!text.trim().is_empty());
        let calc = OpinionStrengthCalculator::new(lexicon(), OpinionWeights::default());
        let before = calc.compute(&text, polarity).unwrap();
        let after = calc.compute(&format!("{text} {hedge}"), polarity).unwrap();
        prop_assert!(after <= before, "{} -> {}", before, after);
    }
}
