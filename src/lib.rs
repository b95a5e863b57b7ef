//! Sentiment, opinion-strength and plausibility scoring for short social-media
//! text about a topic.
//!
//! ```no_run
//! use mirror_vibes::{ScoringConfig, ScoringPipeline};
//!
//! let pipeline = ScoringPipeline::from_config(&ScoringConfig::default())?;
//! let scores = pipeline.score_text("This was horrible. I hated every second.")?;
//! assert!(scores.unwrap().sentiment_polarity < -0.5);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api_types;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod lexicon;
pub mod models;
pub mod ner;
pub mod opinion;
pub mod pipeline;
pub mod plausibility;
pub mod render;
pub mod sentiment;
pub mod source;
pub mod storage;
pub mod subjectivity;
pub mod summary;
pub mod text;

pub use config::ScoringConfig;
pub use lexicon::LexiconBank;
pub use models::{ItemScores, TextItem};
pub use ner::{EntityRecognizer, NamedEntityGrounder};
pub use opinion::OpinionStrengthCalculator;
pub use pipeline::ScoringPipeline;
pub use plausibility::{PlausibilityModel, StrategyKind};
pub use sentiment::SentimentScorer;
