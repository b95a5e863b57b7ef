//! Batch scoring and crash-safe persistence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{NerProvider, ScoringConfig};
use crate::error::ScoringError;
use crate::lexicon::LexiconBank;
use crate::models::{ItemScores, TableRow, TextItem};
use crate::ner::{EntityRecognizer, GazetteerRecognizer, Grounding, HttpEntityRecognizer, NamedEntityGrounder};
use crate::opinion::{OpinionBreakdown, OpinionStrengthCalculator};
use crate::plausibility::{build_model, PlausibilityInput, PlausibilityModel, StrategyKind};
use crate::sentiment::SentimentScorer;
use crate::source::ItemSource;
use crate::storage::{TabularStore, Workbook};
use crate::summary::{summarize_topics, RunReport};
use crate::text::is_blank;

/// What happened to one item in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Scored,
    /// No body; scores stay null.
    Empty,
    /// Scores were rejected; the item stays unscored.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub scored: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchStats {
    fn add(&mut self, other: BatchStats) {
        self.scored += other.scored;
        self.empty += other.empty;
        self.failed += other.failed;
    }
}

/// Full breakdown of how one text was scored.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreExplanation {
    pub strategy: StrategyKind,
    pub lexicon_fingerprint: String,
    pub polarity: Option<f64>,
    pub opinion: Option<OpinionBreakdown>,
    pub grounding: Grounding,
    pub plausibility_raw: Option<f64>,
    pub plausibility: Option<f64>,
}

pub struct ScoringPipeline {
    lexicon: Arc<LexiconBank>,
    sentiment: SentimentScorer,
    opinion: OpinionStrengthCalculator,
    grounder: NamedEntityGrounder,
    plausibility: Arc<dyn PlausibilityModel>,
    strategy: StrategyKind,
    parallel: bool,
}

impl ScoringPipeline {
    pub fn new(lexicon: Arc<LexiconBank>, config: &ScoringConfig, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        let strategy = config.plausibility.strategy;
        Self {
            sentiment: SentimentScorer::new(lexicon.clone(), config.sentiment),
            opinion: OpinionStrengthCalculator::new(lexicon.clone(), config.opinion),
            grounder: NamedEntityGrounder::new(recognizer),
            plausibility: build_model(
                strategy,
                lexicon.clone(),
                config.plausibility.groundedness,
                config.plausibility.scenario,
            ),
            strategy,
            parallel: config.pipeline.parallel,
            lexicon,
        }
    }

    /// Lexicon and recognizer resolved from `config`.
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let lexicon = match &config.lexicon_dir {
            Some(dir) => LexiconBank::from_dir(dir)
                .with_context(|| format!("Loading lexicon overrides from {}", dir.display()))?,
            None => LexiconBank::builtin().context("Loading built-in lexicon")?,
        };
        let lexicon = Arc::new(lexicon);

        let recognizer: Arc<dyn EntityRecognizer> = match config.ner.provider {
            NerProvider::Gazetteer => Arc::new(GazetteerRecognizer::new(&lexicon).context("Building gazetteer")?),
            NerProvider::Http => {
                let endpoint = config
                    .ner
                    .endpoint
                    .clone()
                    .context("ner.endpoint is required for the http provider")?;
                Arc::new(
                    HttpEntityRecognizer::new(endpoint, Duration::from_secs(config.ner.timeout_secs))
                        .context("Building HTTP entity recognizer")?,
                )
            }
        };

        let pipeline = Self::new(lexicon, config, recognizer);
        info!(
            "Scoring pipeline ready - strategy={}, recognizer={}, parallel={}, lexicon={}",
            pipeline.strategy.as_str(),
            pipeline.grounder.recognizer_name(),
            pipeline.parallel,
            pipeline.lexicon.fingerprint()
        );
        Ok(pipeline)
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn lexicon(&self) -> &LexiconBank {
        &self.lexicon
    }

    /// All four scores for `text`, or `None` when it is empty.
    pub fn score_text(&self, text: &str) -> Result<Option<ItemScores>, ScoringError> {
        if is_blank(text) {
            return Ok(None);
        }
        let polarity = self
            .sentiment
            .analyze(text)
            .ok_or(ScoringError::Incomplete { field: "sentiment_polarity" })?;
        let strength = self
            .opinion
            .compute(text, polarity)
            .ok_or(ScoringError::Incomplete { field: "opinion_strength" })?;
        let grounding = self.grounder.ground(text);
        let plausibility = self
            .plausibility
            .score(&PlausibilityInput {
                text,
                polarity: Some(polarity),
                strength: Some(strength),
                grounding: grounding.score,
                entity_count: grounding.count,
            })
            .ok_or(ScoringError::Incomplete { field: "plausibility_score" })?;

        let scores = ItemScores {
            sentiment_polarity: polarity,
            opinion_strength: strength,
            entity_grounding_score: grounding.score,
            plausibility_score: plausibility,
        };
        scores.validate()?;
        Ok(Some(scores))
    }

    pub fn explain(&self, text: &str) -> ScoreExplanation {
        let polarity = self.sentiment.analyze(text);
        let opinion = polarity.and_then(|p| self.opinion.explain(text, p));
        let grounding = self.grounder.ground(text);
        let input = PlausibilityInput {
            text,
            polarity,
            strength: opinion.as_ref().map(|o| o.strength),
            grounding: grounding.score,
            entity_count: grounding.count,
        };
        ScoreExplanation {
            strategy: self.strategy,
            lexicon_fingerprint: self.lexicon.fingerprint().to_string(),
            polarity,
            plausibility_raw: self.plausibility.score_raw(&input),
            plausibility: self.plausibility.score(&input),
            opinion,
            grounding,
        }
    }

    /// Score one item in place. Failures leave the item unscored and are logged.
    pub fn annotate(&self, item: &mut TextItem) -> Annotation {
        let scored = match item.scorable_body() {
            Some(body) => self.score_text(body),
            None => return Annotation::Empty,
        };
        let result = match scored {
            Ok(Some(scores)) => item.attach_scores(scores).map(|_| Annotation::Scored),
            Ok(None) => Ok(Annotation::Empty),
            Err(e) => Err(e),
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Item left unscored - id={}, error={}", item.id(), e);
                Annotation::Failed
            }
        }
    }

    pub fn score_batch(&self, items: &mut [TextItem]) -> BatchStats {
        let outcomes: Vec<Annotation> = if self.parallel {
            items.par_iter_mut().map(|item| self.annotate(item)).collect()
        } else {
            items.iter_mut().map(|item| self.annotate(item)).collect()
        };

        let mut stats = BatchStats::default();
        for outcome in outcomes {
            match outcome {
                Annotation::Scored => stats.scored += 1,
                Annotation::Empty => stats.empty += 1,
                Annotation::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Score every topic from `source`, checkpointing to `store` after each one.
    ///
    /// On a fatal error the unsaved buffer is flushed, everything scored this
    /// run is written as a backup, and the error is returned.
    pub fn run(&self, name: &str, source: &mut dyn ItemSource, store: &mut dyn TabularStore) -> Result<RunReport> {
        let run_start = Instant::now();
        let started_at = Utc::now();
        info!("Scoring run started - name={}, strategy={}", name, self.strategy.as_str());

        let mut buffer = Workbook::default();
        let mut run_log = Workbook::default();
        let mut stats = BatchStats::default();

        if let Err(e) = self.run_topics(source, store, &mut buffer, &mut run_log, &mut stats) {
            error!("Scoring run failed - name={}, error={:#}", name, e);
            if !buffer.is_empty() {
                match store.append(&buffer) {
                    Ok(()) => info!(
                        "Buffered rows flushed after failure - posts={}, comments={}",
                        buffer.posts.len(),
                        buffer.comments.len()
                    ),
                    Err(flush_err) => error!("Flush after failure did not succeed - error={}", flush_err),
                }
            }
            if let Err(backup_err) = store.write_backup(&run_log) {
                error!("Crash backup did not succeed - error={}", backup_err);
            }
            return Err(e);
        }

        let report = RunReport {
            name: name.to_string(),
            strategy: self.strategy.as_str().to_string(),
            lexicon_fingerprint: self.lexicon.fingerprint().to_string(),
            started_at,
            finished_at: Utc::now(),
            posts: run_log.posts.len(),
            comments: run_log.comments.len(),
            scored: stats.scored,
            empty: stats.empty,
            failed: stats.failed,
            topics: summarize_topics(&run_log.posts, &run_log.comments),
        };
        let summary_path = store.write_summary(&report).context("Writing run summary")?;

        info!(
            "Scoring run completed - total_duration={:.2}s, topics={}, posts={}, comments={}, scored={}, empty={}, failed={}, summary={}",
            run_start.elapsed().as_secs_f32(),
            report.topics.len(),
            report.posts,
            report.comments,
            report.scored,
            report.empty,
            report.failed,
            summary_path.display()
        );
        Ok(report)
    }

    fn run_topics(
        &self,
        source: &mut dyn ItemSource,
        store: &mut dyn TabularStore,
        buffer: &mut Workbook,
        run_log: &mut Workbook,
        stats: &mut BatchStats,
    ) -> Result<()> {
        let mut index = 0usize;
        while let Some(mut batch) = source.next_batch().context("Reading next topic batch")? {
            index += 1;
            let topic_start = Instant::now();
            debug!(
                "Scoring topic {} - topic={}, posts={}, comments={}",
                index,
                batch.topic,
                batch.posts.len(),
                batch.comments.len()
            );

            // 1) score
            let mut topic_stats = self.score_batch(&mut batch.posts);
            topic_stats.add(self.score_batch(&mut batch.comments));
            stats.add(topic_stats);

            // 2) buffer rows
            let rows = Workbook {
                posts: batch.posts.iter().map(TableRow::from).collect(),
                comments: batch.comments.iter().map(TableRow::from).collect(),
            };
            buffer.extend(&rows);
            run_log.extend(&rows);

            // 3) checkpoint
            store
                .append(buffer)
                .with_context(|| format!("Saving checkpoint after topic '{}'", batch.topic))?;
            buffer.clear();

            info!(
                "Topic completed - topic={}, duration={:.2}s, scored={}, empty={}, failed={}",
                batch.topic,
                topic_start.elapsed().as_secs_f32(),
                topic_stats.scored,
                topic_stats.empty,
                topic_stats.failed
            );
        }
        Ok(())
    }
}
