use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::text::is_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

/// The four derived scores, always attached together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemScores {
    pub sentiment_polarity: f64,     // [-1, 1]
    pub opinion_strength: f64,       // [0, 1]
    pub entity_grounding_score: f64, // [0, 1]
    pub plausibility_score: f64,     // [0, 1]
}

impl ItemScores {
    pub fn validate(&self) -> Result<(), ScoringError> {
        check("sentiment_polarity", self.sentiment_polarity, -1.0, 1.0)?;
        check("opinion_strength", self.opinion_strength, 0.0, 1.0)?;
        check("entity_grounding_score", self.entity_grounding_score, 0.0, 1.0)?;
        check("plausibility_score", self.plausibility_score, 0.0, 1.0)
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ScoringError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::OutOfRange { field, value, min, max })
    }
}

/// Content of one post or comment as it came from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    pub kind: ItemKind,
    pub id: String,
    pub topic: String,
    /// Post id, for comments.
    pub parent_id: Option<String>,
    /// Posts only.
    pub title: Option<String>,
    /// Community the post was made in, posts only.
    pub subreddit: Option<String>,
    /// Post permalink, posts only.
    pub url: Option<String>,
    pub body: Option<String>,
    pub author: String,
    pub created_utc: DateTime<Utc>,
    pub score: i64,
    /// Reply count, posts only.
    pub num_comments: Option<u64>,
    pub word_count: usize,
}

/// A post or comment plus its derived scores.
///
/// Content cannot change after construction and scores are attached at most
/// once, as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    content: ItemContent,
    scores: Option<ItemScores>,
}

impl TextItem {
    pub fn new(content: ItemContent) -> Self {
        Self { content, scores: None }
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn id(&self) -> &str {
        &self.content.id
    }

    /// Body text, `None` when absent or whitespace only.
    pub fn scorable_body(&self) -> Option<&str> {
        self.content.body.as_deref().filter(|b| !is_blank(b))
    }

    pub fn scores(&self) -> Option<&ItemScores> {
        self.scores.as_ref()
    }

    pub fn attach_scores(&mut self, scores: ItemScores) -> Result<(), ScoringError> {
        if self.scores.is_some() {
            return Err(ScoringError::AlreadyScored {
                id: self.content.id.clone(),
            });
        }
        scores.validate()?;
        self.scores = Some(scores);
        Ok(())
    }
}

/// One row of the "Posts" or "Comments" table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub topic: String,
    pub id: String,
    pub parent_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub body: Option<String>,
    pub author: String,
    pub created_utc: DateTime<Utc>,
    pub score: i64,
    pub num_comments: Option<u64>,
    pub word_count: usize,
    pub sentiment_polarity: Option<f64>,
    pub opinion_strength: Option<f64>,
    pub entity_grounding_score: Option<f64>,
    pub plausibility_score: Option<f64>,
}

impl From<&TextItem> for TableRow {
    fn from(item: &TextItem) -> Self {
        let c = &item.content;
        let s = item.scores;
        Self {
            topic: c.topic.clone(),
            id: c.id.clone(),
            parent_id: c.parent_id.clone(),
            title: c.title.clone(),
            subreddit: c.subreddit.clone(),
            url: c.url.clone(),
            body: c.body.clone(),
            author: c.author.clone(),
            created_utc: c.created_utc,
            score: c.score,
            num_comments: c.num_comments,
            word_count: c.word_count,
            sentiment_polarity: s.map(|s| s.sentiment_polarity),
            opinion_strength: s.map(|s| s.opinion_strength),
            entity_grounding_score: s.map(|s| s.entity_grounding_score),
            plausibility_score: s.map(|s| s.plausibility_score),
        }
    }
}
