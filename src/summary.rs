use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::models::TableRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    pub posts: usize,
    pub comments: usize,
    pub scored: usize,
    pub mean_sentiment: Option<f64>,
    pub mean_opinion: Option<f64>,
    pub mean_grounding: Option<f64>,
    pub mean_plausibility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub strategy: String,
    pub lexicon_fingerprint: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub posts: usize,
    pub comments: usize,
    pub scored: usize,
    /// Items with no body; their scores stay null.
    pub empty: usize,
    /// Items whose scores were rejected.
    pub failed: usize,
    pub topics: Vec<TopicSummary>,
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values.flatten().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Per-topic means over every row written this run, topics in first-seen order.
pub fn summarize_topics(posts: &[TableRow], comments: &[TableRow]) -> Vec<TopicSummary> {
    let topics: Vec<&str> = posts
        .iter()
        .chain(comments)
        .map(|r| r.topic.as_str())
        .unique()
        .collect();

    topics
        .into_iter()
        .map(|topic| {
            let rows: Vec<&TableRow> = posts.iter().chain(comments).filter(|r| r.topic == topic).collect();
            TopicSummary {
                topic: topic.to_string(),
                posts: posts.iter().filter(|r| r.topic == topic).count(),
                comments: comments.iter().filter(|r| r.topic == topic).count(),
                scored: rows.iter().filter(|r| r.sentiment_polarity.is_some()).count(),
                mean_sentiment: mean(rows.iter().map(|r| r.sentiment_polarity)),
                mean_opinion: mean(rows.iter().map(|r| r.opinion_strength)),
                mean_grounding: mean(rows.iter().map(|r| r.entity_grounding_score)),
                mean_plausibility: mean(rows.iter().map(|r| r.plausibility_score)),
            }
        })
        .collect()
}
