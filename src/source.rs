//! Item sources: where topic batches of posts and comments come from.

use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::api_types::{RawComment, RawPost};
use crate::error::SourceError;
use crate::models::{ItemContent, ItemKind, TextItem};

/// Posts and comments collected for one topic.
#[derive(Debug, Clone, Default)]
pub struct TopicBatch {
    pub topic: String,
    pub posts: Vec<TextItem>,
    pub comments: Vec<TextItem>,
}

pub trait ItemSource {
    /// Next topic, or `None` when the source is exhausted.
    fn next_batch(&mut self) -> Result<Option<TopicBatch>, SourceError>;
}

/// Reads a JSON array of [`RawPost`] dumped by the retrieval step.
#[derive(Debug)]
pub struct JsonDumpSource {
    pending: VecDeque<TopicBatch>,
}

impl JsonDumpSource {
    pub fn open(path: &Path, max_posts: usize, max_comments: usize) -> Result<Self, SourceError> {
        let start = std::time::Instant::now();
        let raw = std::fs::read(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let posts: Vec<RawPost> = serde_json::from_slice(&raw).map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let pending = group_topics(posts, max_posts, max_comments);

        info!(
            "Dump loaded - path={}, topics={}, duration={:.2}s",
            path.display(),
            pending.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(Self { pending })
    }
}

impl ItemSource for JsonDumpSource {
    fn next_batch(&mut self) -> Result<Option<TopicBatch>, SourceError> {
        Ok(self.pending.pop_front())
    }
}

/// Topics keep the order in which they first appear in the dump.
fn group_topics(posts: Vec<RawPost>, max_posts: usize, max_comments: usize) -> VecDeque<TopicBatch> {
    let order: Vec<String> = posts.iter().map(|p| p.topic.clone()).unique().collect();
    let mut by_topic = posts.into_iter().into_group_map_by(|p| p.topic.clone());

    let mut out = VecDeque::with_capacity(order.len());
    for topic in order {
        let Some(raw_posts) = by_topic.remove(&topic) else {
            continue;
        };
        let mut batch = TopicBatch {
            topic: topic.clone(),
            ..TopicBatch::default()
        };
        for raw in raw_posts.into_iter().take(max_posts) {
            let post = post_item(&raw);
            let post_id = post.id().to_string();
            let kept: Vec<&RawComment> = raw.comments.iter().filter(|c| !is_deleted(c)).take(max_comments).collect();
            debug!(
                "Post collected - topic={}, post={}, comments_kept={}, comments_seen={}",
                topic,
                post_id,
                kept.len(),
                raw.comments.len()
            );
            batch.comments.extend(kept.into_iter().map(|c| comment_item(c, &topic, &post_id)));
            batch.posts.push(post);
        }
        out.push_back(batch);
    }
    out
}

fn is_deleted(c: &RawComment) -> bool {
    c.body
        .as_deref()
        .map(|b| {
            let b = b.trim().to_lowercase();
            b == "[deleted]" || b == "[removed]"
        })
        .unwrap_or(false)
}

fn fallback_id(parts: &[&str]) -> String {
    format!("{:016x}", xxh3_64(parts.join("|").as_bytes()))
}

/// Out-of-range seconds fall back to the epoch so the record is still kept.
fn timestamp(secs: f64, id: &str) -> DateTime<Utc> {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos).unwrap_or_else(|| {
        warn!("Timestamp out of range, using epoch - id={}, created_utc={}", id, secs);
        DateTime::default()
    })
}

fn word_count(body: Option<&str>) -> usize {
    body.map_or(0, |b| b.split_whitespace().count())
}

fn post_item(raw: &RawPost) -> TextItem {
    let created = raw.created_utc.to_string();
    let id = raw
        .id
        .clone()
        .unwrap_or_else(|| fallback_id(&[&raw.topic, &raw.title, &created]));
    let created_utc = timestamp(raw.created_utc, &id);
    TextItem::new(ItemContent {
        kind: ItemKind::Post,
        id,
        topic: raw.topic.clone(),
        parent_id: None,
        title: Some(raw.title.trim().to_string()),
        subreddit: raw.subreddit.clone(),
        url: raw.url.clone(),
        body: raw.body.clone(),
        author: raw.author.clone().unwrap_or_else(|| "None".to_string()),
        created_utc,
        score: raw.score,
        num_comments: Some(raw.num_comments),
        word_count: word_count(raw.body.as_deref()),
    })
}

fn comment_item(raw: &RawComment, topic: &str, post_id: &str) -> TextItem {
    let created = raw.created_utc.to_string();
    let id = raw.id.clone().unwrap_or_else(|| {
        fallback_id(&[post_id, raw.body.as_deref().unwrap_or_default(), &created])
    });
    let created_utc = timestamp(raw.created_utc, &id);
    TextItem::new(ItemContent {
        kind: ItemKind::Comment,
        id,
        topic: topic.to_string(),
        parent_id: Some(post_id.to_string()),
        title: None,
        subreddit: None,
        url: None,
        body: raw.body.clone(),
        author: raw.author.clone().unwrap_or_else(|| "None".to_string()),
        created_utc,
        score: raw.score,
        num_comments: None,
        word_count: word_count(raw.body.as_deref()),
    })
}
