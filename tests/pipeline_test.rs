use std::path::{Path, PathBuf};

use mirror_vibes::error::{SourceError, StorageError};
use mirror_vibes::source::{ItemSource, JsonDumpSource, TopicBatch};
use mirror_vibes::storage::{JsonWorkbookStore, TabularStore, Workbook};
use mirror_vibes::summary::RunReport;
use mirror_vibes::{ScoringConfig, ScoringPipeline};
use pretty_assertions::assert_eq;

const DUMP: &str = r#"[
    {"topic": "Nosedive", "id": "p1", "title": "Ratings everywhere", "subreddit": "blackmirror",
     "url": "https://www.reddit.com/r/blackmirror/comments/p1/", "created_utc": 1700000000, "score": 12, "num_comments": 3,
     "comments": [
        {"id": "c1", "author": "a", "body": "This is already happening with social media apps.", "created_utc": 1700000100, "score": 5},
        {"id": "c2", "author": "b", "body": "[deleted]", "created_utc": 1700000200},
        {"id": "c3", "author": "c", "body": "I HATED THIS EPISODE SO MUCH", "created_utc": 1700000300, "score": -2}
     ]},
    {"topic": "San Junipero", "id": "p2", "title": "Best one", "body": "I absolutely love this episode! It's perfect.", "created_utc": 1700001000,
     "comments": [
        {"id": "c4", "author": "d", "body": "", "created_utc": 1700001100},
        {"id": "c5", "author": "e", "body": "After death, he uploaded his soul to the cloud and became immortal.", "created_utc": 1700001200}
     ]}
]"#;

fn write_dump(dir: &Path) -> PathBuf {
    let path = dir.join("dump.json");
    std::fs::write(&path, DUMP).unwrap();
    path
}

fn pipeline() -> ScoringPipeline {
    ScoringPipeline::from_config(&ScoringConfig::default()).unwrap()
}

#[test]
fn run_scores_every_topic_and_writes_workbook_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = JsonDumpSource::open(&write_dump(dir.path()), 100, 50).unwrap();
    let mut store = JsonWorkbookStore::new(dir.path(), "blackmirror");

    let report = pipeline().run("blackmirror", &mut source, &mut store).unwrap();
    assert_eq!(report.posts, 2);
    assert_eq!(report.comments, 4);
    // p1 has no body, c4 is empty
    assert_eq!(report.empty, 2);
    assert_eq!(report.scored, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(report.topics.len(), 2);
    assert_eq!(report.topics[0].topic, "Nosedive");

    let book = store.load().unwrap();
    assert_eq!(book.posts.len(), 2);
    assert_eq!(book.comments.len(), 4);
    let p1 = &book.posts[0];
    assert_eq!(p1.sentiment_polarity, None);
    assert_eq!(p1.plausibility_score, None);
    assert_eq!(p1.subreddit.as_deref(), Some("blackmirror"));
    assert_eq!(p1.url.as_deref(), Some("https://www.reddit.com/r/blackmirror/comments/p1/"));
    assert_eq!(book.posts[1].subreddit, None);
    assert!(book.comments.iter().all(|r| r.subreddit.is_none() && r.url.is_none()));
    let c3 = book.comments.iter().find(|r| r.id == "c3").unwrap();
    assert!(c3.sentiment_polarity.unwrap() < 0.0);
    assert!(book.comments.iter().all(|r| r.id != "c2"));

    let summary: RunReport =
        serde_json::from_slice(&std::fs::read(dir.path().join("blackmirror_summary.json")).unwrap()).unwrap();
    assert_eq!(summary.name, "blackmirror");
    assert_eq!(summary.strategy, "v1");
    assert_eq!(summary.lexicon_fingerprint, report.lexicon_fingerprint);
    assert_eq!(summary.topics.len(), 2);
    assert_eq!(summary.topics[1].comments, 2);
}

#[test]
fn second_run_appends_to_existing_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(dir.path());
    let mut store = JsonWorkbookStore::new(dir.path(), "blackmirror");
    for _ in 0..2 {
        let mut source = JsonDumpSource::open(&dump, 100, 50).unwrap();
        pipeline().run("blackmirror", &mut source, &mut store).unwrap();
    }
    assert_eq!(store.load().unwrap().comments.len(), 8);
}

/// Yields the wrapped batches, then fails.
struct FailingSource {
    inner: JsonDumpSource,
    remaining: usize,
}

impl ItemSource for FailingSource {
    fn next_batch(&mut self) -> Result<Option<TopicBatch>, SourceError> {
        if self.remaining == 0 {
            return Err(SourceError::Read {
                path: PathBuf::from("remote"),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            });
        }
        self.remaining -= 1;
        self.inner.next_batch()
    }
}

fn backups(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().unwrap().to_string_lossy().contains("_crash_backup_"))
        .collect()
}

#[test]
fn source_failure_keeps_checkpoints_and_writes_backup() {
    let dir = tempfile::tempdir().unwrap();
    let inner = JsonDumpSource::open(&write_dump(dir.path()), 100, 50).unwrap();
    let mut source = FailingSource { inner, remaining: 1 };
    let mut store = JsonWorkbookStore::new(dir.path(), "blackmirror");

    let err = pipeline().run("blackmirror", &mut source, &mut store).unwrap_err();
    assert!(format!("{err:#}").contains("connection reset"));

    // first topic was checkpointed before the failure
    let book = store.load().unwrap();
    assert_eq!(book.posts.len(), 1);
    assert_eq!(book.comments.len(), 2);

    let found = backups(dir.path());
    assert_eq!(found.len(), 1);
    let backup: Workbook = serde_json::from_slice(&std::fs::read(&found[0]).unwrap()).unwrap();
    assert_eq!(backup, book);
    assert!(!dir.path().join("blackmirror_summary.json").exists());
}

/// Primary writes fail after `ok_writes` successes; backups go to a real store.
struct FlakyStore {
    inner: JsonWorkbookStore,
    ok_writes: usize,
    attempts: usize,
}

impl TabularStore for FlakyStore {
    fn append(&mut self, rows: &Workbook) -> Result<(), StorageError> {
        self.attempts += 1;
        if self.attempts > self.ok_writes {
            return Err(StorageError::Io {
                path: self.inner.primary_path(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.append(rows)
    }

    fn write_backup(&self, rows: &Workbook) -> Result<PathBuf, StorageError> {
        self.inner.write_backup(rows)
    }

    fn write_summary(&self, report: &RunReport) -> Result<PathBuf, StorageError> {
        self.inner.write_summary(report)
    }
}

#[test]
fn storage_failure_still_backs_up_everything_scored() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = JsonDumpSource::open(&write_dump(dir.path()), 100, 50).unwrap();
    let mut store = FlakyStore {
        inner: JsonWorkbookStore::new(dir.path(), "blackmirror"),
        ok_writes: 1,
        attempts: 0,
    };

    let err = pipeline().run("blackmirror", &mut source, &mut store).unwrap_err();
    assert!(format!("{err:#}").contains("San Junipero"));
    // checkpoint, failing checkpoint, failing flush
    assert_eq!(store.attempts, 3);

    let primary = store.inner.load().unwrap();
    assert_eq!(primary.posts.len(), 1);

    let found = backups(dir.path());
    assert_eq!(found.len(), 1);
    let backup: Workbook = serde_json::from_slice(&std::fs::read(&found[0]).unwrap()).unwrap();
    assert_eq!(backup.posts.len(), 2);
    assert_eq!(backup.comments.len(), 4);
    assert!(backup.posts[1].sentiment_polarity.unwrap() > 0.5);
}
