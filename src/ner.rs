//! Named-entity grounding.
//!
//! Recognition sits behind [`EntityRecognizer`] so the grounder does not care
//! whether spans come from the offline gazetteer or an external NER service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LexiconError, NerError};
use crate::lexicon::LexiconBank;
use crate::text::{is_blank, round3, PhraseSet};

/// Entity count at which grounding saturates.
const GROUNDING_SATURATION: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    Person,
    Org,
    Gpe,
    Product,
    Event,
    Norp,
    WorkOfArt,
    #[serde(other)]
    Other,
}

impl EntityCategory {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "PERSON" => EntityCategory::Person,
            "ORG" => EntityCategory::Org,
            "GPE" => EntityCategory::Gpe,
            "PRODUCT" => EntityCategory::Product,
            "EVENT" => EntityCategory::Event,
            "NORP" => EntityCategory::Norp,
            "WORK_OF_ART" => EntityCategory::WorkOfArt,
            _ => EntityCategory::Other,
        }
    }

    /// Categories that count as real-world grounding.
    pub fn is_grounding(&self) -> bool {
        matches!(
            self,
            EntityCategory::Person
                | EntityCategory::Org
                | EntityCategory::Gpe
                | EntityCategory::Product
                | EntityCategory::Event
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub category: EntityCategory,
    pub start: usize,
    pub end: usize,
}

pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>, NerError>;

    fn name(&self) -> &'static str;
}

/// Offline recognizer over the lexicon gazetteer. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    names: PhraseSet,
    labels: HashMap<String, EntityCategory>,
}

impl GazetteerRecognizer {
    pub fn new(lexicon: &LexiconBank) -> Result<Self, LexiconError> {
        let entries = lexicon.entities();
        let names = PhraseSet::case_sensitive(
            "gazetteer",
            &entries.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        )?;
        let labels = entries
            .iter()
            .map(|(name, label)| (collapse_ws(name), EntityCategory::parse(label)))
            .collect();
        Ok(Self { names, labels })
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>, NerError> {
        Ok(self
            .names
            .find_all(text)
            .into_iter()
            .map(|(start, end, surface)| {
                let category = self
                    .labels
                    .get(&collapse_ws(surface))
                    .cloned()
                    .unwrap_or(EntityCategory::Other);
                EntitySpan {
                    text: surface.to_string(),
                    category,
                    start,
                    end,
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "gazetteer"
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct NerResponse {
    #[serde(default)]
    entities: Vec<NerEntity>,
}

#[derive(Deserialize)]
struct NerEntity {
    text: String,
    label: String,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
}

/// Posts `{"text": ...}` to an external service that answers with
/// `{"entities": [{"text", "label", "start", "end"}]}` (spaCy-style labels).
#[derive(Debug, Clone)]
pub struct HttpEntityRecognizer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpEntityRecognizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NerError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl EntityRecognizer for HttpEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>, NerError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&NerRequest { text })
            .send()?;
        if !resp.status().is_success() {
            return Err(NerError::Status {
                status: resp.status().as_u16(),
            });
        }
        let body: NerResponse = resp.json()?;
        Ok(body
            .entities
            .into_iter()
            .map(|e| EntitySpan {
                category: EntityCategory::parse(&e.label),
                text: e.text,
                start: e.start,
                end: e.end,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grounding {
    /// Spans in grounding categories.
    pub count: usize,
    pub score: f64,
    pub entities: Vec<EntitySpan>,
}

impl Grounding {
    fn empty() -> Self {
        Self {
            count: 0,
            score: 0.0,
            entities: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct NamedEntityGrounder {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl NamedEntityGrounder {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Grounding score in [0, 1]; 0.0 for empty text or a failed recognizer.
    pub fn score(&self, text: &str) -> f64 {
        self.ground(text).score
    }

    pub fn ground(&self, text: &str) -> Grounding {
        if is_blank(text) {
            return Grounding::empty();
        }
        let spans = match self.recognizer.recognize(text) {
            Ok(spans) => spans,
            Err(e) => {
                warn!("Entity recognition failed, grounding set to 0 - recognizer={}, error={}", self.recognizer.name(), e);
                return Grounding::empty();
            }
        };
        let entities: Vec<EntitySpan> = spans.into_iter().filter(|s| s.category.is_grounding()).collect();
        let count = entities.len();
        let score = round3((count as f64 / GROUNDING_SATURATION).min(1.0));
        debug!("Entity grounding - count={}, score={}", count, score);
        Grounding { count, score, entities }
    }
}

impl std::fmt::Debug for NamedEntityGrounder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedEntityGrounder")
            .field("recognizer", &self.recognizer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn gazetteer() -> NamedEntityGrounder {
        let lex = LexiconBank::builtin().unwrap();
        NamedEntityGrounder::new(Arc::new(GazetteerRecognizer::new(&lex).unwrap()))
    }

    struct Failing;

    impl EntityRecognizer for Failing {
        fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>, NerError> {
            Err(NerError::Unavailable("down for maintenance".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn counts_grounding_categories_only() {
        let g = gazetteer().ground("Elon Musk and Google met in London to discuss Black Mirror.");
        assert_eq!(g.count, 3);
        assert_eq!(g.score, 0.6);
    }

    #[test]
    fn gazetteer_is_case_sensitive() {
        assert_eq!(gazetteer().score("a meta joke about apple pie"), 0.0);
    }

    #[test]
    fn saturates_at_five() {
        let s = gazetteer().score("Google, Meta, Apple, Tesla, Netflix and Microsoft");
        assert_eq!(s, 1.0);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(gazetteer().ground("  ").count, 0);
        assert_eq!(gazetteer().score(""), 0.0);
    }

    #[test]
    fn recognizer_failure_degrades_to_zero() {
        let g = NamedEntityGrounder::new(Arc::new(Failing));
        assert_eq!(g.score("Elon Musk"), 0.0);
    }

    #[test]
    fn category_labels_parse_and_deserialize() {
        assert_eq!(EntityCategory::parse("org"), EntityCategory::Org);
        assert_eq!(EntityCategory::parse("LAW"), EntityCategory::Other);
        let c: EntityCategory = serde_json::from_str("\"WORK_OF_ART\"").unwrap();
        assert_eq!(c, EntityCategory::WorkOfArt);
        let c: EntityCategory = serde_json::from_str("\"CARDINAL\"").unwrap();
        assert_eq!(c, EntityCategory::Other);
    }

    /// Answers exactly one HTTP request with `body`.
    fn one_shot_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let raw = String::from_utf8_lossy(&buf);
                if let Some(head_end) = raw.find("\r\n\r\n") {
                    let len = raw[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + len {
                        break;
                    }
                }
            }
            let resp = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(resp.as_bytes()).unwrap();
        });
        format!("http://{addr}/ner")
    }

    #[test]
    fn http_recognizer_maps_labels() {
        let url = one_shot_server(
            "200 OK",
            r#"{"entities":[{"text":"Elon Musk","label":"PERSON","start":0,"end":9},{"text":"2024","label":"DATE","start":13,"end":17}]}"#,
        );
        let ner = HttpEntityRecognizer::new(url, Duration::from_secs(5)).unwrap();
        let g = NamedEntityGrounder::new(Arc::new(ner));
        let grounding = g.ground("Elon Musk in 2024");
        assert_eq!(grounding.count, 1);
        assert_eq!(grounding.score, 0.2);
        assert_eq!(grounding.entities[0].category, EntityCategory::Person);
    }

    #[test]
    fn http_error_status_degrades_to_zero() {
        let url = one_shot_server("503 Service Unavailable", r#"{"error":"busy"}"#);
        let ner = HttpEntityRecognizer::new(url, Duration::from_secs(5)).unwrap();
        let err = ner.recognize("Elon Musk").unwrap_err();
        assert!(matches!(err, NerError::Status { status: 503 }));
    }
}
