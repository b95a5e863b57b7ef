use serde::{Deserialize, Serialize};

/// One post as written by the retrieval collaborator, comments nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub topic: String,
    #[serde(default, alias = "post_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, alias = "selftext")]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub created_utc: f64, // unix seconds
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComment {
    #[serde(default, alias = "comment_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub created_utc: f64, // unix seconds
    #[serde(default)]
    pub score: i64,
}
