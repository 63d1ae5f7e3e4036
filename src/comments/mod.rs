//! Comment records as delivered by the scrapers that feed the explorer.
//!
//! Two platforms supply comments and they disagree on field names, so several
//! fields exist twice. Accessors resolve them in a fixed order: the first
//! listed field wins when it is present and non-null.
//!
//! Scrapers are sloppy about types, so an optional field holding the wrong
//! kind of value reads as absent instead of failing the record.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::{AppError, Result};

pub mod present;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "string_or_number")]
    pub comment_id: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<RawTimestamp>,
    #[serde(
        default,
        rename = "commentAt",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment_at: Option<RawTimestamp>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub like_count: Option<u64>,
    #[serde(
        default,
        rename = "reactionsCount",
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub reactions_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub channel_owner_liked: bool,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient_replies")]
    pub replies: Vec<Comment>,
}

/// A timestamp as found in the feed: either a date string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            RawTimestamp::Text(text) => parse_timestamp(text),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Text(value.to_rfc3339())
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Text(value.to_string())
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Comment {
    pub fn new(id: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            comment_id: id.into(),
            author: Some(author.into()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn published_at(mut self, at: impl Into<RawTimestamp>) -> Self {
        self.published_at = Some(at.into());
        self
    }

    pub fn likes(mut self, count: u64) -> Self {
        self.like_count = Some(count);
        self
    }

    pub fn avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar = Some(url.into());
        self
    }

    pub fn owner_liked(mut self, liked: bool) -> Self {
        self.channel_owner_liked = liked;
        self
    }

    pub fn reply(mut self, reply: Comment) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn id(&self) -> &str {
        &self.comment_id
    }

    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or_default()
    }

    /// The first of `published_at` / `commentAt` that parses to a valid instant.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        [self.published_at.as_ref(), self.comment_at.as_ref()]
            .into_iter()
            .flatten()
            .find_map(RawTimestamp::resolve)
    }

    pub fn like_total(&self) -> u64 {
        self.like_count.or(self.reactions_count).unwrap_or(0)
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar.as_deref().filter(|url| !url.trim().is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Whole counts, also when written as floats or numeric strings.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(float_to_count)),
        Value::String(text) => text.trim().parse::<f64>().ok().and_then(float_to_count),
        _ => None,
    };
    Ok(number)
}

fn float_to_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<RawTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms.trunc() as i64))
            .map(RawTimestamp::Millis),
        Value::String(text) => Some(RawTimestamp::Text(text)),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    })
}

/// Replies that are not comment objects are dropped.
fn lenient_replies<'de, D>(deserializer: D) -> std::result::Result<Vec<Comment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| Comment::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Parses a feed that is either a bare array of comments or an object with a
/// `comments` array. Entries that are not comment objects are skipped.
pub fn parse_comments(json: &str) -> serde_json::Result<Vec<Comment>> {
    let items = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items,
        Value::Object(mut feed) => match feed.remove("comments") {
            Some(Value::Array(items)) => items,
            _ => return Err(feed_shape_error()),
        },
        _ => return Err(feed_shape_error()),
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(index, "Skipping feed entry that is not an object");
                return None;
            }
            match Comment::deserialize(item) {
                Ok(comment) => Some(comment),
                Err(error) => {
                    warn!(index, %error, "Skipping malformed comment");
                    None
                }
            }
        })
        .collect())
}

fn feed_shape_error() -> serde_json::Error {
    serde_json::Error::custom("expected an array of comments or an object with a `comments` array")
}

pub async fn load_comments(path: &Path) -> Result<Vec<Comment>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let comments = parse_comments(&raw).map_err(|source| AppError::CommentsFormat {
        path: path.to_path_buf(),
        source,
    })?;
    info!(count = comments.len(), path = %path.display(), "Loaded comments");
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_listed_field_wins() {
        let json = r#"[{
            "comment_id": "c1",
            "author": "alice",
            "text": "from text",
            "content": "from content",
            "like_count": 3,
            "reactionsCount": 9
        }]"#;
        let comments = parse_comments(json).expect("parse");
        assert_eq!(comments[0].body(), "from text");
        assert_eq!(comments[0].like_total(), 3);
    }

    #[test]
    fn falls_back_to_second_variant_when_first_is_null() {
        let json = r#"[{
            "comment_id": 42,
            "author": "bob",
            "text": null,
            "content": "instagram body",
            "like_count": null,
            "reactionsCount": 7,
            "published_at": null,
            "commentAt": "2024-05-01T10:00:00Z",
            "channel_owner_liked": null,
            "replies": null
        }]"#;
        let comments = parse_comments(json).expect("parse");
        let comment = &comments[0];
        assert_eq!(comment.id(), "42");
        assert_eq!(comment.body(), "instagram body");
        assert_eq!(comment.like_total(), 7);
        assert!(!comment.channel_owner_liked);
        assert!(comment.replies.is_empty());
        assert_eq!(
            comment.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_published_at_falls_through_to_comment_at() {
        let json = r#"{"comments": [{
            "comment_id": "x",
            "published_at": "not a date",
            "commentAt": 1714557600000
        }]}"#;
        let comments = parse_comments(json).expect("parse");
        assert_eq!(
            comments[0].timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn missing_fields_resolve_to_defaults() {
        let comments = parse_comments(r#"[{}]"#).expect("parse");
        let comment = &comments[0];
        assert_eq!(comment.id(), "");
        assert_eq!(comment.author_name(), "");
        assert_eq!(comment.body(), "");
        assert_eq!(comment.like_total(), 0);
        assert_eq!(comment.timestamp(), None);
        assert_eq!(comment.avatar_url(), None);
    }

    #[test]
    fn blank_avatar_is_treated_as_absent() {
        let comment = Comment::new("1", "a", "b").avatar("  ");
        assert_eq!(comment.avatar_url(), None);
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        for text in [
            "2023-01-02T03:04:05Z",
            "2023-01-02T03:04:05",
            "2023-01-02 03:04:05",
            "Mon, 02 Jan 2023 03:04:05 +0000",
        ] {
            assert_eq!(parse_timestamp(text), Some(expected), "{text}");
        }
        assert_eq!(
            parse_timestamp("2023-01-02"),
            Some(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn off_type_fields_do_not_sink_the_feed() {
        let json = r#"[
            {"comment_id": "ok", "author": "alice", "text": "fine", "like_count": 2},
            {"comment_id": "bad", "author": 17, "text": ["x"], "like_count": 1.0,
             "published_at": 1714557600000.0, "channel_owner_liked": 1, "avatar": {}}
        ]"#;
        let comments = parse_comments(json).expect("parse");
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].like_total(), 2);

        let bad = &comments[1];
        assert_eq!(bad.id(), "bad");
        assert_eq!(bad.author_name(), "17");
        assert_eq!(bad.body(), "");
        assert_eq!(bad.like_total(), 1);
        assert!(bad.channel_owner_liked);
        assert_eq!(bad.avatar_url(), None);
        assert_eq!(
            bad.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn negative_or_textual_counts() {
        let json = r#"[
            {"like_count": -3, "reactionsCount": "12"},
            {"like_count": "many"}
        ]"#;
        let comments = parse_comments(json).expect("parse");
        assert_eq!(comments[0].like_total(), 12);
        assert_eq!(comments[1].like_total(), 0);
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let json = r#"{"comments": [42, "text", ["a", "b"], {"comment_id": "c", "replies": [1, ["r0"], {"comment_id": "r"}]}]}"#;
        let comments = parse_comments(json).expect("parse");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].replies.len(), 1);
        assert_eq!(comments[0].replies[0].id(), "r");
    }

    #[test]
    fn wrong_feed_shape_is_an_error() {
        assert!(parse_comments("7").is_err());
        assert!(parse_comments(r#"{"items": []}"#).is_err());
        assert!(parse_comments(r#"{"comments": {}}"#).is_err());
        assert!(parse_comments("[").is_err());
    }
}
