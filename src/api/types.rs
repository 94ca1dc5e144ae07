use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier as the server sends it. Posts and users carry numeric ids, but
/// string ids are accepted and echoed back in the same form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Num(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Num(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Num(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub created_by: Option<Author>,
}

impl Post {
    pub fn author(&self) -> Option<&str> {
        self.created_by.as_ref().and_then(|a| a.username.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Author {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest<'a> {
    pub post_id: &'a EntityId,
    pub comment: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentResponse {
    #[serde(default)]
    pub comment: Option<IdOnly>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdOnly {
    #[serde(default)]
    pub id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub object_key: Option<String>,
}

/// Short-lived permission to write one object straight to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub upload_url: String,
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub caption: String,
    pub image_url: String,
    // Always serialized, as an explicit null.
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostResponse {
    #[serde(default)]
    pub post: Option<IdOnly>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parses_numeric_and_missing_fields() {
        let json = r#"{"posts":[
            {"id": 7, "caption": "hi", "createdBy": {"username": "bob"}},
            {"id": "p9"},
            {"caption": "no id"}
        ]}"#;
        let feed: FeedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(feed.posts.len(), 3);
        assert_eq!(feed.posts[0].id, Some(EntityId::Num(7)));
        assert_eq!(feed.posts[0].author(), Some("bob"));
        assert_eq!(feed.posts[1].id, Some(EntityId::from("p9")));
        assert_eq!(feed.posts[1].author(), None);
        assert!(feed.posts[2].id.is_none());
    }

    #[test]
    fn test_empty_feed_body() {
        let feed: FeedResponse = serde_json::from_str("{}").unwrap();
        assert!(feed.posts.is_empty());
    }

    #[test]
    fn test_create_post_serializes_null_video() {
        let req = CreatePostRequest {
            caption: "c".to_string(),
            image_url: "http://x/images/a.jpg".to_string(),
            video_url: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"caption": "c", "imageUrl": "http://x/images/a.jpg", "videoUrl": null})
        );
    }

    #[test]
    fn test_comment_request_keeps_id_form() {
        let id = EntityId::Num(12);
        let v = serde_json::to_value(CommentRequest { post_id: &id, comment: "yo" }).unwrap();
        assert_eq!(v, serde_json::json!({"postId": 12, "comment": "yo"}));
    }
}
