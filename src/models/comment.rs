use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>, // 文字列またはADF形式のオブジェクト
    #[serde(rename = "updateAuthor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_author: Option<User>,
    #[serde(default, with = "super::datetime::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "super::datetime::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(rename = "jsdPublic")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsd_public: Option<bool>,
}

/// `/rest/api/3/issue/{id}/comment` のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(rename = "startAt")]
    pub start_at: u32,

    #[serde(rename = "maxResults")]
    pub max_results: u32,

    pub total: u32,

    pub comments: Vec<Comment>,
}
