use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{IssueType, Priority, Project, Status, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    pub self_url: String,
    #[serde(default)]
    pub fields: IssueFields,
}

/// Issueのフィールド群
///
/// `fields` フィルター付きで取得すると任意のフィールドが欠けるため、
/// すべてのシステムフィールドを `Option` として扱う。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>, // 文字列またはADF形式のオブジェクト
    #[serde(rename = "issuetype")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, with = "super::datetime::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "super::datetime::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(rename = "resolutiondate")]
    #[serde(default, with = "super::datetime::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,

    // カスタムフィールドは動的に追加
    #[serde(flatten)]
    pub custom_fields: HashMap<String, serde_json::Value>,
}

/// 単一Issue取得時のクエリパラメータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueParams {
    pub fields: Option<Vec<String>>,
    pub expand: Option<Vec<String>>,
}

impl IssueParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn expand(mut self, expand: Vec<String>) -> Self {
        self.expand = Some(expand);
        self
    }

    /// `?fields=a,b&expand=c` 形式のクエリペアに変換
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(fields) = &self.fields {
            query.push(("fields", fields.join(",")));
        }
        if let Some(expand) = &self.expand {
            query.push(("expand", expand.join(",")));
        }
        query
    }
}
