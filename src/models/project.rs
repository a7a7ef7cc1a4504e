use serde::{Deserialize, Serialize};

/// Issueの `project` フィールドに埋め込まれるプロジェクト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "self")]
    #[serde(default)]
    pub self_url: String,
    #[serde(rename = "projectTypeKey")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simplified: Option<bool>,
}
