use super::Issue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchParams {
    #[serde(rename = "startAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u32>,

    #[serde(rename = "maxResults")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<Vec<String>>,

    #[serde(rename = "validateQuery")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_query: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "startAt")]
    pub start_at: u32,

    #[serde(rename = "maxResults")]
    pub max_results: u32,

    pub total: u32,

    pub issues: Vec<Issue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(mut self, start_at: u32) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn expand(mut self, expand: Vec<String>) -> Self {
        self.expand = Some(expand);
        self
    }

    pub fn validate_query(mut self, validate: bool) -> Self {
        self.validate_query = Some(validate);
        self
    }

    /// `page_index` 番目のページ（0始まり）を指すように `startAt` と `maxResults` を設定
    pub fn page(self, page_size: u32, page_index: u32) -> Self {
        self.start_at(page_size.saturating_mul(page_index))
            .max_results(page_size)
    }
}

impl SearchResult {
    /// 要求したページサイズより短いページかどうか（検索結果の終端を示す）
    pub fn is_short_page(&self, page_size: u32) -> bool {
        (self.issues.len() as u32) < page_size
    }
}
