use crate::client::JiraApi;
use crate::error::{Error, Result};
use crate::models::{Issue, SearchParams};

/// 1回の検索リクエストで取得する件数
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// JQL検索結果をページ単位で遅延取得するページャー
///
/// `startAt = page_size * ページ番号` で順に取得し、要求件数より短い
/// ページ（空のページを含む）を返した時点で終端となる。
/// [`IssuePager::reset`] で先頭から取り直せる。
pub struct IssuePager<'a> {
    api: &'a dyn JiraApi,
    jql: String,
    page_size: u32,
    fields: Option<Vec<String>>,
    page_index: u32,
    exhausted: bool,
}

impl<'a> IssuePager<'a> {
    pub fn new(api: &'a dyn JiraApi, jql: impl Into<String>, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidInput("page size must be positive".to_string()));
        }
        Ok(Self {
            api,
            jql: jql.into(),
            page_size,
            fields: None,
            page_index: 0,
            exhausted: false,
        })
    }

    /// 検索で返すフィールドを絞る
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// 直近の `reset` 以降に実行した検索リクエスト数
    pub fn rounds(&self) -> u32 {
        self.page_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// 次のページを取得する。終端に達していれば `None`
    ///
    /// リクエストが失敗した場合はページ位置を進めずにエラーを返す。
    pub async fn next_page(&mut self) -> Result<Option<Vec<Issue>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut params = SearchParams::new().page(self.page_size, self.page_index);
        if let Some(fields) = &self.fields {
            params = params.fields(fields.clone());
        }
        let start_at = params.start_at.unwrap_or_default();

        let result = self.api.search_issues(&self.jql, params).await?;
        self.page_index += 1;
        self.exhausted = result.is_short_page(self.page_size);

        tracing::debug!(
            start_at,
            page_size = self.page_size,
            received = result.issues.len(),
            last = self.exhausted,
            "fetched search page"
        );

        Ok(Some(result.issues))
    }

    /// 先頭ページから取り直す
    pub fn reset(&mut self) {
        self.page_index = 0;
        self.exhausted = false;
    }

    /// 残りのページをすべて取得して連結する
    pub async fn collect_all(&mut self) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        while let Some(page) = self.next_page().await? {
            issues.extend(page);
        }
        Ok(issues)
    }
}
