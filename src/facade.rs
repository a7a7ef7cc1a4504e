//! Jiraの検索結果やIssue・コメントをテーブルとして取り出すファサード

use crate::cell::Cell;
use crate::client::{JiraApi, JiraClient};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flatten::{AllowList, flatten_row, objects_to_table, rows_to_table};
use crate::models::{Issue, IssueParams};
use crate::pager::{DEFAULT_PAGE_SIZE, IssuePager};
use crate::table::Table;

/// Issueテーブルのインデックス列
pub const ISSUE_INDEX: &str = "key";

/// コメントテーブルのインデックス列
pub const COMMENT_INDEX: &str = "id";

/// ファサードの動作設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOptions {
    /// 検索1回あたりの取得件数
    pub page_size: u32,
    /// `fields` レベルの列の後ろに追加するカスタムフィールドID
    pub custom_fields: Vec<String>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            custom_fields: Vec::new(),
        }
    }
}

impl FrameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn custom_fields(mut self, fields: Vec<String>) -> Self {
        self.custom_fields = fields;
        self
    }
}

/// 1本の接続を保持するファサード
///
/// 呼び出しは1つの呼び出し元から順番に行う前提。
/// [`JiraFrame::close`] またはドロップで接続を解放する。
pub struct JiraFrame {
    api: Box<dyn JiraApi>,
    page_size: u32,
    issue_columns: AllowList,
    field_columns: AllowList,
    comment_columns: AllowList,
}

impl std::fmt::Debug for JiraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraFrame")
            .field("api", &"<JiraApi>")
            .field("page_size", &self.page_size)
            .field("field_columns", &self.field_columns)
            .finish()
    }
}

impl JiraFrame {
    /// 資格情報で接続し、サーバーに対して認証を確認する
    pub async fn open(credentials: &Credentials) -> Result<Self> {
        Self::open_with(credentials, FrameOptions::default()).await
    }

    pub async fn open_with(credentials: &Credentials, options: FrameOptions) -> Result<Self> {
        let client = JiraClient::new(credentials.to_config()?)?;
        Self::connect(Box::new(client), options).await
    }

    /// 任意の `JiraApi` 実装の上にファサードを作る
    pub async fn connect(api: Box<dyn JiraApi>, options: FrameOptions) -> Result<Self> {
        if options.page_size == 0 {
            return Err(Error::InvalidInput("page size must be positive".to_string()));
        }
        let issue_columns = AllowList::issue();
        if let Some(clash) = options
            .custom_fields
            .iter()
            .find(|name| issue_columns.contains(name.as_str()))
        {
            return Err(Error::InvalidInput(format!(
                "custom field '{}' collides with an issue-level column",
                clash
            )));
        }

        match api.myself().await {
            Ok(user) => {
                tracing::info!(user = %user.display_name, "connected to Jira");
            }
            Err(err) => {
                if let Error::AuthenticationFailed(_) = &err {
                    tracing::warn!("Jira rejected the supplied credentials");
                }
                return Err(err);
            }
        }

        Ok(Self {
            api,
            page_size: options.page_size,
            issue_columns,
            field_columns: AllowList::fields().with(options.custom_fields),
            comment_columns: AllowList::comments(),
        })
    }

    /// 開いて `body` を実行し、成否にかかわらず閉じる
    pub async fn scoped<T, F>(credentials: &Credentials, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&JiraFrame) -> Result<T>,
    {
        let frame = Self::open(credentials).await?;
        frame.run_scoped(body).await
    }

    /// 既存の `JiraApi` 実装で [`JiraFrame::scoped`] と同じことをする
    pub async fn scoped_with<T, F>(
        api: Box<dyn JiraApi>,
        options: FrameOptions,
        body: F,
    ) -> Result<T>
    where
        F: AsyncFnOnce(&JiraFrame) -> Result<T>,
    {
        let frame = Self::connect(api, options).await?;
        frame.run_scoped(body).await
    }

    async fn run_scoped<T, F>(self, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&JiraFrame) -> Result<T>,
    {
        let outcome = body(&self).await;
        if let Err(err) = &outcome {
            tracing::debug!(error = %err, "scoped body failed, closing session");
        }
        self.close();
        outcome
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Issueテーブルの列（Issueレベル + fieldsレベル）
    pub fn issue_columns(&self) -> Vec<String> {
        self.issue_columns
            .names()
            .iter()
            .chain(self.field_columns.names())
            .cloned()
            .collect()
    }

    pub fn comment_columns(&self) -> &[String] {
        self.comment_columns.names()
    }

    /// JQLの検索結果をページ単位で取り出すページャー
    ///
    /// 検索で返すフィールドは `fields` レベルの列に絞る。
    pub fn pager(&self, jql: &str) -> Result<IssuePager<'_>> {
        Ok(IssuePager::new(self.api.as_ref(), jql, self.page_size)?
            .fields(self.field_columns.names().to_vec()))
    }

    /// JQLにヒットする全Issueを1行1Issueのテーブルにする（インデックスはIssueキー）
    ///
    /// 途中のページ取得に失敗した場合は取得済みのページを捨ててエラーを返す。
    pub async fn query(&self, jql: &str) -> Result<Table> {
        let mut pager = self.pager(jql)?;
        let issues = pager.collect_all().await?;
        tracing::info!(
            jql,
            issues = issues.len(),
            rounds = pager.rounds(),
            "query complete"
        );
        self.issues_to_table(&issues)
    }

    /// 1件のIssueを取得して1行のテーブルにする
    pub async fn issue(
        &self,
        id: &str,
        fields: Option<Vec<String>>,
        expand: Option<Vec<String>>,
    ) -> Result<Table> {
        let params = IssueParams { fields, expand };
        let issue = self.api.get_issue(id, params).await?;
        tracing::debug!(id, key = %issue.key, "fetched issue");
        self.issues_to_table(std::slice::from_ref(&issue))
    }

    /// Issueのコメントを1行1コメントのテーブルにする（インデックスはコメントID）
    pub async fn comments(&self, issue: &str) -> Result<Table> {
        let comments = self.api.get_comments(issue).await?;
        tracing::debug!(issue, comments = comments.len(), "fetched comments");
        objects_to_table(&comments, &self.comment_columns, Some(COMMENT_INDEX))
    }

    /// 接続を解放する
    pub fn close(self) {
        drop(self);
    }

    fn issues_to_table(&self, issues: &[Issue]) -> Result<Table> {
        let issue_table = objects_to_table(issues, &self.issue_columns, Some(ISSUE_INDEX))?;
        let field_rows: Vec<Vec<Cell>> = issues
            .iter()
            .map(|issue| flatten_row(&issue.fields, &self.field_columns))
            .collect();
        let field_table = rows_to_table(field_rows, &self.field_columns, None)?;
        issue_table.join(field_table)
    }
}

impl Drop for JiraFrame {
    fn drop(&mut self) {
        tracing::info!("Jira session closed");
    }
}
