//! リモートオブジェクトを許可リストに従ってフラットな行に変換する
//!
//! 各オブジェクト種別は [`Flatten`] で属性名から値への対応を明示的に定義する。
//! 行の列順は常に許可リストの宣言順になる。

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::models::{Comment, Issue, IssueFields};
use crate::table::Table;

/// Issue レベルの列
pub const ISSUE_COLUMNS: &[&str] = &["id", "key", "self"];

/// `fields` レベルの列
pub const FIELD_COLUMNS: &[&str] = &[
    "summary",
    "issuetype",
    "status",
    "priority",
    "assignee",
    "reporter",
    "created",
    "updated",
    "resolutiondate",
    "project",
    "description",
];

/// コメントの列
pub const COMMENT_COLUMNS: &[&str] = &["id", "author", "body", "created", "updated", "updateAuthor"];

/// 行の値として取り出す属性名の順序付きリスト（重複なし）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self { names: Vec::new() };
        list.extend(names);
        list
    }

    pub fn issue() -> Self {
        Self::new(ISSUE_COLUMNS.iter().copied())
    }

    pub fn fields() -> Self {
        Self::new(FIELD_COLUMNS.iter().copied())
    }

    pub fn comments() -> Self {
        Self::new(COMMENT_COLUMNS.iter().copied())
    }

    /// 末尾に名前を追加する。既にある名前は無視
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.names.contains(&name) {
                self.names.push(name);
            }
        }
    }

    pub fn with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend(names);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// 属性名から値を引く明示的なマッピング
pub trait Flatten {
    /// 未知の属性名、またはオブジェクトに存在しない属性は `None`
    fn attribute(&self, name: &str) -> Option<Cell>;
}

impl Flatten for Issue {
    fn attribute(&self, name: &str) -> Option<Cell> {
        match name {
            "id" => Some(self.id.as_str().into()),
            "key" => Some(self.key.as_str().into()),
            "self" => Some(self.self_url.as_str().into()),
            _ => None,
        }
    }
}

impl Flatten for IssueFields {
    fn attribute(&self, name: &str) -> Option<Cell> {
        let cell = match name {
            "summary" => self.summary.clone().into(),
            "issuetype" => self.issue_type.as_ref().map(|t| t.name.clone()).into(),
            "status" => self.status.as_ref().map(|s| s.name.clone()).into(),
            "priority" => self.priority.as_ref().map(|p| p.name.clone()).into(),
            "assignee" => self.assignee.as_ref().map(|u| u.display_name.clone()).into(),
            "reporter" => self.reporter.as_ref().map(|u| u.display_name.clone()).into(),
            "created" => self.created.into(),
            "updated" => self.updated.into(),
            "resolutiondate" => self.resolution_date.into(),
            "project" => self.project.as_ref().map(|p| p.key.clone()).into(),
            "description" => self
                .description
                .as_ref()
                .map(Cell::from_json)
                .unwrap_or(Cell::Null),
            other => return self.custom_fields.get(other).map(Cell::from_json),
        };
        Some(cell)
    }
}

impl Flatten for Comment {
    fn attribute(&self, name: &str) -> Option<Cell> {
        let cell = match name {
            "id" => self.id.as_str().into(),
            "author" => self.author.as_ref().map(|u| u.display_name.clone()).into(),
            "updateAuthor" => self
                .update_author
                .as_ref()
                .map(|u| u.display_name.clone())
                .into(),
            "body" => self.body.as_ref().map(Cell::from_json).unwrap_or(Cell::Null),
            "created" => self.created.into(),
            "updated" => self.updated.into(),
            _ => return None,
        };
        Some(cell)
    }
}

/// 1オブジェクトを許可リスト順の行に変換する。欠けた属性は `Null`
pub(crate) fn flatten_row<T: Flatten + ?Sized>(object: &T, allow: &AllowList) -> Vec<Cell> {
    allow
        .names()
        .iter()
        .map(|name| object.attribute(name).unwrap_or(Cell::Null))
        .collect()
}

/// 行の列を許可リストの列名でテーブルにまとめ、`index_column` があればそれで索引付けする
pub(crate) fn rows_to_table(
    rows: Vec<Vec<Cell>>,
    allow: &AllowList,
    index_column: Option<&str>,
) -> Result<Table> {
    let mut table = Table::from_rows(allow.names().to_vec(), rows)?;
    if let Some(column) = index_column {
        if !allow.contains(column) {
            return Err(Error::InvalidInput(format!(
                "index column '{}' is not in the allow-list",
                column
            )));
        }
        table.set_index(column)?;
    }
    Ok(table)
}

/// オブジェクト列をそのままテーブルへ
pub(crate) fn objects_to_table<'a, T, I>(
    objects: I,
    allow: &AllowList,
    index_column: Option<&str>,
) -> Result<Table>
where
    T: Flatten + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let rows = objects
        .into_iter()
        .map(|object| flatten_row(object, allow))
        .collect();
    rows_to_table(rows, allow, index_column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_issue() -> Issue {
        serde_json::from_value(json!({
            "id": "10000",
            "key": "TEST-1",
            "self": "https://example.atlassian.net/rest/api/3/issue/10000",
            "fields": {
                "updated": "2024-01-02T00:00:00.000+0000",
                "summary": "Crash on start",
                "labels": ["a"],
                "status": {
                    "id": "1",
                    "name": "In Progress",
                    "self": "https://example.atlassian.net/rest/api/3/status/1",
                    "statusCategory": { "id": 4, "key": "indeterminate", "name": "In Progress", "colorName": "yellow" }
                },
                "assignee": {
                    "accountId": "abc",
                    "displayName": "Alice",
                    "self": "https://example.atlassian.net/rest/api/3/user?accountId=abc"
                },
                "customfield_10016": 5
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_allow_list_deduplicates() {
        let list = AllowList::new(["a", "b", "a"]).with(["c", "b"]);

        assert_eq!(list.names(), &["a", "b", "c"]);
    }

    #[test]
    fn test_row_follows_allow_list_order() {
        // JSON上は updated が summary より前にあるが、行は許可リスト順
        let issue = sample_issue();
        let allow = AllowList::new(["summary", "status", "updated"]);

        let row = flatten_row(&issue.fields, &allow);

        assert_eq!(row[0], Cell::from("Crash on start"));
        assert_eq!(row[1], Cell::from("In Progress"));
        assert!(matches!(row[2], Cell::Timestamp(_)));
    }

    #[test]
    fn test_missing_and_unknown_attributes_are_null() {
        let issue = sample_issue();
        let allow = AllowList::new(["reporter", "no_such_field"]);

        assert_eq!(flatten_row(&issue.fields, &allow), vec![Cell::Null, Cell::Null]);
    }

    #[test]
    fn test_extra_attributes_are_ignored() {
        // labels はリモートにあるが許可リストに無いので列にならない
        let issue = sample_issue();

        let row = flatten_row(&issue.fields, &AllowList::fields());

        assert_eq!(row.len(), FIELD_COLUMNS.len());
    }

    #[test]
    fn test_custom_field_lookup() {
        let issue = sample_issue();
        let allow = AllowList::fields().with(["customfield_10016"]);

        let row = flatten_row(&issue.fields, &allow);

        assert_eq!(row.last(), Some(&Cell::Integer(5)));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let issue = sample_issue();
        let allow = AllowList::fields();

        assert_eq!(flatten_row(&issue.fields, &allow), flatten_row(&issue.fields, &allow));
    }

    #[test]
    fn test_issue_level_row() {
        let issue = sample_issue();

        let row = flatten_row(&issue, &AllowList::issue());

        assert_eq!(
            row,
            vec![
                Cell::from("10000"),
                Cell::from("TEST-1"),
                Cell::from("https://example.atlassian.net/rest/api/3/issue/10000"),
            ]
        );
    }

    #[test]
    fn test_rows_to_table_rejects_unknown_index() {
        let result = rows_to_table(Vec::new(), &AllowList::comments(), Some("key"));

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_objects_to_table_indexes_rows() {
        let comments: Vec<Comment> = serde_json::from_value(json!([
            { "id": "1", "body": "first", "author": { "accountId": "a", "displayName": "Alice" } },
            { "id": "2", "body": "second" }
        ]))
        .unwrap();

        let table = objects_to_table(&comments, &AllowList::comments(), Some("id")).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("1", "author"), Some(&Cell::from("Alice")));
        assert_eq!(table.get("2", "author"), Some(&Cell::Null));
    }
}
