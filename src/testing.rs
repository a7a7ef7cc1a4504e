//! テスト用のインメモリ `JiraApi` 実装

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use crate::client::JiraApi;
use crate::error::{Error, Result};
use crate::models::{Comment, Issue, IssueParams, SearchParams, SearchResult, User};

pub(crate) fn make_issue(n: usize) -> Issue {
    serde_json::from_value(json!({
        "id": (10000 + n).to_string(),
        "key": format!("TEST-{}", n),
        "self": format!("https://example.atlassian.net/rest/api/3/issue/{}", 10000 + n),
        "fields": {
            "summary": format!("Issue {}", n),
            "status": {
                "id": "1",
                "name": "To Do",
                "self": "https://example.atlassian.net/rest/api/3/status/1",
                "statusCategory": { "id": 2, "key": "new", "name": "To Do", "colorName": "blue-gray" }
            },
            "created": "2024-01-01T00:00:00.000+0000",
            "customfield_10016": n
        }
    }))
    .expect("fixture issue must deserialize")
}

pub(crate) struct FakeJira {
    issues: Vec<Issue>,
    fail_at_offset: Option<u32>,
    reject_credentials: bool,
    offsets: Mutex<Vec<u32>>,
    fields: Mutex<Vec<Option<Vec<String>>>>,
    issue_requests: Mutex<Vec<(String, IssueParams)>>,
}

impl FakeJira {
    pub(crate) fn with_issues(count: usize) -> Self {
        Self {
            issues: (1..=count).map(make_issue).collect(),
            fail_at_offset: None,
            reject_credentials: false,
            offsets: Mutex::new(Vec::new()),
            fields: Mutex::new(Vec::new()),
            issue_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_at_offset(mut self, offset: u32) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub(crate) fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    pub(crate) fn search_offsets(&self) -> Vec<u32> {
        self.offsets.lock().unwrap().clone()
    }

    /// 検索ごとに要求された `fields`
    pub(crate) fn search_fields(&self) -> Vec<Option<Vec<String>>> {
        self.fields.lock().unwrap().clone()
    }

    pub(crate) fn issue_requests(&self) -> Vec<(String, IssueParams)> {
        self.issue_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JiraApi for FakeJira {
    async fn myself(&self) -> Result<User> {
        if self.reject_credentials {
            return Err(Error::AuthenticationFailed("Unauthorized".to_string()));
        }
        Ok(serde_json::from_value(json!({
            "accountId": "abc",
            "displayName": "Fake User"
        }))?)
    }

    async fn search_issues(&self, _jql: &str, params: SearchParams) -> Result<SearchResult> {
        let start = params.start_at.unwrap_or(0);
        let max = params.max_results.unwrap_or(50);
        self.offsets.lock().unwrap().push(start);
        self.fields.lock().unwrap().push(params.fields.clone());

        if self.fail_at_offset == Some(start) {
            return Err(Error::ApiError {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        let issues: Vec<Issue> = self
            .issues
            .iter()
            .skip(start as usize)
            .take(max as usize)
            .cloned()
            .collect();
        Ok(SearchResult {
            start_at: start,
            max_results: max,
            total: self.issues.len() as u32,
            issues,
            expand: None,
            names: None,
            schema: None,
        })
    }

    async fn get_issue(&self, id: &str, params: IssueParams) -> Result<Issue> {
        self.issue_requests
            .lock()
            .unwrap()
            .push((id.to_string(), params));
        self.issues
            .iter()
            .find(|issue| issue.key == id || issue.id == id)
            .cloned()
            .ok_or_else(|| Error::ApiError {
                status: 404,
                message: "Issue does not exist or you do not have permission to see it."
                    .to_string(),
            })
    }

    async fn get_comments(&self, issue: &str) -> Result<Vec<Comment>> {
        Ok(serde_json::from_value(json!([
            {
                "id": "1",
                "author": { "accountId": "a", "displayName": "Alice" },
                "body": format!("first on {}", issue),
                "created": "2024-01-03T10:00:00.000+0000"
            },
            {
                "id": "2",
                "author": { "accountId": "b", "displayName": "Bob" },
                "body": "second",
                "created": "2024-01-04T10:00:00.000+0000",
                "updateAuthor": { "accountId": "a", "displayName": "Alice" }
            }
        ]))?)
    }
}
