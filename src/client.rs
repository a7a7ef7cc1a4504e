use crate::error::{Error, Result};
use crate::models::{Comment, CommentPage, Issue, IssueParams, SearchParams, SearchResult, User};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone)]
pub enum Auth {
    Basic { username: String, api_token: String },
    Bearer { token: String },
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub auth: Auth,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into();

        let _ = Url::parse(&base_url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        // 末尾のスラッシュはエンドポイント結合時に二重になるため落とす
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { base_url, auth })
    }

    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("JIRA_URL").map_err(|_| {
            Error::ConfigurationMissing("JIRA_URL not found in environment".to_string())
        })?;

        let username = env::var("JIRA_USER").map_err(|_| {
            Error::ConfigurationMissing("JIRA_USER not found in environment".to_string())
        })?;

        let api_token = env::var("JIRA_API_TOKEN").map_err(|_| {
            Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string())
        })?;

        let auth = Auth::Basic { username, api_token };

        Self::new(base_url, auth)
    }
}

/// リモートのJira APIのうち、このクレートが使う操作の抽象
///
/// ファサードとページャーはこのトレイト越しにだけ通信するので、
/// テストでは任意の実装に差し替えられる。
#[async_trait]
pub trait JiraApi: Send + Sync {
    /// 認証済みユーザーを取得（資格情報の検証に使う）
    async fn myself(&self) -> Result<User>;

    async fn search_issues(&self, jql: &str, params: SearchParams) -> Result<SearchResult>;

    async fn get_issue(&self, id: &str, params: IssueParams) -> Result<Issue>;

    async fn get_comments(&self, issue: &str) -> Result<Vec<Comment>>;
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<JiraConfig>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // 認証ヘッダーを追加
        let auth_value = match &config.auth {
            Auth::Basic { username, api_token } => {
                let raw = format!("{}:{}", username, api_token);
                let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
                format!("Basic {}", encoded)
            }
            Auth::Bearer { token } => format!("Bearer {}", token),
        };
        let mut auth_header = header::HeaderValue::from_str(&auth_value)
            .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?;
        auth_header.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_header);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub(crate) async fn get<T>(&self, endpoint: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get_with_query(endpoint, &[]).await
    }

    pub(crate) async fn get_with_query<T>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        tracing::trace!(%url, "GET");

        let response = self.client.get(&url).query(query).send().await?;

        Self::decode(response).await
    }

    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        tracing::trace!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;

        Self::decode(response).await
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::UNAUTHORIZED {
                return Err(Error::AuthenticationFailed(message));
            }
            return Err(Error::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

#[async_trait]
impl JiraApi for JiraClient {
    async fn myself(&self) -> Result<User> {
        self.get("/rest/api/3/myself").await
    }

    async fn search_issues(&self, jql: &str, params: SearchParams) -> Result<SearchResult> {
        let mut body = serde_json::json!({
            "jql": jql
        });

        // SearchParamsの値をリクエストボディにマージ
        if let Some(start_at) = params.start_at {
            body["startAt"] = start_at.into();
        }
        if let Some(max_results) = params.max_results {
            body["maxResults"] = max_results.into();
        }
        if let Some(fields) = params.fields {
            body["fields"] = fields.into();
        }
        if let Some(expand) = params.expand {
            body["expand"] = expand.into();
        }
        if let Some(validate_query) = params.validate_query {
            body["validateQuery"] = validate_query.into();
        }

        self.post("/rest/api/3/search", &body).await
    }

    async fn get_issue(&self, id: &str, params: IssueParams) -> Result<Issue> {
        let endpoint = format!("/rest/api/3/issue/{}", urlencoding::encode(id));
        self.get_with_query(&endpoint, &params.to_query()).await
    }

    async fn get_comments(&self, issue: &str) -> Result<Vec<Comment>> {
        let endpoint = format!("/rest/api/3/issue/{}/comment", urlencoding::encode(issue));
        let page: CommentPage = self.get(&endpoint).await?;
        if page.comments.len() < page.total as usize {
            tracing::warn!(
                issue,
                received = page.comments.len(),
                total = page.total,
                "comment listing was truncated by the server"
            );
        }
        Ok(page.comments)
    }
}
