//! エラーシナリオテスト
//!
//! 失敗はすべて呼び出し元へそのまま伝わることを確認する：
//! 1. 資格情報ファイルの欠落・破損
//! 2. 認証エラー
//! 3. ページング途中のサーバーエラー
//! 4. 存在しないIssue

use jira_frame::{Credentials, Error, JiraFrame};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials_for(server: &MockServer) -> Credentials {
    Credentials::new("test_token", "test@example.com", server.uri()).unwrap()
}

async fn mount_myself(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "557058:f58131cb",
            "displayName": "Test User"
        })))
        .mount(server)
        .await;
}

fn minimal_issue(n: usize) -> serde_json::Value {
    json!({
        "id": (10000 + n).to_string(),
        "key": format!("TEST-{}", n),
        "self": format!("https://example.atlassian.net/rest/api/3/issue/{}", 10000 + n),
        "fields": { "summary": format!("Issue {}", n) }
    })
}

#[test]
fn test_missing_credentials_file() {
    let dir = tempfile::tempdir().unwrap();

    let result = Credentials::from_file(dir.path().join("jira_credentials.ini"));

    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_plain_ini_credentials_file() {
    // Given: クォート無しで書かれたINIファイル
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[CREDENTIALS]\nTOKEN = abc123\nUSER = me@example.com\nURL = https://x.atlassian.net"
    )
    .unwrap();

    // When
    let credentials = Credentials::from_file(file.path()).unwrap();

    // Then: 値がそのまま読める
    assert_eq!(credentials.token, "abc123");
    assert_eq!(credentials.user, "me@example.com");
    assert_eq!(credentials.url, "https://x.atlassian.net");
}

#[test]
fn test_malformed_credentials_file() {
    // セクション見出しが閉じていない
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[CREDENTIALS\nTOKEN = abc").unwrap();

    let result = Credentials::from_file(file.path());

    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_credentials_with_invalid_url() {
    let contents = "[CREDENTIALS]\nTOKEN = \"t\"\nUSER = \"u\"\nURL = \"not a url\"\n";

    let result = Credentials::parse(contents);

    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[tokio::test]
async fn test_open_with_rejected_credentials() {
    // Given: 401を返すサーバー
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Client must be authenticated"))
        .expect(1)
        .mount(&server)
        .await;

    // When
    let result = JiraFrame::open(&credentials_for(&server)).await;

    // Then: AuthenticationFailed がそのまま返る
    match result {
        Err(Error::AuthenticationFailed(msg)) => assert_eq!(msg, "Client must be authenticated"),
        other => panic!("Expected AuthenticationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_mid_pagination_fails_whole_query() {
    // Given: 1ページ目は成功し、2ページ目で500
    let server = MockServer::start().await;
    mount_myself(&server).await;

    let first_page: Vec<_> = (1..=50).map(minimal_issue).collect();
    Mock::given(method("POST"))
        .and(path("/rest/api/3/search"))
        .and(body_partial_json(json!({ "startAt": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 120,
            "issues": first_page
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/search"))
        .and(body_partial_json(json!({ "startAt": 50 })))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;
    // 3ページ目は要求されない
    Mock::given(method("POST"))
        .and(path("/rest/api/3/search"))
        .and(body_partial_json(json!({ "startAt": 100 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 100, "maxResults": 50, "total": 120, "issues": []
        })))
        .expect(0)
        .mount(&server)
        .await;

    // When
    let result = JiraFrame::scoped(&credentials_for(&server), async |frame| {
        frame.query("project = TEST").await
    })
    .await;

    // Then: 部分結果は返らない
    match result {
        Err(Error::ApiError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("Expected ApiError, got {:?}", other.map(|t| t.len())),
    }
}

#[tokio::test]
async fn test_unknown_issue() {
    let server = MockServer::start().await;
    mount_myself(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/NOPE-1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("Issue does not exist or you do not have permission to see it."),
        )
        .mount(&server)
        .await;

    let frame = JiraFrame::open(&credentials_for(&server)).await.unwrap();
    let result = frame.issue("NOPE-1", None, None).await;
    frame.close();

    assert!(matches!(result, Err(Error::ApiError { status: 404, .. })));
}

#[tokio::test]
async fn test_malformed_search_response() {
    let server = MockServer::start().await;
    mount_myself(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let frame = JiraFrame::open(&credentials_for(&server)).await.unwrap();
    let result = frame.query("project = TEST").await;

    // reqwest の JSON デコードエラー
    assert!(matches!(result, Err(Error::RequestFailed(_))));
}
