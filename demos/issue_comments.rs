//! 1件のIssueとそのコメントを表示する
//!
//! ```
//! cargo run --example issue_comments -- TEST-1
//! ```

use jira_frame::{Credentials, JiraFrame};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let key = std::env::args()
        .nth(1)
        .ok_or("usage: issue_comments <ISSUE-KEY>")?;
    let credentials = Credentials::from_default_location().or_else(|_| Credentials::from_env())?;

    let (issue, comments) = JiraFrame::scoped(&credentials, async |frame| {
        let issue = frame.issue(&key, None, Some(vec!["renderedFields".to_string()])).await?;
        let comments = frame.comments(&key).await?;
        Ok((issue, comments))
    })
    .await?;

    println!("{}", issue);
    println!("{}", comments);
    println!("{}", serde_json::to_string_pretty(&comments.to_records())?);
    Ok(())
}
