//! JQLの検索結果をテーブルとして表示する
//!
//! ```
//! cargo run --example query_table -- "project = TEST ORDER BY created DESC"
//! ```
//! 資格情報はカレントディレクトリの `jira_credentials.ini`、
//! 無ければ環境変数（`.env` を含む）から読み込む。

use jira_frame::{Credentials, FrameOptions, JiraFrame};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jira_frame=info".parse()?))
        .init();

    let jql = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ORDER BY created DESC".to_string());
    let custom_fields: Vec<String> = std::env::args().skip(2).collect();

    let credentials = Credentials::from_default_location().or_else(|_| Credentials::from_env())?;
    let options = FrameOptions::new().custom_fields(custom_fields);

    let frame = JiraFrame::open_with(&credentials, options).await?;
    let result = frame.query(&jql).await;
    frame.close();

    let table = result?;
    println!("{}", table);
    println!("{} issues", table.len());
    Ok(())
}
