//! 資格情報ファイルの読み込み
//!
//! ファイルは `[CREDENTIALS]` セクションひとつに `TOKEN` / `USER` / `URL`
//! の3つを持つINI形式:
//!
//! ```ini
//! [CREDENTIALS]
//! TOKEN = api-token
//! USER = someone@example.com
//! URL = https://example.atlassian.net
//! ```
//!
//! 値はクォートで囲んでもよい（TOML風に書かれたファイルもそのまま読める）。

use ini::{Ini, Properties};
use std::path::{Path, PathBuf};

use crate::client::{Auth, JiraConfig};
use crate::error::{Error, Result};

/// カレントディレクトリで探す既定のファイル名
pub const DEFAULT_CREDENTIALS_FILE: &str = "jira_credentials.ini";

/// 検証済みの資格情報
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user: String,
    pub url: String,
}

// トークンをログに出さない
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("url", &self.url)
            .finish()
    }
}

/// 資格情報を持つセクション名
const SECTION: &str = "CREDENTIALS";

impl Credentials {
    pub fn new(
        token: impl Into<String>,
        user: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            token: token.into(),
            user: user.into(),
            url: url.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// 文字列から読み込む
    pub fn parse(contents: &str) -> Result<Self> {
        let file = Ini::load_from_str(contents)?;
        let section = file
            .section(Some(SECTION))
            .or_else(|| file.section(Some(SECTION.to_lowercase())))
            .ok_or_else(|| {
                Error::ConfigurationMissing(format!("[{}] section not found", SECTION))
            })?;
        Self::new(
            entry(section, "TOKEN")?,
            entry(section, "USER")?,
            entry(section, "URL")?,
        )
    }

    /// ファイルから読み込む。ファイルが無い・壊れている場合はそのままエラーを返す
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading credentials file");
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// 既定の場所から読み込む
    ///
    /// カレントディレクトリの `jira_credentials.ini`、次にユーザー設定
    /// ディレクトリの `jira-frame/jira_credentials.ini` を探す。
    pub fn from_default_location() -> Result<Self> {
        let candidates = default_locations();
        let path = candidates.iter().find(|p| p.exists()).ok_or_else(|| {
            Error::ConfigurationMissing(format!(
                "{} not found (searched: {})",
                DEFAULT_CREDENTIALS_FILE,
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        Self::from_file(path)
    }

    /// 環境変数（`.env` を含む）から読み込む
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = JiraConfig::from_env()?;
        match config.auth {
            Auth::Basic { username, api_token } => Self::new(api_token, username, config.base_url),
            Auth::Bearer { .. } => Err(Error::Unexpected(
                "environment configuration produced bearer auth".to_string(),
            )),
        }
    }

    /// 接続設定に変換（USER + TOKEN のBasic認証）
    pub fn to_config(&self) -> Result<JiraConfig> {
        JiraConfig::new(
            self.url.clone(),
            Auth::Basic {
                username: self.user.clone(),
                api_token: self.token.clone(),
            },
        )
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("TOKEN", &self.token), ("USER", &self.user), ("URL", &self.url)] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfiguration(format!("{} is empty", name)));
            }
        }
        url::Url::parse(&self.url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;
        Ok(())
    }
}

// キーは大文字・小文字どちらの表記でもよい
fn entry(section: &Properties, key: &str) -> Result<String> {
    section
        .get(key)
        .or_else(|| section.get(key.to_lowercase()))
        .map(str::to_string)
        .ok_or_else(|| {
            Error::ConfigurationMissing(format!("{} missing from [{}]", key, SECTION))
        })
}

fn default_locations() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(DEFAULT_CREDENTIALS_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("jira-frame").join(DEFAULT_CREDENTIALS_FILE));
    }
    candidates
}
