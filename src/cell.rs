use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// テーブルの1セル分の値
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 任意のJSON値をスカラーへ落とし込む
    ///
    /// オブジェクトは `value` / `name` / `displayName` / `key` の順で代表値を探し、
    /// ADFドキュメントならプレーンテキストに変換する。
    /// 配列は要素を文字列化して `", "` で連結する。
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(items) => {
                if items.is_empty() {
                    return Cell::Null;
                }
                let parts: Vec<String> = items
                    .iter()
                    .map(Cell::from_json)
                    .filter(|c| !c.is_null())
                    .map(|c| c.to_string())
                    .collect();
                Cell::Text(parts.join(", "))
            }
            Value::Object(map) => {
                if is_adf_document(value) {
                    return Cell::Text(adf_to_text(value));
                }
                for key in ["value", "name", "displayName", "key"] {
                    if let Some(inner) = map.get(key) {
                        return Cell::from_json(inner);
                    }
                }
                Cell::Text(value.to_string())
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
            Cell::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

fn is_adf_document(value: &serde_json::Value) -> bool {
    value.get("type").and_then(|t| t.as_str()) == Some("doc") && value.get("content").is_some()
}

/// ADF (Atlassian Document Format) のテキストノードを連結する
///
/// ブロック要素（段落・見出し・リスト項目など）の間は改行で区切る。
pub fn adf_to_text(value: &serde_json::Value) -> String {
    let mut blocks = Vec::new();
    collect_blocks(value, &mut blocks);
    blocks.join("\n")
}

fn collect_blocks(node: &serde_json::Value, blocks: &mut Vec<String>) {
    let Some(children) = node.get("content").and_then(|c| c.as_array()) else {
        return;
    };
    // インライン要素だけを持つノードは1ブロック
    if children.iter().all(is_inline) {
        let mut line = String::new();
        for child in children {
            push_inline(child, &mut line);
        }
        blocks.push(line);
        return;
    }
    for child in children {
        if is_inline(child) {
            let mut line = String::new();
            push_inline(child, &mut line);
            blocks.push(line);
        } else {
            collect_blocks(child, blocks);
        }
    }
}

fn is_inline(node: &serde_json::Value) -> bool {
    matches!(
        node.get("type").and_then(|t| t.as_str()),
        Some("text" | "hardBreak" | "mention" | "emoji" | "inlineCard")
    )
}

fn push_inline(node: &serde_json::Value, out: &mut String) {
    match node.get("type").and_then(|t| t.as_str()) {
        Some("text") => {
            if let Some(text) = node.get("text").and_then(|t| t.as_str()) {
                out.push_str(text);
            }
        }
        Some("hardBreak") => out.push('\n'),
        Some("mention") | Some("emoji") => {
            if let Some(text) = node.pointer("/attrs/text").and_then(|t| t.as_str()) {
                out.push_str(text);
            }
        }
        Some("inlineCard") => {
            if let Some(url) = node.pointer("/attrs/url").and_then(|t| t.as_str()) {
                out.push_str(url);
            }
        }
        _ => {}
    }
}
