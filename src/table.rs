use comfy_table::{ContentArrangement, presets};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::cell::Cell;
use crate::error::{Error, Result};

/// 列名付きの2次元テーブル。任意で1列を行ラベル（インデックス）に使う
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_name: Option<String>,
    index: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// 行の無いテーブル
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// 各行の長さは列数と一致していなければならない
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((pos, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::InvalidData(format!(
                "row {} has {} values but the table has {} columns",
                pos,
                row.len(),
                columns.len()
            )));
        }
        let index = (0..rows.len()).map(|i| i.to_string()).collect();
        Ok(Self {
            columns,
            index_name: None,
            index,
            rows,
        })
    }

    /// 指定列の値をインデックスにする（列自体は残す）
    pub fn set_index(&mut self, column: &str) -> Result<()> {
        let pos = self.column_position(column)?;
        self.index = self.rows.iter().map(|row| row[pos].to_string()).collect();
        self.index_name = Some(column.to_string());
        Ok(())
    }

    /// 同じ行数の2つのテーブルを横に連結する。インデックスは `self` のものを使う
    pub fn join(mut self, other: Table) -> Result<Self> {
        if self.rows.len() != other.rows.len() {
            return Err(Error::InvalidData(format!(
                "cannot join tables of {} and {} rows",
                self.rows.len(),
                other.rows.len()
            )));
        }
        if let Some(dup) = other.columns.iter().find(|c| self.columns.contains(*c)) {
            return Err(Error::InvalidData(format!("duplicate column '{}'", dup)));
        }
        self.columns.extend(other.columns);
        for (left, right) in self.rows.iter_mut().zip(other.rows) {
            left.extend(right);
        }
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// ラベルで行を引く
    pub fn row(&self, label: &str) -> Option<&[Cell]> {
        self.index
            .iter()
            .position(|l| l == label)
            .map(|pos| self.rows[pos].as_slice())
    }

    /// ラベルと列名でセルを引く
    pub fn get(&self, label: &str, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.row(label).map(|row| &row[col])
    }

    /// 列の値を上から順に
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let col = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[col]).collect())
    }

    /// `(ラベル, 行)` を順に返す
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// 1行1オブジェクトのJSON配列
    pub fn to_records(&self) -> Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    record.insert(
                        name.clone(),
                        serde_json::to_value(cell).unwrap_or(Value::Null),
                    );
                }
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }

    fn column_position(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::InvalidInput(format!("no such column '{}'", column)))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = comfy_table::Table::new();
        rendered
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let index_header = self.index_name.clone().unwrap_or_default();
        rendered.set_header(std::iter::once(index_header).chain(self.columns.iter().cloned()));
        for (label, row) in self.iter() {
            rendered.add_row(
                std::iter::once(label.to_string()).chain(row.iter().map(|c| c.to_string())),
            );
        }
        write!(f, "{}", rendered)
    }
}
