use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Time cell in a tidy table, shaped by the requested time format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeValue {
    Date(NaiveDate),
    Num(f64),
    Raw(String),
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Date(date) => write!(f, "{date}"),
            TimeValue::Num(num) => write!(f, "{num}"),
            TimeValue::Raw(label) => write!(f, "{label}"),
        }
    }
}

/// Storage for one dimension column: plain strings, or a categorical
/// encoding whose level order preserves first appearance in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnData {
    Plain(Vec<String>),
    Categorical { levels: Vec<String>, codes: Vec<u32> },
}

impl ColumnData {
    pub fn categorical_from(values: Vec<String>) -> Self {
        let mut levels = Vec::new();
        let mut index = HashMap::new();
        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            let code = *index.entry(value.clone()).or_insert_with(|| {
                levels.push(value);
                (levels.len() - 1) as u32
            });
            codes.push(code);
        }
        ColumnData::Categorical { levels, codes }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Plain(values) => values.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Plain(values) => values.get(row).map(String::as_str),
            ColumnData::Categorical { levels, codes } => codes
                .get(row)
                .and_then(|code| levels.get(*code as usize))
                .map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionColumn {
    pub name: String,
    pub data: ColumnData,
}

/// Long-form table: one dimension column per key part, plus `time` and
/// `values`. All columns are the same length; missing observations are
/// `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyTable {
    pub dimensions: Vec<DimensionColumn>,
    pub time: Vec<TimeValue>,
    pub values: Vec<Option<f64>>,
}

impl TidyTable {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        let mut names = self
            .dimensions
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();
        names.push("time");
        names.push("values");
        names
    }

    pub fn dimension(&self, name: &str) -> Option<&DimensionColumn> {
        self.dimensions.iter().find(|column| column.name == name)
    }
}
