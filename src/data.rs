use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::QueryError;

/// Raw tabular dataset as produced by a loader: headers plus string cells.
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Header names of the five required listing fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub company: String,
    pub model: String,
    pub year: String,
    pub mileage: String,
    pub price: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            company: "회사".to_string(),
            model: "모델".to_string(),
            year: "연식(수)".to_string(),
            mileage: "키로수".to_string(),
            price: "가격(숫자)".to_string(),
        }
    }
}

/// One used-car listing with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub company: String,
    pub model: String,
    pub year: i32,
    /// Kilometers driven
    pub mileage: u64,
    /// Asking price in 만원
    pub price: u64,
}

/// Resolved column positions for one table.
struct ColumnIndex {
    company: usize,
    model: usize,
    year: usize,
    mileage: usize,
    price: usize,
}

impl RecordTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Create a RecordTable from a JSON Array of Objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value.as_array().ok_or_else(||
            anyhow!("Input data must be a JSON array of objects")
        )?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let objects = array
            .iter()
            .map(|item| item.as_object().ok_or_else(||
                anyhow!("Items in array must be objects")
            ))
            .collect::<Result<Vec<_>>>()?;

        // Headers are the union of keys, in first-seen order
        let mut headers: Vec<String> = Vec::new();
        for obj in &objects {
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(objects.len());
        for obj in objects {
            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Position of a header, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize, QueryError> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| QueryError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Extract typed listings in row order.
    ///
    /// Fails only when a required column is absent. Rows with a null or
    /// unparseable required field are dropped.
    pub fn listings(&self, columns: &ColumnMap) -> Result<Vec<Listing>, QueryError> {
        let index = ColumnIndex {
            company: self.column_index(&columns.company)?,
            model: self.column_index(&columns.model)?,
            year: self.column_index(&columns.year)?,
            mileage: self.column_index(&columns.mileage)?,
            price: self.column_index(&columns.price)?,
        };

        let mut listings = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            match parse_listing(row_idx + 1, row, &index, columns) {
                Ok(listing) => listings.push(listing),
                Err(err) => debug!("skipping listing: {}", err),
            }
        }

        Ok(listings)
    }
}

fn parse_listing(
    row_num: usize,
    row: &[String],
    index: &ColumnIndex,
    columns: &ColumnMap,
) -> Result<Listing, QueryError> {
    let invalid = |column: &str| QueryError::InvalidRow {
        row: row_num,
        column: column.to_string(),
    };
    let cell = |idx: usize| row.get(idx).map(|s| s.trim()).filter(|s| !is_null(s));

    let company = cell(index.company).ok_or_else(|| invalid(columns.company.as_str()))?;
    let model = cell(index.model).ok_or_else(|| invalid(columns.model.as_str()))?;

    let year = cell(index.year)
        .and_then(parse_whole_number)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid(columns.year.as_str()))?;
    let mileage = cell(index.mileage)
        .and_then(parse_whole_number)
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| invalid(columns.mileage.as_str()))?;
    let price = cell(index.price)
        .and_then(parse_whole_number)
        .and_then(|v| u64::try_from(v).ok())
        .filter(|&p| p > 0)
        .ok_or_else(|| invalid(columns.price.as_str()))?;

    Ok(Listing {
        company: company.to_string(),
        model: model.to_string(),
        year,
        mileage,
        price,
    })
}

fn is_null(cell: &str) -> bool {
    cell.is_empty()
        || ["nan", "null", "none", "na"]
            .iter()
            .any(|marker| cell.eq_ignore_ascii_case(marker))
}

/// Parse an integer cell, tolerating thousands separators and a zero fraction
/// (spreadsheet exports write `2200.0`).
fn parse_whole_number(cell: &str) -> Option<i64> {
    let cleaned: String = cell.chars().filter(|&c| c != ',').collect();
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
