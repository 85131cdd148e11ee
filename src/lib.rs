// Library exports for carquote

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod range;

// Query pipeline
pub mod bands;
pub mod ir;
pub mod present;
pub mod resolve;
pub mod runtime;
pub mod transform;

use serde::Deserialize;

pub use data::{ColumnMap, Listing, RecordTable};
pub use error::QueryError;
pub use ir::{ChartPoint, QueryOutput, QueryRequest, Selection, ViewMode};
pub use runtime::{render_chart, run_query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
        }
    }
}

/// Query-independent settings: bucket width, fallback selection and column names.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_bin_width")]
    pub bin_width: u64,
    #[serde(default = "default_company")]
    pub default_company: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Cap on fragments in the summary sentence (`None` = all groups)
    #[serde(default)]
    pub max_summary_items: Option<usize>,
    #[serde(default)]
    pub columns: ColumnMap,
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_bin_width() -> u64 { 50_000 }
fn default_company() -> String { "현대".to_string() }
fn default_model() -> String { "그랜저".to_string() }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            bin_width: default_bin_width(),
            default_company: default_company(),
            default_model: default_model(),
            max_summary_items: None,
            columns: ColumnMap::default(),
            render: RenderOptions::default(),
        }
    }
}

impl QueryConfig {
    /// Parse a config from JSON text; missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
