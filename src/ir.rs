use std::fmt;

use serde::Serialize;

use crate::bands::MileageBand;
use crate::range::ListingFilter;

// =============================================================================
// Phase 1: Request & Resolution
// =============================================================================

/// How a query groups the selected listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    ByYear,
    ByMileageBand,
}

/// One user interaction: requested selection plus view
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub company: Option<String>,
    pub model: Option<String>,
    pub view: ViewMode,
    /// Extra inclusive year/price/mileage bounds applied after the model filter
    pub ranges: ListingFilter,
}

/// The (company, model) pair actually in effect for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub company: String,
    pub model: String,
}

// =============================================================================
// Phase 2: Aggregation
// =============================================================================

/// Grouping key of an aggregate row.
///
/// Keys within one result are always the same variant, so the derived
/// ordering only ever compares like with like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    Year(i32),
    Mileage(MileageBand),
}

impl GroupKey {
    /// Axis label for the chart ("2017", "5만~10만km")
    pub fn chart_label(&self) -> String {
        match self {
            GroupKey::Year(year) => year.to_string(),
            GroupKey::Mileage(band) => band.label(),
        }
    }

    /// Label used inside the summary sentence ("2017년식", "5만~10만km")
    pub fn summary_label(&self) -> String {
        match self {
            GroupKey::Year(year) => format!("{}년식", year),
            GroupKey::Mileage(band) => band.label(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chart_label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub mean_price: f64,
    pub count: usize,
}

// =============================================================================
// Phase 3: Presentation
// =============================================================================

/// One bar of the chart; `value` is the unrounded mean price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Everything the renderer needs for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutput {
    pub selection: Option<Selection>,
    pub view: ViewMode,
    pub chart_series: Vec<ChartPoint>,
    pub summary_sentence: String,
    pub mean_year: f64,
    pub mean_mileage: f64,
    pub listing_count: usize,
}

impl QueryOutput {
    /// Well-formed "no data" result
    pub fn empty(selection: Option<Selection>, view: ViewMode, summary_sentence: String) -> Self {
        Self {
            selection,
            view,
            chart_series: Vec::new(),
            summary_sentence,
            mean_year: 0.0,
            mean_mileage: 0.0,
            listing_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listing_count == 0
    }
}
