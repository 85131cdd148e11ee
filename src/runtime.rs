// Query executor: table -> selection -> subset -> groups -> presentation

use anyhow::Result;
use tracing::{debug, warn};

use crate::bands::MileageBands;
use crate::data::RecordTable;
use crate::error::QueryError;
use crate::graph::BarChart;
use crate::ir::{QueryOutput, QueryRequest, Selection};
use crate::present::{empty_summary, to_chart_series, to_summary_sentence};
use crate::resolve::{apply_ranges, filter_listings, resolve_selection};
use crate::transform::{aggregate_view, subset_metrics};
use crate::{QueryConfig, RenderOptions};

/// Run one full pipeline evaluation.
///
/// Missing columns and a zero bin width fail the query. A selection with no
/// matching rows yields `QueryOutput::empty`.
pub fn run_query(
    table: &RecordTable,
    request: &QueryRequest,
    config: &QueryConfig,
) -> Result<QueryOutput, QueryError> {
    let listings = table.listings(&config.columns)?;
    debug!(
        "query over {} valid listings ({} rows)",
        listings.len(),
        table.rows.len()
    );

    // Band layout comes from the whole table so it is stable across selections
    let bands = MileageBands::for_listings(&listings, config.bin_width)?;

    let selection = match resolve_selection(
        &listings,
        request.company.as_deref(),
        request.model.as_deref(),
        &config.default_company,
        &config.default_model,
    ) {
        Ok(selection) => selection,
        Err(err) if err.is_recoverable() => {
            warn!("{}", err);
            let model = request.model.as_deref().unwrap_or_default();
            return Ok(QueryOutput::empty(None, request.view, empty_summary(model)));
        }
        Err(err) => return Err(err),
    };

    let subset = filter_listings(&listings, &selection.company, &selection.model);
    let subset = apply_ranges(subset, &request.ranges);
    if subset.is_empty() {
        warn!(
            "no listings for {}/{} within the requested ranges",
            selection.company, selection.model
        );
        let summary = empty_summary(&selection.model);
        return Ok(QueryOutput::empty(Some(selection), request.view, summary));
    }

    let rows = aggregate_view(&subset, request.view, &bands);
    let (mean_year, mean_mileage, listing_count) = subset_metrics(&subset);

    Ok(QueryOutput {
        chart_series: to_chart_series(&rows),
        summary_sentence: to_summary_sentence(&rows, &selection.model, config.max_summary_items),
        selection: Some(selection),
        view: request.view,
        mean_year,
        mean_mileage,
        listing_count,
    })
}

/// Render the chart series of a query result to PNG or SVG bytes
pub fn render_chart(output: &QueryOutput, options: &RenderOptions) -> Result<Vec<u8>> {
    let title = output
        .selection
        .as_ref()
        .map(chart_title)
        .unwrap_or_default();

    let chart = BarChart::new(options.width, options.height, title, output.chart_series.clone())?;
    chart.render(options.format)
}

fn chart_title(selection: &Selection) -> String {
    format!("{} {} 평균 시세 (만원)", selection.company, selection.model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnMap;
    use crate::ir::{ChartPoint, ViewMode};
    use crate::range::{ListingFilter, ValueRange};

    /// Helper to create a test RecordTable
    fn make_table(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> RecordTable {
        RecordTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn english_config() -> QueryConfig {
        QueryConfig {
            default_company: "Hyundai".to_string(),
            default_model: "Grandeur IG".to_string(),
            columns: ColumnMap {
                company: "company".to_string(),
                model: "model".to_string(),
                year: "year".to_string(),
                mileage: "mileage".to_string(),
                price: "price".to_string(),
            },
            ..QueryConfig::default()
        }
    }

    fn grandeur_table() -> RecordTable {
        make_table(
            vec!["company", "model", "year", "mileage", "price"],
            vec![
                vec!["Hyundai", "Grandeur IG", "2016", "10000", "2200"],
                vec!["Hyundai", "Grandeur IG", "2017", "30000", "2500"],
                vec!["Hyundai", "Grandeur IG", "2017", "40000", "2600"],
            ],
        )
    }

    fn request(company: Option<&str>, model: Option<&str>, view: ViewMode) -> QueryRequest {
        QueryRequest {
            company: company.map(str::to_string),
            model: model.map(str::to_string),
            view,
            ranges: ListingFilter::default(),
        }
    }

    #[test]
    fn test_run_query_by_year() {
        let output = run_query(
            &grandeur_table(),
            &request(Some("Hyundai"), Some("Grandeur IG"), ViewMode::ByYear),
            &english_config(),
        )
        .unwrap();

        assert_eq!(
            output.chart_series,
            vec![
                ChartPoint { label: "2017".to_string(), value: 2550.0 },
                ChartPoint { label: "2016".to_string(), value: 2200.0 },
            ]
        );
        assert_eq!(
            output.summary_sentence,
            "Grandeur IG 중고차 시세는 2017년식 2550만원 · 2016년식 2200만원 입니다."
        );
        assert_eq!(output.listing_count, 3);
        assert!((output.mean_mileage - 26_666.67).abs() < 0.01);
    }

    #[test]
    fn test_run_query_by_mileage_band() {
        let output = run_query(
            &grandeur_table(),
            &request(Some("Hyundai"), Some("Grandeur IG"), ViewMode::ByMileageBand),
            &english_config(),
        )
        .unwrap();
        assert_eq!(output.chart_series.len(), 1);
        assert_eq!(output.chart_series[0].label, "0~5만km");
        assert!((output.chart_series[0].value - 2433.333).abs() < 1e-2);
    }

    #[test]
    fn test_run_query_unknown_company_falls_back() {
        let output = run_query(
            &grandeur_table(),
            &request(Some("Tesla"), None, ViewMode::ByYear),
            &english_config(),
        )
        .unwrap();
        let selection = output.selection.unwrap();
        assert_eq!(selection.company, "Hyundai");
        assert_eq!(selection.model, "Grandeur IG");
        assert_eq!(output.listing_count, 3);
    }

    #[test]
    fn test_run_query_missing_column() {
        let table = make_table(
            vec!["company", "model", "year", "price"],
            vec![vec!["Hyundai", "Grandeur IG", "2016", "2200"]],
        );
        let err = run_query(&table, &QueryRequest::default(), &english_config()).unwrap_err();
        assert_eq!(err, QueryError::MissingColumn { column: "mileage".to_string() });
    }

    #[test]
    fn test_run_query_empty_table_recovers() {
        let table = make_table(vec!["company", "model", "year", "mileage", "price"], vec![]);
        let output = run_query(
            &table,
            &request(None, Some("Grandeur IG"), ViewMode::ByYear),
            &english_config(),
        )
        .unwrap();
        assert!(output.is_empty());
        assert!(output.chart_series.is_empty());
        assert_eq!(output.selection, None);
        assert_eq!(output.summary_sentence, "Grandeur IG 중고차 시세 정보가 없습니다.");
    }

    #[test]
    fn test_run_query_ranges_exclude_everything() {
        let mut req = request(Some("Hyundai"), Some("Grandeur IG"), ViewMode::ByYear);
        req.ranges.year = Some(ValueRange { min: Some(2020), max: None });
        let output = run_query(&grandeur_table(), &req, &english_config()).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.mean_year, 0.0);
        assert!(output.selection.is_some());
    }

    #[test]
    fn test_run_query_zero_bin_width() {
        let config = QueryConfig { bin_width: 0, ..english_config() };
        let err = run_query(&grandeur_table(), &QueryRequest::default(), &config).unwrap_err();
        assert_eq!(err, QueryError::InvalidBinWidth);
    }

    #[test]
    fn test_run_query_idempotent() {
        let table = grandeur_table();
        let req = request(None, None, ViewMode::ByMileageBand);
        let config = english_config();
        let first = run_query(&table, &req, &config).unwrap();
        let second = run_query(&table, &req, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_render_chart_png() {
        let output = run_query(&grandeur_table(), &QueryRequest::default(), &english_config())
            .unwrap();
        let png_bytes = render_chart(&output, &RenderOptions::default()).unwrap();
        assert!(png_bytes.len() > 8);
        assert_eq!(&png_bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_render_chart_empty_output() {
        let output = QueryOutput::empty(None, ViewMode::ByYear, String::new());
        let result = render_chart(&output, &RenderOptions::default());
        assert!(result.unwrap_err().to_string().contains("no data"));
    }
}
