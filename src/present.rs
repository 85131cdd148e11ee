use crate::ir::{AggregateRow, ChartPoint};

const FRAGMENT_SEPARATOR: &str = " · ";

/// Chart series in aggregator order (descending key); the renderer draws the
/// first point as the topmost bar.
pub fn to_chart_series(rows: &[AggregateRow]) -> Vec<ChartPoint> {
    rows.iter()
        .map(|row| ChartPoint {
            label: row.key.chart_label(),
            value: row.mean_price,
        })
        .collect()
}

/// One-line summary: "그랜저 중고차 시세는 2017년식 2550만원 · 2016년식 2200만원 입니다."
///
/// `max_items` keeps only the first N groups. No rows gives the empty-state
/// sentence.
pub fn to_summary_sentence(rows: &[AggregateRow], model_name: &str, max_items: Option<usize>) -> String {
    let limit = max_items.unwrap_or(usize::MAX);
    if rows.is_empty() || limit == 0 {
        return empty_summary(model_name);
    }

    let fragments: Vec<String> = rows
        .iter()
        .take(limit)
        .map(|row| format!("{} {}만원", row.key.summary_label(), display_price(row.mean_price)))
        .collect();

    format!(
        "{} 중고차 시세는 {} 입니다.",
        model_name,
        fragments.join(FRAGMENT_SEPARATOR)
    )
}

pub fn empty_summary(model_name: &str) -> String {
    if model_name.is_empty() {
        "조회된 중고차 시세 정보가 없습니다.".to_string()
    } else {
        format!("{} 중고차 시세 정보가 없습니다.", model_name)
    }
}

/// Whole-만원 display value. `f64::round` rounds half away from zero; this
/// only affects display.
pub fn display_price(mean_price: f64) -> i64 {
    mean_price.round() as i64
}
