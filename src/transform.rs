use std::collections::BTreeMap;

use crate::bands::MileageBands;
use crate::data::Listing;
use crate::ir::{AggregateRow, GroupKey, ViewMode};

/// Group rows by `group_fn` and compute the mean price per group.
///
/// Output is strictly descending by key. Rows for which `group_fn` yields
/// `None` are left out, and a group only exists once a row lands in it.
pub fn aggregate<F>(rows: &[&Listing], group_fn: F) -> Vec<AggregateRow>
where
    F: Fn(&Listing) -> Option<GroupKey>,
{
    // key -> (price sum, count)
    let mut groups: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(key) = group_fn(*row) {
            let entry = groups.entry(key).or_insert((0.0, 0));
            entry.0 += row.price as f64;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .rev()
        .map(|(key, (sum, count))| AggregateRow {
            key,
            mean_price: sum / count as f64,
            count,
        })
        .collect()
}

/// Aggregate a subset for the requested view.
pub fn aggregate_view(rows: &[&Listing], view: ViewMode, bands: &MileageBands) -> Vec<AggregateRow> {
    match view {
        ViewMode::ByYear => aggregate(rows, |l| Some(GroupKey::Year(l.year))),
        ViewMode::ByMileageBand => aggregate(rows, |l| Some(GroupKey::Mileage(bands.assign(l.mileage)))),
    }
}

/// Scalar summary of a subset: (mean year, mean mileage, count).
/// An empty subset yields zeros.
pub fn subset_metrics(rows: &[&Listing]) -> (f64, f64, usize) {
    let count = rows.len();
    if count == 0 {
        return (0.0, 0.0, 0);
    }
    let n = count as f64;
    let year_sum: f64 = rows.iter().map(|l| f64::from(l.year)).sum();
    let mileage_sum: f64 = rows.iter().map(|l| l.mileage as f64).sum();
    (year_sum / n, mileage_sum / n, count)
}
