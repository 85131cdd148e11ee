use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::data::Listing;
use crate::error::QueryError;
use crate::ir::Selection;
use crate::range::ListingFilter;

/// Resolve the (company, model) pair a query runs against.
///
/// Each level falls back from the requested value to the default and then to
/// the lexicographically first value present. Models are scoped to the
/// resolved company.
pub fn resolve_selection(
    listings: &[Listing],
    requested_company: Option<&str>,
    requested_model: Option<&str>,
    default_company: &str,
    default_model: &str,
) -> Result<Selection, QueryError> {
    let companies: BTreeSet<&str> = listings.iter().map(|l| l.company.as_str()).collect();
    let company = pick(&companies, requested_company, default_company)
        .ok_or_else(|| QueryError::EmptySelection {
            company: requested_company.unwrap_or(default_company).to_string(),
        })?;

    let models: BTreeSet<&str> = listings
        .iter()
        .filter(|l| l.company == company)
        .map(|l| l.model.as_str())
        .collect();
    let model = pick(&models, requested_model, default_model)
        .ok_or_else(|| QueryError::EmptySelection {
            company: company.to_string(),
        })?;

    if requested_company.is_some_and(|c| c != company)
        || requested_model.is_some_and(|m| m != model)
    {
        info!(
            "requested {:?}/{:?} not available, using {}/{}",
            requested_company, requested_model, company, model
        );
    }
    debug!("resolved selection {}/{}", company, model);

    Ok(Selection {
        company: company.to_string(),
        model: model.to_string(),
    })
}

fn pick<'a>(
    available: &BTreeSet<&'a str>,
    requested: Option<&str>,
    default: &str,
) -> Option<&'a str> {
    requested
        .and_then(|r| available.get(r).copied())
        .or_else(|| available.get(default).copied())
        .or_else(|| available.iter().next().copied())
}

/// Rows matching both company and model, in table order.
pub fn filter_listings<'a>(listings: &'a [Listing], company: &str, model: &str) -> Vec<&'a Listing> {
    listings
        .iter()
        .filter(|l| l.company == company && l.model == model)
        .collect()
}

/// Narrow an already filtered subset by the optional year/price/mileage bounds.
pub fn apply_ranges<'a>(subset: Vec<&'a Listing>, ranges: &ListingFilter) -> Vec<&'a Listing> {
    if ranges.is_unbounded() {
        return subset;
    }
    subset.into_iter().filter(|l| ranges.matches(l)).collect()
}
