use carquote::bands::MileageBands;
use carquote::ir::GroupKey;
use carquote::range::{ListingFilter, ValueRange};
use carquote::resolve::{apply_ranges, filter_listings};
use carquote::transform::aggregate_view;
use carquote::{run_query, Listing, QueryConfig, QueryRequest, RecordTable, ViewMode};
use proptest::prelude::*;

const COMPANIES: [&str; 2] = ["현대", "기아"];
const MODELS: [&str; 3] = ["그랜저", "쏘나타", "K5"];

fn arb_listing() -> impl Strategy<Value = Listing> {
    (
        0..COMPANIES.len(),
        0..MODELS.len(),
        2005i32..2025,
        0u64..400_000,
        1u64..10_000,
    )
        .prop_map(|(c, m, year, mileage, price)| Listing {
            company: COMPANIES[c].to_string(),
            model: MODELS[m].to_string(),
            year,
            mileage,
            price,
        })
}

fn arb_listings() -> impl Strategy<Value = Vec<Listing>> {
    prop::collection::vec(arb_listing(), 1..40)
}

fn arb_bin_width() -> impl Strategy<Value = u64> {
    prop_oneof![Just(50_000u64), Just(10_000u64), 1_000u64..200_000]
}

fn arb_view() -> impl Strategy<Value = ViewMode> {
    prop_oneof![Just(ViewMode::ByYear), Just(ViewMode::ByMileageBand)]
}

fn to_table(listings: &[Listing]) -> RecordTable {
    let headers = ["회사", "모델", "연식(수)", "키로수", "가격(숫자)"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = listings
        .iter()
        .map(|l| {
            vec![
                l.company.clone(),
                l.model.clone(),
                l.year.to_string(),
                l.mileage.to_string(),
                l.price.to_string(),
            ]
        })
        .collect();
    RecordTable::new(headers, rows)
}

proptest! {
    #[test]
    fn every_mileage_falls_in_exactly_one_band(
        listings in arb_listings(),
        bin_width in arb_bin_width(),
    ) {
        let bands = MileageBands::for_listings(&listings, bin_width).unwrap();
        let all: Vec<_> = bands.bands().collect();
        for listing in &listings {
            let holders = all.iter().filter(|b| b.contains(listing.mileage)).count();
            prop_assert_eq!(holders, 1);
            prop_assert!(bands.assign(listing.mileage).contains(listing.mileage));
        }
    }

    #[test]
    fn mileage_past_table_max_lands_in_top_band(
        listings in arb_listings(),
        bin_width in arb_bin_width(),
        extra in 1u64..1_000_000,
    ) {
        let bands = MileageBands::for_listings(&listings, bin_width).unwrap();
        let max_mileage = listings.iter().map(|l| l.mileage).max().unwrap();
        let top = bands.bands().last().unwrap();
        let band = bands.assign(max_mileage + extra);
        prop_assert_eq!(band, top);
        prop_assert_eq!(band.lower, bands.top_lower());
        prop_assert_eq!(band.upper - band.lower, bin_width);
    }

    #[test]
    fn group_counts_sum_to_subset_size(
        listings in arb_listings(),
        bin_width in arb_bin_width(),
        view in arb_view(),
    ) {
        let bands = MileageBands::for_listings(&listings, bin_width).unwrap();
        let subset = filter_listings(&listings, "현대", "그랜저");
        let rows = aggregate_view(&subset, view, &bands);
        let total: usize = rows.iter().map(|r| r.count).sum();
        prop_assert_eq!(total, subset.len());
        prop_assert!(rows.iter().all(|r| r.count > 0));
    }

    #[test]
    fn group_keys_are_strictly_descending(
        listings in arb_listings(),
        bin_width in arb_bin_width(),
        view in arb_view(),
    ) {
        let bands = MileageBands::for_listings(&listings, bin_width).unwrap();
        let subset: Vec<&Listing> = listings.iter().collect();
        let rows = aggregate_view(&subset, view, &bands);
        let keys: Vec<&GroupKey> = rows.iter().map(|r| &r.key).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn group_mean_lies_within_member_prices(
        listings in arb_listings(),
        view in arb_view(),
    ) {
        let bands = MileageBands::for_listings(&listings, 50_000).unwrap();
        let subset: Vec<&Listing> = listings.iter().collect();
        let min = subset.iter().map(|l| l.price).min().unwrap() as f64;
        let max = subset.iter().map(|l| l.price).max().unwrap() as f64;
        for row in aggregate_view(&subset, view, &bands) {
            prop_assert!(row.mean_price >= min - 1e-9 && row.mean_price <= max + 1e-9);
        }
    }

    #[test]
    fn filter_keeps_exactly_matching_rows(
        listings in arb_listings(),
        company in 0..COMPANIES.len(),
        model in 0..MODELS.len(),
        lo in 2005i64..2025,
        span in 0i64..10,
    ) {
        let (company, model) = (COMPANIES[company], MODELS[model]);
        let ranges = ListingFilter {
            year: Some(ValueRange { min: Some(lo), max: Some(lo + span) }),
            ..ListingFilter::default()
        };
        let kept = apply_ranges(filter_listings(&listings, company, model), &ranges);

        let expected = listings
            .iter()
            .filter(|l| l.company == company && l.model == model)
            .filter(|l| i64::from(l.year) >= lo && i64::from(l.year) <= lo + span)
            .count();
        prop_assert_eq!(kept.len(), expected);
        prop_assert!(kept.iter().all(|l| l.company == company && l.model == model));
    }

    #[test]
    fn query_is_idempotent(
        listings in arb_listings(),
        view in arb_view(),
    ) {
        let table = to_table(&listings);
        let request = QueryRequest { view, ..QueryRequest::default() };
        let config = QueryConfig::default();
        let first = run_query(&table, &request, &config).unwrap();
        let second = run_query(&table, &request, &config).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.chart_series.is_empty(), first.listing_count == 0);
    }
}
