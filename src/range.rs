// Inclusive numeric ranges for narrowing listings (year, price, mileage)

use std::str::FromStr;

use anyhow::anyhow;
use nom::{
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{eof, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair},
    IResult,
};

use crate::data::Listing;

/// Inclusive bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl ValueRange {
    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }
}

impl FromStr for ValueRange {
    type Err = anyhow::Error;

    /// Accepts `2010-2023`, `2015-`, `-2000`, `2018` and `~` as separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, range) = parse_range(s).map_err(|_| anyhow!("invalid range '{}'", s))?;

        if range.min.is_none() && range.max.is_none() {
            anyhow::bail!("range '{}' needs at least one bound", s);
        }
        if let (Some(lo), Some(hi)) = (range.min, range.max) {
            if lo > hi {
                anyhow::bail!("range '{}' has lower bound above upper bound", s);
            }
        }
        Ok(range)
    }
}

/// Optional extra bounds applied after the company/model filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingFilter {
    pub year: Option<ValueRange>,
    pub price: Option<ValueRange>,
    pub mileage: Option<ValueRange>,
}

impl ListingFilter {
    pub fn is_unbounded(&self) -> bool {
        self.year.is_none() && self.price.is_none() && self.mileage.is_none()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        let check = |range: &Option<ValueRange>, value: i64| {
            range.as_ref().map_or(true, |r| r.contains(value))
        };
        check(&self.year, i64::from(listing.year))
            && check(&self.price, saturating_i64(listing.price))
            && check(&self.mileage, saturating_i64(listing.mileage))
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Digits with optional thousands separators: `200,000`
fn number(input: &str) -> IResult<&str, i64> {
    map_res(
        recognize(pair(digit1, many0(pair(char(','), digit1)))),
        |digits: &str| digits.replace(',', "").parse::<i64>(),
    )(input)
}

/// Parse a range expression; a lone number is an exact match.
pub fn parse_range(input: &str) -> IResult<&str, ValueRange> {
    let (input, min) = opt(ws(number))(input)?;
    let (input, sep) = opt(ws(one_of("-~")))(input)?;
    let (input, max) = if sep.is_some() {
        opt(ws(number))(input)?
    } else {
        (input, min)
    };
    let (input, _) = eof(input)?;

    Ok((input, ValueRange { min, max }))
}
