//! Mileage bucketing.
//!
//! Bands are left-closed, right-open `[k*w, (k+1)*w)`. The band holding the
//! dataset's maximum mileage is the top band, and it absorbs every larger
//! value, so the band set is fixed once per table and independent of the
//! selected model.

use std::fmt;

use crate::data::Listing;
use crate::error::QueryError;

/// One mileage bucket. Ordering follows `lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MileageBand {
    pub lower: u64,
    pub upper: u64,
}

impl MileageBand {
    /// Nominal `[lower, upper)` membership. The top band of a layout is
    /// capped at one bin width here even though `MileageBands::assign` also
    /// routes larger values into it.
    pub fn contains(&self, mileage: u64) -> bool {
        self.lower <= mileage && mileage < self.upper
    }

    /// "5만~10만km"
    pub fn label(&self) -> String {
        format!("{}~{}km", format_km(self.lower), format_km(self.upper))
    }
}

impl fmt::Display for MileageBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Fixed band layout derived from a bin width and the table's maximum mileage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MileageBands {
    bin_width: u64,
    top_index: u64,
}

impl MileageBands {
    pub fn new(bin_width: u64, max_mileage: u64) -> Result<Self, QueryError> {
        if bin_width == 0 {
            return Err(QueryError::InvalidBinWidth);
        }
        Ok(Self {
            bin_width,
            top_index: max_mileage / bin_width,
        })
    }

    /// Layout for a whole table; the maximum is taken over every listing.
    pub fn for_listings(listings: &[Listing], bin_width: u64) -> Result<Self, QueryError> {
        let max_mileage = listings.iter().map(|l| l.mileage).max().unwrap_or(0);
        Self::new(bin_width, max_mileage)
    }

    /// Lower bound of the top band; every mileage at or above it lands there.
    pub fn top_lower(&self) -> u64 {
        self.top_index.saturating_mul(self.bin_width)
    }

    /// Band for a mileage. Total: values past the top band fall into it, and
    /// the returned band keeps its nominal one-bin-wide label.
    pub fn assign(&self, mileage: u64) -> MileageBand {
        if mileage >= self.top_lower() {
            return self.band_at(self.top_index);
        }
        self.band_at(mileage / self.bin_width)
    }

    /// Every band in ascending order, top band last.
    pub fn bands(&self) -> impl Iterator<Item = MileageBand> + '_ {
        (0..=self.top_index).map(move |index| self.band_at(index))
    }

    fn band_at(&self, index: u64) -> MileageBand {
        let lower = index.saturating_mul(self.bin_width);
        MileageBand {
            lower,
            upper: lower.saturating_add(self.bin_width),
        }
    }
}

/// 10,000 km multiples use the 만 unit; anything else is written out with
/// thousands separators.
fn format_km(km: u64) -> String {
    if km == 0 {
        "0".to_string()
    } else if km % 10_000 == 0 {
        format!("{}만", km / 10_000)
    } else {
        group_thousands(km)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
