//! # Rating Aggregation
//!
//! Clients submit a rating as five booleans, one per star bucket. Exactly one
//! of them must be set; the selection then collapses into a [`Stars`] value.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Stars;

/// One-hot selection over the five star buckets, as sent over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarSelection {
    pub one_star: bool,
    pub two_stars: bool,
    pub three_stars: bool,
    pub four_stars: bool,
    pub five_stars: bool,
}

impl StarSelection {
    pub fn from_buckets(buckets: [bool; 5]) -> Self {
        let [one_star, two_stars, three_stars, four_stars, five_stars] = buckets;
        StarSelection {
            one_star,
            two_stars,
            three_stars,
            four_stars,
            five_stars,
        }
    }

    pub fn buckets(&self) -> [bool; 5] {
        [
            self.one_star,
            self.two_stars,
            self.three_stars,
            self.four_stars,
            self.five_stars,
        ]
    }

    pub fn selected_count(&self) -> usize {
        self.buckets().iter().filter(|b| **b).count()
    }

    /// Collapses the selection into its bucket. Zero or several selected buckets are rejected.
    pub fn to_stars(&self) -> Result<Stars> {
        if self.selected_count() != 1 {
            return Err(AppError::validation(
                "exactly one of the five rating buckets must be selected",
            ));
        }
        let position = self.buckets().iter().position(|b| *b).unwrap_or_default();
        Stars::try_from(position as u8 + 1)
    }
}

impl From<Stars> for StarSelection {
    fn from(stars: Stars) -> Self {
        let mut buckets = [false; 5];
        buckets[stars.value() as usize - 1] = true;
        StarSelection::from_buckets(buckets)
    }
}

/// Arithmetic mean of the bucket values; `0.0` when nothing was rated.
pub fn average(ratings: &[Stars]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|s| u32::from(s.value())).sum();
    f64::from(sum) / ratings.len() as f64
}
