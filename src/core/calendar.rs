use chrono::{Datelike, NaiveDate};

use crate::ledger::BucketKey;

/// Bucket covering `date`: days 1-7, 8-14, 15-21, then the rest of the month.
pub fn week_of_month(date: NaiveDate) -> BucketKey {
    match date.day() {
        1..=7 => BucketKey::FixedWeek1,
        8..=14 => BucketKey::Week2,
        15..=21 => BucketKey::Week3,
        _ => BucketKey::Week4,
    }
}
