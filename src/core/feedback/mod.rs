//! Marksheet feedback
//!
//! Marksheet layouts live in [`categories`]; the records themselves are
//! [`IndividualFeedback`](crate::models::IndividualFeedback) and
//! [`GroupFeedback`](crate::models::GroupFeedback).

pub mod categories;

pub use categories::{band_for, band_label, is_band, Category, MarksheetType, MARK_BANDS};

/// Rounded mean of the given category marks, `None` when there are none
#[must_use]
pub fn category_average<'a>(marks: impl IntoIterator<Item = &'a i32>) -> Option<i32> {
    let (sum, count) = marks
        .into_iter()
        .fold((0_i64, 0_i64), |(sum, count), mark| (sum + i64::from(*mark), count + 1));
    if count == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mean = (sum as f64 / count as f64).round_ties_even() as i32;
    Some(mean)
}

/// Weighted combination of a group mark and an individual mark
///
/// `split` is `(group weight, individual weight)` in percent.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn combine_group_mark(split: (u32, u32), group_mark: i32, individual_mark: i32) -> i32 {
    let (group_weight, individual_weight) = split;
    let weighted = f64::from(group_mark) * f64::from(group_weight)
        + f64::from(individual_mark) * f64::from(individual_weight);
    (weighted / 100.0).round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_average() {
        assert_eq!(category_average(&[59, 69, 49]), Some(59));
        assert_eq!(category_average(&[59, 60]), Some(60));
        assert_eq!(category_average(&[]), None);
    }

    #[test]
    fn test_combine_group_mark() {
        assert_eq!(combine_group_mark((10, 90), 70, 60), 61);
        assert_eq!(combine_group_mark((50, 50), 45, 50), 48);
    }
}
