use crate::types::{AwardResult, Category, PerCategoryPoints};

/// Applies Full Send and totals the prediction.
///
/// `per_category_points` in the result is the raw grading, before Full Send.
/// Only `total_points` carries the adjustment: a Full Send category that
/// earned points counts double, one that earned nothing stays at zero, so the
/// total never goes below the other categories.
pub fn calculate_award(
    per_category_points: &PerCategoryPoints,
    full_send_category: Option<Category>,
) -> AwardResult {
    let raw: u32 = per_category_points.values().sum();

    let bonus = full_send_category
        .and_then(|c| per_category_points.get(&c).copied())
        .unwrap_or(0);

    AwardResult {
        per_category_points: per_category_points.clone(),
        full_send_applied: bonus > 0,
        total_points: raw + bonus,
    }
}
