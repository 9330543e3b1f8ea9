//! Proportional category selection
//!
//! Picks the category whose local count is furthest behind its weight,
//! i.e. the one with the smallest `count / weight`. Ratios are compared by
//! cross-multiplication so the choice is exact and reproducible. Ties go to
//! the category declared first.

use std::cmp::Ordering;

use crate::types::LocalCounts;
use shared::{Category, CategoryWeights};

/// Select the next category to sample (pure function)
pub fn select_category<'a>(local_counts: &LocalCounts, weights: &'a CategoryWeights) -> &'a Category {
    let mut entries = weights.iter();
    // CategoryWeights is never empty
    let mut best = match entries.next() {
        Some(first) => first,
        None => return weights.first(),
    };

    for candidate in entries {
        let ordering = compare_ratio(
            local_counts.get(&candidate.category),
            candidate.weight,
            local_counts.get(&best.category),
            best.weight,
        );
        if ordering == Ordering::Less {
            best = candidate;
        }
    }

    &best.category
}

/// Compare `count_a / weight_a` with `count_b / weight_b`
fn compare_ratio(count_a: u64, weight_a: u32, count_b: u64, weight_b: u32) -> Ordering {
    let lhs = count_a as u128 * weight_b as u128;
    let rhs = count_b as u128 * weight_a as u128;
    lhs.cmp(&rhs)
}
