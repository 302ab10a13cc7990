use serde::{Deserialize, Serialize};

use crate::differ::{ChangeCategory, ChangeSets};

/// Scalar per-category counts for a comparison.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub disappeared_after_oldest: usize,
    pub disappeared_after_middle: usize,
    pub reappeared_newest: usize,
    pub total: usize,
    pub per_category: Vec<CategoryShare>,
}

/// One category's share of all changed identifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: ChangeCategory,
    pub count: usize,
    pub share: f64,
}

impl ChangeSummary {
    /// Count for a category.
    pub fn count(&self, category: ChangeCategory) -> usize {
        match category {
            ChangeCategory::DisappearedAfterOldest => self.disappeared_after_oldest,
            ChangeCategory::DisappearedAfterMiddle => self.disappeared_after_middle,
            ChangeCategory::ReappearedNewest => self.reappeared_newest,
        }
    }
}

/// Compute counts from identifier sets (not rows).
pub fn change_summary(sets: &ChangeSets) -> ChangeSummary {
    let disappeared_after_oldest = sets.disappeared_after_oldest.len();
    let disappeared_after_middle = sets.disappeared_after_middle.len();
    let reappeared_newest = sets.reappeared_newest.len();
    let total = disappeared_after_oldest + disappeared_after_middle + reappeared_newest;
    let per_category = ChangeCategory::ALL
        .into_iter()
        .map(|category| {
            let count = sets.get(category).len();
            CategoryShare {
                category,
                count,
                share: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                },
            }
        })
        .collect();
    ChangeSummary {
        disappeared_after_oldest,
        disappeared_after_middle,
        reappeared_newest,
        total,
        per_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> std::collections::BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn summary_reports_counts_and_shares() {
        let sets = ChangeSets {
            disappeared_after_oldest: set(&["A", "B"]),
            disappeared_after_middle: set(&["C"]),
            reappeared_newest: set(&["D"]),
        };
        let summary = change_summary(&sets);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(ChangeCategory::DisappearedAfterOldest), 2);
        assert_eq!(summary.count(ChangeCategory::ReappearedNewest), 1);
        assert!((summary.per_category[0].share - 0.5).abs() < 1e-6);
        assert!((summary.per_category[1].share - 0.25).abs() < 1e-6);
    }

    #[test]
    fn empty_sets_have_zero_shares() {
        let summary = change_summary(&ChangeSets::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.per_category.len(), 3);
        assert!(summary.per_category.iter().all(|entry| entry.share == 0.0));
    }
}
