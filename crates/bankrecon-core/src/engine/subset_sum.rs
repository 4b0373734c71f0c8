//! Subset-sum search over single-side candidate amounts.
//!
//! Amounts are integer cents. The caller is responsible for side discipline:
//! one invocation only ever sees debit amounts or credit amounts, never a
//! mixture.

use std::collections::HashMap;

/// One candidate row for the subset search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubsetItem {
    /// Positive amount in cents
    pub cents: i64,
    /// Row id the amount belongs to
    pub id: u32,
}

/// Find ids of 2..=`max_items` items whose cents sum into
/// `[min_target, max_target]`.
///
/// A greedy two-item pass over every pair runs first (most splits are
/// two-item); the dynamic program handles larger subsets, preferring
/// smaller ones. Returns `None` when no subset qualifies.
pub(crate) fn find_subset(
    items: &[SubsetItem],
    min_target: i64,
    max_target: i64,
    max_items: usize,
) -> Option<Vec<u32>> {
    if items.len() < 2 {
        return None;
    }

    for i in 0..items.len() {
        for j in i + 1..items.len() {
            let sum = items[i].cents + items[j].cents;
            if (min_target..=max_target).contains(&sum) {
                return Some(vec![items[i].id, items[j].id]);
            }
        }
    }

    // Larger subsets only consider a bounded prefix to cap the table size.
    let items = &items[..items.len().min(max_items)];

    // Achievable partial sum -> shortest id-list reaching it.
    let mut dp: HashMap<i64, Vec<u32>> = HashMap::from([(0, Vec::new())]);

    for item in items {
        // Visit partial sums in ascending order so ties resolve the same way
        // on every run.
        let mut states: Vec<(i64, Vec<u32>)> =
            dp.iter().map(|(&s, ids)| (s, ids.clone())).collect();
        states.sort_by_key(|(s, _)| *s);

        let mut extensions: Vec<(i64, Vec<u32>)> = Vec::new();
        for (sum, ids) in &states {
            let new_sum = *sum + item.cents;
            if new_sum > max_target || ids.len() + 1 > max_items {
                continue;
            }
            let mut new_ids = ids.clone();
            new_ids.push(item.id);
            if new_ids.len() >= 2 && new_sum >= min_target {
                return Some(new_ids);
            }
            extensions.push((new_sum, new_ids));
        }
        for (sum, ids) in extensions {
            match dp.get(&sum) {
                Some(existing) if existing.len() <= ids.len() => {}
                _ => {
                    dp.insert(sum, ids);
                }
            }
        }
    }

    None
}
