//! Bounded top-k selection over `(value, count)` pairs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Rank of one candidate: higher count wins, equal counts prefer the smaller value.
#[derive(Debug, PartialEq, Eq)]
struct Ranked<T> {
    count: u64,
    value: T,
}

impl<T: Ord> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.value.cmp(&self.value))
    }
}

impl<T: Ord> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the `k` entries with the highest count, ordered by count descending then value ascending.
///
/// Keeps a min-heap of at most `k` entries, so this is O(N log k) and never sorts the whole input.
/// Returns fewer than `k` entries when the input has fewer.
pub fn top_k<T, I>(items: I, k: usize) -> Vec<(T, u64)>
where
    T: Ord,
    I: IntoIterator<Item = (T, u64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Ranked<T>>> = BinaryHeap::with_capacity(k + 1);
    for (value, count) in items {
        let candidate = Ranked { count, value };
        if heap.len() < k {
            heap.push(Reverse(candidate));
            continue;
        }
        // Heap top is the weakest kept entry.
        if let Some(Reverse(weakest)) = heap.peek()
            && candidate > *weakest
        {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }
    // Ascending by Reverse == descending by rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| (r.value, r.count))
        .collect()
}
