//! Cross-boundary query resolution against the gathered residual stacks.

use ansv_comm::BlockPartition;

use crate::boundary::BoundaryEntry;

/// Last entry (bottom to top) holding a value strictly below `value`.
///
/// Residual stacks are strictly increasing in value, so the qualifying
/// entries form a bottom prefix and `partition_point` finds its end in
/// `O(log len)`. By the stacks' index orientation the returned entry is the
/// nearest candidate of its block: the largest index in a left stack, the
/// smallest in a right stack.
fn nearest_below<'s, T: Ord>(
    stack: &'s [BoundaryEntry<T>],
    value: &T,
) -> Option<&'s BoundaryEntry<T>> {
    let cut = stack.partition_point(|entry| entry.value < *value);
    cut.checked_sub(1).map(|last| &stack[last])
}

/// Left nearest-smaller answer for an unresolved position owned by `rank`,
/// scanning the left-boundary stacks of ranks `rank-1 .. 0`.
///
/// The first block with any qualifying entry wins; farther blocks cannot
/// hold a nearer index.
pub(crate) fn resolve_left<T: Ord>(
    value: &T,
    rank: usize,
    stacks: &[Vec<BoundaryEntry<T>>],
    partition: &BlockPartition,
) -> Option<usize> {
    (0..rank)
        .rev()
        .find_map(|q| nearest_below(&stacks[q], value).map(|entry| global_index(entry, partition)))
}

/// Right counterpart of [`resolve_left`], scanning ranks `rank+1 .. P-1`.
pub(crate) fn resolve_right<T: Ord>(
    value: &T,
    rank: usize,
    stacks: &[Vec<BoundaryEntry<T>>],
    partition: &BlockPartition,
) -> Option<usize> {
    (rank + 1..partition.parts())
        .find_map(|q| nearest_below(&stacks[q], value).map(|entry| global_index(entry, partition)))
}

fn global_index<T>(entry: &BoundaryEntry<T>, partition: &BlockPartition) -> usize {
    partition.range(entry.rank as usize).start + entry.index
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn entries(rank: u32, pairs: &[(usize, u64)]) -> Vec<BoundaryEntry<u64>> {
        pairs
            .iter()
            .map(|&(index, value)| BoundaryEntry { rank, index, value })
            .collect()
    }

    #[test]
    fn test_nearest_below_picks_the_prefix_end() {
        let stack = entries(0, &[(2, 10), (5, 20), (7, 30)]);
        assert_eq!(nearest_below(&stack, &35).map(|e| e.index), Some(7));
        assert_eq!(nearest_below(&stack, &25).map(|e| e.index), Some(5));
        assert_eq!(nearest_below(&stack, &20).map(|e| e.index), Some(2));
        assert_eq!(nearest_below(&stack, &10), None);
        assert_eq!(nearest_below(&stack, &5), None);
    }

    #[test]
    fn test_resolve_left_prefers_the_nearest_block() {
        // Blocks of 4 over 12 indices; the querying rank is 2.
        let partition = BlockPartition::new(12, 3);
        let stacks = vec![
            entries(0, &[(0, 1), (3, 8)]),
            entries(1, &[(2, 5), (3, 9)]),
            Vec::new(),
        ];
        // Rank 1 can answer: nearest qualifying index is global 4 + 2.
        assert_eq!(resolve_left(&7, 2, &stacks, &partition), Some(6));
        // Rank 1 cannot answer a query below its whole stack; rank 0 can.
        assert_eq!(resolve_left(&3, 2, &stacks, &partition), Some(0));
        // Nothing anywhere is below 1.
        assert_eq!(resolve_left(&1, 2, &stacks, &partition), None);
        // Rank 0 never looks left.
        assert_eq!(resolve_left(&100, 0, &stacks, &partition), None);
    }

    #[test]
    fn test_resolve_right_scans_outward() {
        let partition = BlockPartition::new(12, 3);
        // Right stacks: indices decrease bottom to top.
        let stacks = vec![
            Vec::new(),
            entries(1, &[(3, 2), (0, 6)]),
            entries(2, &[(2, 1), (1, 4)]),
        ];
        // Rank 1 answers first even though rank 2 also qualifies.
        assert_eq!(resolve_right(&7, 0, &stacks, &partition), Some(4));
        // Rank 1's only entry below 5 sits at local index 3.
        assert_eq!(resolve_right(&5, 0, &stacks, &partition), Some(7));
        // Only rank 2 goes low enough for a query of 2.
        assert_eq!(resolve_right(&2, 0, &stacks, &partition), Some(10));
        assert_eq!(resolve_right(&1, 0, &stacks, &partition), None);
        assert_eq!(resolve_right(&100, 2, &stacks, &partition), None);
    }
}
