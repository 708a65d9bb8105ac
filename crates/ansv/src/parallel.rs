//! The distributed ANSV protocol.
//!
//! Four synchronous phases per worker: local sweep, boundary exchange,
//! cross-boundary resolution, done. The all-gather of the residual stacks is
//! the only barrier the protocol needs; no worker can start resolving before
//! every worker has finished sweeping.

use ansv_comm::{BlockPartition, Communicator};

use crate::boundary::{exchange, residual_entries};
use crate::resolve::{resolve_left, resolve_right};
use crate::sweep::{collapse, left_sweep, right_sweep};
use crate::{Error, Result};

/// Nearest smaller values of a block-distributed sequence.
///
/// `local` is this worker's balanced contiguous block; the returned arrays
/// cover the same block and hold global indices under the 0-sentinel
/// convention. The output is identical to [`crate::ansv_sequential`] over
/// the concatenated sequence, for every group size.
///
/// Preconditions are observable errors: an empty block is rejected before
/// any collective, block sizes that do not form the balanced partition are
/// rejected as soon as the group's size vector is known. Any transport
/// failure aborts the call; partial output is never returned.
pub fn ansv_parallel<T, C>(local: &[T], comm: &C) -> Result<(Vec<usize>, Vec<usize>)>
where
    T: Ord + Copy + Send + 'static,
    C: Communicator,
{
    let rank = comm.rank();
    if local.is_empty() {
        return Err(Error::EmptyBlock { rank });
    }

    // Global offsets and the size vector come first, so balance is
    // validated before any boundary data moves.
    let offset = comm.exclusive_scan(local.len(), 0, |a, b| a + b)?;
    let sizes: Vec<usize> = comm
        .all_gather_v(&[local.len()])?
        .into_iter()
        .flatten()
        .collect();
    let partition = BlockPartition::new(sizes.iter().sum(), comm.size());
    for (q, &got) in sizes.iter().enumerate() {
        let expected = partition.len(q);
        if got != expected {
            return Err(Error::UnbalancedBlocks { rank: q, got, expected });
        }
    }
    debug_assert_eq!(offset, partition.range(rank).start);

    tracing::trace!(rank, offset, len = local.len(), "local sweep");
    let mut left = vec![None; local.len()];
    let mut right = vec![None; local.len()];
    let left_residual = left_sweep(local, offset, &mut left);
    let right_residual = right_sweep(local, offset, &mut right);

    tracing::trace!(
        rank,
        left = left_residual.len(),
        right = right_residual.len(),
        "exchanging boundary stacks"
    );
    let t_left = residual_entries(rank, &left_residual, local);
    let t_right = residual_entries(rank, &right_residual, local);
    let (all_left, all_right) = exchange(comm, &t_left, &t_right)?;

    tracing::trace!(rank, "resolving cross-boundary queries");
    for (i, slot) in left.iter_mut().enumerate() {
        if slot.is_none() {
            *slot = resolve_left(&local[i], rank, &all_left, &partition);
        }
    }
    for (i, slot) in right.iter_mut().enumerate() {
        if slot.is_none() {
            *slot = resolve_right(&local[i], rank, &all_right, &partition);
        }
    }

    Ok((collapse(left), collapse(right)))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use ansv_comm::{Communicator, SelfComm, run_group};
    use rand::{Rng, SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::ansv_sequential;
    use crate::check::{Direction, check_nsv};

    fn random_values(len: usize, bound: u64, seed: u64) -> Vec<u64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..len).map(|_| rng.random_range(0..bound)).collect()
    }

    /// Distributes `values` over `parts` workers and gathers both answer
    /// arrays back at rank 0.
    fn distributed_ansv(values: &[u64], parts: usize) -> (Vec<usize>, Vec<usize>) {
        type Gathered = Option<(Vec<usize>, Vec<usize>)>;
        let results = run_group(parts, |comm| -> Result<Gathered> {
            let global = (comm.rank() == 0).then(|| values.to_vec());
            let (local, _) = comm.block_distribute(global)?;
            let (left, right) = ansv_parallel(&local, comm)?;
            let left = comm.gather_v(&left, 0)?;
            let right = comm.gather_v(&right, 0)?;
            Ok(left.zip(right))
        })
        .unwrap();
        let mut results = results.into_iter();
        let root = results.next().unwrap().unwrap().unwrap();
        assert!(results.all(|r| r.unwrap().is_none()));
        root
    }

    #[test]
    fn test_single_worker_matches_sequential() {
        let values = random_values(137, 997, 1);
        let (left, right) = ansv_parallel(&values, &SelfComm).unwrap();
        let (seq_left, seq_right) = ansv_sequential(&values).unwrap();
        assert_eq!(left, seq_left);
        assert_eq!(right, seq_right);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        assert!(matches!(
            ansv_parallel::<u64, _>(&[], &SelfComm),
            Err(Error::EmptyBlock { rank: 0 })
        ));
    }

    #[test]
    fn test_unbalanced_blocks_are_rejected() {
        let results = run_group(2, |comm| {
            // Rank 0 holds 3 values, rank 1 holds 1: total 4 must split 2/2.
            let local: Vec<u64> = if comm.rank() == 0 { vec![5, 3, 8] } else { vec![1] };
            ansv_parallel(&local, comm)
        })
        .unwrap();
        for result in results {
            assert!(matches!(
                result,
                Err(Error::UnbalancedBlocks { rank: 0, got: 3, expected: 2 })
            ));
        }
    }

    #[test]
    fn test_cross_block_answers() {
        // Split [4, 2, 5 | 3, 1, 6]: every unresolved slot crosses the cut.
        let (left, right) = distributed_ansv(&[4, 2, 5, 3, 1, 6], 2);
        assert_eq!(left, vec![0, 0, 1, 1, 0, 4]);
        assert_eq!(right, vec![1, 4, 3, 4, 0, 0]);
    }

    #[test]
    fn test_answer_can_skip_adjacent_workers() {
        // With one value per worker, the minimum at position 0 answers the
        // left query of every other worker except where 2 intervenes.
        let values = [1u64, 9, 8, 2, 9, 9];
        let (left, right) = distributed_ansv(&values, 6);
        assert_eq!(left, vec![0, 0, 0, 0, 3, 3]);
        assert_eq!(right, vec![0, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_all_equal_stays_unanswered_across_blocks() {
        let (left, right) = distributed_ansv(&[7, 7, 7, 7, 7, 7, 7, 7], 4);
        assert_eq!(left, vec![0; 8]);
        assert_eq!(right, vec![0; 8]);
    }

    #[test]
    fn test_partition_invariance() {
        for len in [13, 137, 1000, 4200, 13790] {
            let values = random_values(len, 997, len as u64);
            let (seq_left, seq_right) = ansv_sequential(&values).unwrap();
            for parts in [1, 2, 4, 7, 16] {
                if parts > len {
                    continue;
                }
                let (left, right) = distributed_ansv(&values, parts);
                assert_eq!(left, seq_left, "left arrays differ for n={len} p={parts}");
                assert_eq!(right, seq_right, "right arrays differ for n={len} p={parts}");
            }
        }
    }

    #[test]
    fn test_random_lengths_and_group_sizes() {
        // Small value range forces equal values across block boundaries,
        // where a non-strict comparison would silently change answers.
        let mut rng = SmallRng::seed_from_u64(1234);
        for _ in 0..50 {
            let len = rng.random_range(1..=300);
            let parts = rng.random_range(1..=8).min(len);
            let values: Vec<u64> = (0..len).map(|_| rng.random_range(0..50)).collect();
            let (seq_left, seq_right) = ansv_sequential(&values).unwrap();
            let (left, right) = distributed_ansv(&values, parts);
            assert_eq!(left, seq_left, "left arrays differ for n={len} p={parts}");
            assert_eq!(right, seq_right, "right arrays differ for n={len} p={parts}");
            check_nsv(&values, &left, Direction::Left).unwrap();
            check_nsv(&values, &right, Direction::Right).unwrap();
        }
    }

    #[test]
    fn test_boundary_stress() {
        let values = random_values(66_666, 10_000, 66);
        let (seq_left, seq_right) = ansv_sequential(&values).unwrap();
        for parts in [4, 16] {
            let (left, right) = distributed_ansv(&values, parts);
            assert_eq!(left, seq_left);
            assert_eq!(right, seq_right);
            check_nsv(&values, &left, Direction::Left).unwrap();
            check_nsv(&values, &right, Direction::Right).unwrap();
        }
    }

    #[test]
    fn test_large_input_wide_group() {
        let values = random_values(137_900, 10_000, 137);
        let (seq_left, seq_right) = ansv_sequential(&values).unwrap();
        let (left, right) = distributed_ansv(&values, 16);
        assert_eq!(left, seq_left);
        assert_eq!(right, seq_right);
    }
}
