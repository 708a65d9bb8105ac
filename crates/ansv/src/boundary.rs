//! Boundary-stack exchange.
//!
//! After its local sweeps, each worker keeps two residual stacks: the
//! positions that can still answer nearest-smaller queries from other
//! blocks. The stacks are monotone and small (the suffix respectively
//! prefix minima chain of the block), so the whole group all-gathers them
//! once and every cross-block query becomes a local lookup.

use ansv_comm::Communicator;

use crate::Result;

/// One residual-stack slot, addressed by owner rather than by global index.
///
/// The resolver compares values straight from the entry and forms the global
/// index only at the final write, so boundary data never has to be re-fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BoundaryEntry<T> {
    pub rank: u32,
    /// Local index within the owning rank's block.
    pub index: usize,
    pub value: T,
}

pub(crate) fn residual_entries<T: Ord + Copy>(
    rank: usize,
    stack: &[usize],
    values: &[T],
) -> Vec<BoundaryEntry<T>> {
    stack
        .iter()
        .map(|&index| BoundaryEntry { rank: rank as u32, index, value: values[index] })
        .collect()
}

/// All-gathers both residual stacks in rank order.
///
/// Every worker observes the identical sequence of stacks; the collective
/// doubles as the barrier between the sweep and resolution phases.
pub(crate) fn exchange<T, C>(
    comm: &C,
    left: &[BoundaryEntry<T>],
    right: &[BoundaryEntry<T>],
) -> Result<(Vec<Vec<BoundaryEntry<T>>>, Vec<Vec<BoundaryEntry<T>>>)>
where
    T: Ord + Copy + Send + 'static,
    C: Communicator,
{
    let all_left = comm.all_gather_v(left)?;
    let all_right = comm.all_gather_v(right)?;
    debug_assert!(
        all_left.iter().chain(all_right.iter()).all(|stack| is_monotone(stack)),
        "gathered boundary stack is not strictly increasing"
    );
    Ok((all_left, all_right))
}

fn is_monotone<T: Ord>(stack: &[BoundaryEntry<T>]) -> bool {
    stack.windows(2).all(|pair| pair[0].value < pair[1].value)
}
