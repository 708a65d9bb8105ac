#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collective message primitives for block-distributed sequence algorithms.
//!
//! A worker group is a fixed set of P ranks that advance through the same
//! sequence of collective calls. The [`Communicator`] trait is the contract a
//! distributed algorithm consumes; the two transports here are [`SelfComm`]
//! (the trivial single-member group) and in-process thread groups spawned by
//! [`run_group`]. All collectives are blocking and deterministic: gathered
//! data is always delivered in rank order, independent of worker timing.

mod error;
pub use error::{Error, Result};

mod partition;
pub use partition::BlockPartition;

mod group;
pub use group::{GroupComm, run_group};

mod single;
pub use single::SelfComm;

/// Anything that can travel between ranks.
///
/// Collectives hand copies of the same buffer to several ranks, hence
/// `Clone`; `Send + 'static` is what the in-process transport needs to move
/// payloads across threads.
pub trait Message: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> Message for T {}

/// Blocking collective operations over a fixed worker group.
///
/// Every member must invoke the same collectives in the same order with
/// compatible arguments; the transports deadlock or error otherwise, they do
/// not reorder. A transport error from any method aborts the surrounding
/// call and leaves no usable partial result.
pub trait Communicator {
    /// This member's rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of members in the group.
    fn size(&self) -> usize;

    /// Completion synchronization point: returns only after every member
    /// has entered the barrier.
    fn barrier(&self) -> Result<()>;

    /// Sends `value` from `root` to every member.
    ///
    /// The root must supply `Some`, every other rank `None`; a mismatch is
    /// an observable [`Error::Role`] rather than a silent no-op.
    fn broadcast<T: Message>(&self, value: Option<T>, root: usize) -> Result<T>;

    /// Every member obtains every member's variable-length contribution,
    /// indexed by rank.
    fn all_gather_v<T: Message>(&self, local: &[T]) -> Result<Vec<Vec<T>>>;

    /// The root obtains the rank-ordered concatenation of all
    /// contributions; other ranks receive `None`.
    fn gather_v<T: Message>(&self, local: &[T], root: usize) -> Result<Option<Vec<T>>>;

    /// Permuted delivery of per-destination buffers: `sends[d]` goes to
    /// rank `d`, and the result holds one buffer per source rank.
    ///
    /// `sends.len()` must equal the group size.
    fn all_to_all_v<T: Message>(&self, sends: Vec<Vec<T>>) -> Result<Vec<Vec<T>>>;

    /// Buckets `msgs` by destination rank and exchanges them, returning the
    /// received messages in source-rank order.
    fn all_to_all_by<T: Message>(
        &self,
        msgs: Vec<T>,
        dest: impl Fn(&T) -> usize,
    ) -> Result<Vec<T>> {
        let size = self.size();
        let mut sends: Vec<Vec<T>> = (0..size).map(|_| Vec::new()).collect();
        for msg in msgs {
            let d = dest(&msg);
            if d >= size {
                return Err(Error::InvalidDestination { dest: d, size });
            }
            sends[d].push(msg);
        }
        Ok(self.all_to_all_v(sends)?.into_iter().flatten().collect())
    }

    /// Exclusive scan: rank r receives `op` folded over the values of all
    /// ranks `< r`; rank 0 receives `identity`.
    fn exclusive_scan<T: Message>(
        &self,
        value: T,
        identity: T,
        op: impl Fn(&T, &T) -> T,
    ) -> Result<T>;

    /// Fans the root-held sequence out into balanced contiguous blocks.
    ///
    /// Rank 0 supplies the sequence, every other rank passes `None`; each
    /// member returns its own block together with the [`BlockPartition`]
    /// describing the whole distribution. Distributing an empty sequence is
    /// a precondition error.
    fn block_distribute<T: Message>(
        &self,
        global: Option<Vec<T>>,
    ) -> Result<(Vec<T>, BlockPartition)>;
}
