use crate::{BlockPartition, Communicator, Error, Message, Result};

/// The trivial group of one member: every collective is a local move.
///
/// Useful for running distributed algorithms unmodified on a single worker
/// and as the reference semantics for the threaded transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelfComm;

impl Communicator for SelfComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }

    fn broadcast<T: Message>(&self, value: Option<T>, root: usize) -> Result<T> {
        if root != 0 {
            return Err(Error::InvalidRoot { root, size: 1 });
        }
        value.ok_or(Error::Role { rank: 0, collective: "broadcast" })
    }

    fn all_gather_v<T: Message>(&self, local: &[T]) -> Result<Vec<Vec<T>>> {
        Ok(vec![local.to_vec()])
    }

    fn gather_v<T: Message>(&self, local: &[T], root: usize) -> Result<Option<Vec<T>>> {
        if root != 0 {
            return Err(Error::InvalidRoot { root, size: 1 });
        }
        Ok(Some(local.to_vec()))
    }

    fn all_to_all_v<T: Message>(&self, sends: Vec<Vec<T>>) -> Result<Vec<Vec<T>>> {
        if sends.len() != 1 {
            return Err(Error::SendCountMismatch { got: sends.len(), size: 1 });
        }
        Ok(sends)
    }

    fn exclusive_scan<T: Message>(
        &self,
        _value: T,
        identity: T,
        _op: impl Fn(&T, &T) -> T,
    ) -> Result<T> {
        Ok(identity)
    }

    fn block_distribute<T: Message>(
        &self,
        global: Option<Vec<T>>,
    ) -> Result<(Vec<T>, BlockPartition)> {
        let Some(global) = global else {
            return Err(Error::Role { rank: 0, collective: "block_distribute" });
        };
        if global.is_empty() {
            return Err(Error::EmptyDistribution);
        }
        let partition = BlockPartition::new(global.len(), 1);
        Ok((global, partition))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        let comm = SelfComm;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert!(comm.barrier().is_ok());
    }

    #[test]
    fn test_broadcast_requires_a_value() {
        let comm = SelfComm;
        assert_eq!(comm.broadcast(Some(3u8), 0).unwrap(), 3);
        assert!(matches!(comm.broadcast::<u8>(None, 0), Err(Error::Role { .. })));
        assert!(matches!(comm.broadcast(Some(3u8), 1), Err(Error::InvalidRoot { .. })));
    }

    #[test]
    fn test_gathers_are_identities() {
        let comm = SelfComm;
        assert_eq!(comm.all_gather_v(&[1, 2]).unwrap(), vec![vec![1, 2]]);
        assert_eq!(comm.gather_v(&[1, 2], 0).unwrap(), Some(vec![1, 2]));
        assert_eq!(comm.all_to_all_v(vec![vec![9u8]]).unwrap(), vec![vec![9]]);
        assert_eq!(comm.all_to_all_by(vec![1, 2, 3], |_| 0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_exclusive_scan_is_identity() {
        let comm = SelfComm;
        assert_eq!(comm.exclusive_scan(41u64, 0, |a, b| a + b).unwrap(), 0);
    }

    #[test]
    fn test_block_distribute_keeps_the_sequence() {
        let comm = SelfComm;
        let (local, partition) = comm.block_distribute(Some(vec![5u8, 6, 7])).unwrap();
        assert_eq!(local, vec![5, 6, 7]);
        assert_eq!(partition.range(0), 0..3);
        assert!(matches!(
            comm.block_distribute::<u8>(None),
            Err(Error::Role { .. })
        ));
    }
}
