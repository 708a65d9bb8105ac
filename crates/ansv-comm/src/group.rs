use std::any::Any;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use crate::{BlockPartition, Communicator, Error, Message, Result};

type Payload = Box<dyn Any + Send>;

/// One member of an in-process worker group.
///
/// Every pair of ranks is connected by a dedicated FIFO channel, so messages
/// from a given peer arrive in the order that peer sent them. Together with
/// the rule that all members issue the same collectives in the same order,
/// this makes tagging unnecessary: the next payload from rank `s` always
/// belongs to the collective currently being executed.
pub struct GroupComm {
    rank: usize,
    parts: usize,
    /// `peers[d]` sends to rank `d` (including `d == rank`).
    peers: Vec<Sender<Payload>>,
    /// `inboxes[s]` receives from rank `s`.
    inboxes: Vec<Receiver<Payload>>,
}

impl GroupComm {
    fn send<T: Message>(&self, to: usize, value: T) -> Result<()> {
        self.peers[to]
            .send(Box::new(value))
            .map_err(|_| Error::Disconnected { peer: to })
    }

    fn recv<T: Message>(&self, from: usize) -> Result<T> {
        let payload = self.inboxes[from]
            .recv()
            .map_err(|_| Error::Disconnected { peer: from })?;
        match payload.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => {
                debug_assert!(false, "payload of unexpected type from rank {from}");
                Err(Error::Protocol { from })
            }
        }
    }

    fn check_root(&self, root: usize) -> Result<()> {
        if root < self.parts {
            Ok(())
        } else {
            Err(Error::InvalidRoot { root, size: self.parts })
        }
    }
}

impl Communicator for GroupComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.parts
    }

    fn barrier(&self) -> Result<()> {
        for d in 0..self.parts {
            self.send(d, ())?;
        }
        for s in 0..self.parts {
            self.recv::<()>(s)?;
        }
        Ok(())
    }

    fn broadcast<T: Message>(&self, value: Option<T>, root: usize) -> Result<T> {
        self.check_root(root)?;
        if self.rank == root {
            let Some(value) = value else {
                return Err(Error::Role { rank: self.rank, collective: "broadcast" });
            };
            for d in 0..self.parts {
                if d != self.rank {
                    self.send(d, value.clone())?;
                }
            }
            Ok(value)
        } else {
            if value.is_some() {
                return Err(Error::Role { rank: self.rank, collective: "broadcast" });
            }
            self.recv(root)
        }
    }

    fn all_gather_v<T: Message>(&self, local: &[T]) -> Result<Vec<Vec<T>>> {
        for d in 0..self.parts {
            self.send(d, local.to_vec())?;
        }
        (0..self.parts).map(|s| self.recv::<Vec<T>>(s)).collect()
    }

    fn gather_v<T: Message>(&self, local: &[T], root: usize) -> Result<Option<Vec<T>>> {
        self.check_root(root)?;
        if self.rank == root {
            let mut out = Vec::new();
            for s in 0..self.parts {
                if s == self.rank {
                    out.extend_from_slice(local);
                } else {
                    out.extend(self.recv::<Vec<T>>(s)?);
                }
            }
            Ok(Some(out))
        } else {
            self.send(root, local.to_vec())?;
            Ok(None)
        }
    }

    fn all_to_all_v<T: Message>(&self, sends: Vec<Vec<T>>) -> Result<Vec<Vec<T>>> {
        if sends.len() != self.parts {
            return Err(Error::SendCountMismatch { got: sends.len(), size: self.parts });
        }
        for (d, buffer) in sends.into_iter().enumerate() {
            self.send(d, buffer)?;
        }
        (0..self.parts).map(|s| self.recv::<Vec<T>>(s)).collect()
    }

    fn exclusive_scan<T: Message>(
        &self,
        value: T,
        identity: T,
        op: impl Fn(&T, &T) -> T,
    ) -> Result<T> {
        let acc = if self.rank == 0 {
            identity
        } else {
            self.recv::<T>(self.rank - 1)?
        };
        if self.rank + 1 < self.parts {
            self.send(self.rank + 1, op(&acc, &value))?;
        }
        Ok(acc)
    }

    fn block_distribute<T: Message>(
        &self,
        global: Option<Vec<T>>,
    ) -> Result<(Vec<T>, BlockPartition)> {
        if self.rank == 0 {
            let Some(global) = global else {
                return Err(Error::Role { rank: self.rank, collective: "block_distribute" });
            };
            if global.is_empty() {
                return Err(Error::EmptyDistribution);
            }
            let partition = BlockPartition::new(global.len(), self.parts);
            for d in 1..self.parts {
                self.send(d, (global.len(), global[partition.range(d)].to_vec()))?;
            }
            let local = global[partition.range(0)].to_vec();
            Ok((local, partition))
        } else {
            if global.is_some() {
                return Err(Error::Role { rank: self.rank, collective: "block_distribute" });
            }
            let (total, local) = self.recv::<(usize, Vec<T>)>(0)?;
            let partition = BlockPartition::new(total, self.parts);
            debug_assert_eq!(local.len(), partition.len(self.rank));
            Ok((local, partition))
        }
    }
}

/// Runs `f` on a fresh group of `parts` workers, one OS thread per rank.
///
/// Results are returned in rank order. A panicking worker is propagated once
/// the whole group has wound down; its peers observe [`Error::Disconnected`]
/// on their next collective and unwind normally.
pub fn run_group<R, F>(parts: usize, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(&GroupComm) -> R + Send + Sync,
{
    if parts == 0 {
        return Err(Error::EmptyGroup);
    }
    tracing::debug!(parts, "spawning worker group");
    let comms = wire(parts);
    let results = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                scope.spawn(move || {
                    let _span = tracing::trace_span!("worker", rank = comm.rank()).entered();
                    f(&comm)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    });
    results
        .into_iter()
        .map(|result| match result {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        })
        .collect()
}

/// Connects every pair of ranks with a dedicated channel.
fn wire(parts: usize) -> Vec<GroupComm> {
    let mut peers: Vec<Vec<Sender<Payload>>> =
        (0..parts).map(|_| Vec::with_capacity(parts)).collect();
    let mut inboxes: Vec<Vec<Receiver<Payload>>> =
        (0..parts).map(|_| Vec::with_capacity(parts)).collect();
    for dst in 0..parts {
        for src in 0..parts {
            let (tx, rx) = channel();
            peers[src].push(tx);
            inboxes[dst].push(rx);
        }
    }
    peers
        .into_iter()
        .zip(inboxes)
        .enumerate()
        .map(|(rank, (peers, inboxes))| GroupComm { rank, parts, peers, inboxes })
        .collect()
}
