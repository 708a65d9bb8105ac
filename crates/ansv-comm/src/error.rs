#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("worker group must have at least one member")]
    EmptyGroup,

    #[error("root rank {root} out of range for group of size {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("destination rank {dest} out of range for group of size {size}")]
    InvalidDestination { dest: usize, size: usize },

    #[error("rank {rank} took the wrong role in {collective}")]
    Role {
        rank: usize,
        collective: &'static str,
    },

    #[error("send buffers for {got} destinations in a group of size {size}")]
    SendCountMismatch { got: usize, size: usize },

    #[error("cannot block-distribute an empty sequence")]
    EmptyDistribution,

    #[error("rank {peer} left the group mid-collective")]
    Disconnected { peer: usize },

    #[error("payload of unexpected type from rank {from}")]
    Protocol { from: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
