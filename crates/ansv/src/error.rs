#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot compute nearest smaller values of an empty sequence")]
    EmptyInput,

    #[error("rank {rank} holds an empty block")]
    EmptyBlock { rank: usize },

    #[error("rank {rank} holds {got} values where the balanced partition expects {expected}")]
    UnbalancedBlocks {
        rank: usize,
        got: usize,
        expected: usize,
    },

    #[error("collective failure")]
    Comm(#[from] ansv_comm::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
