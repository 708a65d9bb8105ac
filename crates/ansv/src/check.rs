//! Independent RMQ-driven verification of nearest-smaller arrays.
//!
//! The checker never looks at how an array was produced; it re-derives every
//! claim from range minima. Equal values make the nearest answer non-unique
//! from the checker's point of view, so resolved entries are accepted when
//! the gap minimum equals the answer's value, and a left sentinel is
//! accepted when position 0 holds the prefix minimum (the sentinel aliases
//! index 0).

use rayon::prelude::*;

use crate::rmq::SparseRmq;

/// Which side of each position an array claims to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckError {
    #[error("position {position}: sentinel entry, but a strictly smaller value exists on that side")]
    FalseSentinel { position: usize },

    #[error("position {position}: answer {answer} lies on the wrong side")]
    WrongSide { position: usize, answer: usize },

    #[error("position {position}: value at answer {answer} is not strictly smaller")]
    NotSmaller { position: usize, answer: usize },

    #[error("position {position}: a nearer candidate than answer {answer} exists")]
    NotNearest { position: usize, answer: usize },
}

/// Verifies one nearest-smaller array against its sequence.
///
/// # Panics
///
/// If the array lengths differ; that is a harness bug, not a checkable
/// property.
pub fn check_nsv<T>(values: &[T], nsv: &[usize], direction: Direction) -> Result<(), CheckError>
where
    T: Ord + Sync,
{
    assert_eq!(values.len(), nsv.len(), "sequence and answer array must have equal length");
    let rmq = SparseRmq::new(values);
    (0..values.len())
        .into_par_iter()
        .try_for_each(|i| check_position(values, &rmq, nsv[i], i, direction))
}

fn check_position<T: Ord>(
    values: &[T],
    rmq: &SparseRmq<'_, T>,
    answer: usize,
    i: usize,
    direction: Direction,
) -> Result<(), CheckError> {
    let n = values.len();
    match (direction, answer) {
        (Direction::Left, 0) => {
            // Either no smaller value exists left of i (i holds the prefix
            // minimum) or the answer really is position 0.
            if i > 0 {
                let min = rmq.min(0..i + 1);
                if values[i] != *min && values[0] != *min {
                    return Err(CheckError::FalseSentinel { position: i });
                }
            }
        }
        (Direction::Right, 0) => {
            if i + 1 < n && values[i] != *rmq.min(i..n) {
                return Err(CheckError::FalseSentinel { position: i });
            }
        }
        (Direction::Left, s) => {
            if s >= i {
                return Err(CheckError::WrongSide { position: i, answer: s });
            }
            if values[s] >= values[i] {
                return Err(CheckError::NotSmaller { position: i, answer: s });
            }
            if s + 1 < i {
                let min = rmq.min(s + 1..i);
                if values[i] > *min && values[s] != *min {
                    return Err(CheckError::NotNearest { position: i, answer: s });
                }
            }
        }
        (Direction::Right, s) => {
            if s <= i {
                return Err(CheckError::WrongSide { position: i, answer: s });
            }
            if values[s] >= values[i] {
                return Err(CheckError::NotSmaller { position: i, answer: s });
            }
            if i + 1 < s {
                let min = rmq.min(i + 1..s);
                if values[i] > *min && values[s] != *min {
                    return Err(CheckError::NotNearest { position: i, answer: s });
                }
            }
        }
    }
    Ok(())
}
