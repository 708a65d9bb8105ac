#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! All Nearest Smaller Values (ANSV) for in-memory and block-distributed
//! sequences.
//!
//! For every position of a totally ordered sequence, ANSV finds the nearest
//! position to its left and to its right holding a strictly smaller value.
//! [`ansv_sequential`] is the classic linear-time monotone-stack sweep;
//! [`ansv_parallel`] runs the same sweep per block of a distributed sequence
//! and settles the positions whose answer lies on another worker through one
//! exchange of monotone boundary stacks, so the number of communication
//! rounds is constant and the result is identical for every group size.
//!
//! Output arrays use the sentinel convention of the surrounding pipeline:
//! `0` means "no smaller value on this side", which aliases the legitimate
//! answer "position 0". Consumers that must distinguish the two check the
//! first sequence value; the [`check`] module does.

mod error;
pub use error::{Error, Result};

pub mod rmq;

mod sweep;
pub use sweep::ansv_sequential;

mod boundary;
mod resolve;

mod parallel;
pub use parallel::ansv_parallel;

pub mod check;
