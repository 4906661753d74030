//! Sum reduction of `f32` vectors on a reducebench device.
//!
//! The reduction runs in two dispatches on the same in-order queue. The first folds every cube's
//! slice in shared memory and publishes one partial sum per cube. The second, a single unit,
//! combines the partial sums into slot 0.

#[macro_use]
extern crate derive_new;

mod combine;
mod config;
mod error;
mod launch;
mod shared_sum;

pub use combine::*;
pub use config::*;
pub use error::*;
pub use launch::*;
pub use shared_sum::*;
