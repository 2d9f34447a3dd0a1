//! tally-pool: per-role resource accounting for one offer batch.
//!
//! Turns a batch of offers into a [`ResourcePool`] and carves exact
//! reservations out of it. It does NOT choose which tasks run where
//! (that's the assignment solver); it only checks and records what the
//! solver already decided.
//!
//! # Components
//!
//! - **`pool`**: Pool construction (`name -> role -> value`)
//! - **`scalar`**: Role-ordered scalar allocation, wildcard role last
//! - **`ports`**: Owning-role lookup for pre-selected ports
//!
//! Every operation takes the pool by reference and returns a new one, so
//! a failed allocation never disturbs the caller's copy. Threading the
//! pool through a batch of tasks is left to the launch compiler, which
//! commits a task's reservations only once its whole message compiles.

pub mod error;
pub mod pool;
pub mod ports;
pub mod scalar;

pub use error::{PoolError, PoolResult};
pub use pool::ResourcePool;
pub use ports::{assign_ports, owning_role, port_env};
pub use scalar::{ScalarAllocation, allocate, allocate_all};
