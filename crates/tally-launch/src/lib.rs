//! tally-launch: compiles solver decisions into agent launch messages.
//!
//! Takes jobs paired with the assignment solver's output, reserves their
//! resources against one offer batch (via `tally-pool`), and emits one
//! wire-ready [`LaunchMessage`] per task.
//!
//! # Architecture
//!
//! ```text
//! JobSpec + SolverOutput
//!   └── DescriptorBuilder ──► TaskDescriptor
//!                                  │
//! Offers ──► ResourcePool ──► MessageCompiler
//!                                  ├── allocate_all (scalars, role order)
//!                                  ├── assign_ports (owning role, PORTn env)
//!                                  └── translate ──► LaunchMessage
//! ```
//!
//! Tasks that cannot launch are reported as [`TaskFailure`]s and never
//! hold capacity in the batch's pool.

pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod protocol;
pub mod tables;

pub use compiler::{CompileOutcome, MessageCompiler, TaskFailure};
pub use descriptor::{DescriptorBuilder, TaskData, TaskDescriptor, decode_task_data, encode_task_data};
pub use error::{LaunchError, LaunchResult};
pub use protocol::LaunchMessage;
pub use tables::{ContainerType, ImageType, NetworkMode, VolumeMode};
