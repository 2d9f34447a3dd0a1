//! Launch compilation error types.

use tally_pool::PoolError;
use thiserror::Error;

/// Errors that keep a task from getting a launch message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaunchError {
    #[error("invalid job {job}: {reason}")]
    InvalidJob { job: String, reason: String },

    #[error("unknown container type: {0}")]
    UnknownContainerType(String),

    #[error("unknown network mode: {0}")]
    UnknownNetworkMode(String),

    #[error("unknown volume mode: {0}")]
    UnknownVolumeMode(String),

    #[error("unknown image type: {0}")]
    UnknownImageType(String),

    #[error("task {task_id}: {source}")]
    Allocation { task_id: String, source: PoolError },

    #[error("task {0} has no agent id")]
    NoAgent(String),

    #[error("offer batch is empty")]
    NoOffers,

    #[error("task data payload: {0}")]
    Payload(String),
}

pub type LaunchResult<T> = Result<T, LaunchError>;
