//! Task descriptors: a job spec merged with the solver's per-task output.
//!
//! A descriptor is built once per task, gets its reservations and agent id
//! filled in by the compiler, and is then turned into exactly one
//! [`LaunchMessage`](crate::protocol::LaunchMessage).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use tally_core::config::TaskConfig;
use tally_core::{
    CPUS, ContainerSpec, JobSpec, MEM, Reservation, ScalarRequirement, SolverOutput, TallyConfig,
    UriSpec,
};

use crate::error::{LaunchError, LaunchResult};
use crate::tables::ContainerType;

/// Self-contained description of one task to launch.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub task_id: String,
    /// `{job name}_{user}_{task id}`.
    pub name: String,
    pub job_uuid: String,
    pub user: String,
    pub command: Option<String>,
    pub uris: Vec<UriSpec>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub container: Option<ContainerSpec>,
    /// Opaque payload, see [`encode_task_data`].
    pub data: Vec<u8>,
    /// Wrap the command in the custom executor instead of running it directly.
    pub custom_executor: bool,
    pub framework_id: String,
    /// Set by the compiler from the offer batch.
    pub agent_id: Option<String>,
    pub requirements: Vec<ScalarRequirement>,
    /// Ports chosen by the solver, in order.
    pub ports: Vec<u64>,
    pub scalar_reservations: Vec<Reservation>,
    pub port_reservations: Vec<Reservation>,
}

/// Builds [`TaskDescriptor`]s, rejecting jobs that could never launch.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    task: TaskConfig,
    framework_id: String,
}

impl DescriptorBuilder {
    pub fn new(config: &TallyConfig) -> Self {
        Self {
            task: config.task.clone(),
            framework_id: config.framework.id.clone(),
        }
    }

    /// Override the framework id stamped on executor blocks.
    pub fn with_framework_id(mut self, framework_id: impl Into<String>) -> Self {
        self.framework_id = framework_id.into();
        self
    }

    pub fn build(&self, job: &JobSpec, solver: &SolverOutput) -> LaunchResult<TaskDescriptor> {
        validate(job, solver)?;

        let job_name = job.name.as_deref().unwrap_or(&self.task.default_job_name);
        let name = format!("{job_name}_{}_{}", job.user, solver.task_id);

        let requirements = [(CPUS, job.cpus), (MEM, job.mem)]
            .into_iter()
            .filter(|(_, amount)| *amount > 0.0)
            .map(|(resource, amount)| ScalarRequirement::new(resource, amount))
            .collect();

        let data = encode_task_data(job.instance_count)?;

        debug!(
            task = %solver.task_id,
            job = %job.uuid,
            ports = solver.ports.len(),
            "built task descriptor"
        );

        Ok(TaskDescriptor {
            task_id: solver.task_id.clone(),
            name,
            job_uuid: job.uuid.clone(),
            user: job.user.clone(),
            command: job.command.clone(),
            uris: job.uris.clone(),
            env: job.env.clone(),
            labels: job.labels.clone(),
            container: job.container.clone(),
            data,
            // Jobs stored before the flag existed always used the executor.
            custom_executor: job.custom_executor.unwrap_or(true),
            framework_id: self.framework_id.clone(),
            agent_id: None,
            requirements,
            ports: solver.ports.clone(),
            scalar_reservations: Vec::new(),
            port_reservations: Vec::new(),
        })
    }
}

fn validate(job: &JobSpec, solver: &SolverOutput) -> LaunchResult<()> {
    let invalid = |reason: String| LaunchError::InvalidJob {
        job: job.uuid.clone(),
        reason,
    };

    if solver.task_id.trim().is_empty() {
        return Err(invalid("empty task id".to_string()));
    }

    let has_command = job.command.as_deref().is_some_and(|c| !c.trim().is_empty());
    if !has_command && job.container.is_none() {
        return Err(invalid("no command and no container".to_string()));
    }

    for (resource, amount) in [(CPUS, job.cpus), (MEM, job.mem)] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(invalid(format!("{resource} must be a non-negative number, got {amount}")));
        }
    }

    if solver.ports.len() != job.ports as usize {
        return Err(invalid(format!(
            "requested {} ports but {} were assigned",
            job.ports,
            solver.ports.len()
        )));
    }
    let distinct: BTreeSet<u64> = solver.ports.iter().copied().collect();
    if distinct.len() != solver.ports.len() {
        return Err(invalid("duplicate assigned port".to_string()));
    }

    if let Some(container) = &job.container {
        // Unknown tokens are left for the compiler; only structure is checked here.
        if ContainerType::from_token(&container.kind) == Ok(ContainerType::Docker)
            && container.docker.is_none()
        {
            return Err(invalid("DOCKER container without a docker section".to_string()));
        }
    }

    Ok(())
}

/// Auxiliary metadata carried in a launch message's `data` field.
///
/// Best effort: the instance count is read from stored job state and may be
/// stale by the time the task starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    pub instance: String,
}

/// Encode [`TaskData`] as JSON prefixed by its big-endian `u32` length.
pub fn encode_task_data(instance_count: u32) -> LaunchResult<Vec<u8>> {
    let body = serde_json::to_vec(&TaskData {
        instance: instance_count.to_string(),
    })
    .map_err(|e| LaunchError::Payload(format!("serialize: {e}")))?;
    let len = u32::try_from(body.len())
        .map_err(|_| LaunchError::Payload(format!("{} bytes is too long", body.len())))?;

    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode_task_data(bytes: &[u8]) -> LaunchResult<TaskData> {
    let Some((prefix, body)) = bytes.split_first_chunk::<4>() else {
        return Err(LaunchError::Payload("missing length prefix".to_string()));
    };
    let len = u32::from_be_bytes(*prefix) as usize;
    if body.len() != len {
        return Err(LaunchError::Payload(format!(
            "length prefix says {len} bytes, found {}",
            body.len()
        )));
    }
    serde_json::from_slice(body).map_err(|e| LaunchError::Payload(format!("deserialize: {e}")))
}
