use std::path::Path;

use serde::Serialize;
use tracing::warn;

use tally_core::{Offer, TallyConfig, TaskAssignment};
use tally_launch::{DescriptorBuilder, LaunchMessage, MessageCompiler};
use tally_pool::ResourcePool;

/// What `tally compile` prints.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub messages: Vec<LaunchMessage>,
    pub failures: Vec<FailureReport>,
    pub remaining: ResourcePool,
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub task_id: String,
    pub error: String,
}

pub fn run(
    offers: &Path,
    tasks: &Path,
    config: Option<&Path>,
    framework_id: Option<&str>,
) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let offers: Vec<Offer> = super::read_json(offers)?;
    let tasks: Vec<TaskAssignment> = super::read_json(tasks)?;

    let report = compile_batch(&offers, &tasks, config, framework_id);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Build descriptors, then compile them against `offers`.
///
/// Jobs rejected by the descriptor builder are reported without touching
/// the pool.
pub fn compile_batch(
    offers: &[Offer],
    tasks: &[TaskAssignment],
    config: TallyConfig,
    framework_id: Option<&str>,
) -> BatchReport {
    let mut builder = DescriptorBuilder::new(&config);
    if let Some(id) = framework_id {
        builder = builder.with_framework_id(id);
    }

    let mut failures = Vec::new();
    let mut descriptors = Vec::with_capacity(tasks.len());
    for task in tasks {
        match builder.build(&task.job, &task.solver) {
            Ok(desc) => descriptors.push(desc),
            Err(e) => {
                warn!(task = %task.solver.task_id, error = %e, "rejected before reservation");
                failures.push(FailureReport {
                    task_id: task.solver.task_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let outcome = MessageCompiler::new(config).compile(offers, descriptors);
    failures.extend(outcome.failures.into_iter().map(|f| FailureReport {
        task_id: f.task_id,
        error: f.error.to_string(),
    }));

    BatchReport {
        messages: outcome.messages,
        failures,
        remaining: outcome.pool,
    }
}
