//! Message compiler: turns an offer batch and task descriptors into
//! launch messages.
//!
//! Per batch:
//! 1. Build the [`ResourcePool`] from the offers
//! 2. For each descriptor, in order: reserve scalars, resolve port owners,
//!    export ports as environment variables, stamp the agent id
//! 3. Translate the descriptor into a [`LaunchMessage`]
//!
//! Each task is all-or-nothing against the pool: the pool only advances
//! once a task's message has compiled, so a refused task leaves no trace
//! for the tasks after it.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use tally_core::{ContainerSpec, Offer, TallyConfig};
use tally_pool::{ResourcePool, allocate_all, assign_ports, port_env};

use crate::descriptor::TaskDescriptor;
use crate::error::{LaunchError, LaunchResult};
use crate::protocol::{
    CommandInfo, CommandUri, ContainerInfo, DockerInfo, Environment, ExecutorInfo, Id, Image, Label,
    Labels, LaunchMessage, MesosInfo, NamedImage, Parameter, PortMapping, Resource, Variable, Volume,
};
use crate::tables::{ContainerType, ImageType, NetworkMode, VolumeMode};

/// A task that did not get a launch message, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub task_id: String,
    pub error: LaunchError,
}

/// Result of compiling one batch.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// One message per successful task, in input order.
    pub messages: Vec<LaunchMessage>,
    pub failures: Vec<TaskFailure>,
    /// What is left of the batch's capacity.
    pub pool: ResourcePool,
}

/// Compiles launch messages for a single offer batch at a time.
///
/// Holds no state between batches, so one compiler can serve independent
/// batches from any number of threads.
#[derive(Debug, Clone)]
pub struct MessageCompiler {
    config: TallyConfig,
}

impl MessageCompiler {
    pub fn new(config: TallyConfig) -> Self {
        Self { config }
    }

    pub fn compile(&self, offers: &[Offer], descriptors: Vec<TaskDescriptor>) -> CompileOutcome {
        let mut pool = ResourcePool::from_offers(offers);

        // All offers in a batch come from one agent.
        let Some(agent_id) = offers.first().map(|o| o.agent_id.clone()) else {
            warn!(tasks = descriptors.len(), "no offers in batch, nothing can launch");
            let failures = descriptors
                .into_iter()
                .map(|d| TaskFailure {
                    task_id: d.task_id,
                    error: LaunchError::NoOffers,
                })
                .collect();
            return CompileOutcome {
                messages: Vec::new(),
                failures,
                pool,
            };
        };

        let mut messages = Vec::with_capacity(descriptors.len());
        let mut failures = Vec::new();

        for desc in descriptors {
            let task_id = desc.task_id.clone();
            match self.compile_task(&pool, &agent_id, desc) {
                Ok((next, message)) => {
                    pool = next;
                    messages.push(message);
                }
                Err(error) => {
                    warn!(task = %task_id, %error, "task dropped from launch batch");
                    failures.push(TaskFailure { task_id, error });
                }
            }
        }

        info!(
            agent = %agent_id,
            launched = messages.len(),
            failed = failures.len(),
            "compiled launch batch"
        );

        CompileOutcome {
            messages,
            failures,
            pool,
        }
    }

    /// Reserve resources for one task against `pool` and compile its message.
    ///
    /// Returns the pool as it stands after this task.
    fn compile_task(
        &self,
        pool: &ResourcePool,
        agent_id: &str,
        mut desc: TaskDescriptor,
    ) -> LaunchResult<(ResourcePool, LaunchMessage)> {
        let allocation_error = |source| LaunchError::Allocation {
            task_id: desc.task_id.clone(),
            source,
        };

        let scalars = allocate_all(pool, &desc.requirements).map_err(allocation_error)?;
        let port_reservations = assign_ports(&scalars.pool, &desc.ports).map_err(allocation_error)?;

        desc.scalar_reservations = scalars.reservations;
        desc.port_reservations = port_reservations;
        desc.env
            .extend(port_env(&self.config.task.port_env_prefix, &desc.ports));
        desc.agent_id = Some(agent_id.to_string());

        let message = self.translate(&desc)?;
        debug!(task = %desc.task_id, resources = message.resources.len(), "compiled task");
        Ok((scalars.pool, message))
    }

    /// Translate a fully resourced descriptor into its wire message.
    pub fn translate(&self, desc: &TaskDescriptor) -> LaunchResult<LaunchMessage> {
        let agent_id = desc
            .agent_id
            .as_ref()
            .ok_or_else(|| LaunchError::NoAgent(desc.task_id.clone()))?;

        let resources = desc
            .scalar_reservations
            .iter()
            .chain(&desc.port_reservations)
            .map(Resource::from)
            .collect();

        let command = CommandInfo {
            value: desc.command.clone(),
            shell: desc.command.is_some(),
            user: Some(desc.user.clone()),
            environment: Environment {
                variables: desc
                    .env
                    .iter()
                    .map(|(name, value)| Variable {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            },
            uris: desc
                .uris
                .iter()
                .map(|u| CommandUri {
                    value: u.value.clone(),
                    executable: u.executable,
                    extract: u.extract,
                    cache: u.cache,
                })
                .collect(),
        };

        let container = desc.container.as_ref().map(translate_container).transpose()?;

        let mut message = LaunchMessage {
            name: desc.name.clone(),
            task_id: Id::new(&desc.task_id),
            agent_id: Id::new(agent_id),
            resources,
            labels: translate_labels(&desc.labels),
            data: desc.data.clone(),
            executor: None,
            command: None,
            container: None,
        };

        // The executor model expects the container inside the executor
        // block; the command model expects it beside the command.
        if desc.custom_executor {
            message.executor = Some(ExecutorInfo {
                executor_id: Id::new(&desc.task_id),
                framework_id: Id::new(&desc.framework_id),
                name: self.config.executor.name.clone(),
                source: self.config.executor.source.clone(),
                command,
                container,
            });
        } else {
            message.command = Some(command);
            message.container = container;
        }

        Ok(message)
    }
}

fn translate_labels(labels: &BTreeMap<String, String>) -> Labels {
    Labels {
        labels: labels
            .iter()
            .map(|(key, value)| Label {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
    }
}

fn translate_container(spec: &ContainerSpec) -> LaunchResult<ContainerInfo> {
    let kind = ContainerType::from_token(&spec.kind)?;

    let volumes = spec
        .volumes
        .iter()
        .map(|v| -> LaunchResult<Volume> {
            Ok(Volume {
                container_path: v.container_path.clone(),
                host_path: v.host_path.clone(),
                mode: VolumeMode::from_token(v.mode.as_deref())?,
            })
        })
        .collect::<LaunchResult<Vec<_>>>()?;

    let docker = spec
        .docker
        .as_ref()
        .map(|d| -> LaunchResult<DockerInfo> {
            Ok(DockerInfo {
                image: d.image.clone(),
                network: d.network.as_deref().map(NetworkMode::from_token).transpose()?,
                force_pull_image: d.force_pull_image,
                parameters: d
                    .parameters
                    .iter()
                    .map(|p| Parameter {
                        key: p.key.clone(),
                        value: p.value.clone(),
                    })
                    .collect(),
                port_mappings: d
                    .port_mappings
                    .iter()
                    .map(|m| PortMapping {
                        host_port: m.host_port,
                        container_port: m.container_port,
                        protocol: m.protocol.clone(),
                    })
                    .collect(),
            })
        })
        .transpose()?;

    let mesos = spec
        .mesos
        .as_ref()
        .map(|m| -> LaunchResult<MesosInfo> {
            let image = m
                .image
                .as_ref()
                .map(|img| -> LaunchResult<Image> {
                    let kind = ImageType::from_token(&img.kind)?;
                    let named = Some(NamedImage {
                        name: img.name.clone(),
                    });
                    Ok(match kind {
                        ImageType::Docker => Image {
                            kind,
                            docker: named,
                            appc: None,
                        },
                        ImageType::Appc => Image {
                            kind,
                            docker: None,
                            appc: named,
                        },
                    })
                })
                .transpose()?;
            Ok(MesosInfo { image })
        })
        .transpose()?;

    Ok(ContainerInfo {
        kind,
        volumes,
        docker,
        mesos,
    })
}
