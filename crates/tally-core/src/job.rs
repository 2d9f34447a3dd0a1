//! Job specifications and the assignment solver's per-task output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A submitted job, as stored by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub uuid: String,
    /// Display name. Falls back to the configured default when absent.
    #[serde(default)]
    pub name: Option<String>,
    pub user: String,
    /// Shell command line. Required unless a container is given.
    #[serde(default)]
    pub command: Option<String>,
    /// CPU shares per task.
    pub cpus: f64,
    /// Memory per task, in MiB.
    pub mem: f64,
    /// Number of ports the task needs; the solver picks which ones.
    #[serde(default)]
    pub ports: u32,
    #[serde(default)]
    pub uris: Vec<UriSpec>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub container: Option<ContainerSpec>,
    /// Wrap the command in the custom executor. Unset means `true`.
    #[serde(default)]
    pub custom_executor: Option<bool>,
    /// How many instances of this job have been created so far.
    #[serde(default)]
    pub instance_count: u32,
}

/// A file the agent fetches into the sandbox before launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UriSpec {
    pub value: String,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub extract: bool,
    #[serde(default)]
    pub cache: bool,
}

/// Container settings as written in a job spec, using short tokens
/// (`"DOCKER"`, `"BRIDGE"`, `"RO"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub docker: Option<DockerSpec>,
    #[serde(default)]
    pub mesos: Option<MesosSpec>,
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerSpec {
    pub image: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub force_pull_image: bool,
    #[serde(default)]
    pub parameters: Vec<DockerParameter>,
    #[serde(default)]
    pub port_mappings: Vec<PortMappingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerParameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMappingSpec {
    pub host_port: u32,
    pub container_port: u32,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MesosSpec {
    #[serde(default)]
    pub image: Option<ImageSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub container_path: String,
    #[serde(default)]
    pub host_path: Option<String>,
    /// `"RW"`, `"RO"`, or absent (read-only).
    #[serde(default)]
    pub mode: Option<String>,
}

/// What the assignment solver decided for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutput {
    pub task_id: String,
    /// Concrete port numbers, in the order the task will see them.
    #[serde(default)]
    pub ports: Vec<u64>,
}

/// A job paired with its solver output; the unit of input to the launch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub job: JobSpec,
    #[serde(flatten)]
    pub solver: SolverOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_job() {
        let json = r#"{
            "uuid": "0b7c9a36",
            "user": "alice",
            "command": "echo hello",
            "cpus": 1.0,
            "mem": 128.0
        }"#;
        let job: JobSpec = serde_json::from_str(json).unwrap();
        assert_eq!(job.name, None);
        assert_eq!(job.ports, 0);
        assert_eq!(job.custom_executor, None);
        assert!(job.env.is_empty());
        assert!(job.container.is_none());
    }

    #[test]
    fn parses_docker_container() {
        let json = r#"{
            "type": "DOCKER",
            "docker": {"image": "busybox:latest", "network": "BRIDGE"},
            "volumes": [
                {"container_path": "/data", "host_path": "/mnt/data", "mode": "RW"},
                {"container_path": "/scratch"}
            ]
        }"#;
        let container: ContainerSpec = serde_json::from_str(json).unwrap();
        assert_eq!(container.kind, "DOCKER");
        let docker = container.docker.unwrap();
        assert_eq!(docker.network.as_deref(), Some("BRIDGE"));
        assert!(!docker.force_pull_image);
        assert_eq!(container.volumes.len(), 2);
        assert_eq!(container.volumes[1].mode, None);
    }

    #[test]
    fn assignment_flattens_solver_fields() {
        let json = r#"{
            "job": {"uuid": "j1", "user": "bob", "command": "true", "cpus": 0.5, "mem": 64.0, "ports": 1},
            "task_id": "t1",
            "ports": [31005]
        }"#;
        let assignment: TaskAssignment = serde_json::from_str(json).unwrap();
        assert_eq!(assignment.solver.task_id, "t1");
        assert_eq!(assignment.solver.ports, vec![31005]);
        assert_eq!(assignment.job.ports, 1);
    }
}
