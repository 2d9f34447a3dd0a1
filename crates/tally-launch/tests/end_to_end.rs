//! End-to-end launch compilation tests.
//!
//! Drives the full pipeline: job spec + solver output, then descriptor,
//! reservation against an offer batch, then launch message.

use std::collections::BTreeMap;

use tally_core::*;
use tally_launch::protocol::ValueType;
use tally_launch::*;

fn offer(agent: &str, resources: Vec<ResourceDeclaration>) -> Offer {
    Offer {
        id: format!("offer-{agent}"),
        agent_id: agent.to_string(),
        hostname: None,
        resources,
    }
}

fn job(uuid: &str, cpus: f64, ports: u32) -> JobSpec {
    JobSpec {
        uuid: uuid.to_string(),
        name: Some("svc".to_string()),
        user: "alice".to_string(),
        command: Some("./serve".to_string()),
        cpus,
        mem: 0.0,
        ports,
        uris: Vec::new(),
        env: BTreeMap::new(),
        labels: BTreeMap::new(),
        container: None,
        custom_executor: Some(false),
        instance_count: 0,
    }
}

fn descriptor(job: &JobSpec, task_id: &str, ports: Vec<u64>) -> TaskDescriptor {
    DescriptorBuilder::new(&TallyConfig::default())
        .build(
            job,
            &SolverOutput {
                task_id: task_id.to_string(),
                ports,
            },
        )
        .unwrap()
}

fn compiler() -> MessageCompiler {
    MessageCompiler::new(TallyConfig::default())
}

#[test]
fn single_task_reserves_cpus_and_port() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "*", 4.0),
        ResourceDeclaration::ranges(PORTS, "*", vec![Range::new(31000, 31010)]),
    ])];
    let desc = descriptor(&job("j1", 1.0, 1), "t1", vec![31005]);

    let out = compiler().compile(&offers, vec![desc]);

    assert!(out.failures.is_empty());
    let msg = &out.messages[0];
    assert_eq!(msg.resources.len(), 2);

    let cpus = &msg.resources[0];
    assert_eq!((cpus.name.as_str(), cpus.role.as_str()), (CPUS, "*"));
    assert_eq!(cpus.scalar.as_ref().unwrap().value, 1.0);

    let port = &msg.resources[1];
    assert_eq!((port.name.as_str(), port.role.as_str()), (PORTS, "*"));
    assert_eq!(port.kind, ValueType::Ranges);
    assert_eq!(port.ranges.as_ref().unwrap().range, vec![Range::single(31005)]);

    let env = &msg.command.as_ref().unwrap().environment;
    assert_eq!(env.get("PORT0"), Some("31005"));

    assert_eq!(out.pool.scalar(CPUS, "*"), 3.0);
}

#[test]
fn reserved_role_is_spent_before_wildcard() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "teamA", 2.0),
        ResourceDeclaration::scalar(CPUS, "*", 2.0),
    ])];
    let desc = descriptor(&job("j1", 3.0, 0), "t1", vec![]);

    let out = compiler().compile(&offers, vec![desc]);

    let resources = &out.messages[0].resources;
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].role, "teamA");
    assert_eq!(resources[0].scalar.as_ref().unwrap().value, 2.0);
    assert_eq!(resources[1].role, "*");
    assert_eq!(resources[1].scalar.as_ref().unwrap().value, 1.0);
    assert_eq!(out.pool.scalar(CPUS, "teamA"), 0.0);
    assert_eq!(out.pool.scalar(CPUS, "*"), 1.0);
}

#[test]
fn oversubscribed_task_is_excluded() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "teamA", 2.0),
        ResourceDeclaration::scalar(CPUS, "*", 2.0),
    ])];
    let desc = descriptor(&job("j1", 5.0, 0), "t1", vec![]);

    let out = compiler().compile(&offers, vec![desc]);

    assert!(out.messages.is_empty());
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].task_id, "t1");
    match &out.failures[0].error {
        LaunchError::Allocation {
            source:
                tally_pool::PoolError::Deficit {
                    resource,
                    requested,
                    unmet,
                    available,
                },
            ..
        } => {
            assert_eq!(resource, CPUS);
            assert_eq!(*requested, 5.0);
            assert_eq!(*unmet, 1.0);
            assert_eq!(
                available,
                &vec![("teamA".to_string(), 2.0), ("*".to_string(), 2.0)]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(out.pool.total(CPUS), 4.0);
}

#[test]
fn float_residue_never_reaches_the_wire() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "teamA", 0.1),
        ResourceDeclaration::scalar(CPUS, "teamA", 0.2),
        ResourceDeclaration::scalar(CPUS, "*", 2.0),
    ])];
    let descs = vec![
        descriptor(&job("j1", 0.3, 0), "t1", vec![]),
        descriptor(&job("j2", 1.0, 0), "t2", vec![]),
    ];

    let out = compiler().compile(&offers, descs);

    assert!(out.failures.is_empty());
    let second = &out.messages[1].resources;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].role, "*");
    assert_eq!(second[0].scalar.as_ref().unwrap().value, 1.0);
    assert_eq!(out.pool.scalar(CPUS, "teamA"), 0.0);
}

#[test]
fn later_tasks_see_earlier_reservations() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "*", 3.0),
        ResourceDeclaration::ranges(PORTS, "*", vec![Range::new(31000, 31010)]),
    ])];
    let descs = vec![
        descriptor(&job("j1", 2.0, 1), "t1", vec![31000]),
        descriptor(&job("j2", 2.0, 1), "t2", vec![31001]),
        descriptor(&job("j3", 1.0, 1), "t3", vec![31002]),
    ];

    let out = compiler().compile(&offers, descs);

    let launched: Vec<_> = out.messages.iter().map(|m| m.task_id.value.as_str()).collect();
    assert_eq!(launched, vec!["t1", "t3"]);
    assert_eq!(out.failures[0].task_id, "t2");
    assert_eq!(out.pool.scalar(CPUS, "*"), 0.0);
}

#[test]
fn docker_container_nests_inside_executor() {
    let mut spec = job("j1", 1.0, 0);
    spec.custom_executor = Some(true);
    spec.container = Some(ContainerSpec {
        kind: "DOCKER".to_string(),
        docker: Some(DockerSpec {
            image: "busybox:1.36".to_string(),
            network: Some("BRIDGE".to_string()),
            force_pull_image: false,
            parameters: vec![DockerParameter {
                key: "ulimit".to_string(),
                value: "nofile=1024".to_string(),
            }],
            port_mappings: Vec::new(),
        }),
        mesos: None,
        volumes: vec![
            VolumeSpec {
                container_path: "/etc/app".to_string(),
                host_path: Some("/srv/app".to_string()),
                mode: Some("RO".to_string()),
            },
            VolumeSpec {
                container_path: "/var/cache".to_string(),
                host_path: None,
                mode: None,
            },
        ],
    });
    let offers = vec![offer("agent-1", vec![ResourceDeclaration::scalar(CPUS, "*", 2.0)])];

    let out = compiler().compile(&offers, vec![descriptor(&spec, "t1", vec![])]);

    let msg = &out.messages[0];
    assert!(msg.container.is_none());
    assert!(msg.command.is_none());

    let executor = msg.executor.as_ref().unwrap();
    assert_eq!(executor.command.value.as_deref(), Some("./serve"));
    let container = executor.container.as_ref().unwrap();
    assert_eq!(container.kind, ContainerType::Docker);
    assert_eq!(
        container.docker.as_ref().unwrap().network,
        Some(NetworkMode::Bridge)
    );
    let modes: Vec<_> = container.volumes.iter().map(|v| v.mode).collect();
    assert_eq!(modes, vec![VolumeMode::ReadOnly, VolumeMode::ReadOnly]);

    let json = serde_json::to_value(msg).unwrap();
    assert!(json.get("container").is_none());
    assert_eq!(json["executor"]["container"]["type"], "DOCKER");
    assert_eq!(json["executor"]["container"]["docker"]["network"], "BRIDGE");
    assert_eq!(json["executor"]["container"]["volumes"][1]["mode"], "RO");
}

#[test]
fn compiling_twice_is_byte_identical() {
    let offers = vec![offer("agent-1", vec![
        ResourceDeclaration::scalar(CPUS, "teamA", 1.0),
        ResourceDeclaration::scalar(CPUS, "*", 4.0),
        ResourceDeclaration::scalar(MEM, "*", 2048.0),
        ResourceDeclaration::ranges(PORTS, "*", vec![Range::new(31000, 31010)]),
    ])];
    let mut spec = job("j1", 1.5, 2);
    spec.mem = 512.0;
    spec.env = BTreeMap::from([
        ("Z_LAST".to_string(), "1".to_string()),
        ("A_FIRST".to_string(), "2".to_string()),
    ]);
    spec.labels = BTreeMap::from([("team".to_string(), "infra".to_string())]);
    let descs = vec![descriptor(&spec, "t1", vec![31004, 31001])];

    let first = compiler().compile(&offers, descs.clone());
    let second = compiler().compile(&offers, descs);

    let a = serde_json::to_vec(&first.messages).unwrap();
    let b = serde_json::to_vec(&second.messages).unwrap();
    assert_eq!(a, b);
}

#[test]
fn data_payload_survives_to_the_message() {
    let mut spec = job("j1", 1.0, 0);
    spec.instance_count = 3;
    let offers = vec![offer("agent-1", vec![ResourceDeclaration::scalar(CPUS, "*", 1.0)])];

    let out = compiler().compile(&offers, vec![descriptor(&spec, "t1", vec![])]);

    let data = decode_task_data(&out.messages[0].data).unwrap();
    assert_eq!(data.instance, "3");
}

#[test]
fn offers_parse_from_json() {
    let json = r#"[{
        "id": "o-1",
        "agent_id": "agent-9",
        "resources": [
            {"name": "cpus", "kind": "scalar", "scalar": 4.0},
            {"name": "ports", "role": "web", "kind": "ranges", "ranges": [{"begin": 8000, "end": 8010}]}
        ]
    }]"#;
    let offers: Vec<Offer> = serde_json::from_str(json).unwrap();
    let desc = descriptor(&job("j1", 1.0, 1), "t1", vec![8005]);

    let out = compiler().compile(&offers, vec![desc]);

    let msg = &out.messages[0];
    assert_eq!(msg.agent_id.value, "agent-9");
    assert_eq!(msg.resources[1].role, "web");
}
