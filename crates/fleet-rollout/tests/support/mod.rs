//! In-memory fakes for the artifact store, process runtime and prober.
//!
//! All three append to a shared call log so tests can assert step order.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use fleet_core::{FleetConfig, RobotConfig};
use fleet_health::{ProbeFuture, ProbeResult, Prober};
use fleet_rollout::{
    ArtifactStore, ProcessHandle, ProcessRuntime, RunningSet, RuntimeError, StoreError,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn fleet_config() -> FleetConfig {
    FleetConfig::from_toml(
        r#"
[app]
image = "robot-app"
project = "robot-fleet"

[[robots]]
id = "robot-1"
port = 8001

[[robots]]
id = "robot-2"
port = 8002

[[robots]]
id = "robot-3"
port = 8003
"#,
    )
    .unwrap()
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Index of the first call starting with `prefix`.
pub fn position(log: &CallLog, prefix: &str) -> Option<usize> {
    calls(log).iter().position(|c| c.starts_with(prefix))
}

pub struct FakeStore {
    pub tags: Mutex<Vec<String>>,
    pub fail_build: bool,
    log: CallLog,
}

impl FakeStore {
    pub fn new(tags: &[&str], log: &CallLog) -> Self {
        Self {
            tags: Mutex::new(tags.iter().map(|t| t.to_string()).collect()),
            fail_build: false,
            log: log.clone(),
        }
    }

    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.lock().unwrap().iter().any(|t| t == tag)
    }
}

impl ArtifactStore for FakeStore {
    fn list_tags(&self, _image: &str) -> Result<Vec<String>, StoreError> {
        self.log.lock().unwrap().push("list_tags".to_string());
        Ok(self.tags.lock().unwrap().clone())
    }

    fn exists(&self, _image: &str, tag: &str) -> Result<bool, StoreError> {
        self.log.lock().unwrap().push(format!("exists:{tag}"));
        Ok(self.has(tag))
    }

    fn build(&self, _context: &Path, _image: &str, tags: &[String]) -> Result<(), StoreError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("build:{}", tags.join(",")));
        if self.fail_build {
            return Err(StoreError::Build("step 3/5 failed".to_string()));
        }
        let mut stored = self.tags.lock().unwrap();
        for tag in tags {
            if !stored.contains(tag) {
                stored.push(tag.clone());
            }
        }
        Ok(())
    }
}

pub struct FakeRuntime {
    pub running: Mutex<Vec<String>>,
    pub port_owners: Mutex<HashMap<u16, String>>,
    pub started_version: Mutex<Option<String>>,
    log: CallLog,
}

impl FakeRuntime {
    pub fn new(log: &CallLog) -> Self {
        Self {
            running: Mutex::new(Vec::new()),
            port_owners: Mutex::new(HashMap::new()),
            started_version: Mutex::new(None),
            log: log.clone(),
        }
    }

    pub fn with_running(self, instances: &[&str]) -> Self {
        *self.running.lock().unwrap() = instances.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_port_owner(self, port: u16, id: &str) -> Self {
        self.port_owners.lock().unwrap().insert(port, id.to_string());
        self
    }
}

impl ProcessRuntime for FakeRuntime {
    fn running_set(&self, _project: &str) -> Result<RunningSet, RuntimeError> {
        self.log.lock().unwrap().push("running_set".to_string());
        Ok(RunningSet {
            instances: self.running.lock().unwrap().clone(),
        })
    }

    fn stop_all(&self, project: &str) -> Result<(), RuntimeError> {
        self.log.lock().unwrap().push(format!("stop_all:{project}"));
        self.running.lock().unwrap().clear();
        Ok(())
    }

    fn find_owner(&self, port: u16) -> Result<Option<ProcessHandle>, RuntimeError> {
        Ok(self
            .port_owners
            .lock()
            .unwrap()
            .get(&port)
            .map(|id| match id.parse::<u32>() {
                Ok(_) => ProcessHandle::host_process(id.clone()),
                Err(_) => ProcessHandle::container(id.clone(), None),
            }))
    }

    fn stop(&self, handle: &ProcessHandle) -> Result<(), RuntimeError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("stop:{}:{:?}", handle.id, handle.kind));
        self.port_owners
            .lock()
            .unwrap()
            .retain(|_, id| *id != handle.id);
        Ok(())
    }

    fn start_all(&self, project: &str, version: &str) -> Result<(), RuntimeError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("start_all:{project}:{version}"));
        *self.running.lock().unwrap() = vec![
            "robot-1".to_string(),
            "robot-2".to_string(),
            "robot-3".to_string(),
        ];
        *self.started_version.lock().unwrap() = Some(version.to_string());
        Ok(())
    }

    fn logs(&self, _project: &str, service: &str) -> Result<String, RuntimeError> {
        Ok(format!("{service}: started"))
    }
}

/// Fails the listed robots, passes everyone else.
pub struct FakeProber {
    unhealthy: HashSet<String>,
    log: CallLog,
}

impl FakeProber {
    pub fn healthy(log: &CallLog) -> Self {
        Self::failing(&[], log)
    }

    pub fn failing(robots: &[&str], log: &CallLog) -> Self {
        Self {
            unhealthy: robots.iter().map(|s| s.to_string()).collect(),
            log: log.clone(),
        }
    }
}

impl Prober for FakeProber {
    fn probe<'a>(&'a self, robot: &'a RobotConfig) -> ProbeFuture<'a> {
        self.log.lock().unwrap().push(format!("probe:{}", robot.id));
        let result = if self.unhealthy.contains(&robot.id) {
            ProbeResult::Unhealthy
        } else {
            ProbeResult::Healthy
        };
        Box::pin(async move { result })
    }
}
