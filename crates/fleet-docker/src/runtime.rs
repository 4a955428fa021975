//! Process runtime backed by `docker compose`.
//!
//! The managed set is a compose project; each robot is one service. The
//! version reaches the instances through an environment variable that the
//! compose file interpolates (e.g. `image: robot-app:${APP_VERSION}`).

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use fleet_core::FleetConfig;
use fleet_rollout::{OwnerKind, ProcessHandle, ProcessRuntime, RunningSet, RuntimeError};

use crate::command::{self, describe};

/// Lines of log output fetched per instance for diagnostics.
const LOG_TAIL: u32 = 50;

#[derive(Debug, Clone)]
pub struct ComposeRuntime {
    bin: String,
    compose_file: PathBuf,
    version_env: String,
}

impl ComposeRuntime {
    pub fn new(
        bin: impl Into<String>,
        compose_file: impl Into<PathBuf>,
        version_env: impl Into<String>,
    ) -> Self {
        Self {
            bin: bin.into(),
            compose_file: compose_file.into(),
            version_env: version_env.into(),
        }
    }

    pub fn from_config(config: &FleetConfig) -> Self {
        Self::new(
            crate::docker_bin(),
            config.app.compose_file.clone(),
            config.app.version_env.clone(),
        )
    }

    fn compose(&self, project: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("compose")
            .arg("-p")
            .arg(project)
            .arg("-f")
            .arg(&self.compose_file);
        cmd
    }

    fn ps_command(&self, project: &str) -> Command {
        let mut cmd = self.compose(project);
        cmd.arg("ps").arg("-q");
        cmd
    }

    fn down_command(&self, project: &str) -> Command {
        let mut cmd = self.compose(project);
        cmd.arg("down").arg("--remove-orphans");
        cmd
    }

    fn up_command(&self, project: &str, version: &str) -> Command {
        let mut cmd = self.compose(project);
        cmd.arg("up").arg("-d").env(&self.version_env, version);
        cmd
    }

    fn logs_command(&self, project: &str, service: &str) -> Command {
        let mut cmd = self.compose(project);
        cmd.arg("logs")
            .arg("--no-color")
            .arg("--tail")
            .arg(LOG_TAIL.to_string())
            .arg(service);
        cmd
    }

    fn port_owner_command(&self, port: u16) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("ps")
            .arg("--filter")
            .arg(format!("publish={port}"))
            .arg("--format")
            .arg("{{.ID}}\t{{.Names}}");
        cmd
    }

    /// Host processes listening on `port`, for owners docker does not know about.
    fn listener_command(&self, port: u16) -> Command {
        let mut cmd = Command::new("lsof");
        cmd.arg("-t")
            .arg(format!("-iTCP:{port}"))
            .arg("-sTCP:LISTEN");
        cmd
    }

    fn stop_command(&self, handle: &ProcessHandle) -> Command {
        match handle.kind {
            OwnerKind::Container => {
                let mut cmd = Command::new(&self.bin);
                cmd.arg("stop").arg(&handle.id);
                cmd
            }
            OwnerKind::HostProcess => {
                let mut cmd = Command::new("kill");
                cmd.arg("-TERM").arg(&handle.id);
                cmd
            }
        }
    }

    /// Pid of a host process listening on `port`.
    ///
    /// `lsof` exits non-zero when nothing matches; a missing `lsof` is
    /// logged and treated as no owner.
    fn host_listener(&self, port: u16) -> Option<ProcessHandle> {
        let mut cmd = self.listener_command(port);
        match command::run(&mut cmd) {
            Ok(out) => parse_listener_pid(&out.stdout),
            Err(e) => {
                warn!(port, command = %describe(&cmd), error = %e, "cannot look up host listeners");
                None
            }
        }
    }

    /// Run `cmd` and return stdout, failing on a non-zero exit.
    fn checked(&self, mut cmd: Command) -> Result<String, RuntimeError> {
        let out = command::run(&mut cmd).map_err(|message| RuntimeError::Command {
            command: describe(&cmd),
            message,
        })?;
        if !out.success {
            return Err(RuntimeError::Command {
                command: describe(&cmd),
                message: out.stderr,
            });
        }
        Ok(out.stdout)
    }
}

/// First `ID<TAB>NAME` row of `docker ps` output.
fn parse_port_owner(stdout: &str) -> Option<ProcessHandle> {
    let line = command::lines(stdout).into_iter().next()?;
    Some(match line.split_once('\t') {
        Some((id, name)) => ProcessHandle::container(id, Some(name.to_string())),
        None => ProcessHandle::container(line, None),
    })
}

/// First pid printed by `lsof -t`.
fn parse_listener_pid(stdout: &str) -> Option<ProcessHandle> {
    command::lines(stdout)
        .into_iter()
        .find(|line| line.parse::<u32>().is_ok())
        .map(ProcessHandle::host_process)
}

impl ProcessRuntime for ComposeRuntime {
    fn running_set(&self, project: &str) -> Result<RunningSet, RuntimeError> {
        let stdout = self.checked(self.ps_command(project))?;
        Ok(RunningSet {
            instances: command::lines(&stdout),
        })
    }

    fn stop_all(&self, project: &str) -> Result<(), RuntimeError> {
        self.checked(self.down_command(project))?;
        Ok(())
    }

    fn find_owner(&self, port: u16) -> Result<Option<ProcessHandle>, RuntimeError> {
        let stdout = self.checked(self.port_owner_command(port))?;
        let owner = parse_port_owner(&stdout).or_else(|| self.host_listener(port));
        debug!(port, ?owner, "port owner lookup");
        Ok(owner)
    }

    fn stop(&self, handle: &ProcessHandle) -> Result<(), RuntimeError> {
        self.checked(self.stop_command(handle))?;
        Ok(())
    }

    fn start_all(&self, project: &str, version: &str) -> Result<(), RuntimeError> {
        self.checked(self.up_command(project, version))?;
        Ok(())
    }

    fn logs(&self, project: &str, service: &str) -> Result<String, RuntimeError> {
        self.checked(self.logs_command(project, service))
    }
}
