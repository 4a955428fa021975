//! Artifact store backed by the local docker image cache.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use fleet_rollout::{ArtifactStore, StoreError};

use crate::command::{self, describe};

#[derive(Debug, Clone)]
pub struct DockerStore {
    bin: String,
}

impl Default for DockerStore {
    fn default() -> Self {
        Self::new(crate::docker_bin())
    }
}

impl DockerStore {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn list_tags_command(&self, image: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("images").arg(image).arg("--format").arg("{{.Tag}}");
        cmd
    }

    fn inspect_command(&self, image: &str, tag: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("image").arg("inspect").arg(format!("{image}:{tag}"));
        cmd
    }

    fn build_command(&self, context: &Path, image: &str, tags: &[String]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("build");
        for tag in tags {
            cmd.arg("-t").arg(format!("{image}:{tag}"));
        }
        cmd.arg(context);
        cmd
    }
}

fn command_error(cmd: &Command, message: impl Into<String>) -> StoreError {
    StoreError::Command {
        command: describe(cmd),
        message: message.into(),
    }
}

impl ArtifactStore for DockerStore {
    fn list_tags(&self, image: &str) -> Result<Vec<String>, StoreError> {
        let mut cmd = self.list_tags_command(image);
        let out = command::run(&mut cmd).map_err(|e| command_error(&cmd, e))?;
        if !out.success {
            return Err(command_error(&cmd, out.stderr));
        }
        Ok(command::lines(&out.stdout)
            .into_iter()
            .filter(|t| t != "<none>")
            .collect())
    }

    fn exists(&self, image: &str, tag: &str) -> Result<bool, StoreError> {
        let mut cmd = self.inspect_command(image, tag);
        let out = command::run(&mut cmd).map_err(|e| command_error(&cmd, e))?;
        if out.success {
            return Ok(true);
        }
        if out.stderr.contains("No such image") || out.stderr.contains("No such object") {
            return Ok(false);
        }
        Err(command_error(&cmd, out.stderr))
    }

    fn build(&self, context: &Path, image: &str, tags: &[String]) -> Result<(), StoreError> {
        let mut cmd = self.build_command(context, image, tags);
        info!("Building image: {}", describe(&cmd));

        // Inherit stdio so the operator sees build progress.
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| command_error(&cmd, e.to_string()))?;

        if !status.success() {
            return Err(StoreError::Build(format!(
                "{} exited with code {}",
                describe(&cmd),
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}
