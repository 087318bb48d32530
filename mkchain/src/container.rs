//! Running one-shot containers and capturing what they print

use crate::error::{MkchainError, Result};
use std::cell::OnceCell;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs an image to completion and returns its combined stdout+stderr.
pub trait ContainerRunner {
    fn run(&self, image: &str, entrypoint: &str, args: &[String]) -> Result<String>;
}

/// `docker run --entrypoint <entrypoint> --rm <image> <args...>`
///
/// Any CLI compatible with `docker run` works (podman, nerdctl).
pub struct DockerRunner {
    binary: PathBuf,
}

impl DockerRunner {
    /// Locate the runtime binary on PATH
    pub fn locate(runtime: &str) -> Result<Self> {
        let binary =
            which::which(runtime).map_err(|_| MkchainError::BinaryNotFound(runtime.into()))?;
        debug!("Container runtime: {:?}", binary);
        Ok(Self { binary })
    }

    fn command(&self, image: &str, entrypoint: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("run")
            .arg("--entrypoint")
            .arg(entrypoint)
            .arg("--rm")
            .arg(image)
            .args(args);
        cmd
    }
}

impl ContainerRunner for DockerRunner {
    fn run(&self, image: &str, entrypoint: &str, args: &[String]) -> Result<String> {
        // stdout and stderr share one file so their interleaving survives
        let mut capture = tempfile::tempfile()?;

        let mut cmd = self.command(image, entrypoint, args);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(capture.try_clone()?))
            .stderr(Stdio::from(capture.try_clone()?));

        debug!("Running {:?}", cmd);
        let status = cmd.status()?;

        capture.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        capture.read_to_end(&mut raw)?;
        let output = String::from_utf8_lossy(&raw).into_owned();

        if !status.success() {
            return Err(MkchainError::ContainerFailed {
                image: image.into(),
                status: status.to_string(),
                output,
            });
        }

        Ok(output)
    }
}

/// Defers the PATH lookup until a container actually has to run
pub struct LazyRunner {
    runtime: String,
    runner: OnceCell<DockerRunner>,
}

impl LazyRunner {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            runner: OnceCell::new(),
        }
    }

    fn runner(&self) -> Result<&DockerRunner> {
        if let Some(runner) = self.runner.get() {
            return Ok(runner);
        }
        let located = DockerRunner::locate(&self.runtime)?;
        Ok(self.runner.get_or_init(|| located))
    }
}

impl ContainerRunner for LazyRunner {
    fn run(&self, image: &str, entrypoint: &str, args: &[String]) -> Result<String> {
        self.runner()?.run(image, entrypoint, args)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned outputs in order and records every invocation
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: RefCell<VecDeque<Result<String>>>,
        pub calls: RefCell<Vec<(String, String, Vec<String>)>>,
    }

    impl ScriptedRunner {
        pub fn new(responses: impl IntoIterator<Item = Result<String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().collect()),
                calls: RefCell::default(),
            }
        }
    }

    impl ContainerRunner for ScriptedRunner {
        fn run(&self, image: &str, entrypoint: &str, args: &[String]) -> Result<String> {
            self.calls
                .borrow_mut()
                .push((image.into(), entrypoint.into(), args.to_vec()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected container run of {}", image))
        }
    }
}
