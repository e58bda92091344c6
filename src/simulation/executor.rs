use crate::config::ScriptSettings;
use crate::simulation::step::{RunId, Step};
use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("step program `{program}` not found")]
    MissingProgram { program: String },
    #[error("failed to spawn step program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error while supervising `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one step to completion and hands back its raw streams.
pub trait StepExecutor: Send + Sync {
    fn execute(&self, step: Step, run_id: &RunId) -> Result<ExecutionOutcome, ExecutionError>;
}

#[derive(Debug, Clone)]
pub struct ProcessStepExecutor {
    program: String,
    leading_args: Vec<String>,
    working_dir: Option<PathBuf>,
    env_overrides: BTreeMap<String, String>,
}

impl ProcessStepExecutor {
    pub fn new(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
            working_dir: None,
            env_overrides: BTreeMap::new(),
        }
    }

    pub fn from_settings(settings: &ScriptSettings) -> Self {
        Self {
            program: settings.program.clone(),
            leading_args: settings.args.clone(),
            working_dir: settings.working_dir.clone(),
            env_overrides: settings.env.clone(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn invocation_args(&self, step: Step, run_id: &RunId) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push("--run".to_string());
        args.push(run_id.to_string());
        args.push("--step".to_string());
        args.push(step.to_string());
        args.push("--json".to_string());
        args
    }

    fn io_error(&self, source: std::io::Error) -> ExecutionError {
        ExecutionError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl StepExecutor for ProcessStepExecutor {
    fn execute(&self, step: Step, run_id: &RunId) -> Result<ExecutionOutcome, ExecutionError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.invocation_args(step, run_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        for (k, v) in &self.env_overrides {
            command.env(k, v);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExecutionError::MissingProgram {
                    program: self.program.clone(),
                })
            }
            Err(source) => {
                return Err(ExecutionError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.io_error(std::io::Error::other("missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| self.io_error(std::io::Error::other("missing stderr pipe")))?;

        let stdout_reader = thread::spawn(move || read_lossy(stdout));
        let stderr_reader = thread::spawn(move || read_lossy(stderr));

        // No deadline: a hung script holds this request until it exits.
        let status = child.wait().map_err(|e| self.io_error(e))?;
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        Ok(ExecutionOutcome {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Drains a pipe to EOF. Invalid UTF-8 is replaced rather than discarding the whole stream.
fn read_lossy(pipe: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = BufReader::new(pipe).read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
