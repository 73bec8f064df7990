use std::process::{Command, Output};

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{Error, Result};
use crate::work::task::{Task, TaskPoll};

#[derive(Debug)]
enum ShellState {
    Running(oneshot::Receiver<std::io::Result<Output>>),
    Done(std::result::Result<String, String>),
}

/// Runs `sh -c <command>` on its own thread and reports the captured stdout.
///
/// The command starts when the task is built; `result` only checks whether
/// it has finished, so polling never blocks on the child process.
#[derive(Debug)]
pub struct ShellTask {
    command: String,
    state: ShellState,
}

impl ShellTask {
    pub fn spawn(command: impl Into<String>) -> Self {
        let command = command.into();
        let (tx, rx) = oneshot::channel();

        let program = command.clone();
        let spawned = std::thread::Builder::new()
            .name("shell-task".into())
            .spawn(move || {
                let output = Command::new("sh").arg("-c").arg(&program).output();
                if tx.send(output).is_err() {
                    tracing::debug!("Shell task dropped before `{}` finished", program);
                }
            });

        let state = match spawned {
            Ok(_) => ShellState::Running(rx),
            Err(err) => ShellState::Done(Err(Error::from(err).to_string())),
        };
        tracing::info!("Started shell command `{}`", command);

        Self { command, state }
    }

    /// Build from the argument row: the first argument is the command line.
    pub fn from_args(args: &[Value]) -> Self {
        match args.first().and_then(Value::as_str) {
            Some(command) => Self::spawn(command),
            None => Self::failed(Error::InvalidArgument(
                "expected the command as the first argument",
            )),
        }
    }

    fn failed(err: Error) -> Self {
        Self {
            command: String::new(),
            state: ShellState::Done(Err(err.to_string())),
        }
    }
}

fn collect_output(output: Output) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::CommandFailed(format!(
        "{}: {}",
        output.status,
        stderr.trim_end()
    )))
}

impl Task for ShellTask {
    fn result(&mut self) -> TaskPoll {
        if let ShellState::Running(rx) = &mut self.state {
            let outcome = match rx.try_recv() {
                Err(TryRecvError::Empty) => return TaskPoll::Pending,
                Err(TryRecvError::Closed) => Err(Error::CommandFailed(
                    "command runner exited without a result".into(),
                )),
                Ok(output) => output.map_err(Error::from).and_then(collect_output),
            };

            tracing::debug!("Shell command `{}` finished", self.command);
            self.state = ShellState::Done(outcome.map_err(|err| err.to_string()));
        }

        match &self.state {
            ShellState::Done(Ok(stdout)) => TaskPoll::Ready(Value::String(stdout.clone())),
            ShellState::Done(Err(message)) => TaskPoll::Failed(anyhow::anyhow!(message.clone())),
            ShellState::Running(_) => TaskPoll::Pending,
        }
    }
}
