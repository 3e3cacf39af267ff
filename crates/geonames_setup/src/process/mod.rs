use std::{collections::VecDeque, fmt, io, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::info;

use crate::error::ProvisionError;

const OUTPUT_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Last lines written to stdout. [`SystemRunner`] keeps at most
    /// `OUTPUT_TAIL_LINES` of them.
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !self.stderr.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }

    fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Runs commands as real child processes.
///
/// Both output streams are forwarded to the log line by line while the
/// process runs; only a bounded tail of each is kept for error reporting.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        let mut child = command.spawn()?;

        let program = spec.program.display().to_string();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not piped"))?;

        let (stdout, stderr, status) = tokio::try_join!(
            forward_lines(stdout, &program, "stdout"),
            forward_lines(stderr, &program, "stderr"),
            child.wait(),
        )?;
        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Logs every line of `reader` at info and returns the last
/// `OUTPUT_TAIL_LINES` of them.
async fn forward_lines<R>(reader: R, program: &str, stream: &'static str) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut kept: VecDeque<String> = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        info!(command = program, stream, "{line}");
        if kept.len() == OUTPUT_TAIL_LINES {
            kept.pop_front();
        }
        kept.push_back(line.to_string());
    }
    Ok(Vec::from(kept).join("\n"))
}

/// Records every command it is asked to run and replays canned outputs.
///
/// Outputs are handed out in order; once the queue is drained every further
/// command succeeds with empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    outputs: Mutex<VecDeque<io::Result<CommandOutput>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_output(&self, output: CommandOutput) {
        self.outputs.lock().push_back(Ok(output));
    }

    pub fn push_spawn_error(&self, kind: io::ErrorKind) {
        self.outputs
            .lock()
            .push_back(Err(io::Error::new(kind, "simulated spawn failure")));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.calls.lock().push(spec.clone());
        self.outputs
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::success()))
    }
}

/// Runs `spec` and turns a spawn failure or non-zero exit into an error.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<CommandOutput, ProvisionError> {
    info!(command = %spec, "running");
    let output = runner
        .run(spec)
        .await
        .map_err(|source| ProvisionError::Spawn {
            command: spec.to_string(),
            source,
        })?;

    if !output.is_success() {
        return Err(ProvisionError::Subprocess {
            command: spec.to_string(),
            status: output.status_label(),
            output: tail(&output.combined(), OUTPUT_TAIL_LINES),
        });
    }
    Ok(output)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
