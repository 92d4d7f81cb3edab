use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{Error, Result};

const CHUNK: usize = 64 * 1024;

/// Runs an external program in a fixed working directory, capturing its combined output.
#[derive(Debug, Clone)]
pub struct Commander {
    program: String,
    args: Vec<String>,
    dir: PathBuf,
}

impl Commander {
    pub fn new(program: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: dir.into(),
        }
    }

    /// Arguments passed on every invocation, before any per-call arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs with no stdin.
    pub async fn run(&self, extra: &[&str]) -> Result<()> {
        self.run_with_env(extra, &[]).await
    }

    /// Runs with no stdin and additional environment variables for this invocation.
    pub async fn run_with_env(&self, extra: &[&str], envs: &[(&str, String)]) -> Result<()> {
        let mut cmd = self.command(extra);
        cmd.stdin(Stdio::null());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        let output = cmd.output().await.map_err(|e| self.spawn_error(extra, e))?;
        self.check(extra, output)
    }

    /// Runs with `input` streamed to stdin.
    ///
    /// Returns the `Io` error of a failed read from `input` as is, so that callers can tell a
    /// broken source apart from a failing command.
    pub async fn pipe<R>(&self, extra: &[&str], envs: &[(&str, String)], input: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut cmd = self.command(extra);
        cmd.stdin(Stdio::piped());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(extra, e))?;
        let mut stdin = child.stdin.take();

        let feed = async move {
            let mut buf = vec![0u8; CHUNK];
            loop {
                let n = input.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let Some(sink) = stdin.as_mut() else {
                    continue;
                };
                match sink.write_all(&buf[..n]).await {
                    Ok(()) => {}
                    // The command stopped reading; its exit status decides the outcome.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => stdin = None,
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            drop(stdin);
            Ok::<(), Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| self.spawn_error(extra, e))?;
        fed?;
        self.check(extra, output)
    }

    fn command(&self, extra: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra)
            .current_dir(&self.dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn describe(&self, extra: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(extra.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spawn_error(&self, extra: &[&str], e: std::io::Error) -> Error {
        Error::Process {
            command: self.describe(extra),
            status: format!("failed to start: {e}"),
            output: String::new(),
        }
    }

    fn check(&self, extra: &[&str], output: Output) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Error::Process {
            command: self.describe(extra),
            status: output.status.to_string(),
            output: combined,
        })
    }
}
