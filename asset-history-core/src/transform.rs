use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::command::Commander;
use crate::config::PipelineConfig;
use crate::contract::ContentStream;
use crate::error::{Error, Result};

/// Result of handing one version's content to the transform stage.
#[derive(Debug)]
pub enum TransformOutcome {
    Accepted,
    /// The transform command failed; the version must not be recorded.
    Rejected(Error),
}

/// Persists content and runs the optional transform command in the output directory.
pub struct TransformRunner {
    dir: PathBuf,
    command: Option<Commander>,
    pipe: bool,
    /// The recorder stages the target file after each accepted version.
    staged: bool,
}

impl TransformRunner {
    pub fn new(config: &PipelineConfig) -> Self {
        let command = config.transform.as_ref().map(|t| {
            info!(program = %t.program, args = ?t.args, "Found transform command");
            Commander::new(t.program.clone(), &config.output_dir).with_args(t.args.clone())
        });
        Self {
            dir: config.output_dir.clone(),
            command,
            pipe: config.pipe,
            staged: config.git,
        }
    }

    /// Writes `content` to `filename` unless it is piped to the command, then runs the command.
    ///
    /// Failures to read the content or write the file are returned as errors; a failing command
    /// is reported as [`TransformOutcome::Rejected`].
    pub async fn apply(&self, filename: &str, content: &mut ContentStream) -> Result<TransformOutcome> {
        let piping = self.pipe && self.command.is_some();
        if !piping {
            self.write(filename, content).await?;
        }
        let Some(command) = &self.command else {
            return Ok(TransformOutcome::Accepted);
        };

        let result = if piping && self.staged {
            self.pipe_for_staging(filename, command, content).await
        } else if piping {
            command.pipe(&[], &[], content).await
        } else {
            command.run(&[]).await
        };
        match result {
            Ok(()) => Ok(TransformOutcome::Accepted),
            Err(e @ Error::Process { .. }) => {
                debug!(filename, error = %e, "Transform command failed");
                Ok(TransformOutcome::Rejected(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a file written for a rejected version.
    pub async fn discard(&self, filename: &str) -> Result<()> {
        let path = self.dir.join(filename);
        if remove_if_present(&path).await? {
            debug!(path = %path.display(), "Removed file of rejected version");
        }
        Ok(())
    }

    /// Pipes the content through a private copy, which becomes `filename` when the command
    /// leaves no file behind for the recorder to stage. The previous version's file is cleared
    /// first so that only this version's output counts.
    async fn pipe_for_staging(
        &self,
        filename: &str,
        command: &Commander,
        content: &mut ContentStream,
    ) -> Result<()> {
        let copy = tempfile::Builder::new()
            .prefix(".asset-history-")
            .tempfile_in(&self.dir)?;
        let mut file = File::create(copy.path()).await?;
        tokio::io::copy(content, &mut file).await?;
        file.flush().await?;
        drop(file);

        let path = self.dir.join(filename);
        remove_if_present(&path).await?;
        let mut input = File::open(copy.path()).await?;
        command.pipe(&[], &[], &mut input).await?;

        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        copy.persist(&path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "Kept piped content for staging");
        Ok(())
    }

    async fn write(&self, filename: &str, content: &mut ContentStream) -> Result<()> {
        let path = self.dir.join(filename);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = File::create(&path).await?;
        let written = tokio::io::copy(content, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        debug!(path = %path.display(), bytes = written, "Wrote version file");
        Ok(())
    }
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
