//! Git history writer.
//!
//! Each accepted version becomes exactly one commit whose author and committer dates are the
//! version's creation time, optionally tagged `v<VersionNumber>`. Git is always an external
//! process; every failure is fatal to the run.

use std::path::Path;

use tracing::{debug, info};

use crate::command::Commander;
use crate::error::Result;
use crate::version::AssetVersion;

pub const AUTHOR_NAME: &str = "asset-history";
pub const AUTHOR_EMAIL: &str = "asset-history@localhost";

/// Returns true when a `git` binary is on `PATH`.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

pub struct GitRecorder {
    git: Commander,
    tag: bool,
}

impl GitRecorder {
    pub fn new(dir: &Path, tag: bool) -> Self {
        Self {
            git: Commander::new("git", dir),
            tag,
        }
    }

    /// `git init` in the output directory. Safe on an existing repository.
    pub async fn init(&self) -> Result<()> {
        self.git.run(&["init"]).await?;
        info!(dir = %self.git.dir().display(), "Initialized repository");
        Ok(())
    }

    /// Stages `filename` and commits it as `version`, then tags the commit if enabled.
    pub async fn record(&self, version: &AssetVersion, filename: &str) -> Result<()> {
        self.git.run(&["add", filename]).await?;

        let timestamp = version.created.timestamp().to_string();
        let author = format!("{AUTHOR_NAME} <{AUTHOR_EMAIL}>");
        let envs = [
            ("GIT_COMMITTER_NAME", AUTHOR_NAME.to_string()),
            ("GIT_COMMITTER_EMAIL", AUTHOR_EMAIL.to_string()),
            ("GIT_COMMITTER_DATE", format!("{timestamp} +0000")),
        ];
        let message = commit_message(version, filename);
        let mut stdin = message.as_bytes();
        self.git
            .pipe(
                &[
                    "commit",
                    "-F",
                    "-",
                    "--allow-empty",
                    "--date",
                    &timestamp,
                    "--author",
                    &author,
                ],
                &envs,
                &mut stdin,
            )
            .await?;
        debug!(
            version_number = version.version_number,
            created = %version.created,
            "Committed version"
        );

        if self.tag {
            let tag = tag_name(version);
            self.git.run(&["tag", &tag]).await?;
            debug!(tag = %tag, "Tagged version");
        }
        Ok(())
    }
}

pub fn tag_name(version: &AssetVersion) -> String {
    format!("v{}", version.version_number)
}

/// Commit message listing every field of the version.
pub fn commit_message(v: &AssetVersion, filename: &str) -> String {
    let universe = v
        .creating_universe_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    format!(
        "Update {filename} to version {}\n\n\
         Id: {}\n\
         AssetId: {}\n\
         VersionNumber: {}\n\
         ParentAssetVersionId: {}\n\
         CreatorType: {}\n\
         CreatorTargetId: {}\n\
         CreatingUniverseId: {universe}\n\
         Created: {}\n\
         Updated: {}\n",
        v.version_number,
        v.id,
        v.asset_id,
        v.version_number,
        v.parent_asset_version_id,
        v.creator_type,
        v.creator_target_id,
        v.created.to_rfc2822(),
        v.updated.to_rfc2822(),
    )
}
