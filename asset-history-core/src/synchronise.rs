//! High-level pipeline: list → name → fetch → transform/persist → record, one version at a time.
//!
//! # Responsibilities
//! - Lists every version of the asset and replays them in ascending version number
//! - Names output files through a [`FilenamePlan`] fixed for the whole run
//! - Hands each version's content to the [`TransformRunner`]; a rejected version is skipped
//! - In git mode, turns each accepted version into one commit via the [`GitRecorder`]
//!
//! # Error Handling
//! Each version ends in a [`VersionOutcome`]. `Skipped` is logged and the run moves on; `Fatal`
//! stops the run at once. Files and commits already produced are left in place.

use tracing::{debug, error, info, info_span, Instrument};

use crate::config::PipelineConfig;
use crate::contract::AssetSource;
use crate::error::{Error, Result};
use crate::filename::FilenamePlan;
use crate::listing::list_versions;
use crate::recorder::GitRecorder;
use crate::transform::{TransformOutcome, TransformRunner};
use crate::version::AssetVersion;

/// How a single version ended.
#[derive(Debug)]
pub enum VersionOutcome {
    Recorded,
    /// The transform rejected the version; carries the reason.
    Skipped(String),
    Fatal(Error),
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub asset_id: i64,
    /// Number of versions returned by the listing.
    pub listed: usize,
    /// Version numbers written (and committed, in git mode), in order.
    pub recorded: Vec<i64>,
    /// Version numbers rejected by the transform command.
    pub skipped: Vec<i64>,
}

/// Per-run components, built once from the configuration.
struct Stages {
    runner: TransformRunner,
    recorder: Option<GitRecorder>,
    plan: FilenamePlan,
    git: bool,
}

pub async fn synchronise<S>(config: &PipelineConfig, source: &S) -> Result<SyncReport>
where
    S: AssetSource + ?Sized,
{
    info!(asset_id = config.asset_id, "[SYNC] Starting asset history synchronisation");
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let versions = list_versions(source, config.asset_id, config.login).await?;
    let mut report = SyncReport {
        asset_id: config.asset_id,
        listed: versions.len(),
        ..SyncReport::default()
    };

    let recorder = if config.git {
        debug!("[SYNC] Using git");
        let recorder = GitRecorder::new(&config.output_dir, config.tag);
        recorder.init().await?;
        Some(recorder)
    } else {
        debug!("[SYNC] Using file list");
        None
    };

    let Some(first) = versions.first() else {
        info!(asset_id = config.asset_id, "[SYNC] Asset has no versions");
        return Ok(report);
    };
    let plan = if config.git {
        FilenamePlan::fixed(&config.filename, first)
    } else {
        FilenamePlan::unique(&config.filename)
    };
    debug!(?plan, "[SYNC] Filename plan");

    let stages = Stages {
        runner: TransformRunner::new(config),
        recorder,
        plan,
        git: config.git,
    };

    for version in &versions {
        let span = info_span!("version", number = version.version_number, id = version.id);
        match process_version(source, &stages, version).instrument(span).await {
            VersionOutcome::Recorded => report.recorded.push(version.version_number),
            VersionOutcome::Skipped(reason) => {
                debug!(
                    version_number = version.version_number,
                    reason = %reason,
                    "[SYNC] Skipped version"
                );
                report.skipped.push(version.version_number);
            }
            VersionOutcome::Fatal(e) => {
                error!(
                    version_number = version.version_number,
                    error = %e,
                    "[SYNC][ERROR] Stopping at version"
                );
                return Err(e);
            }
        }
    }

    info!(
        asset_id = config.asset_id,
        recorded = report.recorded.len(),
        skipped = report.skipped.len(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}

async fn process_version<S>(source: &S, stages: &Stages, version: &AssetVersion) -> VersionOutcome
where
    S: AssetSource + ?Sized,
{
    let number = version.version_number;
    debug!("[SYNC] Getting version");
    let mut content = match source.fetch_content(version).await {
        Ok(content) => content,
        Err(e) => return VersionOutcome::Fatal(e.in_version(number)),
    };

    let filename = stages.plan.filename_for(version);
    match stages.runner.apply(&filename, &mut content).await {
        Ok(TransformOutcome::Accepted) => {}
        Ok(TransformOutcome::Rejected(reason)) => {
            if !stages.git {
                if let Err(e) = stages.runner.discard(&filename).await {
                    return VersionOutcome::Fatal(e.in_version(number));
                }
            }
            return VersionOutcome::Skipped(reason.to_string());
        }
        Err(e) => return VersionOutcome::Fatal(e.in_version(number)),
    }
    drop(content);

    if let Some(recorder) = &stages.recorder {
        if let Err(e) = recorder.record(version, &filename).await {
            return VersionOutcome::Fatal(e.in_version(number));
        }
    }
    debug!(filename = %filename, "[SYNC] Recorded version");
    VersionOutcome::Recorded
}
