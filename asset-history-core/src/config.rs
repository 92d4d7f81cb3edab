use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Immutable parameters of one run. Built once by the caller and passed by reference.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub asset_id: i64,
    pub output_dir: PathBuf,
    /// Filename template, see [`crate::filename`].
    pub filename: String,
    pub git: bool,
    pub tag: bool,
    /// Stream content to the transform's stdin instead of writing it first.
    pub pipe: bool,
    pub transform: Option<TransformCommand>,
    pub login: LoginPolicy,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            asset_id = self.asset_id,
            output_dir = %self.output_dir.display(),
            filename = %self.filename,
            git = self.git,
            tag = self.tag,
            pipe = self.pipe,
            transform = self.transform.as_ref().map(|t| t.program.as_str()).unwrap_or("<none>"),
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

/// External program run after (or instead of) writing each version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TransformCommand {
    /// Splits `argv` into program and arguments. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// When the session cookies are attached to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginPolicy {
    /// Try unauthenticated first; log in once if the first listing page is denied.
    #[default]
    Lazy,
    /// Log in before the first request.
    Eager,
}

/// Remote endpoints. URL templates use `{asset_id}`, `{page}` and `{version_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub versions: String,
    pub content: String,
    /// URL the session cookies are scoped to.
    pub cookie_domain: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            versions: "https://api.roblox.com/assets/{asset_id}/versions?page={page}".into(),
            content: "https://assetgame.roblox.com/Asset?versionId={version_id}".into(),
            cookie_domain: "https://www.roblox.com/".into(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at one base URL. Used by local mirrors and tests.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            versions: format!("{base}/assets/{{asset_id}}/versions?page={{page}}"),
            content: format!("{base}/Asset?versionId={{version_id}}"),
            cookie_domain: format!("{base}/"),
        }
    }

    pub fn versions_url(&self, asset_id: i64, page: u32) -> String {
        self.versions
            .replace("{asset_id}", &asset_id.to_string())
            .replace("{page}", &page.to_string())
    }

    pub fn content_url(&self, version_id: i64) -> String {
        self.content.replace("{version_id}", &version_id.to_string())
    }
}
