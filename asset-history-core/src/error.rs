//! Error types for the asset history pipeline.
//!
//! Every fallible operation in the core returns [`Result`]. Listing and per-version failures are
//! wrapped in [`Error::Page`] and [`Error::Version`] so a fatal message always names where the run
//! stopped.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection or transfer failure from the HTTP client
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("http {code}: {url}")]
    Status { code: u16, url: String },

    /// Listing payload did not decode into version records
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing or rejected session
    #[error("authentication error: {0}")]
    Auth(String),

    /// External command failed to start or exited non-zero
    #[error("command {command:?} failed ({status}){}", format_output(.output))]
    Process {
        command: String,
        status: String,
        output: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("get versions of asset {asset_id} (page {page}): {source}")]
    Page {
        asset_id: i64,
        page: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("get asset version {version_number}: {source}")]
    Version {
        version_number: i64,
        #[source]
        source: Box<Error>,
    },
}

fn format_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

impl Error {
    /// True for a 401/403 response, looking through page/version context.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Status { code, .. } => *code == 401 || *code == 403,
            Error::Auth(_) => true,
            Error::Page { source, .. } | Error::Version { source, .. } => {
                source.is_permission_denied()
            }
            _ => false,
        }
    }

    pub(crate) fn in_page(self, asset_id: i64, page: u32) -> Self {
        Error::Page {
            asset_id,
            page,
            source: Box::new(self),
        }
    }

    pub(crate) fn in_version(self, version_number: i64) -> Self {
        Error::Version {
            version_number,
            source: Box::new(self),
        }
    }
}
