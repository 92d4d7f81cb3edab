//! Session credentials.
//!
//! A [`CredentialProvider`] hands the client a set of cookies. The pipeline treats them as
//! opaque, except that [`SESSION_COOKIE`] must be among them.

use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

/// Name of the cookie that carries the authenticated session.
pub const SESSION_COOKIE: &str = ".ROBLOSECURITY";

/// Environment variable read by [`EnvCookie`].
pub const SESSION_ENV: &str = "ROBLOSECURITY";

/// One cookie, kept as its full `Set-Cookie` value so attributes survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub header: String,
}

impl SessionCookie {
    /// Parses a `Set-Cookie` header value (`name=value; attr; ...`).
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (name, _) = header.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            header: header.to_string(),
        })
    }
}

pub trait CredentialProvider: Send + Sync {
    fn session_cookies(&self) -> Result<Vec<SessionCookie>>;
}

/// Fails unless the session cookie is present.
pub fn validate_session(cookies: &[SessionCookie]) -> Result<()> {
    if cookies.iter().any(|c| c.name == SESSION_COOKIE) {
        Ok(())
    } else {
        Err(Error::Auth("missing session cookie".into()))
    }
}

/// Reads cookies from a file of `Set-Cookie:` header lines.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for CookieFile {
    fn session_cookies(&self) -> Result<Vec<SessionCookie>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Auth(format!("auth file {}: {e}", self.path.display()))
        })?;
        let cookies = parse_cookie_lines(&content);
        debug!(
            path = %self.path.display(),
            count = cookies.len(),
            "Read session cookies from auth file"
        );
        Ok(cookies)
    }
}

fn parse_cookie_lines(content: &str) -> Vec<SessionCookie> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let value = match line.split_once(':') {
                Some((key, rest)) if key.trim().eq_ignore_ascii_case("set-cookie") => rest,
                _ => line,
            };
            let cookie = SessionCookie::parse(value);
            if cookie.is_none() {
                debug!(line, "Ignoring malformed cookie line");
            }
            cookie
        })
        .collect()
}

/// Builds the session cookie from the `ROBLOSECURITY` environment variable.
#[derive(Debug, Clone, Default)]
pub struct EnvCookie;

impl CredentialProvider for EnvCookie {
    fn session_cookies(&self) -> Result<Vec<SessionCookie>> {
        match std::env::var(SESSION_ENV) {
            Ok(value) if !value.trim().is_empty() => {
                debug!(var = SESSION_ENV, "Read session cookie from environment");
                Ok(vec![SessionCookie {
                    name: SESSION_COOKIE.to_string(),
                    header: format!("{SESSION_COOKIE}={}", value.trim()),
                }])
            }
            _ => Err(Error::Auth(format!(
                "no auth file given and {SESSION_ENV} is not set"
            ))),
        }
    }
}
