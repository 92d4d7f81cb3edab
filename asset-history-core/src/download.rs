use std::sync::Arc;

use futures::TryStreamExt;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use tokio_util::io::StreamReader;

use crate::auth::{validate_session, CredentialProvider};
use crate::config::Endpoints;
use crate::contract::{AssetSource, ContentStream};
use crate::error::{Error, Result};
use crate::version::AssetVersion;

/// HTTP implementation of [`AssetSource`]. Session cookies live in a shared jar that starts
/// empty and is filled by [`AssetSource::authenticate`].
pub struct RemoteClient {
    http: Client,
    jar: Arc<Jar>,
    endpoints: Endpoints,
    credentials: Box<dyn CredentialProvider>,
}

impl RemoteClient {
    pub fn new(endpoints: Endpoints, credentials: Box<dyn CredentialProvider>) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self {
            http,
            jar,
            endpoints,
            credentials,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(status = %status, url, "Request returned non-success status");
            return Err(Error::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl AssetSource for RemoteClient {
    async fn list_page(&self, asset_id: i64, page: u32) -> Result<Vec<AssetVersion>> {
        let url = self.endpoints.versions_url(asset_id, page);
        tracing::debug!(asset_id, page, url = %url, "Getting version listing page");
        let body = self.get(&url).await?.bytes().await?;
        let versions: Vec<AssetVersion> = serde_json::from_slice(&body)?;
        Ok(versions)
    }

    async fn fetch_content(&self, version: &AssetVersion) -> Result<ContentStream> {
        let url = self.endpoints.content_url(version.id);
        tracing::debug!(
            version_number = version.version_number,
            version_id = version.id,
            url = %url,
            "Getting asset version content"
        );
        let resp = self.get(&url).await?;
        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn authenticate(&self) -> Result<()> {
        let cookies = self.credentials.session_cookies()?;
        validate_session(&cookies)?;

        let origins = self.endpoints.session_origins()?;
        for cookie in &cookies {
            for origin in &origins {
                self.jar.add_cookie_str(&cookie.header, origin);
            }
        }
        tracing::info!(
            count = cookies.len(),
            origins = ?origins.iter().map(Url::as_str).collect::<Vec<_>>(),
            "Attached session cookies"
        );
        Ok(())
    }
}

impl Endpoints {
    /// Root URLs of the cookie domain and of every endpoint host. A cookie without a `Domain`
    /// attribute is host-only, so it is stored once per origin to reach each endpoint.
    fn session_origins(&self) -> Result<Vec<Url>> {
        let mut origins: Vec<Url> = Vec::new();
        for raw in [
            self.cookie_domain.clone(),
            self.versions_url(0, 1),
            self.content_url(0),
        ] {
            let mut url = Url::parse(&raw)
                .map_err(|e| Error::Auth(format!("login: invalid endpoint {raw:?}: {e}")))?;
            url.set_path("/");
            url.set_query(None);
            url.set_fragment(None);
            if !origins.contains(&url) {
                origins.push(url);
            }
        }
        Ok(origins)
    }
}
