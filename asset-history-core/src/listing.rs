use tracing::{debug, info, warn};

use crate::config::LoginPolicy;
use crate::contract::AssetSource;
use crate::error::{Error, Result};
use crate::version::{sort_for_replay, AssetVersion};

/// Collects every page of the version listing and returns the versions in replay order.
///
/// Pages are requested from 1 until the first empty page. Under [`LoginPolicy::Lazy`], a
/// permission failure on page 1 triggers exactly one [`AssetSource::authenticate`] followed by
/// one retry of that page; any other failure is returned with the page attached.
pub async fn list_versions<S>(
    source: &S,
    asset_id: i64,
    policy: LoginPolicy,
) -> Result<Vec<AssetVersion>>
where
    S: AssetSource + ?Sized,
{
    let mut authed = false;
    if policy == LoginPolicy::Eager {
        source.authenticate().await?;
        authed = true;
    }

    let mut versions = Vec::new();
    let mut page = 1;
    loop {
        let batch = match source.list_page(asset_id, page).await {
            Ok(batch) => batch,
            Err(e) if page == 1 && !authed && e.is_permission_denied() => {
                info!(asset_id, error = %e, "Listing denied without a session; logging in");
                source.authenticate().await?;
                authed = true;
                continue;
            }
            Err(e) if authed && e.is_permission_denied() => {
                warn!(asset_id, page, error = %e, "Listing denied with a session");
                return Err(Error::Auth(format!("session rejected: {e}")).in_page(asset_id, page));
            }
            Err(e) => return Err(e.in_page(asset_id, page)),
        };
        if batch.is_empty() {
            debug!(asset_id, page, "Reached empty page");
            break;
        }
        debug!(asset_id, page, count = batch.len(), "Received listing page");
        versions.extend(batch);
        page += 1;
    }

    sort_for_replay(&mut versions);
    info!(asset_id, count = versions.len(), "Listed asset versions");
    Ok(versions)
}
