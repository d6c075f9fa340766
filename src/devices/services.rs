use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::IngestStore;

/// Picks the device key for a request: the header wins over the legacy
/// body fields (`mac`, then `api_key`). Blank keys count as absent.
pub fn pick_device_key(
    header: Option<&str>,
    mac: Option<&str>,
    api_key: Option<&str>,
) -> Option<String> {
    [header, mac, api_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
}

pub async fn resolve_device(store: &dyn IngestStore, key: &str) -> anyhow::Result<Option<Uuid>> {
    let owner = store.device_owner(key).await?;
    match owner {
        Some(user_id) => debug!(device = %key, %user_id, "device resolved"),
        None => warn!(device = %key, "unknown device"),
    }
    Ok(owner)
}
