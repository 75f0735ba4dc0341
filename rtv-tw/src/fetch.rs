//! Payload acquisition: cache lookup, streaming download, cache fill

use futures::StreamExt;
use rtv_common::cache::PayloadCache;
use rtv_common::events::{EventBus, TreeEvent};
use rtv_common::{Error, Result};
use tracing::{debug, info};

/// Status message shown when the payload has to be downloaded
const DOWNLOAD_MESSAGE: &str = "Downloading data (this might take a minute, but it \
should only happen the first time you visit)...";

/// Fetch the compressed payload for `url`, preferring the cache.
///
/// On a miss the response body is streamed chunk by chunk, emitting
/// byte-progress fractions against Content-Length (no progress without
/// one), and the complete payload is stored in the cache before it is
/// returned. Network failures surface as terminal
/// [`Error::Acquisition`]s.
pub async fn fetch_payload(
    cache: &PayloadCache,
    url: &str,
    events: &EventBus,
) -> Result<Vec<u8>> {
    if let Some(payload) = cache.get(url).await? {
        debug!("Using cached payload for {}", url);
        return Ok(payload);
    }

    events.emit(TreeEvent::status(DOWNLOAD_MESSAGE));

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Acquisition(e.to_string()))?;

    let total = response.content_length().unwrap_or(0);
    let mut stream = response.bytes_stream();
    let mut payload: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Acquisition(e.to_string()))?;
        payload.extend_from_slice(&chunk);
        if total > 0 {
            events.emit(TreeEvent::progress(payload.len() as f64 / total as f64));
        }
    }

    cache.put(url, &payload).await?;
    info!("Downloaded and cached {} bytes for {}", payload.len(), url);
    Ok(payload)
}
