//! Chunked gzip decompression with progress reporting
//!
//! The payload is pushed through the decoder in fixed-size chunks so a
//! monotonic processed/total fraction can be reported between pushes. The
//! chunk size is internal policy, not part of any contract.

use std::io::Write;

use flate2::write::GzDecoder;
use rtv_common::events::{EventBus, TreeEvent};
use rtv_common::{Error, Result};

/// Input chunk size fed to the decoder between progress reports
const CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Decompress a gzip payload to its UTF-8 text.
///
/// Reports the fraction of compressed input consumed after every chunk.
/// A corrupt payload, a truncated stream, or non-UTF-8 output all fail
/// with [`Error::Decompression`]; no partial result escapes.
pub fn inflate_to_string(payload: &[u8], events: &EventBus) -> Result<String> {
    let total = payload.len();
    let mut decoder = GzDecoder::new(Vec::new());
    let mut processed = 0usize;

    for chunk in payload.chunks(CHUNK_SIZE) {
        decoder
            .write_all(chunk)
            .map_err(|e| Error::Decompression(e.to_string()))?;
        processed += chunk.len();
        events.emit(TreeEvent::progress(processed as f64 / total as f64));
    }

    let bytes = decoder
        .finish()
        .map_err(|e| Error::Decompression(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Decompression(e.to_string()))
}
