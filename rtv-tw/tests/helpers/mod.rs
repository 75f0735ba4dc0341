//! Shared fixtures for rtv-tw integration tests

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use rtv_common::cache::PayloadCache;
use rtv_common::config::{ProcessingMode, TreeConfig, DEFAULT_CUTOFF, DEFAULT_SENTINEL};
use tempfile::TempDir;

/// URL the fixture payload is cached under; the host never resolves, so
/// any accidental network access fails loudly
pub const TREE_URL: &str = "https://example.invalid/static/tree.json.gz";

/// A small tree exercising chains, branching, the sentinel, sub-cutoff
/// children, and one legacy-encoded node.
///
/// Preorder ids: root=0, " yes"=1, "!"=2, " no"=3, sentinel=4, " maybe"=5.
pub fn sample_tree_json() -> String {
    format!(
        r#"{{
        "value": "The answer is", "prob": 1.0, "total_prob": 1.0, "depth": 0,
        "next": {{
            "0": {{
                "value": " yes", "prob": 0.6, "total_prob": 0.6, "depth": 1,
                "response_distribution": {{ "yes": 1.0 }},
                "next": {{
                    "0": {{
                        "value": "!", "prob": 0.95, "total_prob": 0.57, "depth": 2,
                        "response_distribution": {{ "yes": 0.9, "no": 0.1 }}
                    }}
                }}
            }},
            "1": {{
                "value": " no", "prob": 0.3, "total_prob": 0.3, "depth": 1,
                "response_distribution": {{ "no": 1.0 }}
            }},
            "2": {{ "value": "{sentinel}", "prob": 0.05, "total_prob": 0.05, "depth": 1 }},
            "3": {{ "v": " maybe", "p": 0.05, "t": 0.05, "depth": 1 }}
        }}
    }}"#,
        sentinel = DEFAULT_SENTINEL
    )
}

/// Number of nodes in the sample tree
pub const SAMPLE_NODE_COUNT: u64 = 6;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A cache pre-seeded with the compressed sample payload, so loads run
/// entirely offline
pub async fn seeded_cache() -> (TempDir, PayloadCache) {
    let dir = TempDir::new().unwrap();
    let cache = PayloadCache::open(&dir.path().join("cache.db"))
        .await
        .unwrap();
    cache
        .put(TREE_URL, &gzip(sample_tree_json().as_bytes()))
        .await
        .unwrap();
    (dir, cache)
}

/// Default engine configuration for the given mode
pub fn test_config(mode: ProcessingMode, cache_db: std::path::PathBuf) -> TreeConfig {
    TreeConfig {
        cutoff: DEFAULT_CUTOFF,
        sentinel: DEFAULT_SENTINEL.to_string(),
        mode,
        cache_db,
    }
}
