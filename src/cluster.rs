use indexmap::IndexMap;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{parse_hex, quantize, round_div, to_hex};
use crate::error::{DnaError, Result};

/// Per-channel grid step used to decide which colors from different images
/// agree. Deliberately coarser than [`crate::extract::PIXEL_GRID`].
pub const CLUSTER_GRID: u8 = 32;
pub const DEFAULT_TOP_K: usize = 8;

/// Accumulator for colors from many palettes landing in the same grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsensusCluster {
    /// Running mean of the raw (unquantized) member colors.
    pub color: Srgb<u8>,
    pub count: u64,
}

impl ConsensusCluster {
    fn new(color: Srgb<u8>) -> Self {
        Self { color, count: 1 }
    }

    /// Online mean update; the result depends on arrival order when rounding
    /// kicks in.
    fn push(&mut self, color: Srgb<u8>) {
        self.count += 1;
        let n = self.count;
        let step = |mean: u8, c: u8| round_div(mean as u64 * (n - 1) + c as u64, n) as u8;
        self.color = Srgb::new(
            step(self.color.red, color.red),
            step(self.color.green, color.green),
            step(self.color.blue, color.blue),
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterColor {
    pub hex: String,
    pub count: u64,
}

/// Any record carrying an optional hex color, e.g. a stored palette entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HexEntry {
    #[serde(default)]
    pub hex: Option<String>,
}

/// Group hex colors gathered from many palettes into at most `top_k`
/// consensus colors, most common first.
///
/// Malformed or missing entries are skipped. Empty input yields an empty
/// result.
pub fn cluster_colors<I, S>(colors: I, top_k: usize) -> Result<Vec<ClusterColor>>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    if top_k == 0 {
        return Err(DnaError::InvalidParameter("top_k must be at least 1".into()));
    }

    let mut buckets: IndexMap<[u8; 3], ConsensusCluster> = IndexMap::new();
    let mut skipped = 0usize;
    for entry in colors {
        let Some(color) = entry.as_ref().and_then(|s| parse_hex(s.as_ref())) else {
            skipped += 1;
            continue;
        };
        let key = [color.red, color.green, color.blue].map(|c| quantize(c, CLUSTER_GRID));
        buckets
            .entry(key)
            .and_modify(|cluster| cluster.push(color))
            .or_insert_with(|| ConsensusCluster::new(color));
    }
    debug!(buckets = buckets.len(), skipped, "clustered palette colors");

    let mut clusters: Vec<ConsensusCluster> = buckets.into_values().collect();
    clusters.sort_by(|a, b| b.count.cmp(&a.count));
    clusters.truncate(top_k);

    Ok(clusters
        .into_iter()
        .map(|c| ClusterColor {
            hex: to_hex(c.color),
            count: c.count,
        })
        .collect())
}

/// Convenience over [`cluster_colors`] for stored `{ hex }` records.
pub fn cluster_entries(entries: &[HexEntry], top_k: usize) -> Result<Vec<ClusterColor>> {
    cluster_colors(entries.iter().map(|e| e.hex.as_deref()), top_k)
}
