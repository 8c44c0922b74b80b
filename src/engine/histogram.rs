//! Per-image color counting.

use std::collections::HashMap;

use crate::engine::topk::top_k;
use crate::types::{DecodedImage, Rgb24, TopKResult};

/// Occurrence count per distinct 24-bit color for one image.
///
/// Keys are packed RGB values, so counting allocates only map entries, never per-pixel strings.
/// Built once per image and discarded after top-k extraction.
#[derive(Debug, Default, Clone)]
pub struct ColorHistogram {
    counts: HashMap<Rgb24, u64>,
    total: u64,
}

impl ColorHistogram {
    /// Single pass over all pixels. Alpha was already discarded at decode (RGB8 buffer).
    pub fn accumulate(image: &DecodedImage) -> Self {
        let mut hist = ColorHistogram::default();
        for px in image.pixels.pixels() {
            hist.add(Rgb24::from(px.0), 1);
        }
        hist
    }

    /// Add `n` occurrences of `color`.
    pub fn add(&mut self, color: Rgb24, n: u64) {
        *self.counts.entry(color).or_insert(0) += n;
        self.total += n;
    }

    /// Sum of all counts; equals width × height after [`ColorHistogram::accumulate`].
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, color: Rgb24) -> u64 {
        self.counts.get(&color).copied().unwrap_or(0)
    }

    /// The `k` most frequent colors with their counts (count desc, then hex asc).
    pub fn top_k_with_counts(&self, k: usize) -> Vec<(Rgb24, u64)> {
        top_k(self.counts.iter().map(|(c, n)| (*c, *n)), k)
    }

    /// The `k` most frequent colors (count desc, then hex asc).
    pub fn top_k(&self, k: usize) -> TopKResult {
        self.top_k_with_counts(k)
            .into_iter()
            .map(|(c, _)| c)
            .collect()
    }
}
