//! Header merge-region calculation and its session-scoped cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::spec::{SpecHeaderMatrix, SpecMergeRegion};

////////////////////////////////////////////////////////////////////////////////
// #region MergeRegionCalculation

/// Compute header merge regions.
///
/// Horizontal runs of row 0 come first, vertical blanks of row 1 after them.
/// Lookups downstream take the first region that contains a cell, so the
/// order is part of the contract. Overlapping regions are kept as-is.
pub fn compute_merge_regions(header: &SpecHeaderMatrix) -> Vec<SpecMergeRegion> {
    let mut l_regions = plan_horizontal_run_regions(&header.rows()[0]);
    l_regions.extend(plan_vertical_blank_regions(&header.rows()[1]));
    l_regions
}

/// Row-0 runs of >= 2 equal adjacent labels. Blank runs are not skipped.
pub fn plan_horizontal_run_regions(row_labels: &[String]) -> Vec<SpecMergeRegion> {
    let mut l_regions = Vec::new();
    let Some(mut c_label_prev) = row_labels.first() else {
        return l_regions;
    };

    let mut n_idx_run_start = 0;
    for (n_idx_col, c_label) in row_labels.iter().enumerate().skip(1) {
        if c_label == c_label_prev {
            continue;
        }
        if n_idx_col - n_idx_run_start > 1 {
            l_regions.push(SpecMergeRegion::horizontal(0, n_idx_run_start, n_idx_col - 1));
        }
        n_idx_run_start = n_idx_col;
        c_label_prev = c_label;
    }

    if row_labels.len() - n_idx_run_start > 1 {
        l_regions.push(SpecMergeRegion::horizontal(
            0,
            n_idx_run_start,
            row_labels.len() - 1,
        ));
    }
    l_regions
}

/// One rows-0..=1 region per blank row-1 label.
pub fn plan_vertical_blank_regions(row_labels: &[String]) -> Vec<SpecMergeRegion> {
    row_labels
        .iter()
        .enumerate()
        .filter(|(_, c_label)| c_label.is_empty())
        .map(|(n_idx_col, _)| SpecMergeRegion::vertical(n_idx_col, 0, 1))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeRegionCache

struct SpecCacheEntry {
    header: SpecHeaderMatrix,
    regions: Arc<[SpecMergeRegion]>,
}

/// Read-mostly cache of merge regions keyed by header content.
///
/// Entries are immutable once inserted. Owned by a report session (or shared
/// between sessions through an `Arc`) rather than living in a global.
pub struct MergeRegionCache {
    dict_entries: RwLock<HashMap<[u8; 32], SpecCacheEntry>>,
    n_entries_max: Option<usize>,
    n_hits: AtomicU64,
    n_misses: AtomicU64,
}

impl Default for MergeRegionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeRegionCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self {
            dict_entries: RwLock::new(HashMap::new()),
            n_entries_max: None,
            n_hits: AtomicU64::new(0),
            n_misses: AtomicU64::new(0),
        }
    }

    /// Cache that stops inserting after `n_entries_max` distinct shapes.
    pub fn with_capacity_max(n_entries_max: usize) -> Self {
        Self {
            n_entries_max: Some(n_entries_max),
            ..Self::new()
        }
    }

    /// Return cached regions for `header`, computing them on a miss.
    pub fn get_or_compute(&self, header: &SpecHeaderMatrix) -> Arc<[SpecMergeRegion]> {
        let Some(key) = derive_cache_key(header) else {
            return compute_merge_regions(header).into();
        };

        {
            let dict_entries = self.dict_entries.read();
            if let Some(entry) = dict_entries.get(&key)
                && entry.header == *header
            {
                self.n_hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("merge-region cache hit (width={})", header.width());
                return Arc::clone(&entry.regions);
            }
        }

        self.n_misses.fetch_add(1, Ordering::Relaxed);
        let regions: Arc<[SpecMergeRegion]> = compute_merge_regions(header).into();
        log::debug!(
            "merge-region cache miss (width={}, regions={})",
            header.width(),
            regions.len()
        );

        let mut dict_entries = self.dict_entries.write();
        if let Some(entry) = dict_entries.get(&key) {
            if entry.header == *header {
                return Arc::clone(&entry.regions);
            }
            log::warn!("merge-region cache key collision; result not cached");
            return regions;
        }
        if self
            .n_entries_max
            .is_some_and(|n_max| dict_entries.len() >= n_max)
        {
            log::debug!("merge-region cache full; result not cached");
            return regions;
        }
        dict_entries.insert(
            key,
            SpecCacheEntry {
                header: header.clone(),
                regions: Arc::clone(&regions),
            },
        );
        regions
    }

    /// Number of cached header shapes.
    pub fn len(&self) -> usize {
        self.dict_entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        self.dict_entries.write().clear();
        self.n_hits.store(0, Ordering::Relaxed);
        self.n_misses.store(0, Ordering::Relaxed);
    }

    /// `(hits, misses)` since creation or the last [`Self::clear`].
    pub fn stats(&self) -> (u64, u64) {
        (
            self.n_hits.load(Ordering::Relaxed),
            self.n_misses.load(Ordering::Relaxed),
        )
    }
}

/// SHA-256 of the stable JSON serialization of the header.
fn derive_cache_key(header: &SpecHeaderMatrix) -> Option<[u8; 32]> {
    match serde_json::to_vec(header) {
        Ok(v_bytes) => Some(Sha256::digest(&v_bytes).into()),
        Err(err) => {
            log::debug!("header serialization failed, bypassing cache: {err}");
            None
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
