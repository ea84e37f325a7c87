use super::grid::WavenumberGrid;
use super::index::{WavenumberIndex, WavenumberIndexError};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

#[derive(Debug)]
struct CacheEntry {
    grid_values: Vec<f64>,
    centers: Vec<f64>,
    index: Arc<WavenumberIndex>,
}

impl CacheEntry {
    fn matches(&self, grid: &WavenumberGrid, centers: &[f64]) -> bool {
        same_bits(&self.grid_values, grid.values()) && same_bits(&self.centers, centers)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<u64, Vec<CacheEntry>>,
    hits: usize,
    misses: usize,
}

/// Memoizes [`WavenumberIndex`] values for repeated (line list, grid) pairs.
///
/// The cache is owned by the caller and handed to each synthesis call; it is
/// safe to share between threads.
#[derive(Debug, Default)]
pub struct WavenumberIndexCache {
    state: Mutex<CacheState>,
}

impl WavenumberIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        grid: &WavenumberGrid,
        centers: &[f64],
    ) -> Result<Arc<WavenumberIndex>, WavenumberIndexError> {
        let key = fingerprint(grid.values(), centers);
        {
            let mut state = self.lock();
            let cached = state.entries.get(&key).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|entry| entry.matches(grid, centers))
                    .map(|entry| Arc::clone(&entry.index))
            });
            if let Some(index) = cached {
                state.hits += 1;
                return Ok(index);
            }
        }

        // Built outside the lock; concurrent misses on the same key may both
        // build, and the first insert wins.
        let built = Arc::new(WavenumberIndex::from_lines(grid, centers)?);
        let mut state = self.lock();
        state.misses += 1;
        let bucket = state.entries.entry(key).or_default();
        if let Some(existing) = bucket.iter().find(|entry| entry.matches(grid, centers)) {
            return Ok(Arc::clone(&existing.index));
        }
        bucket.push(CacheEntry {
            grid_values: grid.values().to_vec(),
            centers: centers.to_vec(),
            index: Arc::clone(&built),
        });
        tracing::debug!(
            lines = centers.len(),
            grid_len = grid.len(),
            "cached wavenumber index"
        );
        Ok(built)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.values().map(Vec::len).sum(),
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn fingerprint(grid_values: &[f64], centers: &[f64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    grid_values.len().hash(&mut hasher);
    for value in grid_values {
        value.to_bits().hash(&mut hasher);
    }
    centers.len().hash(&mut hasher);
    for value in centers {
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

fn same_bits(lhs: &[f64], rhs: &[f64]) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs)
            .all(|(left, right)| left.to_bits() == right.to_bits())
}

#[cfg(test)]
mod tests {
    use super::{CacheStats, WavenumberIndexCache};
    use crate::modules::wavenumber::WavenumberGrid;
    use std::sync::Arc;

    #[test]
    fn repeated_requests_reuse_the_same_index() {
        let cache = WavenumberIndexCache::new();
        let grid = WavenumberGrid::log_uniform(4000.0, 4100.0, 200).expect("grid");
        let centers = [4010.0, 4020.0, 4090.0];

        let first = cache.get_or_build(&grid, &centers).expect("first");
        let second = cache.get_or_build(&grid, &centers).expect("second");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn different_grids_or_lines_build_separate_entries() {
        let cache = WavenumberIndexCache::new();
        let grid = WavenumberGrid::log_uniform(4000.0, 4100.0, 200).expect("grid");
        let finer = WavenumberGrid::log_uniform(4000.0, 4100.0, 400).expect("grid");

        let base = cache.get_or_build(&grid, &[4010.0]).expect("base");
        let other_grid = cache.get_or_build(&finer, &[4010.0]).expect("finer");
        let other_lines = cache.get_or_build(&grid, &[4011.0]).expect("lines");
        assert!(!Arc::ptr_eq(&base, &other_grid));
        assert!(!Arc::ptr_eq(&base, &other_lines));
        assert_eq!(cache.stats().entries, 3);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = WavenumberIndexCache::new();
        let grid = WavenumberGrid::log_uniform(4000.0, 4100.0, 200).expect("grid");
        assert!(cache.get_or_build(&grid, &[5000.0]).is_err());
        assert_eq!(cache.stats().entries, 0);
    }
}
