//! Region-level parallelism configuration.

use serde::{Deserialize, Serialize};

/// Controls whether regions of one page are encoded and decoded concurrently.
///
/// Regions are decode-independent, so running them on the rayon pool is safe;
/// results are always reassembled in detector order. Pages are never processed
/// concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel processing.
    /// If None, rayon will use the default thread pool size (typically number of CPU cores).
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Pages with at most this many regions are decoded sequentially.
    /// Default: `usize::MAX` (always sequential).
    #[serde(default = "ParallelPolicy::default_region_threshold")]
    pub region_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that decodes regions in parallel once a page has more than
    /// `threshold` of them.
    pub fn parallel_above(threshold: usize) -> Self {
        Self {
            region_threshold: threshold,
            ..Self::default()
        }
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Whether a page with `region_count` regions should be decoded in parallel.
    pub fn use_parallel(&self, region_count: usize) -> bool {
        region_count > self.region_threshold
    }

    /// Install the global rayon thread pool with the configured number of threads.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the thread pool was successfully configured
    /// - `Ok(false)` if `max_threads` is None (no configuration needed)
    /// - `Err` if the thread pool has already been initialized
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        if let Some(num_threads) = self.max_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn default_region_threshold() -> usize {
        usize::MAX
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            region_threshold: Self::default_region_threshold(),
        }
    }
}
