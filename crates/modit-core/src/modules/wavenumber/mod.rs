//! Log-uniform wavenumber grid and the line-to-grid index built on it.

mod cache;
mod grid;
mod index;

pub use cache::{CacheStats, WavenumberIndexCache};
pub use grid::{SpectralUnit, WavenumberGrid, WavenumberGridError};
pub use index::{WavenumberIndex, WavenumberIndexError};
