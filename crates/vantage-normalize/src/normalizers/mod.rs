mod news;
mod snapshot;
mod timeseries;

pub use news::NewsNormalizer;
pub use snapshot::SnapshotNormalizer;
pub use timeseries::TimeseriesNormalizer;

use crate::normalizer::NormalizerRegistry;

/// Builds the registry with the built-in normalizers in the order the core
/// ships them. Callers may still push additional normalizers after this.
pub fn default_registry() -> NormalizerRegistry {
    let mut registry = NormalizerRegistry::new();
    registry.register(Box::new(TimeseriesNormalizer));
    registry.register(Box::new(SnapshotNormalizer));
    registry.register(Box::new(NewsNormalizer));
    registry
}
