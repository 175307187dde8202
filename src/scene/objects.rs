use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::foundation::core::Rgba;
use crate::foundation::error::{ScheduleError, ScheduleResult};
use crate::foundation::ids::{ObjectHandle, ProductId};

/// Renderable object inventory as delivered by the scene collaborator.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

/// One renderable object and the product it represents, if any.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    pub handle: ObjectHandle,
    #[serde(default)]
    pub product: Option<ProductId>,
    /// Color the object carries before any schedule state is applied.
    #[serde(default)]
    pub color: Rgba,
}

/// Counters from the last [`ObjectCache::build`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectCacheStats {
    /// Object handles stored under some product.
    pub objects_cached: usize,
    /// Distinct products with at least one object.
    pub products: usize,
    /// Objects skipped because their handle was already seen.
    pub duplicates_dropped: usize,
    pub build_duration: Duration,
}

/// Product → renderable object handles, built once per model load.
///
/// Reads are only trusted while [`ObjectCache::is_valid`] holds; lookups on an invalidated cache
/// return [`ScheduleError::StaleCache`].
#[derive(Clone, Debug, Default)]
pub struct ObjectCache {
    by_product: HashMap<ProductId, SmallVec<[ObjectHandle; 2]>>,
    original_colors: HashMap<ObjectHandle, Rgba>,
    valid: bool,
    stats: ObjectCacheStats,
}

impl ObjectCache {
    /// Single pass over `scene`. Objects without a product only contribute their original color.
    #[tracing::instrument(skip_all, fields(objects = scene.objects.len()))]
    pub fn build(scene: &Scene) -> Self {
        let t0 = Instant::now();
        let mut by_product = HashMap::<ProductId, SmallVec<[ObjectHandle; 2]>>::new();
        let mut original_colors = HashMap::with_capacity(scene.objects.len());
        let mut seen = HashSet::with_capacity(scene.objects.len());
        let mut stats = ObjectCacheStats::default();

        for obj in &scene.objects {
            if !seen.insert(obj.handle) {
                stats.duplicates_dropped += 1;
                continue;
            }
            original_colors.insert(obj.handle, obj.color);
            if let Some(product) = obj.product {
                by_product.entry(product).or_default().push(obj.handle);
                stats.objects_cached += 1;
            }
        }

        stats.products = by_product.len();
        stats.build_duration = t0.elapsed();
        if stats.duplicates_dropped > 0 {
            tracing::warn!(
                dropped = stats.duplicates_dropped,
                "scene lists some object handles more than once"
            );
        }
        tracing::debug!(
            objects = stats.objects_cached,
            products = stats.products,
            "object cache built"
        );

        Self {
            by_product,
            original_colors,
            valid: true,
            stats,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the cache stale after a model reload or structural scene change.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Object handles representing `product`; empty when the product has no objects.
    pub fn objects_for(&self, product: ProductId) -> ScheduleResult<&[ObjectHandle]> {
        if !self.valid {
            return Err(ScheduleError::stale_cache(
                "object cache read after invalidation",
            ));
        }
        Ok(self
            .by_product
            .get(&product)
            .map(|v| v.as_slice())
            .unwrap_or(&[]))
    }

    /// Original color of an object, white when unknown.
    pub fn original_color(&self, handle: ObjectHandle) -> Rgba {
        self.original_colors
            .get(&handle)
            .copied()
            .unwrap_or(Rgba::WHITE)
    }

    pub fn stats(&self) -> ObjectCacheStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/objects.rs"]
mod tests;
