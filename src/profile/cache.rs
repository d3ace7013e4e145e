//! Cache invalidation for derived per-profile state.

/// Anything that caches values derived from its radii or data (spline
/// coefficients, …) should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}
