//! Shared behavioral contract of every concrete profile representation.
//!
//! Each variant only provides access to its storage (radii, data, point
//! overlay, layer normal, gradient cache) plus the few queries whose meaning
//! differs per variant. Everything else in the contract is a provided method
//! written once here.
//!
//! Raw mutable storage sits behind a sealed supertrait, so outside this crate
//! `set_radius`, `set_data` and `set_point_index` are the only ways to change a
//! profile's nodes and every change goes through their checks.
//!
//! # Absence vs. misuse
//! Read queries of radii and values return NaN for a node the variant does not
//! have; data access, point-index access and all setters return
//! [`ProfileError::NodeIndexOutOfBounds`].

use itertools::Itertools;

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::gradient::{
    CalculatorPool, GradientCache, GradientCalculator, GradientLocation, GradientRequest,
};
use crate::profile::cache::InvalidateCache;
use crate::profile::interp::InterpolatorType;
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// NaN 3-vector returned by gradient reads on variants without a cache.
pub const NAN_GRADIENT: [f64; 3] = [f64::NAN; 3];

pub(crate) mod sealed {
    use crate::data::Data;
    use crate::profile::point_index::PointIndexOverlay;

    /// Unchecked mutable storage. Not nameable outside the crate.
    pub trait ProfileStorage {
        /// Mutable radii; callers must re-check ordering.
        fn radii_mut(&mut self) -> &mut [f32];
        /// Mutable data values; callers must keep types and lengths uniform.
        fn data_mut(&mut self) -> &mut [Data];
        /// Mutable point-index overlay.
        fn point_indices_mut(&mut self) -> &mut PointIndexOverlay;
    }
}

/// Storage accessors and provided operations common to all profile variants.
///
/// The trait is sealed; node storage can only be changed through the checked
/// setters:
///
/// ```compile_fail
/// use earth_profile::prelude::*;
///
/// let mut p = Profile::thin(10.0, Data::from(vec![1.0f64])).unwrap();
/// p.radii_mut()[0] = f32::NAN;
/// ```
pub trait ProfileVariant: InvalidateCache + DebugInvariants + sealed::ProfileStorage {
    /// Tag of the variant.
    fn profile_type(&self) -> ProfileType;

    /// Radii (km) from the bottom of the layer upward.
    fn radii(&self) -> &[f32];
    /// Data values from the bottom of the layer upward.
    fn data(&self) -> &[Data];

    /// Point-index overlay (one slot per data node).
    fn point_indices(&self) -> &PointIndexOverlay;

    /// Layer normal at this profile's vertex, if one was assigned.
    fn layer_normal(&self) -> Option<[f64; 3]>;
    /// Assign or clear the layer normal.
    fn set_layer_normal(&mut self, normal: Option<[f64; 3]>);

    /// Gradient cache, for variants that carry one.
    fn gradient_cache(&self) -> Option<&GradientCache> {
        None
    }

    /// Index into [`data`](Self::data) that node `node` reads its values from.
    fn data_node(&self, node: usize) -> Option<usize> {
        (node < self.data().len()).then_some(node)
    }

    // --- sizes and radii ---

    /// Number of radii.
    fn n_radii(&self) -> usize {
        self.radii().len()
    }

    /// Number of Data values.
    fn n_data(&self) -> usize {
        self.data().len()
    }

    /// Radius of `node`, or NaN if the variant has no such radius.
    fn radius(&self, node: usize) -> f64 {
        self.radii().get(node).map_or(f64::NAN, |&r| f64::from(r))
    }

    /// Radius at the bottom of the layer (NaN without a radius axis).
    fn radius_bottom(&self) -> f64 {
        self.radii().first().map_or(f64::NAN, |&r| f64::from(r))
    }

    /// Radius at the top of the layer (NaN without a radius axis).
    fn radius_top(&self) -> f64 {
        self.radii().last().map_or(f64::NAN, |&r| f64::from(r))
    }

    /// Replace the radius of `node`.
    ///
    /// # Errors
    /// - [`ProfileError::NodeIndexOutOfBounds`] if the variant has no such radius.
    /// - [`ProfileError::InvalidProfile`] if the radius is not finite or would
    ///   break the variant's ordering (strict for NPoint, non-strict for Constant).
    ///   The profile is left unchanged.
    fn set_radius(&mut self, node: usize, radius: f32) -> Result<(), ProfileError> {
        let profile = self.profile_type();
        let len = self.n_radii();
        if node >= len {
            return Err(ProfileError::NodeIndexOutOfBounds { profile, node, len });
        }
        if !radius.is_finite() {
            return Err(ProfileError::InvalidProfile {
                profile,
                reason: format!("radius {radius} is not finite"),
            });
        }
        let strict = profile == ProfileType::NPoint;
        let radii = self.radii();
        let below_ok = node == 0 || ordered(radii[node - 1], radius, strict);
        let above_ok = node + 1 == len || ordered(radius, radii[node + 1], strict);
        if !(below_ok && above_ok) {
            return Err(ProfileError::InvalidProfile {
                profile,
                reason: format!("radius {radius} at node {node} breaks radius ordering"),
            });
        }
        self.radii_mut()[node] = radius;
        self.invalidate_cache();
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    // --- values ---

    /// Value of `attribute` at `node`, or NaN if absent.
    fn value(&self, attribute: usize, node: usize) -> f64 {
        self.data_node(node)
            .map_or(f64::NAN, |i| self.data()[i].value(attribute))
    }

    /// Value of `attribute` at the top of the layer (NaN without data).
    fn value_top(&self, attribute: usize) -> f64 {
        self.data().last().map_or(f64::NAN, |d| d.value(attribute))
    }

    /// Value of `attribute` at the bottom of the layer (NaN without data).
    fn value_bottom(&self, attribute: usize) -> f64 {
        self.data().first().map_or(f64::NAN, |d| d.value(attribute))
    }

    /// Whether the value at (`node`, `attribute`) is NaN or absent.
    fn is_nan(&self, node: usize, attribute: usize) -> bool {
        self.data_node(node)
            .is_none_or(|i| self.data()[i].is_nan(attribute))
    }

    /// Interpolated value of `attribute` at `radius`.
    ///
    /// With zero or one Data value the sole value (or NaN) is returned for any
    /// radius. Multi-node variants override this.
    fn value_at_radius(
        &self,
        _interp: InterpolatorType,
        attribute: usize,
        _radius: f64,
        _allow_out_of_range: bool,
    ) -> Result<f64, ProfileError> {
        Ok(self.value_bottom(attribute))
    }

    /// `(node, weight)` pairs whose weighted node values sum to the
    /// interpolated value at `radius`.
    fn interpolation_coefficients(
        &self,
        _interp: InterpolatorType,
        _radius: f64,
        _allow_out_of_range: bool,
    ) -> Result<Vec<(usize, f64)>, ProfileError> {
        Ok(if self.n_data() == 0 {
            Vec::new()
        } else {
            vec![(0, 1.0)]
        })
    }

    // --- data ---

    /// Data value at `index`.
    fn data_at(&self, index: usize) -> Result<&Data, ProfileError> {
        let len = self.n_data();
        self.data()
            .get(index)
            .ok_or(ProfileError::NodeIndexOutOfBounds {
                profile: self.profile_type(),
                node: index,
                len,
            })
    }

    /// Data value at the top of the layer.
    fn data_top(&self) -> Option<&Data> {
        self.data().last()
    }

    /// Data value at the bottom of the layer.
    fn data_bottom(&self) -> Option<&Data> {
        self.data().first()
    }

    /// Replace the Data value at `index`.
    ///
    /// # Errors
    /// - [`ProfileError::NodeIndexOutOfBounds`] for an index the variant lacks.
    /// - [`ProfileError::DataTypeMismatch`] / [`ProfileError::AttributeCountMismatch`]
    ///   when `data` differs in shape from the value it replaces.
    fn set_data(&mut self, index: usize, data: Data) -> Result<(), ProfileError> {
        let profile = self.profile_type();
        let len = self.n_data();
        let current = self
            .data()
            .get(index)
            .ok_or(ProfileError::NodeIndexOutOfBounds {
                profile,
                node: index,
                len,
            })?;
        data.check_shape(current.data_type(), current.len())?;
        self.data_mut()[index] = data;
        self.invalidate_cache();
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    // --- radius lookup ---

    /// Index of the radius nearest `radius`; ties go to the lower index.
    /// `-1` for variants without radii.
    fn find_closest_radius_index(&self, radius: f64) -> i32 {
        let radii = self.radii();
        if radii.is_empty() {
            return -1;
        }
        let mut best = 0usize;
        let mut best_dist = (f64::from(radii[0]) - radius).abs();
        for (i, &r) in radii.iter().enumerate().skip(1) {
            let dist = (f64::from(r) - radius).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best as i32
    }

    /// Interval index `i` with `r[i] <= radius < r[i+1]`, clamped to the
    /// layer; `-1` for variants with fewer than two radii.
    fn radius_index(&self, radius: f64) -> i32 {
        let radii = self.radii();
        if radii.len() < 2 {
            return -1;
        }
        crate::profile::interp::interval(radii, radius) as i32
    }

    // --- point indices ---

    /// Global point index of `node` (`-1` when unset).
    fn point_index(&self, node: usize) -> Result<i32, ProfileError> {
        self.point_indices().get(self.profile_type(), node)
    }

    /// Assign the global point index of `node`.
    fn set_point_index(&mut self, node: usize, point: i32) -> Result<(), ProfileError> {
        let profile = self.profile_type();
        self.point_indices_mut().set(profile, node, point)?;
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Reset every point index to unset.
    fn reset_point_indices(&mut self) {
        self.point_indices_mut().reset();
    }

    // --- gradients ---

    /// Compute (once) the gradient of `attribute` at every node.
    ///
    /// A calculator is checked out of `pool` only when at least one slot is
    /// missing for (`attribute`, `reciprocal`). Variants without a gradient
    /// cache do nothing.
    ///
    /// # Errors
    /// - [`ProfileError::AttributeIndexOutOfBounds`] for an attribute beyond the Data length.
    /// - [`ProfileError::GradientCalculator`] wrapping the calculator's own error.
    fn compute_gradients<C: GradientCalculator>(
        &self,
        pool: &CalculatorPool<C>,
        location: GradientLocation,
        attribute: usize,
        reciprocal: bool,
    ) -> Result<(), ProfileError>
    where
        Self: Sized,
    {
        let Some(cache) = self.gradient_cache() else {
            return Ok(());
        };
        let n_attributes = self.data().first().map_or(0, Data::len);
        let layer_normal = self.layer_normal();
        let mut calculator = None;
        let computed = cache.compute_missing(attribute, n_attributes, reciprocal, |node| {
            let calc = calculator.get_or_insert_with(|| pool.checkout());
            let request = GradientRequest {
                vertex: location.vertex,
                layer: location.layer,
                node,
                radius: self.radius(node),
                attribute,
                reciprocal,
                layer_normal,
            };
            calc.gradient(&request)
                .map_err(|e| ProfileError::GradientCalculator(Box::new(e)))
        })?;
        if computed > 0 {
            log::trace!(
                "computed {computed} gradient slot(s) for attribute {attribute} (reciprocal = {reciprocal}) at vertex {} layer {}",
                location.vertex,
                location.layer
            );
        }
        Ok(())
    }

    /// Cached gradient of `attribute` at `node`.
    ///
    /// # Errors
    /// [`ProfileError::GradientNotComputed`] when the slot was never computed
    /// for `reciprocal`. Variants without a cache return [`NAN_GRADIENT`].
    fn gradient(
        &self,
        node: usize,
        attribute: usize,
        reciprocal: bool,
    ) -> Result<[f64; 3], ProfileError> {
        match self.gradient_cache() {
            None => Ok(NAN_GRADIENT),
            Some(cache) => {
                if node >= cache.n_nodes() {
                    return Err(ProfileError::NodeIndexOutOfBounds {
                        profile: self.profile_type(),
                        node,
                        len: cache.n_nodes(),
                    });
                }
                cache.get(node, attribute, reciprocal)
            }
        }
    }

    /// Cached gradient of `attribute` at `radius`. Single-node caches return
    /// their only slot; NPoint overrides this to blend neighbouring nodes.
    fn gradient_at_radius(
        &self,
        attribute: usize,
        reciprocal: bool,
        _radius: f64,
    ) -> Result<[f64; 3], ProfileError> {
        self.gradient(0, attribute, reciprocal)
    }

    /// Whether the gradient of `attribute` is cached for `reciprocal` at every node.
    fn has_gradients(&self, attribute: usize, reciprocal: bool) -> bool {
        self.gradient_cache().is_some_and(|cache| {
            (0..cache.n_nodes()).all(|node| cache.is_ready(node, attribute, reciprocal))
        })
    }

    // --- equality ---

    /// Exact radii and value-equal data; caches and point indices are ignored.
    fn same_content(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.radii() == other.radii() && self.data() == other.data()
    }
}

/// Structural checks shared by every variant: node counts per shape, finite
/// and ordered radii, uniform data shape, overlay and cache sizes.
pub(crate) fn validate_profile<P: ProfileVariant + ?Sized>(p: &P) -> Result<(), ProfileError> {
    let profile_type = p.profile_type();
    let (n_radii, n_data) = (p.n_radii(), p.n_data());
    let shape_ok = match profile_type {
        ProfileType::Empty | ProfileType::SurfaceEmpty => (n_radii, n_data) == (0, 0),
        ProfileType::Surface => (n_radii, n_data) == (0, 1),
        ProfileType::Thin => (n_radii, n_data) == (1, 1),
        ProfileType::Constant => (n_radii, n_data) == (2, 1),
        ProfileType::NPoint => n_radii >= 2 && n_radii == n_data,
    };
    if !shape_ok {
        return Err(crate::invariant_error!(
            "{profile_type} profile has {n_radii} radii and {n_data} data value(s)"
        ));
    }
    if let Some(r) = p.radii().iter().find(|r| !r.is_finite()) {
        return Err(crate::invariant_error!(
            "{profile_type} profile has non-finite radius {r}"
        ));
    }
    let strict = profile_type == ProfileType::NPoint;
    if let Some((lo, hi)) = p
        .radii()
        .iter()
        .tuple_windows()
        .find(|(lo, hi)| if strict { lo >= hi } else { lo > hi })
    {
        return Err(crate::invariant_error!(
            "{profile_type} profile radii out of order: {lo} then {hi}"
        ));
    }
    if let Some(first) = p.data().first() {
        for d in &p.data()[1..] {
            d.check_shape(first.data_type(), first.len())?;
        }
    }
    let slots = p.point_indices().len();
    if slots != n_data {
        return Err(crate::invariant_error!(
            "{profile_type} profile has {slots} point slot(s) for {n_data} data value(s)"
        ));
    }
    if p.gradient_cache().is_some() != profile_type.has_gradients() {
        return Err(crate::invariant_error!(
            "{profile_type} profile gradient cache presence is wrong"
        ));
    }
    if let Some(cache) = p.gradient_cache() {
        if cache.n_nodes() != n_data {
            return Err(crate::invariant_error!(
                "{profile_type} gradient cache has {} node(s) for {n_data} data value(s)",
                cache.n_nodes()
            ));
        }
    }
    Ok(())
}

#[inline]
fn ordered(lo: f32, hi: f32, strict: bool) -> bool {
    if strict { lo < hi } else { lo <= hi }
}

#[cfg(test)]
mod tests {
    use super::sealed::ProfileStorage;
    use super::*;
    use crate::profile::Profile;

    fn npoint() -> Profile {
        Profile::npoint(
            vec![1.0, 2.0, 3.0],
            vec![
                Data::from(vec![1.0f64]),
                Data::from(vec![2.0f64]),
                Data::from(vec![3.0f64]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn checked_mutations_keep_invariants() {
        let mut p = npoint();
        p.set_radius(1, 2.5).unwrap();
        p.set_data(2, Data::from(vec![9.0f64])).unwrap();
        p.set_point_index(0, 7).unwrap();
        p.validate_invariants().unwrap();
        assert!(p.set_radius(1, 0.5).is_err());
        assert!(p.set_data(0, Data::from(vec![1.0f32])).is_err());
        assert_eq!(p.radii(), &[1.0, 2.5, 3.0]);
        p.validate_invariants().unwrap();
    }

    #[test]
    fn validate_reports_raw_storage_corruption() {
        let mut p = npoint();
        p.radii_mut()[0] = 5.0;
        assert!(matches!(
            p.validate_invariants(),
            Err(ProfileError::InvariantViolation(_))
        ));
        let mut p = npoint();
        p.data_mut()[1] = Data::from(vec![1.0f64, 2.0]);
        assert!(p.validate_invariants().is_err());
    }

    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    #[test]
    #[should_panic(expected = "profile invariants")]
    fn mutation_on_corrupt_profile_panics() {
        let mut p = npoint();
        p.radii_mut()[2] = 0.0;
        // Valid by itself; the post-mutation check sees the broken ordering.
        let _ = p.set_data(0, Data::from(vec![4.0f64]));
    }
}
