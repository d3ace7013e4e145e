//! `NPoint`: a general multi-node profile.
//!
//! Radii are strictly increasing from the bottom of the layer to the top and
//! every node carries its own Data value of uniform type and length. Values
//! between nodes are interpolated linearly or with a natural cubic spline.
//!
//! Spline second derivatives are computed per attribute on first use and
//! dropped whenever a radius or Data value changes.

use itertools::Itertools;
use once_cell::sync::OnceCell;

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::gradient::GradientCache;
use crate::profile::cache::InvalidateCache;
use crate::profile::interp::{self, InterpolatorType, Placement};
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::variant::sealed::ProfileStorage;
use crate::profile::variant::{ProfileVariant, validate_profile};
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// Profile with two or more radius nodes, each owning a Data value.
#[derive(Clone, Debug)]
pub struct ProfileNPoint {
    radii: Vec<f32>,
    data: Vec<Data>,
    points: PointIndexOverlay,
    layer_normal: Option<[f64; 3]>,
    gradients: GradientCache,
    splines: Vec<OnceCell<Vec<f64>>>,
}

impl ProfileNPoint {
    /// Build from matching radii and Data values.
    ///
    /// # Errors
    /// [`ProfileError::InvalidProfile`] when fewer than two nodes are given,
    /// the counts differ, a radius is not finite, the radii are not strictly
    /// increasing, or the Data values differ in type or length.
    pub fn new(radii: Vec<f32>, data: Vec<Data>) -> Result<Self, ProfileError> {
        let invalid = |reason: String| ProfileError::InvalidProfile {
            profile: ProfileType::NPoint,
            reason,
        };
        if radii.len() < 2 {
            return Err(invalid(format!("{} node(s), need at least 2", radii.len())));
        }
        if radii.len() != data.len() {
            return Err(invalid(format!(
                "{} radii but {} data values",
                radii.len(),
                data.len()
            )));
        }
        if let Some(r) = radii.iter().find(|r| !r.is_finite()) {
            return Err(invalid(format!("radius {r} is not finite")));
        }
        if let Some((i, (lo, hi))) = radii
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (lo, hi))| lo >= hi)
        {
            return Err(invalid(format!(
                "radii not strictly increasing at node {}: {lo} >= {hi}",
                i + 1
            )));
        }
        let (data_type, n_attributes) = (data[0].data_type(), data[0].len());
        for d in &data[1..] {
            d.check_shape(data_type, n_attributes)?;
        }
        let n = radii.len();
        Ok(Self {
            radii,
            data,
            points: PointIndexOverlay::new(n),
            layer_normal: None,
            gradients: GradientCache::new(n),
            splines: vec![OnceCell::new(); n_attributes],
        })
    }

    /// Number of attributes carried by every node.
    pub fn n_attributes(&self) -> usize {
        self.data[0].len()
    }

    fn radii_f64(&self) -> Vec<f64> {
        self.radii.iter().map(|&r| f64::from(r)).collect()
    }

    fn column(&self, attribute: usize) -> Vec<f64> {
        self.data.iter().map(|d| d.value(attribute)).collect()
    }

    /// Natural spline second derivatives for `attribute`, computed once.
    fn spline(&self, attribute: usize) -> Option<&[f64]> {
        let cell = self.splines.get(attribute)?;
        let y2 = cell.get_or_init(|| {
            log::trace!(
                "building spline for attribute {attribute} over {} nodes",
                self.radii.len()
            );
            interp::spline_second_derivatives(&self.radii_f64(), &self.column(attribute))
        });
        Some(y2)
    }

    /// Drop every cached gradient vector.
    pub fn clear_gradients(&mut self) {
        self.gradients.clear();
    }
}

impl PartialEq for ProfileNPoint {
    fn eq(&self, other: &Self) -> bool {
        self.same_content(other)
    }
}

impl InvalidateCache for ProfileNPoint {
    fn invalidate_cache(&mut self) {
        for cell in &mut self.splines {
            cell.take();
        }
    }
}

impl ProfileStorage for ProfileNPoint {
    fn radii_mut(&mut self) -> &mut [f32] {
        &mut self.radii
    }
    fn data_mut(&mut self) -> &mut [Data] {
        &mut self.data
    }
    fn point_indices_mut(&mut self) -> &mut PointIndexOverlay {
        &mut self.points
    }
}

impl DebugInvariants for ProfileNPoint {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ProfileNPoint invalid");
    }
    fn validate_invariants(&self) -> Result<(), ProfileError> {
        validate_profile(self)
    }
}

impl ProfileVariant for ProfileNPoint {
    fn profile_type(&self) -> ProfileType {
        ProfileType::NPoint
    }
    fn radii(&self) -> &[f32] {
        &self.radii
    }
    fn data(&self) -> &[Data] {
        &self.data
    }
    fn point_indices(&self) -> &PointIndexOverlay {
        &self.points
    }
    fn layer_normal(&self) -> Option<[f64; 3]> {
        self.layer_normal
    }
    fn set_layer_normal(&mut self, normal: Option<[f64; 3]>) {
        self.layer_normal = normal;
    }
    fn gradient_cache(&self) -> Option<&GradientCache> {
        Some(&self.gradients)
    }

    fn value_at_radius(
        &self,
        interp: InterpolatorType,
        attribute: usize,
        radius: f64,
        allow_out_of_range: bool,
    ) -> Result<f64, ProfileError> {
        match interp::place(&self.radii, radius, allow_out_of_range)? {
            Placement::Below => Ok(self.value_bottom(attribute)),
            Placement::Above => Ok(self.value_top(attribute)),
            Placement::Inside(lo) => match interp {
                InterpolatorType::Linear => {
                    let (w_lo, w_hi) =
                        interp::linear_weights(self.radius(lo), self.radius(lo + 1), radius);
                    Ok(w_lo * self.value(attribute, lo) + w_hi * self.value(attribute, lo + 1))
                }
                InterpolatorType::CubicSpline => match self.spline(attribute) {
                    None => Ok(f64::NAN),
                    Some(y2) => Ok(interp::spline_value(
                        &self.radii_f64(),
                        &self.column(attribute),
                        y2,
                        lo,
                        radius,
                    )),
                },
            },
        }
    }

    fn interpolation_coefficients(
        &self,
        interp: InterpolatorType,
        radius: f64,
        allow_out_of_range: bool,
    ) -> Result<Vec<(usize, f64)>, ProfileError> {
        let lo = match interp::place(&self.radii, radius, allow_out_of_range)? {
            Placement::Below => return Ok(vec![(0, 1.0)]),
            Placement::Above => return Ok(vec![(self.radii.len() - 1, 1.0)]),
            Placement::Inside(lo) => lo,
        };
        match interp {
            InterpolatorType::Linear => {
                let (w_lo, w_hi) =
                    interp::linear_weights(self.radius(lo), self.radius(lo + 1), radius);
                Ok(vec![(lo, w_lo), (lo + 1, w_hi)])
            }
            InterpolatorType::CubicSpline => {
                // The spline is linear in the node values, so the weight of
                // node j is the spline through the j-th unit vector.
                let x = self.radii_f64();
                let n = x.len();
                let mut coefficients = Vec::with_capacity(n);
                let mut unit = vec![0.0; n];
                for j in 0..n {
                    unit[j] = 1.0;
                    let y2 = interp::spline_second_derivatives(&x, &unit);
                    let w = interp::spline_value(&x, &unit, &y2, lo, radius);
                    if w != 0.0 {
                        coefficients.push((j, w));
                    }
                    unit[j] = 0.0;
                }
                Ok(coefficients)
            }
        }
    }

    /// Linear blend of the cached gradients of the two bracketing nodes.
    /// Radii outside the layer clamp to the boundary node.
    fn gradient_at_radius(
        &self,
        attribute: usize,
        reciprocal: bool,
        radius: f64,
    ) -> Result<[f64; 3], ProfileError> {
        let lo = match interp::place(&self.radii, radius, true)? {
            Placement::Below => return self.gradient(0, attribute, reciprocal),
            Placement::Above => {
                return self.gradient(self.radii.len() - 1, attribute, reciprocal);
            }
            Placement::Inside(lo) => lo,
        };
        let g_lo = self.gradient(lo, attribute, reciprocal)?;
        let g_hi = self.gradient(lo + 1, attribute, reciprocal)?;
        let (w_lo, w_hi) = interp::linear_weights(self.radius(lo), self.radius(lo + 1), radius);
        Ok(std::array::from_fn(|k| w_lo * g_lo[k] + w_hi * g_hi[k]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npoint() -> ProfileNPoint {
        ProfileNPoint::new(
            vec![3000.0, 3500.0, 4500.0],
            vec![
                Data::from(vec![10.0f64, 1.0]),
                Data::from(vec![20.0f64, 2.0]),
                Data::from(vec![40.0f64, 4.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn constructor_validates_shape() {
        let d = |v: f64| Data::from(vec![v]);
        assert!(ProfileNPoint::new(vec![1.0], vec![d(1.0)]).is_err());
        assert!(ProfileNPoint::new(vec![1.0, 2.0], vec![d(1.0)]).is_err());
        assert!(ProfileNPoint::new(vec![2.0, 2.0], vec![d(1.0), d(2.0)]).is_err());
        assert!(ProfileNPoint::new(vec![1.0, f32::NAN], vec![d(1.0), d(2.0)]).is_err());
        assert!(
            ProfileNPoint::new(vec![1.0, 2.0], vec![d(1.0), Data::from(vec![2.0f32])]).is_err()
        );
        assert!(ProfileNPoint::new(vec![1.0, 2.0], vec![d(1.0), d(2.0)]).is_ok());
    }

    #[test]
    fn node_queries() {
        let p = npoint();
        assert_eq!((p.n_radii(), p.n_data()), (3, 3));
        assert_eq!(p.n_attributes(), 2);
        assert_eq!(p.radius_bottom(), 3000.0);
        assert_eq!(p.radius_top(), 4500.0);
        assert_eq!(p.value(0, 1), 20.0);
        assert!(p.value(0, 3).is_nan());
        assert_eq!(p.value_top(1), 4.0);
        assert_eq!(p.find_closest_radius_index(3250.0), 0);
        assert_eq!(p.find_closest_radius_index(4000.0), 1);
        assert_eq!(p.find_closest_radius_index(9000.0), 2);
        assert_eq!(p.radius_index(4000.0), 1);
    }

    #[test]
    fn linear_interpolation() {
        let p = npoint();
        let v = p
            .value_at_radius(InterpolatorType::Linear, 0, 4000.0, false)
            .unwrap();
        assert!((v - 30.0).abs() < 1e-12);
        assert!(matches!(
            p.value_at_radius(InterpolatorType::Linear, 0, 5000.0, false),
            Err(ProfileError::RadiusOutOfRange { .. })
        ));
        let clamped = p
            .value_at_radius(InterpolatorType::Linear, 0, 5000.0, true)
            .unwrap();
        assert_eq!(clamped, 40.0);
        let below = p
            .value_at_radius(InterpolatorType::Linear, 1, 0.0, true)
            .unwrap();
        assert_eq!(below, 1.0);
    }

    #[test]
    fn spline_hits_nodes_and_matches_coefficients() {
        let p = npoint();
        for node in 0..3 {
            let v = p
                .value_at_radius(InterpolatorType::CubicSpline, 0, p.radius(node), false)
                .unwrap();
            assert!((v - p.value(0, node)).abs() < 1e-9);
        }
        let r = 3800.0;
        let v = p
            .value_at_radius(InterpolatorType::CubicSpline, 0, r, false)
            .unwrap();
        let coeffs = p
            .interpolation_coefficients(InterpolatorType::CubicSpline, r, false)
            .unwrap();
        let weighted: f64 = coeffs.iter().map(|&(j, w)| w * p.value(0, j)).sum();
        assert!((v - weighted).abs() < 1e-9);
    }

    #[test]
    fn linear_coefficients_sum_to_one() {
        let p = npoint();
        let coeffs = p
            .interpolation_coefficients(InterpolatorType::Linear, 3250.0, false)
            .unwrap();
        assert_eq!(coeffs.len(), 2);
        assert_eq!(coeffs[0].0, 0);
        assert!((coeffs.iter().map(|c| c.1).sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(
            p.interpolation_coefficients(InterpolatorType::Linear, 1.0, true)
                .unwrap(),
            vec![(0, 1.0)]
        );
    }

    #[test]
    fn mutation_drops_spline_cache() {
        let mut p = npoint();
        let before = p
            .value_at_radius(InterpolatorType::CubicSpline, 0, 3800.0, false)
            .unwrap();
        p.set_data(1, Data::from(vec![25.0f64, 2.0])).unwrap();
        let after = p
            .value_at_radius(InterpolatorType::CubicSpline, 0, 3800.0, false)
            .unwrap();
        assert!(after > before);
    }

    #[test]
    fn strict_radius_ordering() {
        let mut p = npoint();
        assert!(p.set_radius(1, 3000.0).is_err());
        assert!(p.set_radius(1, 4500.0).is_err());
        p.set_radius(1, 4000.0).unwrap();
        assert_eq!(p.radius(1), 4000.0);
        assert!(p.set_radius(3, 5000.0).unwrap_err().is_bounds_error());
    }

    #[test]
    fn one_point_slot_per_node() {
        let mut p = npoint();
        for node in 0..3 {
            p.set_point_index(node, node as i32 + 100).unwrap();
        }
        assert_eq!(p.point_index(2).unwrap(), 102);
        assert!(p.point_index(3).unwrap_err().is_bounds_error());
    }
}
