//! `Thin`: a single radius with a single Data value.
//!
//! Models a layer of zero thickness at this vertex. The top and bottom of the
//! layer coincide, `find_closest_radius_index` is always `0`, and the node owns
//! one gradient slot per attribute.

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::gradient::GradientCache;
use crate::profile::cache::InvalidateCache;
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::variant::sealed::ProfileStorage;
use crate::profile::variant::{ProfileVariant, validate_profile};
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// Zero-thickness profile.
#[derive(Clone, Debug)]
pub struct ProfileThin {
    radius: [f32; 1],
    data: [Data; 1],
    points: PointIndexOverlay,
    layer_normal: Option<[f64; 3]>,
    gradients: GradientCache,
}

impl ProfileThin {
    /// Thin profile at `radius` owning `data`.
    ///
    /// # Errors
    /// [`ProfileError::InvalidProfile`] if `radius` is not finite.
    pub fn new(radius: f32, data: Data) -> Result<Self, ProfileError> {
        if !radius.is_finite() {
            return Err(ProfileError::InvalidProfile {
                profile: ProfileType::Thin,
                reason: format!("radius {radius} is not finite"),
            });
        }
        Ok(Self {
            radius: [radius],
            data: [data],
            points: PointIndexOverlay::new(1),
            layer_normal: None,
            gradients: GradientCache::new(1),
        })
    }

    /// Drop every cached gradient vector.
    pub fn clear_gradients(&mut self) {
        self.gradients.clear();
    }
}

impl PartialEq for ProfileThin {
    fn eq(&self, other: &Self) -> bool {
        self.same_content(other)
    }
}

impl InvalidateCache for ProfileThin {
    fn invalidate_cache(&mut self) {}
}

impl ProfileStorage for ProfileThin {
    fn radii_mut(&mut self) -> &mut [f32] {
        &mut self.radius
    }
    fn data_mut(&mut self) -> &mut [Data] {
        &mut self.data
    }
    fn point_indices_mut(&mut self) -> &mut PointIndexOverlay {
        &mut self.points
    }
}

impl DebugInvariants for ProfileThin {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ProfileThin invalid");
    }
    fn validate_invariants(&self) -> Result<(), ProfileError> {
        validate_profile(self)
    }
}

impl ProfileVariant for ProfileThin {
    fn profile_type(&self) -> ProfileType {
        ProfileType::Thin
    }
    fn radii(&self) -> &[f32] {
        &self.radius
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
    fn find_closest_radius_index(&self, _radius: f64) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::interp::InterpolatorType;

    fn thin() -> ProfileThin {
        ProfileThin::new(6371.0, Data::from(vec![3.5f32, 8.0])).unwrap()
    }

    #[test]
    fn top_equals_bottom() {
        let p = thin();
        assert_eq!(p.radius_top(), 6371.0);
        assert_eq!(p.radius_bottom(), 6371.0);
        assert_eq!(p.radius(0), 6371.0);
        assert!(p.radius(1).is_nan());
        assert_eq!((p.n_radii(), p.n_data()), (1, 1));
    }

    #[test]
    fn closest_radius_index_is_zero() {
        let p = thin();
        for r in [-1.0e9, 0.0, 6371.0, 1.0e9, f64::NAN] {
            assert_eq!(p.find_closest_radius_index(r), 0);
        }
    }

    #[test]
    fn interpolation_ignores_radius() {
        let p = thin();
        for r in [0.0, 6371.0, 9999.0] {
            let v = p
                .value_at_radius(InterpolatorType::CubicSpline, 1, r, false)
                .unwrap();
            assert_eq!(v, 8.0);
        }
        assert_eq!(
            p.interpolation_coefficients(InterpolatorType::Linear, 1.0, false)
                .unwrap(),
            vec![(0, 1.0)]
        );
    }

    #[test]
    fn set_radius_and_bounds() {
        let mut p = thin();
        p.set_radius(0, 6000.0).unwrap();
        assert_eq!(p.radius_top(), 6000.0);
        assert!(p.set_radius(1, 1.0).unwrap_err().is_bounds_error());
        assert!(matches!(
            p.set_radius(0, f32::NAN),
            Err(ProfileError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_radius() {
        assert!(ProfileThin::new(f32::INFINITY, Data::from(vec![1.0f64])).is_err());
    }
}
