//! `Constant`: bottom and top radius sharing one Data value.

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::gradient::GradientCache;
use crate::profile::cache::InvalidateCache;
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::variant::sealed::ProfileStorage;
use crate::profile::variant::{ProfileVariant, validate_profile};
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// Layer whose attribute values do not vary with radius.
///
/// Radius nodes 0 (bottom) and 1 (top) both read the single Data value. The
/// layer owns one point-index slot and one gradient slot per attribute,
/// evaluated at the bottom radius.
#[derive(Clone, Debug)]
pub struct ProfileConstant {
    radii: [f32; 2],
    data: [Data; 1],
    points: PointIndexOverlay,
    layer_normal: Option<[f64; 3]>,
    gradients: GradientCache,
}

impl ProfileConstant {
    /// Constant profile spanning `[radius_bottom, radius_top]`.
    ///
    /// # Errors
    /// [`ProfileError::InvalidProfile`] if a radius is not finite or
    /// `radius_bottom > radius_top`.
    pub fn new(radius_bottom: f32, radius_top: f32, data: Data) -> Result<Self, ProfileError> {
        if !(radius_bottom.is_finite() && radius_top.is_finite()) || radius_bottom > radius_top {
            return Err(ProfileError::InvalidProfile {
                profile: ProfileType::Constant,
                reason: format!("invalid radius range [{radius_bottom}, {radius_top}]"),
            });
        }
        Ok(Self {
            radii: [radius_bottom, radius_top],
            data: [data],
            points: PointIndexOverlay::new(1),
            layer_normal: None,
            gradients: GradientCache::new(1),
        })
    }

    /// Layer thickness in km.
    pub fn thickness(&self) -> f64 {
        f64::from(self.radii[1]) - f64::from(self.radii[0])
    }

    /// Drop every cached gradient vector.
    pub fn clear_gradients(&mut self) {
        self.gradients.clear();
    }
}

impl PartialEq for ProfileConstant {
    fn eq(&self, other: &Self) -> bool {
        self.same_content(other)
    }
}

impl InvalidateCache for ProfileConstant {
    fn invalidate_cache(&mut self) {}
}

impl ProfileStorage for ProfileConstant {
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

impl DebugInvariants for ProfileConstant {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ProfileConstant invalid");
    }
    fn validate_invariants(&self) -> Result<(), ProfileError> {
        validate_profile(self)
    }
}

impl ProfileVariant for ProfileConstant {
    fn profile_type(&self) -> ProfileType {
        ProfileType::Constant
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
    fn data_node(&self, node: usize) -> Option<usize> {
        (node < 2).then_some(0)
    }
}
