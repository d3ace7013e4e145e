//! `Surface`: a single Data value with no radius axis.

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::profile::cache::InvalidateCache;
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::variant::sealed::ProfileStorage;
use crate::profile::variant::{ProfileVariant, validate_profile};
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// Value attached to a 2D surface; radius queries are NaN.
#[derive(Clone, Debug)]
pub struct ProfileSurface {
    data: [Data; 1],
    points: PointIndexOverlay,
    layer_normal: Option<[f64; 3]>,
}

impl ProfileSurface {
    /// Surface profile owning `data`.
    pub fn new(data: Data) -> Self {
        Self {
            data: [data],
            points: PointIndexOverlay::new(1),
            layer_normal: None,
        }
    }
}

impl PartialEq for ProfileSurface {
    fn eq(&self, other: &Self) -> bool {
        self.same_content(other)
    }
}

impl InvalidateCache for ProfileSurface {
    fn invalidate_cache(&mut self) {}
}

impl ProfileStorage for ProfileSurface {
    fn radii_mut(&mut self) -> &mut [f32] {
        &mut []
    }
    fn data_mut(&mut self) -> &mut [Data] {
        &mut self.data
    }
    fn point_indices_mut(&mut self) -> &mut PointIndexOverlay {
        &mut self.points
    }
}

impl DebugInvariants for ProfileSurface {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ProfileSurface invalid");
    }
    fn validate_invariants(&self) -> Result<(), ProfileError> {
        validate_profile(self)
    }
}

impl ProfileVariant for ProfileSurface {
    fn profile_type(&self) -> ProfileType {
        ProfileType::Surface
    }
    fn radii(&self) -> &[f32] {
        &[]
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
}
