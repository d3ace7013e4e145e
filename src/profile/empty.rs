//! Zero-node variants: `Empty` and `SurfaceEmpty`.
//!
//! Neither carries radii nor data. Every value query returns NaN, every node
//! index is out of bounds for mutation, and `find_closest_radius_index` is `-1`.
//! `SurfaceEmpty` marks a surface layer with no data at all ("always absent").

use crate::data::Data;
use crate::debug_invariants::DebugInvariants;
use crate::profile::cache::InvalidateCache;
use crate::profile::point_index::PointIndexOverlay;
use crate::profile::variant::sealed::ProfileStorage;
use crate::profile::variant::{ProfileVariant, validate_profile};
use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

macro_rules! zero_node_variant {
    ($(#[$meta:meta])* $name:ident, $tag:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            points: PointIndexOverlay,
            layer_normal: Option<[f64; 3]>,
        }

        impl $name {
            /// New profile with no layer normal.
            pub fn new() -> Self {
                Self {
                    points: PointIndexOverlay::new(0),
                    layer_normal: None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, _other: &Self) -> bool {
                true
            }
        }

        impl InvalidateCache for $name {
            fn invalidate_cache(&mut self) {}
        }

        impl ProfileStorage for $name {
            fn radii_mut(&mut self) -> &mut [f32] {
                &mut []
            }
            fn data_mut(&mut self) -> &mut [Data] {
                &mut []
            }
            fn point_indices_mut(&mut self) -> &mut PointIndexOverlay {
                &mut self.points
            }
        }

        impl DebugInvariants for $name {
            fn debug_assert_invariants(&self) {
                crate::profile_debug_assert_ok!(
                    self.validate_invariants(),
                    stringify!($name),
                    " invalid"
                );
            }
            fn validate_invariants(&self) -> Result<(), ProfileError> {
                validate_profile(self)
            }
        }

        impl ProfileVariant for $name {
            fn profile_type(&self) -> ProfileType {
                $tag
            }
            fn radii(&self) -> &[f32] {
                &[]
            }
            fn data(&self) -> &[Data] {
                &[]
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
    };
}

zero_node_variant!(
    /// Layer with no thickness information and no data at this vertex.
    ProfileEmpty,
    ProfileType::Empty
);

zero_node_variant!(
    /// Surface layer whose value is always absent at this vertex.
    ProfileSurfaceEmpty,
    ProfileType::SurfaceEmpty
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::interp::InterpolatorType;

    #[test]
    fn empty_answers_with_sentinels() {
        let p = ProfileEmpty::new();
        assert_eq!((p.n_radii(), p.n_data()), (0, 0));
        assert!(p.radius(0).is_nan());
        assert!(p.radius_top().is_nan());
        assert!(p.radius_bottom().is_nan());
        assert!(p.value(0, 0).is_nan());
        assert!(p.value_top(0).is_nan());
        assert_eq!(p.find_closest_radius_index(6371.0), -1);
        assert!(p
            .value_at_radius(InterpolatorType::Linear, 0, 10.0, false)
            .unwrap()
            .is_nan());
        assert!(p.data_top().is_none());
    }

    #[test]
    fn surface_empty_is_always_nan() {
        let p = ProfileSurfaceEmpty::new();
        for node in 0..3 {
            for attribute in 0..3 {
                assert!(p.is_nan(node, attribute));
            }
        }
        assert_eq!(p.profile_type(), ProfileType::SurfaceEmpty);
    }

    #[test]
    fn any_node_is_out_of_bounds_for_mutation() {
        let mut p = ProfileEmpty::new();
        assert!(p.set_radius(0, 1.0).unwrap_err().is_bounds_error());
        assert!(p.point_index(0).unwrap_err().is_bounds_error());
        assert!(p.set_point_index(0, 3).unwrap_err().is_bounds_error());
        assert!(p.data_at(0).unwrap_err().is_bounds_error());
        p.reset_point_indices();
    }
}
