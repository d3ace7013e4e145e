//! Per-vertex radial profiles of a layered model.
//!
//! A [`Profile`] describes how attribute values vary with radius inside one
//! layer at one grid vertex. The variant set is closed; each variant stores
//! only what its shape needs:
//!
//! | variant | radii | data |
//! |---|---|---|
//! | [`ProfileEmpty`] | 0 | 0 |
//! | [`ProfileSurfaceEmpty`] | 0 | 0 |
//! | [`ProfileSurface`] | 0 | 1 |
//! | [`ProfileThin`] | 1 | 1 |
//! | [`ProfileConstant`] | 2 | 1 |
//! | [`ProfileNPoint`] | n >= 2 | n |
//!
//! All variants share the [`ProfileVariant`] contract, and so does the
//! [`Profile`] enum, which forwards every call to the variant it holds.

pub mod cache;
pub mod constant;
pub mod empty;
pub mod interp;
pub mod npoint;
pub mod point_index;
pub mod profile_type;
pub mod surface;
pub mod thin;
pub mod variant;

pub use cache::InvalidateCache;
pub use constant::ProfileConstant;
pub use empty::{ProfileEmpty, ProfileSurfaceEmpty};
pub use interp::InterpolatorType;
pub use npoint::ProfileNPoint;
pub use point_index::{POINT_INDEX_UNSET, PointIndexOverlay};
pub use profile_type::{Field, ProfileType};
pub use surface::ProfileSurface;
pub use thin::ProfileThin;
pub use variant::{NAN_GRADIENT, ProfileVariant};

use std::io::{BufRead, Read, Write};

use crate::codec::{AsciiReader, AsciiWriter, BinaryReader, BinaryWriter};
use crate::data::{AttributeSchema, Data};
use crate::debug_invariants::DebugInvariants;
use crate::gradient::GradientCache;
use crate::profile_error::ProfileError;
use variant::sealed::ProfileStorage;

/// One profile of the closed variant set.
#[derive(Clone, Debug)]
pub enum Profile {
    /// No radii, no data.
    Empty(ProfileEmpty),
    /// Surface layer that is always absent.
    SurfaceEmpty(ProfileSurfaceEmpty),
    /// Surface value without a radius axis.
    Surface(ProfileSurface),
    /// Zero-thickness layer.
    Thin(ProfileThin),
    /// Radius-independent layer.
    Constant(ProfileConstant),
    /// General multi-node layer.
    NPoint(ProfileNPoint),
}

/// Run `$body` against the variant inside a [`Profile`], bound to `$p`.
macro_rules! dispatch {
    ($profile:expr, $p:ident => $body:expr) => {
        match $profile {
            Profile::Empty($p) => $body,
            Profile::SurfaceEmpty($p) => $body,
            Profile::Surface($p) => $body,
            Profile::Thin($p) => $body,
            Profile::Constant($p) => $body,
            Profile::NPoint($p) => $body,
        }
    };
}

impl Profile {
    /// Empty profile.
    pub fn empty() -> Self {
        Profile::Empty(ProfileEmpty::new())
    }

    /// Always-absent surface profile.
    pub fn surface_empty() -> Self {
        Profile::SurfaceEmpty(ProfileSurfaceEmpty::new())
    }

    /// Surface profile owning `data`.
    pub fn surface(data: Data) -> Self {
        Profile::Surface(ProfileSurface::new(data))
    }

    /// Thin profile at `radius`.
    pub fn thin(radius: f32, data: Data) -> Result<Self, ProfileError> {
        ProfileThin::new(radius, data).map(Profile::Thin)
    }

    /// Constant profile spanning `[radius_bottom, radius_top]`.
    pub fn constant(radius_bottom: f32, radius_top: f32, data: Data) -> Result<Self, ProfileError> {
        ProfileConstant::new(radius_bottom, radius_top, data).map(Profile::Constant)
    }

    /// General profile with one Data value per radius.
    pub fn npoint(radii: Vec<f32>, data: Vec<Data>) -> Result<Self, ProfileError> {
        ProfileNPoint::new(radii, data).map(Profile::NPoint)
    }

    /// Pick the variant that matches the shape of `radii` and `data`.
    ///
    /// | radii | data | variant |
    /// |---|---|---|
    /// | 0 | 0 | Empty |
    /// | 0 | 1 | Surface |
    /// | 1 | 1 | Thin |
    /// | 2 | 1 | Constant |
    /// | n >= 2 | n | NPoint |
    ///
    /// # Errors
    /// [`ProfileError::UnsupportedShape`] for any other shape, or the
    /// variant's own validation error.
    pub fn from_parts(radii: Vec<f32>, data: Vec<Data>) -> Result<Self, ProfileError> {
        let profile_type = match (radii.len(), data.len()) {
            (0, 0) => ProfileType::Empty,
            (0, 1) => ProfileType::Surface,
            (1, 1) => ProfileType::Thin,
            (2, 1) => ProfileType::Constant,
            (n, m) if n >= 2 && n == m => ProfileType::NPoint,
            (n_radii, n_data) => return Err(ProfileError::UnsupportedShape { n_radii, n_data }),
        };
        Self::with_type(profile_type, radii, data)
    }

    /// Build the variant `profile_type` from its radii and Data values.
    ///
    /// # Errors
    /// [`ProfileError::UnsupportedShape`] when the counts do not fit the
    /// variant, or the variant's own validation error.
    pub fn with_type(
        profile_type: ProfileType,
        radii: Vec<f32>,
        data: Vec<Data>,
    ) -> Result<Self, ProfileError> {
        let (n_radii, n_data) = (radii.len(), data.len());
        let shape_error = || ProfileError::UnsupportedShape { n_radii, n_data };
        let profile = match profile_type {
            ProfileType::Empty | ProfileType::SurfaceEmpty => {
                if (n_radii, n_data) != (0, 0) {
                    return Err(shape_error());
                }
                if profile_type == ProfileType::Empty {
                    Profile::empty()
                } else {
                    Profile::surface_empty()
                }
            }
            ProfileType::Surface => {
                if n_radii != 0 {
                    return Err(shape_error());
                }
                let [d] = single(0, data)?;
                Profile::surface(d)
            }
            ProfileType::Thin => match (radii.as_slice(), n_data) {
                (&[r], 1) => {
                    let [d] = single(1, data)?;
                    Profile::thin(r, d)?
                }
                _ => return Err(shape_error()),
            },
            ProfileType::Constant => match (radii.as_slice(), n_data) {
                (&[bottom, top], 1) => {
                    let [d] = single(2, data)?;
                    Profile::constant(bottom, top, d)?
                }
                _ => return Err(shape_error()),
            },
            ProfileType::NPoint => Profile::npoint(radii, data)?,
        };
        Ok(profile)
    }

    /// Drop every cached gradient vector (no-op for variants without a cache).
    pub fn clear_gradients(&mut self) {
        match self {
            Profile::Thin(p) => p.clear_gradients(),
            Profile::Constant(p) => p.clear_gradients(),
            Profile::NPoint(p) => p.clear_gradients(),
            Profile::Empty(_) | Profile::SurfaceEmpty(_) | Profile::Surface(_) => {}
        }
    }

    /// Deep, independent clone: radii, Data values, point indices, layer
    /// normal and gradient cache are all copied.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Encode as one binary record (`tag` byte followed by the payload).
    pub fn write_binary<W: Write>(&self, writer: W) -> Result<(), ProfileError> {
        BinaryWriter::new(writer).write_profile(self)
    }

    /// Encode as one ascii line.
    pub fn write_ascii<W: Write>(&self, writer: W) -> Result<(), ProfileError> {
        AsciiWriter::new(writer).write_profile(self)
    }

    /// Decode one binary record using `schema` to size the Data payload.
    pub fn read_binary<R, S>(reader: R, schema: &S) -> Result<Self, ProfileError>
    where
        R: Read,
        S: AttributeSchema + ?Sized,
    {
        BinaryReader::new(reader).read_profile(schema)
    }

    /// Decode one ascii line using `schema` to size the Data payload.
    pub fn read_ascii<R, S>(reader: R, schema: &S) -> Result<Self, ProfileError>
    where
        R: BufRead,
        S: AttributeSchema + ?Sized,
    {
        AsciiReader::new(reader).read_profile(schema)
    }
}

fn single(n_radii: usize, data: Vec<Data>) -> Result<[Data; 1], ProfileError> {
    <[Data; 1]>::try_from(data).map_err(|d| ProfileError::UnsupportedShape {
        n_radii,
        n_data: d.len(),
    })
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Profile::Empty(_), Profile::Empty(_)) => true,
            (Profile::SurfaceEmpty(_), Profile::SurfaceEmpty(_)) => true,
            (Profile::Surface(a), Profile::Surface(b)) => a == b,
            (Profile::Thin(a), Profile::Thin(b)) => a == b,
            (Profile::Constant(a), Profile::Constant(b)) => a == b,
            (Profile::NPoint(a), Profile::NPoint(b)) => a == b,
            _ => false,
        }
    }
}

impl InvalidateCache for Profile {
    fn invalidate_cache(&mut self) {
        dispatch!(self, p => p.invalidate_cache())
    }
}

impl ProfileStorage for Profile {
    fn radii_mut(&mut self) -> &mut [f32] {
        dispatch!(self, p => p.radii_mut())
    }
    fn data_mut(&mut self) -> &mut [Data] {
        dispatch!(self, p => p.data_mut())
    }
    fn point_indices_mut(&mut self) -> &mut PointIndexOverlay {
        dispatch!(self, p => p.point_indices_mut())
    }
}

impl ProfileVariant for Profile {
    fn profile_type(&self) -> ProfileType {
        dispatch!(self, p => p.profile_type())
    }
    fn radii(&self) -> &[f32] {
        dispatch!(self, p => p.radii())
    }
    fn data(&self) -> &[Data] {
        dispatch!(self, p => p.data())
    }
    fn point_indices(&self) -> &PointIndexOverlay {
        dispatch!(self, p => p.point_indices())
    }
    fn layer_normal(&self) -> Option<[f64; 3]> {
        dispatch!(self, p => p.layer_normal())
    }
    fn set_layer_normal(&mut self, normal: Option<[f64; 3]>) {
        dispatch!(self, p => p.set_layer_normal(normal))
    }
    fn gradient_cache(&self) -> Option<&GradientCache> {
        dispatch!(self, p => p.gradient_cache())
    }
    fn data_node(&self, node: usize) -> Option<usize> {
        dispatch!(self, p => p.data_node(node))
    }
    fn find_closest_radius_index(&self, radius: f64) -> i32 {
        dispatch!(self, p => p.find_closest_radius_index(radius))
    }
    fn value_at_radius(
        &self,
        interp: InterpolatorType,
        attribute: usize,
        radius: f64,
        allow_out_of_range: bool,
    ) -> Result<f64, ProfileError> {
        dispatch!(self, p => p.value_at_radius(interp, attribute, radius, allow_out_of_range))
    }
    fn interpolation_coefficients(
        &self,
        interp: InterpolatorType,
        radius: f64,
        allow_out_of_range: bool,
    ) -> Result<Vec<(usize, f64)>, ProfileError> {
        dispatch!(self, p => p.interpolation_coefficients(interp, radius, allow_out_of_range))
    }
    fn gradient_at_radius(
        &self,
        attribute: usize,
        reciprocal: bool,
        radius: f64,
    ) -> Result<[f64; 3], ProfileError> {
        dispatch!(self, p => p.gradient_at_radius(attribute, reciprocal, radius))
    }
}

impl DebugInvariants for Profile {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "Profile invalid");
    }

    fn validate_invariants(&self) -> Result<(), ProfileError> {
        dispatch!(self, p => p.validate_invariants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: f64) -> Data {
        Data::from(vec![v, v * 2.0])
    }

    #[test]
    fn from_parts_picks_variant_by_shape() {
        let cases = [
            (vec![], vec![], ProfileType::Empty),
            (vec![], vec![d(1.0)], ProfileType::Surface),
            (vec![10.0], vec![d(1.0)], ProfileType::Thin),
            (vec![10.0, 20.0], vec![d(1.0)], ProfileType::Constant),
            (vec![10.0, 20.0], vec![d(1.0), d(2.0)], ProfileType::NPoint),
            (
                vec![10.0, 20.0, 30.0],
                vec![d(1.0), d(2.0), d(3.0)],
                ProfileType::NPoint,
            ),
        ];
        for (radii, data, expected) in cases {
            let p = Profile::from_parts(radii, data).unwrap();
            assert_eq!(p.profile_type(), expected);
            p.validate_invariants().unwrap();
        }
    }

    #[test]
    fn from_parts_rejects_unknown_shapes() {
        assert!(matches!(
            Profile::from_parts(vec![1.0], vec![]),
            Err(ProfileError::UnsupportedShape { n_radii: 1, n_data: 0 })
        ));
        assert!(matches!(
            Profile::from_parts(vec![1.0, 2.0, 3.0], vec![d(1.0), d(2.0)]),
            Err(ProfileError::UnsupportedShape { .. })
        ));
        assert!(matches!(
            Profile::from_parts(vec![], vec![d(1.0), d(2.0)]),
            Err(ProfileError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn with_type_checks_counts() {
        assert!(Profile::with_type(ProfileType::SurfaceEmpty, vec![], vec![]).is_ok());
        assert!(Profile::with_type(ProfileType::SurfaceEmpty, vec![], vec![d(1.0)]).is_err());
        assert!(Profile::with_type(ProfileType::Thin, vec![1.0, 2.0], vec![d(1.0)]).is_err());
        assert!(Profile::with_type(ProfileType::Constant, vec![1.0], vec![d(1.0)]).is_err());
    }

    #[test]
    fn equality_requires_same_variant() {
        assert_eq!(Profile::empty(), Profile::empty());
        assert_ne!(Profile::empty(), Profile::surface_empty());
        let thin = Profile::thin(10.0, d(1.0)).unwrap();
        let constant = Profile::constant(10.0, 10.0, d(1.0)).unwrap();
        assert_ne!(thin, constant);
        assert_eq!(thin, Profile::thin(10.0, d(1.0)).unwrap());
        assert_ne!(thin, Profile::thin(10.5, d(1.0)).unwrap());
    }

    #[test]
    fn equality_ignores_point_indices_and_copy_keeps_them() {
        let mut a = Profile::npoint(vec![1.0, 2.0], vec![d(1.0), d(2.0)]).unwrap();
        a.set_point_index(1, 42).unwrap();
        a.set_layer_normal(Some([0.0, 0.0, 1.0]));
        let b = a.copy();
        assert_eq!(b.point_index(1).unwrap(), 42);
        assert_eq!(b.layer_normal(), Some([0.0, 0.0, 1.0]));
        let mut c = b.copy();
        c.reset_point_indices();
        assert_eq!(a, c);
    }

    #[test]
    fn copy_is_independent() {
        let a = Profile::npoint(vec![1.0, 2.0], vec![d(1.0), d(2.0)]).unwrap();
        let mut b = a.copy();
        b.set_radius(1, 3.0).unwrap();
        b.set_data(0, d(9.0)).unwrap();
        assert_eq!(a.radius(1), 2.0);
        assert_eq!(a.value(0, 0), 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn dispatch_uses_variant_overrides() {
        let thin = Profile::thin(100.0, d(1.0)).unwrap();
        assert_eq!(thin.find_closest_radius_index(-5.0), 0);
        let constant = Profile::constant(1.0, 2.0, d(3.0)).unwrap();
        assert_eq!(constant.value(0, 1), 3.0);
        let np = Profile::npoint(vec![1.0, 3.0], vec![d(0.0), d(2.0)]).unwrap();
        let v = np
            .value_at_radius(InterpolatorType::Linear, 0, 2.0, false)
            .unwrap();
        assert_eq!(v, 1.0);
    }

    #[test]
    fn constant_ordering_is_non_strict() {
        let mut p = Profile::constant(1.0, 2.0, d(3.0)).unwrap();
        p.set_radius(0, 2.0).unwrap();
        assert!(p.set_radius(0, 2.5).is_err());
        assert_eq!(p.radius_bottom(), 2.0);
    }
}
