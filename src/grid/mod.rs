//! ProfileGrid: the vertex × layer table of profiles owned by a model.
//!
//! Profiles are stored vertex-major (all layers of vertex 0, then vertex 1,
//! ...). The grid assigns global point indices to profile nodes, reads and
//! writes whole blocks of profile records, and drives gradient computation
//! over every profile.

pub mod point_map;

pub use point_map::{NodeLocation, PointMap};

use std::io::{BufRead, Read, Write};

use crate::codec::{AsciiReader, AsciiWriter, BinaryReader, BinaryWriter, MAX_PREALLOC};
use crate::data::{AttributeSchema, ModelMetadata};
use crate::debug_invariants::DebugInvariants;
use crate::gradient::{CalculatorPool, GradientCalculator, GradientLocation};
use crate::profile::{Profile, ProfileVariant};
use crate::profile_error::ProfileError;

/// Table of profiles indexed by (vertex, layer).
///
/// # Invariants
/// - `profiles.len() == n_vertices * n_layers`.
/// - Every profile satisfies its own invariants.
/// - When the point map is non-empty, it lists every Data-bearing node
///   exactly once and each node's point index points back at its entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileGrid {
    n_vertices: usize,
    n_layers: usize,
    profiles: Vec<Profile>,
    point_map: PointMap,
}

impl ProfileGrid {
    /// Grid of `n_vertices × n_layers` empty profiles.
    pub fn new(n_vertices: usize, n_layers: usize) -> Self {
        Self {
            n_vertices,
            n_layers,
            profiles: vec![Profile::empty(); n_vertices * n_layers],
            point_map: PointMap::default(),
        }
    }

    /// Empty grid with one layer per layer name of `metadata`.
    pub fn for_metadata(metadata: &ModelMetadata, n_vertices: usize) -> Self {
        Self::new(n_vertices, metadata.n_layers())
    }

    /// Grid over `profiles` given in vertex-major order.
    ///
    /// # Errors
    /// [`ProfileError::InvalidMetadata`] if the profile count is not
    /// `n_vertices * n_layers`.
    pub fn from_profiles(
        n_vertices: usize,
        n_layers: usize,
        profiles: Vec<Profile>,
    ) -> Result<Self, ProfileError> {
        let expected = n_vertices.checked_mul(n_layers).ok_or_else(|| {
            ProfileError::InvalidMetadata(format!("{n_vertices} x {n_layers} grid is too large"))
        })?;
        if profiles.len() != expected {
            return Err(ProfileError::InvalidMetadata(format!(
                "{} profiles for a {n_vertices} x {n_layers} grid",
                profiles.len()
            )));
        }
        let grid = Self {
            n_vertices,
            n_layers,
            profiles,
            point_map: PointMap::default(),
        };
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        grid.debug_assert_invariants();
        Ok(grid)
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    /// Number of layers.
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    fn offset(&self, vertex: usize, layer: usize) -> Result<usize, ProfileError> {
        if vertex >= self.n_vertices || layer >= self.n_layers {
            return Err(ProfileError::GridIndexOutOfBounds {
                vertex,
                layer,
                n_vertices: self.n_vertices,
                n_layers: self.n_layers,
            });
        }
        Ok(vertex * self.n_layers + layer)
    }

    /// Profile at (`vertex`, `layer`).
    pub fn get(&self, vertex: usize, layer: usize) -> Result<&Profile, ProfileError> {
        let i = self.offset(vertex, layer)?;
        Ok(&self.profiles[i])
    }

    /// Mutable profile at (`vertex`, `layer`).
    ///
    /// Edits that change node counts leave the point map stale until the next
    /// [`rebuild_point_map`](Self::rebuild_point_map).
    pub fn get_mut(&mut self, vertex: usize, layer: usize) -> Result<&mut Profile, ProfileError> {
        let i = self.offset(vertex, layer)?;
        Ok(&mut self.profiles[i])
    }

    /// Replace the profile at (`vertex`, `layer`) and return the old one.
    ///
    /// The incoming profile's point indices are reset and the point map is
    /// cleared; call [`rebuild_point_map`](Self::rebuild_point_map) afterwards.
    pub fn set(
        &mut self,
        vertex: usize,
        layer: usize,
        mut profile: Profile,
    ) -> Result<Profile, ProfileError> {
        let i = self.offset(vertex, layer)?;
        profile.reset_point_indices();
        self.point_map.clear();
        Ok(std::mem::replace(&mut self.profiles[i], profile))
    }

    /// All layers of `vertex`, bottom layer first.
    pub fn vertex_profiles(&self, vertex: usize) -> Result<&[Profile], ProfileError> {
        let start = self.offset(vertex, 0)?;
        Ok(&self.profiles[start..start + self.n_layers])
    }

    /// Iterate `((vertex, layer), profile)` in vertex-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Profile)> + '_ {
        let n_layers = self.n_layers;
        self.profiles
            .iter()
            .enumerate()
            .map(move |(i, p)| ((i / n_layers, i % n_layers), p))
    }

    /// Current point map (empty until [`rebuild_point_map`](Self::rebuild_point_map)).
    pub fn point_map(&self) -> &PointMap {
        &self.point_map
    }

    /// Reset every point index, then number every Data-bearing node
    /// consecutively in (vertex, layer, node) order. Returns the point count.
    ///
    /// # Errors
    /// [`ProfileError::InvariantViolation`] if the point count exceeds `i32`.
    pub fn rebuild_point_map(&mut self) -> Result<usize, ProfileError> {
        self.point_map.clear();
        for profile in &mut self.profiles {
            profile.reset_point_indices();
        }
        let n_layers = self.n_layers;
        for (i, profile) in self.profiles.iter_mut().enumerate() {
            let (vertex, layer) = (i / n_layers, i % n_layers);
            for node in 0..profile.point_indices().len() {
                let point = self.point_map.push(NodeLocation {
                    vertex,
                    layer,
                    node,
                });
                let point = i32::try_from(point)
                    .map_err(|_| crate::invariant_error!("point index {point} exceeds i32"))?;
                profile.set_point_index(node, point)?;
            }
        }
        log::debug!(
            "rebuilt point map: {} point(s) over {} x {} profiles",
            self.point_map.len(),
            self.n_vertices,
            self.n_layers
        );
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(self.point_map.len())
    }

    /// Value of `attribute` at global point `point` (NaN for an unknown point).
    pub fn value_at_point(&self, point: usize, attribute: usize) -> f64 {
        self.point_map
            .get(point)
            .and_then(|loc| {
                self.get(loc.vertex, loc.layer)
                    .ok()
                    .map(|p| p.value(attribute, loc.node))
            })
            .unwrap_or(f64::NAN)
    }

    /// Compute the gradient of `attribute` at every node of every profile.
    ///
    /// With the `rayon` feature vertices are processed in parallel; each
    /// profile still computes under its own lock, and the first error aborts
    /// the sweep.
    pub fn compute_gradients<C: GradientCalculator>(
        &self,
        pool: &CalculatorPool<C>,
        attribute: usize,
        reciprocal: bool,
    ) -> Result<(), ProfileError> {
        if self.n_layers == 0 {
            return Ok(());
        }
        let compute_vertex = |(vertex, row): (usize, &[Profile])| -> Result<(), ProfileError> {
            for (layer, profile) in row.iter().enumerate() {
                profile.compute_gradients(
                    pool,
                    GradientLocation::new(vertex, layer),
                    attribute,
                    reciprocal,
                )?;
            }
            Ok(())
        };
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.profiles
                .par_chunks(self.n_layers)
                .enumerate()
                .try_for_each(compute_vertex)?;
        }
        #[cfg(not(feature = "rayon"))]
        self.profiles
            .chunks(self.n_layers)
            .enumerate()
            .try_for_each(compute_vertex)?;
        log::debug!(
            "gradients ready for attribute {attribute} (reciprocal = {reciprocal}); pool created {} calculator(s)",
            pool.created()
        );
        Ok(())
    }

    /// Drop every cached gradient.
    pub fn clear_gradients(&mut self) {
        for profile in &mut self.profiles {
            profile.clear_gradients();
        }
    }

    /// Check every Data value against `schema` before anything is written.
    fn check_schema<S: AttributeSchema + ?Sized>(&self, schema: &S) -> Result<(), ProfileError> {
        self.profiles
            .iter()
            .flat_map(|p| p.data())
            .try_for_each(|d| schema.check_data(d))
    }

    /// Write every profile as a binary record, vertex-major.
    ///
    /// # Errors
    /// A schema mismatch is reported before any byte is written.
    pub fn write_binary<W, S>(&self, writer: W, schema: &S) -> Result<(), ProfileError>
    where
        W: Write,
        S: AttributeSchema + ?Sized,
    {
        self.check_schema(schema)?;
        let mut w = BinaryWriter::new(writer);
        w.write_all(&self.profiles)?;
        w.into_inner()?;
        Ok(())
    }

    /// Write every profile as an ascii line, vertex-major.
    pub fn write_ascii<W, S>(&self, writer: W, schema: &S) -> Result<(), ProfileError>
    where
        W: Write,
        S: AttributeSchema + ?Sized,
    {
        self.check_schema(schema)?;
        let mut w = AsciiWriter::new(writer);
        w.write_all(&self.profiles)?;
        w.into_inner()?;
        Ok(())
    }

    /// Read `n_vertices * n_layers` binary records and number their points.
    ///
    /// All-or-nothing: any decode error is returned and no grid is built.
    pub fn read_binary<R, S>(
        reader: R,
        n_vertices: usize,
        n_layers: usize,
        schema: &S,
    ) -> Result<Self, ProfileError>
    where
        R: Read,
        S: AttributeSchema + ?Sized,
    {
        let mut r = BinaryReader::new(reader);
        Self::read_block(n_vertices, n_layers, |_| r.read_profile(schema))
    }

    /// Read `n_vertices * n_layers` ascii lines and number their points.
    pub fn read_ascii<R, S>(
        reader: R,
        n_vertices: usize,
        n_layers: usize,
        schema: &S,
    ) -> Result<Self, ProfileError>
    where
        R: BufRead,
        S: AttributeSchema + ?Sized,
    {
        let mut r = AsciiReader::new(reader);
        Self::read_block(n_vertices, n_layers, |_| r.read_profile(schema))
    }

    fn read_block<F>(n_vertices: usize, n_layers: usize, mut next: F) -> Result<Self, ProfileError>
    where
        F: FnMut(usize) -> Result<Profile, ProfileError>,
    {
        let total = n_vertices.checked_mul(n_layers).ok_or_else(|| {
            ProfileError::InvalidMetadata(format!("{n_vertices} x {n_layers} grid is too large"))
        })?;
        let mut profiles = Vec::with_capacity(total.min(MAX_PREALLOC));
        for i in 0..total {
            let profile = next(i).inspect_err(|e| {
                log::warn!(
                    "profile block read failed at vertex {} layer {}: {e}",
                    i / n_layers,
                    i % n_layers
                );
            })?;
            profiles.push(profile);
        }
        let mut grid = Self::from_profiles(n_vertices, n_layers, profiles)?;
        grid.rebuild_point_map()?;
        Ok(grid)
    }
}

impl DebugInvariants for ProfileGrid {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ProfileGrid invalid");
    }

    fn validate_invariants(&self) -> Result<(), ProfileError> {
        if self.profiles.len() != self.n_vertices * self.n_layers {
            return Err(crate::invariant_error!(
                "{} profiles in a {} x {} grid",
                self.profiles.len(),
                self.n_vertices,
                self.n_layers
            ));
        }
        for ((vertex, layer), profile) in self.iter() {
            profile.validate_invariants().map_err(|e| {
                crate::invariant_error!("profile at vertex {vertex} layer {layer}: {e}")
            })?;
        }
        if self.point_map.is_empty() {
            return Ok(());
        }
        self.point_map.validate_invariants()?;
        let n_nodes: usize = self.profiles.iter().map(|p| p.point_indices().len()).sum();
        if n_nodes != self.point_map.len() {
            return Err(crate::invariant_error!(
                "point map lists {} point(s) but the grid has {n_nodes} data node(s)",
                self.point_map.len()
            ));
        }
        for (point, loc) in self.point_map.iter() {
            let profile = self.get(loc.vertex, loc.layer)?;
            let stored = profile.point_index(loc.node)?;
            if usize::try_from(stored).ok() != Some(point) {
                return Err(crate::invariant_error!(
                    "point {point} maps to {loc:?} whose point index is {stored}"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Data, DataType, SimpleSchema};
    use crate::profile::POINT_INDEX_UNSET;

    fn d(v: f64) -> Data {
        Data::from(vec![v])
    }

    fn grid() -> ProfileGrid {
        ProfileGrid::from_profiles(
            2,
            2,
            vec![
                Profile::npoint(vec![1.0, 2.0, 3.0], vec![d(1.0), d(2.0), d(3.0)]).unwrap(),
                Profile::surface(d(4.0)),
                Profile::empty(),
                Profile::constant(1.0, 2.0, d(5.0)).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rebuild_numbers_nodes_in_order() {
        let mut g = grid();
        assert_eq!(g.rebuild_point_map().unwrap(), 5);
        let map = g.point_map();
        assert_eq!(
            map.get(3),
            Some(NodeLocation {
                vertex: 0,
                layer: 1,
                node: 0
            })
        );
        assert_eq!(map.get(4).map(|l| (l.vertex, l.layer)), Some((1, 1)));
        assert_eq!(g.get(0, 0).unwrap().point_index(2).unwrap(), 2);
        assert_eq!(g.value_at_point(4, 0), 5.0);
        assert!(g.value_at_point(5, 0).is_nan());
        g.validate_invariants().unwrap();
    }

    #[test]
    fn set_clears_point_map() {
        let mut g = grid();
        g.rebuild_point_map().unwrap();
        let mut incoming = Profile::thin(3.0, d(9.0)).unwrap();
        incoming.set_point_index(0, 77).unwrap();
        let old = g.set(1, 0, incoming).unwrap();
        assert_eq!(old, Profile::empty());
        assert!(g.point_map().is_empty());
        assert_eq!(g.get(1, 0).unwrap().point_index(0).unwrap(), POINT_INDEX_UNSET);
        assert_eq!(g.rebuild_point_map().unwrap(), 6);
    }

    #[test]
    fn out_of_range_lookup() {
        let g = grid();
        assert!(g.get(2, 0).unwrap_err().is_bounds_error());
        assert!(g.get(0, 2).unwrap_err().is_bounds_error());
        assert_eq!(g.vertex_profiles(1).unwrap().len(), 2);
    }

    #[test]
    fn wrong_profile_count_is_rejected() {
        assert!(ProfileGrid::from_profiles(2, 2, vec![Profile::empty()]).is_err());
    }

    #[test]
    fn block_round_trip_in_both_formats() {
        let g = grid();
        let schema = SimpleSchema::new(DataType::Double, 1);

        let mut bin = Vec::new();
        g.write_binary(&mut bin, &schema).unwrap();
        let back = ProfileGrid::read_binary(bin.as_slice(), 2, 2, &schema).unwrap();
        assert_eq!(back.point_map().len(), 5);
        for ((v, l), p) in g.iter() {
            assert_eq!(back.get(v, l).unwrap(), p);
        }

        let mut text = Vec::new();
        g.write_ascii(&mut text, &schema).unwrap();
        let back = ProfileGrid::read_ascii(text.as_slice(), 2, 2, &schema).unwrap();
        assert_eq!(back.get(1, 1).unwrap(), g.get(1, 1).unwrap());
    }

    #[test]
    fn short_block_is_an_error() {
        let g = grid();
        let schema = SimpleSchema::new(DataType::Double, 1);
        let mut bin = Vec::new();
        g.write_binary(&mut bin, &schema).unwrap();
        let err = ProfileGrid::read_binary(bin.as_slice(), 3, 2, &schema).unwrap_err();
        assert!(matches!(err, ProfileError::Truncated { .. }));
    }

    #[test]
    fn schema_mismatch_writes_nothing() {
        let g = grid();
        let schema = SimpleSchema::new(DataType::Float, 1);
        let mut bin = Vec::new();
        assert!(g.write_binary(&mut bin, &schema).is_err());
        assert!(bin.is_empty());
    }
}
