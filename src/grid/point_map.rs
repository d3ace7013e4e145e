//! PointMap: global point index → (vertex, layer, node).
//!
//! Every Data-bearing node of every profile in a grid receives a consecutive
//! global point index. The map stores the reverse direction so a flattened
//! attribute table can be traced back to the profile node it came from.

use std::collections::HashSet;

use crate::debug_invariants::DebugInvariants;
use crate::profile_error::ProfileError;

/// Location of one profile node inside a grid.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct NodeLocation {
    /// Grid vertex.
    pub vertex: usize,
    /// Layer index.
    pub layer: usize,
    /// Local node index within the profile.
    pub node: usize,
}

/// Reverse lookup from global point index to node location.
///
/// # Invariants
/// - Every location appears at most once.
/// - Locations are strictly increasing in (vertex, layer, node) order, which is
///   the order point indices are assigned in.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PointMap {
    locations: Vec<NodeLocation>,
}

impl PointMap {
    /// Number of assigned points.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no point has been assigned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location of global point `point`.
    #[inline]
    pub fn get(&self, point: usize) -> Option<NodeLocation> {
        self.locations.get(point).copied()
    }

    /// Iterate `(point, location)` in point order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeLocation)> + '_ {
        self.locations.iter().copied().enumerate()
    }

    /// Append `location` and return its new point index.
    pub(crate) fn push(&mut self, location: NodeLocation) -> usize {
        self.locations.push(location);
        self.locations.len() - 1
    }

    pub(crate) fn clear(&mut self) {
        self.locations.clear();
    }
}

impl DebugInvariants for PointMap {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "PointMap invalid");
    }

    fn validate_invariants(&self) -> Result<(), ProfileError> {
        let mut seen = HashSet::with_capacity(self.locations.len());
        for (point, loc) in self.iter() {
            if !seen.insert(loc) {
                return Err(crate::invariant_error!(
                    "point {point} repeats location {loc:?}"
                ));
            }
        }
        if let Some(point) = self
            .locations
            .windows(2)
            .position(|w| w[0] >= w[1])
        {
            return Err(crate::invariant_error!(
                "point {} is out of (vertex, layer, node) order",
                point + 1
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(vertex: usize, layer: usize, node: usize) -> NodeLocation {
        NodeLocation {
            vertex,
            layer,
            node,
        }
    }

    #[test]
    fn push_assigns_consecutive_points() {
        let mut map = PointMap::default();
        assert_eq!(map.push(loc(0, 0, 0)), 0);
        assert_eq!(map.push(loc(0, 1, 0)), 1);
        assert_eq!(map.push(loc(1, 0, 2)), 2);
        assert_eq!(map.get(2), Some(loc(1, 0, 2)));
        assert_eq!(map.get(3), None);
        map.validate_invariants().unwrap();
    }

    #[test]
    fn out_of_order_is_invalid() {
        let mut map = PointMap::default();
        map.push(loc(1, 0, 0));
        map.push(loc(0, 0, 0));
        assert!(matches!(
            map.validate_invariants(),
            Err(ProfileError::InvariantViolation(_))
        ));
    }

    #[test]
    fn duplicates_are_invalid() {
        let mut map = PointMap::default();
        map.push(loc(0, 0, 0));
        map.push(loc(0, 0, 0));
        assert!(map.validate_invariants().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let mut map = PointMap::default();
        map.push(loc(0, 2, 1));
        let json = serde_json::to_string(&map).unwrap();
        let back: PointMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
