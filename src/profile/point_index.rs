//! Point-index overlay: local node → global point index.
//!
//! The owning grid assigns each Data-bearing node an offset into its flattened
//! attribute table. Indices start unset ([`POINT_INDEX_UNSET`]) and must be
//! reset whenever the grid rebuilds its point layout.

use crate::profile::ProfileType;
use crate::profile_error::ProfileError;

/// Sentinel for "no global point assigned".
pub const POINT_INDEX_UNSET: i32 = -1;

/// Per-node global point indices of one profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointIndexOverlay {
    slots: Vec<i32>,
}

impl PointIndexOverlay {
    /// Overlay with `n_nodes` unset slots.
    pub fn new(n_nodes: usize) -> Self {
        Self {
            slots: vec![POINT_INDEX_UNSET; n_nodes],
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the overlay tracks no node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Global point index of `node`.
    pub fn get(&self, profile: ProfileType, node: usize) -> Result<i32, ProfileError> {
        self.slots
            .get(node)
            .copied()
            .ok_or(ProfileError::NodeIndexOutOfBounds {
                profile,
                node,
                len: self.slots.len(),
            })
    }

    /// Assign a global point index to `node`. `point` must be `>= -1`.
    pub fn set(
        &mut self,
        profile: ProfileType,
        node: usize,
        point: i32,
    ) -> Result<(), ProfileError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(node)
            .ok_or(ProfileError::NodeIndexOutOfBounds { profile, node, len })?;
        if point < POINT_INDEX_UNSET {
            return Err(ProfileError::InvalidProfile {
                profile,
                reason: format!("point index {point} is below the unset sentinel"),
            });
        }
        *slot = point;
        Ok(())
    }

    /// Clear every slot back to [`POINT_INDEX_UNSET`].
    pub fn reset(&mut self) {
        self.slots.fill(POINT_INDEX_UNSET);
    }

    /// Read-only view of all slots.
    pub fn as_slice(&self) -> &[i32] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset_and_resets() {
        let mut o = PointIndexOverlay::new(3);
        assert!(o.as_slice().iter().all(|&p| p == POINT_INDEX_UNSET));
        o.set(ProfileType::NPoint, 2, 17).unwrap();
        assert_eq!(o.get(ProfileType::NPoint, 2).unwrap(), 17);
        o.reset();
        assert_eq!(o.get(ProfileType::NPoint, 2).unwrap(), POINT_INDEX_UNSET);
    }

    #[test]
    fn out_of_range_node_is_bounds_error() {
        let mut o = PointIndexOverlay::new(1);
        let err = o.set(ProfileType::Thin, 1, 4).unwrap_err();
        assert!(err.is_bounds_error());
        assert!(PointIndexOverlay::new(0).get(ProfileType::Empty, 0).is_err());
    }

    #[test]
    fn rejects_negative_points_below_sentinel() {
        let mut o = PointIndexOverlay::new(1);
        assert!(o.set(ProfileType::Thin, 0, -2).is_err());
        assert!(o.set(ProfileType::Thin, 0, -1).is_ok());
    }
}
