//! Per-profile, per-attribute gradient cache.
//!
//! Each node of a gradient-bearing profile owns one [`GradientSlot`] per
//! attribute. Slots move `Unset → Ready` on first computation and are only
//! recomputed when the requested reciprocal flag differs from the cached one.
//! Cached vectors are never refreshed when the grid geometry changes; callers
//! needing fresh values clear the cache first.
//!
//! All slots of one profile sit behind a single `parking_lot::Mutex` that is
//! held for the whole computation, so at most one computation per profile runs
//! at a time and readers never observe a half-written vector. A failed
//! computation leaves every slot of the attribute in its prior state.

pub mod calculator;

pub use calculator::{
    CalculatorPool, GradientCalculator, GradientLocation, GradientRequest, PooledCalculator,
};

use crate::profile_error::ProfileError;
use parking_lot::Mutex;

/// State of one (node, attribute) gradient slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GradientSlot {
    /// Never computed.
    #[default]
    Unset,
    /// Computed for the given reciprocal flag.
    Ready {
        /// Whether `vector` is the gradient of `1/attribute`.
        reciprocal: bool,
        /// Gradient 3-vector.
        vector: [f64; 3],
    },
}

impl GradientSlot {
    /// Cached vector if the slot is ready for `reciprocal`.
    #[inline]
    pub fn vector_for(&self, reciprocal: bool) -> Option<[f64; 3]> {
        match *self {
            GradientSlot::Ready {
                reciprocal: r,
                vector,
            } if r == reciprocal => Some(vector),
            _ => None,
        }
    }
}

/// Lazily populated gradient slots for the nodes of one profile.
#[derive(Debug)]
pub struct GradientCache {
    n_nodes: usize,
    /// `slots[node][attribute]`; inner rows are allocated on first computation.
    slots: Mutex<Vec<Vec<GradientSlot>>>,
}

impl GradientCache {
    /// Empty cache for `n_nodes` nodes.
    pub fn new(n_nodes: usize) -> Self {
        Self {
            n_nodes,
            slots: Mutex::new(vec![Vec::new(); n_nodes]),
        }
    }

    /// Number of nodes covered.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Snapshot of one slot (`Unset` when never allocated).
    pub fn slot(&self, node: usize, attribute: usize) -> GradientSlot {
        self.slots
            .lock()
            .get(node)
            .and_then(|row| row.get(attribute))
            .copied()
            .unwrap_or_default()
    }

    /// Whether the slot holds a vector for `reciprocal`.
    pub fn is_ready(&self, node: usize, attribute: usize, reciprocal: bool) -> bool {
        self.slot(node, attribute).vector_for(reciprocal).is_some()
    }

    /// Cached gradient of `attribute` at `node`.
    ///
    /// # Errors
    /// [`ProfileError::GradientNotComputed`] if the slot is unset or holds the
    /// other reciprocal flag.
    pub fn get(
        &self,
        node: usize,
        attribute: usize,
        reciprocal: bool,
    ) -> Result<[f64; 3], ProfileError> {
        self.slot(node, attribute)
            .vector_for(reciprocal)
            .ok_or(ProfileError::GradientNotComputed {
                node,
                attribute,
                reciprocal,
            })
    }

    /// Fill every node's slot for (`attribute`, `reciprocal`) that is not
    /// already ready, calling `compute(node)` for each miss.
    ///
    /// Returns the number of slots computed (0 on a full cache hit). The lock is
    /// held across the calls to `compute`; nothing is written unless every
    /// call succeeds.
    pub(crate) fn compute_missing<F>(
        &self,
        attribute: usize,
        n_attributes: usize,
        reciprocal: bool,
        mut compute: F,
    ) -> Result<usize, ProfileError>
    where
        F: FnMut(usize) -> Result<[f64; 3], ProfileError>,
    {
        if attribute >= n_attributes {
            return Err(ProfileError::AttributeIndexOutOfBounds {
                attribute,
                len: n_attributes,
            });
        }
        let mut slots = self.slots.lock();
        let mut fresh = Vec::new();
        for (node, row) in slots.iter().enumerate() {
            let ready = row
                .get(attribute)
                .is_some_and(|slot| slot.vector_for(reciprocal).is_some());
            if !ready {
                fresh.push((node, compute(node)?));
            }
        }
        // Commit only once every miss succeeded.
        for &(node, vector) in &fresh {
            let row = &mut slots[node];
            if row.len() < n_attributes {
                row.resize(n_attributes, GradientSlot::Unset);
            }
            row[attribute] = GradientSlot::Ready { reciprocal, vector };
        }
        Ok(fresh.len())
    }

    /// Independent copy of all slots.
    pub fn deep_copy(&self) -> Self {
        Self {
            n_nodes: self.n_nodes,
            slots: Mutex::new(self.slots.lock().clone()),
        }
    }

    /// Drop every cached vector.
    pub fn clear(&mut self) {
        for row in self.slots.get_mut().iter_mut() {
            row.clear();
        }
    }
}

impl Clone for GradientCache {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}
