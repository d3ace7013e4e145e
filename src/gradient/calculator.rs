//! External gradient-geometry calculators and their checkout pool.
//!
//! Profiles never compute spatial derivatives themselves. On a cache miss they
//! check a [`GradientCalculator`] out of the owning model's [`CalculatorPool`],
//! ask it for one 3-vector per node, and the guard returns the calculator to the
//! pool when it is dropped.

use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Where a gradient is requested.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientRequest {
    /// Grid vertex owning the profile.
    pub vertex: usize,
    /// Layer owning the profile.
    pub layer: usize,
    /// Local node index within the profile.
    pub node: usize,
    /// Radius of the node in km.
    pub radius: f64,
    /// Attribute index.
    pub attribute: usize,
    /// Differentiate `1/attribute` instead of `attribute`.
    pub reciprocal: bool,
    /// Layer normal at the vertex, when the model tracks one.
    pub layer_normal: Option<[f64; 3]>,
}

/// (vertex, layer) coordinates of a profile inside its grid.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct GradientLocation {
    /// Grid vertex.
    pub vertex: usize,
    /// Layer index.
    pub layer: usize,
}

impl GradientLocation {
    /// Location of the profile at (`vertex`, `layer`).
    pub fn new(vertex: usize, layer: usize) -> Self {
        Self { vertex, layer }
    }
}

/// Computes the spatial gradient of one attribute at one profile node.
pub trait GradientCalculator: Send {
    /// Failure type; propagated to callers unchanged (boxed).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Gradient 3-vector for `request`.
    fn gradient(&mut self, request: &GradientRequest) -> Result<[f64; 3], Self::Error>;
}

/// Checkout / checkin pool of calculators shared by all profiles of a model.
pub struct CalculatorPool<C> {
    idle: Mutex<Vec<C>>,
    factory: Box<dyn Fn() -> C + Send + Sync>,
    created: AtomicUsize,
}

impl<C> CalculatorPool<C> {
    /// Pool that builds calculators on demand with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            created: AtomicUsize::new(0),
        }
    }

    /// Check out an idle calculator, building a new one if none is idle.
    pub fn checkout(&self) -> PooledCalculator<'_, C> {
        let idle = self.idle.lock().pop();
        let calculator = idle.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            (self.factory)()
        });
        PooledCalculator {
            pool: self,
            calculator: ManuallyDrop::new(calculator),
        }
    }

    fn checkin(&self, calculator: C) {
        self.idle.lock().push(calculator);
    }

    /// Number of calculators currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Number of calculators the factory has built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl<C> std::fmt::Debug for CalculatorPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorPool")
            .field("idle", &self.idle())
            .field("created", &self.created())
            .finish()
    }
}

/// A checked-out calculator; returned to its pool on drop.
pub struct PooledCalculator<'a, C> {
    pool: &'a CalculatorPool<C>,
    calculator: ManuallyDrop<C>,
}

impl<C> Deref for PooledCalculator<'_, C> {
    type Target = C;
    fn deref(&self) -> &C {
        &self.calculator
    }
}

impl<C> DerefMut for PooledCalculator<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.calculator
    }
}

impl<C> Drop for PooledCalculator<'_, C> {
    fn drop(&mut self) {
        // SAFETY: `calculator` is taken exactly once, here, and the guard is
        // never touched again after `drop`.
        let calculator = unsafe { ManuallyDrop::take(&mut self.calculator) };
        self.pool.checkin(calculator);
    }
}
