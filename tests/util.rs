#![allow(dead_code)]
use earth_profile::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Two-attribute double schema used by most tests.
pub fn schema() -> SimpleSchema {
    SimpleSchema::new(DataType::Double, 2)
}

pub fn data(a: f64, b: f64) -> Data {
    Data::from(vec![a, b])
}

/// One profile of every variant, all over the two-attribute double schema.
pub fn every_variant() -> Vec<Profile> {
    vec![
        Profile::empty(),
        Profile::surface_empty(),
        Profile::surface(data(1.5, -2.0)),
        Profile::thin(6371.0, data(3.0, f64::NAN)).unwrap(),
        Profile::constant(5701.0, 5971.0, data(10.0, 5.5)).unwrap(),
        Profile::npoint(
            vec![3480.0, 3630.0, 5600.0, 5701.0],
            vec![
                data(13.7, 7.2),
                data(13.6, 7.2),
                data(11.1, 6.3),
                data(10.8, 6.0),
            ],
        )
        .unwrap(),
    ]
}

/// Calculator that counts its invocations and returns a deterministic vector.
#[derive(Clone, Debug)]
pub struct CountingCalculator {
    pub calls: Arc<AtomicUsize>,
}

impl GradientCalculator for CountingCalculator {
    type Error = std::convert::Infallible;

    fn gradient(&mut self, request: &GradientRequest) -> Result<[f64; 3], Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sign = if request.reciprocal { -1.0 } else { 1.0 };
        Ok([
            sign * request.radius,
            request.node as f64 + 0.25,
            request.attribute as f64 + 10.0 * request.vertex as f64 + 100.0 * request.layer as f64,
        ])
    }
}

/// Pool of counting calculators sharing one counter.
pub fn counting_pool() -> (CalculatorPool<CountingCalculator>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&calls);
    let pool = CalculatorPool::new(move || CountingCalculator {
        calls: Arc::clone(&shared),
    });
    (pool, calls)
}

#[derive(Debug, thiserror::Error)]
#[error("geometry unavailable at vertex {vertex}")]
pub struct GeometryError {
    pub vertex: usize,
}

/// Calculator that always fails.
pub struct FailingCalculator;

impl GradientCalculator for FailingCalculator {
    type Error = GeometryError;

    fn gradient(&mut self, request: &GradientRequest) -> Result<[f64; 3], Self::Error> {
        Err(GeometryError {
            vertex: request.vertex,
        })
    }
}

pub fn encode_binary(p: &Profile) -> Vec<u8> {
    let mut buf = Vec::new();
    p.write_binary(&mut buf).unwrap();
    buf
}

pub fn encode_ascii(p: &Profile) -> String {
    let mut buf = Vec::new();
    p.write_ascii(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}
