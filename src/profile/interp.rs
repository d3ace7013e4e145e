//! Radial interpolation along a profile's nodes.
//!
//! Radii are stored as `f32` (the wire width) and widened to `f64` for all
//! arithmetic. Natural cubic splines use zero second derivatives at both ends.

use crate::profile_error::ProfileError;

/// Interpolation scheme along radius.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize,
)]
pub enum InterpolatorType {
    /// Piecewise linear between bracketing nodes.
    #[default]
    Linear,
    /// Natural cubic spline through all nodes.
    CubicSpline,
}

impl InterpolatorType {
    /// Parse `"linear"` / `"cubic_spline"` (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(InterpolatorType::Linear),
            "cubic_spline" | "cubicspline" | "spline" => Some(InterpolatorType::CubicSpline),
            _ => None,
        }
    }
}

/// Where a radius falls relative to a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Placement {
    /// Below the bottom radius; clamp to node 0.
    Below,
    /// Inside interval `i` (between nodes `i` and `i + 1`).
    Inside(usize),
    /// Above the top radius; clamp to the last node.
    Above,
}

/// Locate `radius` among `radii` (n >= 2), enforcing the out-of-range policy.
pub(crate) fn place(
    radii: &[f32],
    radius: f64,
    allow_out_of_range: bool,
) -> Result<Placement, ProfileError> {
    debug_assert!(radii.len() >= 2);
    let bottom = f64::from(radii[0]);
    let top = f64::from(radii[radii.len() - 1]);
    if radius < bottom || radius > top {
        if !allow_out_of_range {
            return Err(ProfileError::RadiusOutOfRange {
                radius,
                bottom,
                top,
            });
        }
        return Ok(if radius < bottom {
            Placement::Below
        } else {
            Placement::Above
        });
    }
    if radius.is_nan() {
        return Err(ProfileError::RadiusOutOfRange {
            radius,
            bottom,
            top,
        });
    }
    Ok(Placement::Inside(interval(radii, radius)))
}

/// Interval index `i` with `r[i] <= radius <= r[i+1]`, clamped to `[0, n-2]`.
pub(crate) fn interval(radii: &[f32], radius: f64) -> usize {
    let above = radii.partition_point(|&r| f64::from(r) <= radius);
    above.saturating_sub(1).min(radii.len().saturating_sub(2))
}

/// Linear weights `(w_lo, w_hi)` for `radius` in `[r_lo, r_hi]`.
#[inline]
pub(crate) fn linear_weights(r_lo: f64, r_hi: f64, radius: f64) -> (f64, f64) {
    let w_hi = (radius - r_lo) / (r_hi - r_lo);
    (1.0 - w_hi, w_hi)
}

/// Second derivatives of the natural cubic spline through `(x, y)`.
pub(crate) fn spline_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut y2 = vec![0.0; n];
    if n < 3 {
        return y2;
    }
    let mut u = vec![0.0; n - 1];
    for i in 1..n - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * y2[i - 1] + 2.0;
        y2[i] = (sig - 1.0) / p;
        let slope =
            (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        u[i] = (6.0 * slope / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
    }
    y2[n - 1] = 0.0;
    for k in (0..n - 1).rev() {
        y2[k] = y2[k] * y2[k + 1] + u[k];
    }
    y2
}

/// Evaluate the spline on interval `lo` at `radius`.
pub(crate) fn spline_value(x: &[f64], y: &[f64], y2: &[f64], lo: usize, radius: f64) -> f64 {
    let hi = lo + 1;
    let h = x[hi] - x[lo];
    let a = (x[hi] - radius) / h;
    let b = (radius - x[lo]) / h;
    a * y[lo] + b * y[hi] + ((a * a * a - a) * y2[lo] + (b * b * b - b) * y2[hi]) * h * h / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_clamps_to_valid_range() {
        let r = [1.0f32, 2.0, 4.0];
        assert_eq!(interval(&r, 1.0), 0);
        assert_eq!(interval(&r, 1.5), 0);
        assert_eq!(interval(&r, 2.0), 1);
        assert_eq!(interval(&r, 4.0), 1);
        assert_eq!(interval(&r, -9.0), 0);
        assert_eq!(interval(&r, 99.0), 1);
    }

    #[test]
    fn place_enforces_range() {
        let r = [1.0f32, 2.0];
        assert!(matches!(
            place(&r, 3.0, false),
            Err(ProfileError::RadiusOutOfRange { .. })
        ));
        assert_eq!(place(&r, 3.0, true).unwrap(), Placement::Above);
        assert_eq!(place(&r, 0.0, true).unwrap(), Placement::Below);
        assert_eq!(place(&r, 1.5, false).unwrap(), Placement::Inside(0));
        assert!(place(&r, f64::NAN, true).is_err());
    }

    #[test]
    fn spline_reproduces_linear_data() {
        let x = [0.0, 1.0, 3.0, 4.0];
        let y = [1.0, 3.0, 7.0, 9.0];
        let y2 = spline_second_derivatives(&x, &y);
        assert!(y2.iter().all(|v| v.abs() < 1e-12));
        let v = spline_value(&x, &y, &y2, 1, 2.0);
        assert!((v - 5.0).abs() < 1e-12);
    }

    #[test]
    fn spline_passes_through_nodes() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 0.0, 1.0];
        let y2 = spline_second_derivatives(&x, &y);
        for lo in 0..3 {
            assert!((spline_value(&x, &y, &y2, lo, x[lo]) - y[lo]).abs() < 1e-12);
            assert!((spline_value(&x, &y, &y2, lo, x[lo + 1]) - y[lo + 1]).abs() < 1e-12);
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!(InterpolatorType::parse("LINEAR"), Some(InterpolatorType::Linear));
        assert_eq!(
            InterpolatorType::parse("cubic_spline"),
            Some(InterpolatorType::CubicSpline)
        );
        assert_eq!(InterpolatorType::parse("nearest"), None);
    }
}
