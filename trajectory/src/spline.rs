//! Natural cubic spline interpolation.
//!
//! Used by the time profile to interpolate between (distance, time)
//! samples in both directions. The knots must be strictly increasing.
//!

use crate::error::AnalysisError;

/// A natural cubic spline through a set of knots.
///
/// Outside the knot range the end segment polynomials are extended.
///
#[derive(Clone, Debug)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots; zero at both ends.
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural cubic spline through the knots.
    ///
    /// There must be at least two knots with strictly increasing `xs`.
    ///
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, AnalysisError> {
        if (xs.len() < 2) || (xs.len() != ys.len()) {
            return Err(AnalysisError::NumericalFailure(
                "a spline requires at least two knots".into(),
            ));
        }
        if xs.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(AnalysisError::NumericalFailure(
                "spline knots must be strictly increasing".into(),
            ));
        }

        let n = xs.len();
        let mut second_derivatives = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the natural spline tridiagonal system
            // with unknowns at the interior knots
            let count = n - 2;
            let mut diagonal = vec![0.0; count];
            let mut upper = vec![0.0; count];
            let mut rhs = vec![0.0; count];
            for k in 0..count {
                let i = k + 1;
                let h0 = xs[i] - xs[i - 1];
                let h1 = xs[i + 1] - xs[i];
                diagonal[k] = 2.0 * (h0 + h1);
                upper[k] = h1;
                rhs[k] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
            }

            // forward elimination; the lower coefficient of row k is
            // the knot spacing before its interior knot
            for k in 1..count {
                let lower = xs[k + 1] - xs[k];
                let factor = lower / diagonal[k - 1];
                diagonal[k] -= factor * upper[k - 1];
                rhs[k] -= factor * rhs[k - 1];
            }

            // back substitution; the end second derivatives stay zero
            let mut next = 0.0;
            for k in (0..count).rev() {
                let value = (rhs[k] - upper[k] * next) / diagonal[k];
                second_derivatives[k + 1] = value;
                next = value;
            }
        }

        Ok(CubicSpline {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            second_derivatives,
        })
    }

    /// Evaluate the spline at `x`.
    ///
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // the segment containing x, or the end segments outside the range
        let i = match self.xs.binary_search_by(|knot| knot.total_cmp(&x)) {
            Ok(index) => index.min(n - 2),
            Err(index) => index.clamp(1, n - 1) - 1,
        };

        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.second_derivatives[i]
                + (b * b * b - b) * self.second_derivatives[i + 1])
                * (h * h)
                / 6.0
    }

    /// Evaluate the spline at each of `values`.
    ///
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|x| self.evaluate(*x)).collect()
    }
}
