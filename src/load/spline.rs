//! Exact quadratic B-spline interpolation.
//!
//! Knots follow the placement used for even-degree interpolating splines:
//! the end knots are repeated `degree + 1` times and every interior knot sits
//! halfway between two neighbouring data sites, which keeps the collocation
//! matrix non-singular for strictly increasing sites.

use std::cmp::Ordering;

use crate::error::{LoadError, LoadResult};

const DEGREE: usize = 2;

#[derive(Debug, Clone)]
pub struct QuadraticSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl QuadraticSpline {
    /// Fits the spline passing through every `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidInput`] when the slices differ in length,
    /// hold fewer than three points, or `xs` is not strictly increasing.
    pub fn interpolate(xs: &[f64], ys: &[f64]) -> LoadResult<Self> {
        let m = xs.len();
        if m != ys.len() {
            return Err(LoadError::InvalidInput(format!(
                "spline sites and values differ in length ({m} vs {})",
                ys.len()
            )));
        }
        if m <= DEGREE {
            return Err(LoadError::InvalidInput(format!(
                "need at least {} points for a quadratic spline, got {m}",
                DEGREE + 1
            )));
        }
        if xs
            .windows(2)
            .any(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less))
        {
            return Err(LoadError::InvalidInput(
                "spline sites must be strictly increasing".to_string(),
            ));
        }

        let mut knots = Vec::with_capacity(m + DEGREE + 1);
        knots.extend(std::iter::repeat_n(xs[0], DEGREE + 1));
        for l in 0..m - DEGREE - 1 {
            knots.push((xs[l + 1] + xs[l + 2]) / 2.0);
        }
        knots.extend(std::iter::repeat_n(xs[m - 1], DEGREE + 1));

        let mut spline = Self {
            knots,
            coeffs: vec![0.0; m],
        };

        let mut matrix = vec![vec![0.0; m]; m];
        for (row, &x) in matrix.iter_mut().zip(xs) {
            let span = spline.span(x);
            for (i, b) in spline.basis(span, x).into_iter().enumerate() {
                row[span - DEGREE + i] = b;
            }
        }

        spline.coeffs = solve(matrix, ys.to_vec()).ok_or_else(|| {
            LoadError::InvalidInput("spline collocation matrix is singular".to_string())
        })?;

        Ok(spline)
    }

    /// First and last data site; the curve is only defined in between.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[DEGREE], self.knots[self.knots.len() - DEGREE - 1])
    }

    /// Value at `x`, or `None` outside [`Self::domain`]. Never extrapolates.
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !x.is_finite() || x < lo || x > hi {
            return None;
        }
        let span = self.span(x);
        let value = self
            .basis(span, x)
            .iter()
            .enumerate()
            .map(|(i, b)| self.coeffs[span - DEGREE + i] * b)
            .sum();
        Some(value)
    }

    /// Index `mu` with `knots[mu] <= x < knots[mu + 1]`; the right end maps to the last span.
    fn span(&self, x: f64) -> usize {
        let last = self.knots.len() - DEGREE - 2;
        (DEGREE..=last)
            .find(|&mu| x < self.knots[mu + 1])
            .unwrap_or(last)
    }

    /// The `DEGREE + 1` non-zero basis functions at `x` (Cox-de Boor).
    fn basis(&self, span: usize, x: f64) -> [f64; DEGREE + 1] {
        let t = &self.knots;
        let mut n = [0.0; DEGREE + 1];
        let mut left = [0.0; DEGREE + 1];
        let mut right = [0.0; DEGREE + 1];
        n[0] = 1.0;
        for j in 1..=DEGREE {
            left[j] = x - t[span + 1 - j];
            right[j] = t[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = n[r] / (right[r + 1] + left[j - r]);
                n[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n[j] = saved;
        }
        n
    }
}

/// Gaussian elimination with partial pivoting. `None` if the system is singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..n {
                let upper = a[col][k];
                a[row][k] -= f * upper;
            }
            let rhs = b[col];
            b[row] -= f * rhs;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
