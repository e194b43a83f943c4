//! Real polynomials with a companion-matrix root finder.
//!
//! Roots are the eigenvalues of the companion matrix, computed with
//! [`nalgebra::Schur`]. Real roots come out of 1×1 blocks of the quasi upper
//! triangular Schur form and therefore carry an imaginary part of exactly
//! `0.0`, which callers rely on to tell real roots from complex ones.
//! The companion matrix is balanced before the decomposition and every real
//! root is polished with Newton steps on the original polynomial.

use nalgebra::linalg::balancing::balance_parlett_reinsch;
use nalgebra::{Complex, DMatrix, Schur};
use std::fmt;
use std::ops::Add;

/// Iteration cap handed to the Schur decomposition.
const SCHUR_MAX_ITERATIONS: usize = 1000;

/// Newton steps spent polishing each real root.
const NEWTON_MAX_ITERATIONS: usize = 8;

/// A polynomial with real coefficients.
///
/// Coefficients are stored in ascending order of degree, so `coeffs[i]`
/// multiplies `x^i`.
#[derive(Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients given highest degree first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use camcalib::math::Polynomial;
    ///
    /// // 2x^2 - 3x + 1
    /// let p = Polynomial::new(&[2.0, -3.0, 1.0]);
    /// assert_eq!(p.degree(), 2);
    /// assert_eq!(p.eval(1.0), 0.0);
    /// ```
    pub fn new(coeffs_highest_first: &[f64]) -> Self {
        let coeffs = coeffs_highest_first.iter().rev().copied().collect();
        Polynomial { coeffs }
    }

    /// Degree ignoring leading zero coefficients. The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coeffs.iter().rposition(|c| *c != 0.0).unwrap_or(0)
    }

    /// Evaluates the polynomial at `x` using Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Evaluates the polynomial and its first derivative at `x`.
    fn eval_with_derivative(&self, x: f64) -> (f64, f64) {
        self.coeffs
            .iter()
            .rev()
            .fold((0.0, 0.0), |(value, slope), c| (value * x + c, slope * x + value))
    }

    /// Refines a real root estimate. A step is only taken if it lowers the residual.
    fn polish(&self, mut x: f64) -> f64 {
        let mut residual = self.eval(x).abs();
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let (value, slope) = self.eval_with_derivative(x);
            if value == 0.0 || slope == 0.0 {
                break;
            }
            let next = x - value / slope;
            let next_residual = self.eval(next).abs();
            if !next.is_finite() || next_residual >= residual {
                break;
            }
            x = next;
            residual = next_residual;
        }
        x
    }

    /// Computes all roots (real and complex) of the polynomial.
    ///
    /// The number of roots equals [`Polynomial::degree`], except that a
    /// leading coefficient too small to divide the others by is treated as
    /// zero (its root lies at infinity). Constant polynomials have no roots.
    /// If a coefficient is not finite, or the eigenvalue decomposition does
    /// not converge, no roots are returned.
    pub fn roots(&self) -> Vec<Complex<f64>> {
        let mut n = self.degree();
        if self.coeffs.iter().any(|c| !c.is_finite()) {
            return Vec::new();
        }
        while n > 0 && self.coeffs[..n].iter().any(|c| !(c / self.coeffs[n]).is_finite()) {
            n -= 1;
            while n > 0 && self.coeffs[n] == 0.0 {
                n -= 1;
            }
        }
        if n == 0 {
            return Vec::new();
        }
        let coeffs = &self.coeffs[..=n];

        let lead = coeffs[n];
        if n == 1 {
            return vec![Complex::new(-coeffs[0] / lead, 0.0)];
        }

        // Companion matrix of the monic polynomial: ones on the sub-diagonal,
        // negated normalized coefficients in the last column.
        let mut companion = DMatrix::<f64>::zeros(n, n);
        for i in 1..n {
            companion[(i, i - 1)] = 1.0;
        }
        for i in 0..n {
            companion[(i, n - 1)] = -coeffs[i] / lead;
        }

        balance_parlett_reinsch(&mut companion);

        match Schur::try_new(companion, f64::EPSILON, SCHUR_MAX_ITERATIONS) {
            Some(schur) => schur
                .complex_eigenvalues()
                .iter()
                .map(|r| if r.im == 0.0 { Complex::new(self.polish(r.re), 0.0) } else { *r })
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..len)
            .map(|i| {
                self.coeffs.get(i).copied().unwrap_or(0.0) + rhs.coeffs.get(i).copied().unwrap_or(0.0)
            })
            .collect();
        Polynomial { coeffs }
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polynomial [coeffs (ascending): {:?}]", self.coeffs)
    }
}
