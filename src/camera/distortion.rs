//! Radial-tangential lens distortion.
//!
//! [`CameraCalibration::distort`] applies the closed-form forward model: it
//! takes an ideal (distortion free) pixel and returns where the lens images
//! it on the sensor.
//!
//! [`CameraCalibration::undistort`] goes the other way. The forward model has
//! no closed-form inverse, so each axis is corrected on its own: writing the
//! ideal normalized point as `λ·p`, where `p` is the distorted normalized
//! point, and substituting into the forward model gives a polynomial in `λ`
//! per axis. The real root closest to `1` is taken as that axis' scale. Both
//! axes share the same radial term and differ only in the tangential part, so
//! the result is exact for purely radial distortion and an approximation
//! otherwise.

use super::CameraCalibration;
use crate::math::Polynomial;
use log::trace;
use nalgebra::Vector2;

/// Scale returned for an axis whose polynomial has no real root.
pub const NO_REAL_ROOT_SCALE: f64 = 1e6;

impl CameraCalibration {
    /// Maps an ideal pixel to its distorted location.
    ///
    /// With `p = (ideal - c) / f`, `r2 = |p|²` and
    /// `poly = 1 + k1·r2 + k2·r2² + k3·r2³`:
    ///
    /// ```text
    /// x' = fx · (p.x·poly + 2·p.x·p.y·p1 + p2·(r2 + 2·p.x²)) + cx
    /// y' = fy · (p.y·poly + 2·p.x·p.y·p2 + p1·(r2 + 2·p.y²)) + cy
    /// ```
    ///
    /// # Examples
    ///
    /// ```rust
    /// use camcalib::camera::CameraCalibration;
    /// use nalgebra::{Vector2, Vector3};
    ///
    /// let mut calib = CameraCalibration::new();
    /// calib.set_intrinsics_params(500.0, 500.0, 320.0, 240.0, 0.0);
    /// calib.set_distortion(&Vector3::new(-0.2, 0.0, 0.0), &Vector2::zeros());
    ///
    /// // Barrel distortion pulls points towards the principal point
    /// let distorted = calib.distort(&Vector2::new(600.0, 240.0));
    /// assert!(distorted.x < 600.0);
    /// assert_eq!(distorted.y, 240.0);
    /// ```
    pub fn distort(&self, ideal: &Vector2<f64>) -> Vector2<f64> {
        let c = self.center();
        let f = self.focal_length();
        let k1 = self.radial[0];
        let k2 = self.radial[1];
        let k3 = self.radial[2];
        let p1 = self.tangential[0];
        let p2 = self.tangential[1];

        let p = (ideal - c).component_div(&f);
        let r2 = p.norm_squared();
        let r4 = r2 * r2;
        let r6 = r2 * r4;
        let poly = 1.0 + k1 * r2 + k2 * r4 + k3 * r6;
        let xy2 = 2.0 * p.x * p.y;

        Vector2::new(
            f.x * (p.x * poly + xy2 * p1 + p2 * (r2 + 2.0 * p.x * p.x)) + c.x,
            f.y * (p.y * poly + xy2 * p2 + p1 * (r2 + 2.0 * p.y * p.y)) + c.y,
        )
    }

    /// Recovers the ideal pixel from a distorted one.
    ///
    /// Every axis gets its own scale `λ` around the principal point, chosen as
    /// the real root of
    ///
    /// ```text
    /// k3·r6·λ⁷ + k2·r4·λ⁵ + k1·r2·λ³ + t·λ² + λ - 1
    /// ```
    ///
    /// closest to `1`, where `r2 = |p|²` of the normalized distorted point and
    /// `t` is the axis' tangential term
    ///
    /// ```text
    /// tx = p1·2·p.y + p2·(p.y² / p.x + 3·p.x)
    /// ty = p2·2·p.x + p1·(p.x² / p.y + 3·p.y)
    /// ```
    ///
    /// An axis without any real root keeps [`NO_REAL_ROOT_SCALE`]. A point on
    /// the principal row or column makes the other axis' tangential term
    /// non-finite, which also yields that scale, but it multiplies a zero
    /// offset there.
    pub fn undistort(&self, distorted: &Vector2<f64>) -> Vector2<f64> {
        let c = self.center();
        let f = self.focal_length();
        let k1 = self.radial[0];
        let k2 = self.radial[1];
        let k3 = self.radial[2];
        let p1 = self.tangential[0];
        let p2 = self.tangential[1];

        let p = (distorted - c).component_div(&f);
        let r2 = p.norm_squared();
        let r4 = r2 * r2;
        let r6 = r2 * r4;

        let radial = Polynomial::new(&[r6 * k3, 0.0, r4 * k2, 0.0, r2 * k1, 0.0, 1.0, -1.0]);

        let tx = p1 * 2.0 * p.y + p2 * ((p.y * p.y) / p.x + 3.0 * p.x);
        let lambda_x = closest_real_root_to_one(&(&radial + &Polynomial::new(&[tx, 0.0, 0.0])));

        let ty = p2 * 2.0 * p.x + p1 * ((p.x * p.x) / p.y + 3.0 * p.y);
        let lambda_y = closest_real_root_to_one(&(&radial + &Polynomial::new(&[ty, 0.0, 0.0])));

        if lambda_x == NO_REAL_ROOT_SCALE || lambda_y == NO_REAL_ROOT_SCALE {
            trace!(
                "No real root while undistorting ({}, {}): lambda = ({}, {})",
                distorted.x,
                distorted.y,
                lambda_x,
                lambda_y
            );
        }

        let offset = distorted - c;
        Vector2::new(lambda_x * offset.x, lambda_y * offset.y) + c
    }
}

/// Picks the real root with the smallest distance to `1`.
///
/// Only roots whose imaginary part is exactly zero count as real. Returns
/// [`NO_REAL_ROOT_SCALE`] when there is none.
fn closest_real_root_to_one(poly: &Polynomial) -> f64 {
    let mut lambda = NO_REAL_ROOT_SCALE;
    for root in poly.roots() {
        if root.im == 0.0 && (root.re - 1.0).abs() < (lambda - 1.0).abs() {
            lambda = root.re;
        }
    }
    lambda
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn calibration(radial: Vector3<f64>, tangential: Vector2<f64>) -> CameraCalibration {
        let mut calib = CameraCalibration::new();
        calib.set_intrinsics_params(500.0, 500.0, 320.0, 240.0, 0.0);
        calib.set_distortion(&radial, &tangential);
        calib
    }

    fn grid() -> Vec<Vector2<f64>> {
        let mut points = Vec::new();
        for i in 0..9 {
            for j in 0..7 {
                points.push(Vector2::new(3.5 + 79.0 * i as f64, 1.5 + 79.0 * j as f64));
            }
        }
        points
    }

    #[test]
    fn test_zero_distortion_is_identity() {
        let calib = calibration(Vector3::zeros(), Vector2::zeros());
        let mut points = grid();
        // Principal point, its row and its column
        points.push(Vector2::new(320.0, 240.0));
        points.push(Vector2::new(320.0, 17.0));
        points.push(Vector2::new(11.0, 240.0));

        for point in &points {
            let distorted = calib.distort(point);
            assert_relative_eq!(distorted.x, point.x, epsilon = 1e-9);
            assert_relative_eq!(distorted.y, point.y, epsilon = 1e-9);

            let undistorted = calib.undistort(point);
            assert_relative_eq!(undistorted.x, point.x, epsilon = 1e-9);
            assert_relative_eq!(undistorted.y, point.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_distortion_with_default_intrinsics() {
        let calib = CameraCalibration::new();
        for point in [
            Vector2::new(0.0, 0.0),
            Vector2::new(640.0, 0.0),
            Vector2::new(0.0, 480.0),
            Vector2::new(123.25, 77.5),
        ] {
            let undistorted = calib.undistort(&point);
            assert_relative_eq!(undistorted.x, point.x, epsilon = 1e-9);
            assert_relative_eq!(undistorted.y, point.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_distort_matches_reference_formula() {
        let k = Vector3::new(-0.28, 0.07, 0.01);
        let t = Vector2::new(0.0002, -0.0003);
        let calib = calibration(k, t);

        let ideal = Vector2::new(100.0, 400.0);
        let px = (100.0 - 320.0) / 500.0;
        let py = (400.0 - 240.0) / 500.0;
        let r2: f64 = px * px + py * py;
        let poly = 1.0 + k[0] * r2 + k[1] * r2 * r2 + k[2] * r2 * r2 * r2;
        let x = 500.0 * (px * poly + 2.0 * px * py * t[0] + t[1] * (r2 + 2.0 * px * px)) + 320.0;
        let y = 500.0 * (py * poly + 2.0 * px * py * t[1] + t[0] * (r2 + 2.0 * py * py)) + 240.0;

        let distorted = calib.distort(&ideal);
        assert_relative_eq!(distorted.x, x, epsilon = 1e-9);
        assert_relative_eq!(distorted.y, y, epsilon = 1e-9);

        // Pure function
        assert_eq!(calib.distort(&ideal), distorted);
    }

    #[test]
    fn test_barrel_moves_points_inwards() {
        let calib = calibration(Vector3::new(-0.2, 0.0, 0.0), Vector2::zeros());
        let corner = Vector2::new(0.0, 0.0);

        let distorted = calib.distort(&corner);
        assert!(distorted.x > 0.0 && distorted.y > 0.0);

        let undistorted = calib.undistort(&corner);
        assert!(undistorted.x < 0.0 && undistorted.y < 0.0);
    }

    #[test]
    fn test_undistort_inverts_radial_distortion() {
        let calib = calibration(Vector3::new(-0.2, 0.05, 0.001), Vector2::zeros());
        for ideal in grid() {
            let distorted = calib.distort(&ideal);
            let recovered = calib.undistort(&distorted);
            assert_relative_eq!(recovered.x, ideal.x, epsilon = 1e-6);
            assert_relative_eq!(recovered.y, ideal.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_undistort_with_negligible_k3() {
        for k3 in [1e-8, 1e-12, 1e-14, 1e-16, 1e-310] {
            let calib = calibration(Vector3::new(-0.2, 0.0, k3), Vector2::zeros());
            let mut points = grid();
            points.push(Vector2::new(10.0, 15.0));
            for ideal in points {
                let recovered = calib.undistort(&calib.distort(&ideal));
                assert!(
                    (recovered - ideal).norm() < 1e-6,
                    "k3 {} ideal {:?} recovered {:?}",
                    k3,
                    ideal,
                    recovered
                );
            }
        }
    }

    #[test]
    fn test_undistort_approximates_tangential_distortion() {
        let calib = calibration(Vector3::new(-0.1, 0.0, 0.0), Vector2::new(0.0005, -0.0004));
        for ideal in grid() {
            let distorted = calib.distort(&ideal);
            let recovered = calib.undistort(&distorted);
            // Per-axis correction, not an exact inverse
            assert!(
                (recovered - ideal).norm() < 1.0,
                "ideal {:?} recovered {:?}",
                ideal,
                recovered
            );
        }
    }

    #[test]
    fn test_undistort_without_real_root_keeps_sentinel() {
        // Without radial terms the polynomial is t·λ² + λ - 1, which has no
        // real root once t < -1/4
        let mut calib = CameraCalibration::new();
        calib.set_intrinsics_params(1.0, 1.0, 0.0, 0.0, 0.0);
        calib.set_distortion(&Vector3::zeros(), &Vector2::new(-1.0, 0.0));

        // tx = p1·2·p.y = -2 at p = (1, 1); -2λ² + λ - 1 has no real root
        let undistorted = calib.undistort(&Vector2::new(1.0, 1.0));
        assert_eq!(undistorted.x, NO_REAL_ROOT_SCALE);
        // ty = p1·(p.x²/p.y + 3·p.y) = -4; -4λ² + λ - 1 has no real root either
        assert_eq!(undistorted.y, NO_REAL_ROOT_SCALE);
    }

    #[test]
    fn test_closest_real_root_to_one() {
        // (λ - 0.5)(λ - 1.2)(λ - 3) = λ³ - 4.7λ² + 5.7λ - 1.8
        let poly = Polynomial::new(&[1.0, -4.7, 5.7, -1.8]);
        assert_relative_eq!(closest_real_root_to_one(&poly), 1.2, epsilon = 1e-9);

        let no_real = Polynomial::new(&[1.0, 0.0, 1.0]);
        assert_eq!(closest_real_root_to_one(&no_real), NO_REAL_ROOT_SCALE);
    }
}
