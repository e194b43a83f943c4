//! Camera calibration parameters: pinhole intrinsics, camera-to-world
//! extrinsics and a radial-tangential lens distortion model.
//!
//! [`CameraCalibration`] is a plain value type. The forward distortion model,
//! the inverse solver, the rectification bounds and YAML persistence live in
//! the [`distortion`], [`rectify`] and [`io`] submodules as inherent methods.

use nalgebra::{Isometry3, Matrix3, Matrix4, Vector2, Vector3};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

pub mod distortion;
pub mod io;
pub mod rectify;

pub use rectify::RectificationBounds;

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("Format error: {0}")]
    FormatError(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CalibrationError {
    fn from(err: std::io::Error) -> Self {
        CalibrationError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for CalibrationError {
    fn from(err: yaml_rust::ScanError) -> Self {
        CalibrationError::YamlError(err.to_string())
    }
}

/// Set of parameter groups that were explicitly assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CalibrationFlags(u8);

impl CalibrationFlags {
    pub const INTRINSICS: CalibrationFlags = CalibrationFlags(1 << 0);
    pub const EXTRINSICS: CalibrationFlags = CalibrationFlags(1 << 1);
    pub const DISTORTION: CalibrationFlags = CalibrationFlags(1 << 2);

    pub const fn empty() -> Self {
        CalibrationFlags(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if every group in `other` is also set in `self`.
    pub const fn contains(&self, other: CalibrationFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: CalibrationFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for CalibrationFlags {
    type Output = CalibrationFlags;

    fn bitor(self, rhs: CalibrationFlags) -> CalibrationFlags {
        CalibrationFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CalibrationFlags {
    fn bitor_assign(&mut self, rhs: CalibrationFlags) {
        self.insert(rhs);
    }
}

/// Calibration of a single camera.
///
/// Holds the intrinsic matrix
///
/// ```text
/// | fx  alpha  cx |
/// | 0   fy     cy |
/// | 0   0      1  |
/// ```
///
/// the camera-to-world extrinsic transform, the radial `(k1, k2, k3)` and
/// tangential `(p1, p2)` distortion coefficients and the derived 4×4
/// projection matrix. The projection is recomputed by every intrinsics or
/// extrinsics setter, so it never lags behind the parameters it is built from.
///
/// # Examples
///
/// ```rust
/// use camcalib::camera::CameraCalibration;
/// use nalgebra::{Vector2, Vector3};
///
/// let mut calib = CameraCalibration::new();
/// assert!(!calib.has_intrinsics());
///
/// calib.set_intrinsics_params(500.0, 500.0, 320.0, 240.0, 0.0);
/// calib.set_distortion(&Vector3::new(-0.2, 0.0, 0.0), &Vector2::zeros());
///
/// assert!(calib.has_intrinsics());
/// assert!(!calib.has_extrinsics());
/// assert_eq!(calib.center(), Vector2::new(320.0, 240.0));
/// ```
#[derive(Clone, PartialEq)]
pub struct CameraCalibration {
    intrinsics: Matrix3<f64>,
    extrinsics: Matrix4<f64>,
    projection: Matrix4<f64>,
    radial: Vector3<f64>,
    tangential: Vector2<f64>,
    flags: CalibrationFlags,
}

impl Default for CameraCalibration {
    fn default() -> Self {
        CameraCalibration {
            intrinsics: Matrix3::identity(),
            extrinsics: Matrix4::identity(),
            projection: Matrix4::identity(),
            radial: Vector3::zeros(),
            tangential: Vector2::zeros(),
            flags: CalibrationFlags::empty(),
        }
    }
}

impl CameraCalibration {
    /// Identity intrinsics and extrinsics, zero distortion, no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intrinsics(&self) -> &Matrix3<f64> {
        &self.intrinsics
    }

    /// The camera-to-world transform.
    pub fn extrinsics(&self) -> &Matrix4<f64> {
        &self.extrinsics
    }

    /// Radial coefficients `(k1, k2, k3)`.
    pub fn radial_distortion(&self) -> &Vector3<f64> {
        &self.radial
    }

    /// Tangential coefficients `(p1, p2)`.
    pub fn tangential_distortion(&self) -> &Vector2<f64> {
        &self.tangential
    }

    pub fn projection_matrix(&self) -> &Matrix4<f64> {
        &self.projection
    }

    pub fn flags(&self) -> CalibrationFlags {
        self.flags
    }

    /// Principal point `(cx, cy)`.
    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.intrinsics[(0, 2)], self.intrinsics[(1, 2)])
    }

    /// Focal lengths `(fx, fy)`.
    pub fn focal_length(&self) -> Vector2<f64> {
        Vector2::new(self.intrinsics[(0, 0)], self.intrinsics[(1, 1)])
    }

    pub fn skew(&self) -> f64 {
        self.intrinsics[(0, 1)]
    }

    pub fn has_intrinsics(&self) -> bool {
        self.flags.contains(CalibrationFlags::INTRINSICS)
    }

    pub fn has_extrinsics(&self) -> bool {
        self.flags.contains(CalibrationFlags::EXTRINSICS)
    }

    pub fn has_distortion(&self) -> bool {
        self.flags.contains(CalibrationFlags::DISTORTION)
    }

    pub fn set_intrinsics(&mut self, intrinsics: &Matrix3<f64>) {
        self.flags |= CalibrationFlags::INTRINSICS;
        self.intrinsics = *intrinsics;
        self.update_projection_matrix();
    }

    /// Sets the intrinsics from focal lengths, principal point and skew.
    pub fn set_intrinsics_params(&mut self, fx: f64, fy: f64, cx: f64, cy: f64, alpha: f64) {
        self.flags |= CalibrationFlags::INTRINSICS;
        self.intrinsics = Matrix3::new(
            fx, alpha, cx, //
            0.0, fy, cy, //
            0.0, 0.0, 1.0,
        );
        self.update_projection_matrix();
    }

    /// Sets the extrinsics.
    ///
    /// `extrinsics` is the transformation from camera to world and is
    /// expected to be rigid; it is stored as given.
    pub fn set_extrinsics(&mut self, extrinsics: &Matrix4<f64>) {
        self.flags |= CalibrationFlags::EXTRINSICS;
        self.extrinsics = *extrinsics;
        self.update_projection_matrix();
    }

    /// Sets the extrinsics from a camera-to-world pose.
    pub fn set_extrinsics_from_pose(&mut self, camera_to_world: &Isometry3<f64>) {
        self.set_extrinsics(&camera_to_world.to_homogeneous());
    }

    pub fn set_distortion(&mut self, radial: &Vector3<f64>, tangential: &Vector2<f64>) {
        self.flags |= CalibrationFlags::DISTORTION;
        self.radial = *radial;
        self.tangential = *tangential;
    }

    fn update_projection_matrix(&mut self) {
        // Identity with the intrinsics in the upper-left block; without
        // intrinsics this stays I_4x4
        let mut projection = Matrix4::identity();
        projection
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.intrinsics);

        if self.has_extrinsics() {
            projection *= self.extrinsics;
        }
        self.projection = projection;
    }
}

impl fmt::Debug for CameraCalibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let focal = self.focal_length();
        let center = self.center();
        write!(
            f,
            "CameraCalibration [fx: {} fy: {} cx: {} cy: {} alpha: {} radial: {:?} tangential: {:?} flags: {:#05b}]",
            focal.x,
            focal.y,
            center.x,
            center.y,
            self.skew(),
            self.radial.as_slice(),
            self.tangential.as_slice(),
            self.flags.bits(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    fn sample_extrinsics() -> Matrix4<f64> {
        let rotation = UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3);
        Isometry3::from_parts(Translation3::new(0.5, -1.0, 2.0), rotation).to_homogeneous()
    }

    #[test]
    fn test_default_is_identity_without_flags() {
        let calib = CameraCalibration::new();
        assert!(!calib.has_intrinsics());
        assert!(!calib.has_extrinsics());
        assert!(!calib.has_distortion());
        assert!(calib.flags().is_empty());
        assert_eq!(*calib.intrinsics(), Matrix3::identity());
        assert_eq!(*calib.extrinsics(), Matrix4::identity());
        assert_eq!(*calib.projection_matrix(), Matrix4::identity());
        assert_eq!(*calib.radial_distortion(), Vector3::zeros());
        assert_eq!(*calib.tangential_distortion(), Vector2::zeros());
    }

    #[test]
    fn test_setters_only_raise_their_own_flag() {
        let mut calib = CameraCalibration::new();
        calib.set_intrinsics_params(500.0, 510.0, 320.0, 240.0, 0.0);
        assert!(calib.has_intrinsics());
        assert!(!calib.has_extrinsics());
        assert!(!calib.has_distortion());

        calib.set_distortion(&Vector3::new(0.1, 0.0, 0.0), &Vector2::new(0.01, 0.0));
        assert!(calib.has_distortion());
        assert!(!calib.has_extrinsics());
        // Distortion never touches the projection
        let expected = Matrix4::new(
            500.0, 0.0, 320.0, 0.0, //
            0.0, 510.0, 240.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        assert_eq!(*calib.projection_matrix(), expected);

        calib.set_extrinsics(&sample_extrinsics());
        assert_eq!(
            calib.flags(),
            CalibrationFlags::INTRINSICS | CalibrationFlags::EXTRINSICS | CalibrationFlags::DISTORTION
        );
    }

    #[test]
    fn test_intrinsics_layout_and_accessors() {
        let mut calib = CameraCalibration::new();
        calib.set_intrinsics_params(400.0, 420.0, 300.0, 200.0, 1.5);

        let k = calib.intrinsics();
        assert_eq!(k[(0, 0)], 400.0);
        assert_eq!(k[(0, 1)], 1.5);
        assert_eq!(k[(0, 2)], 300.0);
        assert_eq!(k[(1, 0)], 0.0);
        assert_eq!(k[(1, 1)], 420.0);
        assert_eq!(k[(1, 2)], 200.0);
        assert_eq!((k[(2, 0)], k[(2, 1)], k[(2, 2)]), (0.0, 0.0, 1.0));

        assert_eq!(calib.focal_length(), Vector2::new(400.0, 420.0));
        assert_eq!(calib.center(), Vector2::new(300.0, 200.0));
        assert_eq!(calib.skew(), 1.5);
    }

    #[test]
    fn test_projection_composition_order() {
        let mut calib = CameraCalibration::new();
        let k = Matrix3::new(
            450.0, 0.5, 310.0, //
            0.0, 455.0, 250.0, //
            0.0, 0.0, 1.0,
        );
        calib.set_intrinsics(&k);

        let mut padded = Matrix4::identity();
        padded.fixed_view_mut::<3, 3>(0, 0).copy_from(&k);
        assert_eq!(*calib.projection_matrix(), padded);

        let extrinsics = sample_extrinsics();
        calib.set_extrinsics(&extrinsics);
        assert_eq!(*calib.projection_matrix(), padded * extrinsics);

        // Re-setting the intrinsics keeps composing with the extrinsics
        let k2 = Matrix3::new(
            300.0, 0.0, 160.0, //
            0.0, 300.0, 120.0, //
            0.0, 0.0, 1.0,
        );
        calib.set_intrinsics(&k2);
        let mut padded2 = Matrix4::identity();
        padded2.fixed_view_mut::<3, 3>(0, 0).copy_from(&k2);
        assert_eq!(*calib.projection_matrix(), padded2 * extrinsics);
    }

    #[test]
    fn test_extrinsics_without_intrinsics() {
        let mut calib = CameraCalibration::new();
        let extrinsics = sample_extrinsics();
        calib.set_extrinsics(&extrinsics);
        assert!(!calib.has_intrinsics());
        assert_eq!(*calib.projection_matrix(), extrinsics);
    }

    #[test]
    fn test_extrinsics_from_pose() {
        let pose = Isometry3::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5),
        );
        let mut calib = CameraCalibration::new();
        calib.set_extrinsics_from_pose(&pose);
        assert!(calib.has_extrinsics());
        assert_eq!(*calib.extrinsics(), pose.to_homogeneous());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut calib = CameraCalibration::new();
        calib.set_intrinsics_params(500.0, 500.0, 320.0, 240.0, 0.0);
        let copy = calib.clone();

        calib.set_distortion(&Vector3::new(-0.3, 0.1, 0.0), &Vector2::zeros());
        calib.set_intrinsics_params(100.0, 100.0, 50.0, 50.0, 0.0);

        assert!(!copy.has_distortion());
        assert_eq!(copy.focal_length(), Vector2::new(500.0, 500.0));
        assert_ne!(copy, calib);
    }

    #[test]
    fn test_calibration_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CameraCalibration>();
    }
}
