//! Camera Calibration Library
//!
//! A Rust library describing a calibrated pinhole camera with lens distortion.
//! It provides:
//! - Intrinsic, extrinsic and radial-tangential distortion parameters
//! - The forward distortion model and a per-axis polynomial undistortion solver
//! - Outer and inner crop rectangles for undistorted images
//! - Tree serialization of calibrations, persisted as YAML

pub mod camera;
pub mod geometry;
pub mod math;
pub mod serialization;

// Re-export commonly used types
pub use camera::{CalibrationError, CalibrationFlags, CameraCalibration, RectificationBounds};
pub use geometry::Rect;
pub use serialization::{Node, Serializable};
