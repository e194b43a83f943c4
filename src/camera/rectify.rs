//! Undistortion crop rectangles.
//!
//! Undistorting an image warps its border. [`CameraCalibration::bounds_for`]
//! returns two axis-aligned rectangles in undistorted pixel coordinates: the
//! outer one contains the whole warped border, the inner one contains only
//! pixels that have a source inside the distorted image.
//!
//! Corners alone are not enough. For barrel distortion (`k1 < 0`) the warped
//! edges bow inwards and the tightest point of each edge lies in its
//! interior; for pincushion distortion (`k1 >= 0`) they bow outwards and the
//! outermost point lies in the interior. Each edge is therefore searched
//! with a golden-section line search, see [`crate::math::golden`] for the
//! tolerance and iteration cap.

use super::CameraCalibration;
use crate::geometry::Rect;
use crate::math::{line_search_max_golden, line_search_min_golden};
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Result of [`CameraCalibration::bounds_for`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectificationBounds {
    /// Contains the undistorted image of the whole input rectangle.
    pub outer: Rect,
    /// Contains only valid undistorted pixels.
    pub inner: Rect,
}

impl CameraCalibration {
    /// Computes the outer and inner undistorted rectangles of `input`.
    ///
    /// `input` is given in distorted pixel coordinates. Edge searches run
    /// over `[input.y, input.y + input.height - 1]` for the left and right
    /// edges and `[input.x, input.x + input.width - 1]` for the top and
    /// bottom edges.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use camcalib::camera::CameraCalibration;
    /// use camcalib::geometry::Rect;
    /// use nalgebra::{Vector2, Vector3};
    ///
    /// let mut calib = CameraCalibration::new();
    /// calib.set_intrinsics_params(500.0, 500.0, 320.0, 240.0, 0.0);
    /// calib.set_distortion(&Vector3::new(-0.2, 0.0, 0.0), &Vector2::zeros());
    ///
    /// let input = Rect::new(0.0, 0.0, 640.0, 480.0);
    /// let bounds = calib.bounds_for(&input);
    /// assert!(bounds.outer.contains_rect(&bounds.inner));
    /// assert!(bounds.inner.area() <= bounds.outer.area());
    /// ```
    pub fn bounds_for(&self, input: &Rect) -> RectificationBounds {
        let mut outer = *input;
        for corner in [
            Vector2::new(input.x, input.y),
            Vector2::new(input.right(), input.y),
            Vector2::new(input.right(), input.bottom()),
            Vector2::new(input.x, input.bottom()),
        ] {
            outer.join(&self.undistort(&corner));
        }

        let mut x1min = outer.x;
        let mut x2min = outer.right();
        let mut y1min = outer.y;
        let mut y2min = outer.bottom();

        let left = |y: f64| self.undistort(&Vector2::new(input.x, y)).x;
        let right = |y: f64| self.undistort(&Vector2::new(input.right(), y)).x;
        let top = |x: f64| self.undistort(&Vector2::new(x, input.y)).y;
        let bottom = |x: f64| self.undistort(&Vector2::new(x, input.bottom())).y;

        let y_lo = input.y;
        let y_hi = input.y + input.height - 1.0;
        let x_lo = input.x;
        let x_hi = input.x + input.width - 1.0;

        if self.radial[0] < 0.0 {
            debug!("Barrel distortion (k1 = {}): tightening inner bounds", self.radial[0]);

            let y = line_search_max_golden(y_lo, y_hi, left);
            x1min = x1min.max(self.undistort(&Vector2::new(input.x, y)).x);

            let y = line_search_min_golden(y_lo, y_hi, right);
            x2min = x2min.min(self.undistort(&Vector2::new(input.right(), y)).x);

            let x = line_search_max_golden(x_lo, x_hi, top);
            y1min = y1min.max(self.undistort(&Vector2::new(x, input.y)).y);

            let x = line_search_min_golden(x_lo, x_hi, bottom);
            y2min = y2min.min(self.undistort(&Vector2::new(x, input.bottom())).y);
        } else {
            debug!("Pincushion distortion (k1 = {}): growing outer bounds", self.radial[0]);

            let y = line_search_min_golden(y_lo, y_hi, left);
            outer.join(&self.undistort(&Vector2::new(input.x, y)));

            let y = line_search_max_golden(y_lo, y_hi, right);
            outer.join(&self.undistort(&Vector2::new(input.right(), y)));

            let x = line_search_min_golden(x_lo, x_hi, top);
            outer.join(&self.undistort(&Vector2::new(x, input.y)));

            let x = line_search_max_golden(x_lo, x_hi, bottom);
            outer.join(&self.undistort(&Vector2::new(x, input.bottom())));
        }

        let inner = Rect::new(x1min, y1min, x2min - x1min, y2min - y1min);
        debug!("Rectification bounds for {}: outer {}, inner {}", input, outer, inner);

        RectificationBounds { outer, inner }
    }
}
