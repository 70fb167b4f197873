// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs for a single render.

use num::Complex;

use crate::error::{MandelError, Result};

/// Default image width in pixels.
pub const DEFAULT_WIDTH: usize = 800;
/// Default image height in pixels.
pub const DEFAULT_HEIGHT: usize = 600;
/// Default iteration bound.
pub const DEFAULT_MAX_ITER: u32 = 256;
/// Default center, real part.
pub const DEFAULT_X_CENTER: f64 = -0.75;
/// Default center, imaginary part.
pub const DEFAULT_Y_CENTER: f64 = 0.0;
/// Default half-range of the real axis.
pub const DEFAULT_AXIS_RANGE: f64 = 2.5;

/// Describes what to render: the pixel size of the image, how hard to
/// look at each point, and which part of the complex plane to look at.
/// The view is centered on `(x_center, y_center)` and spans
/// `axis_range` either side along the real axis; the imaginary span
/// follows from the aspect ratio.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Iteration bound per point
    pub max_iter: u32,
    /// Real part of the view center
    pub x_center: f64,
    /// Imaginary part of the view center
    pub y_center: f64,
    /// Half-range of the real axis
    pub axis_range: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            max_iter: DEFAULT_MAX_ITER,
            x_center: DEFAULT_X_CENTER,
            y_center: DEFAULT_Y_CENTER,
            axis_range: DEFAULT_AXIS_RANGE,
        }
    }
}

impl RenderConfig {
    /// The view center as a complex number.
    pub fn center(&self) -> Complex<f64> {
        Complex::new(self.x_center, self.y_center)
    }

    /// Checks everything the grid and the kernel assume about their
    /// inputs, so a bad configuration fails before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MandelError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iter == 0 {
            return Err(MandelError::InvalidIterations(self.max_iter));
        }
        for &(name, value) in &[
            ("x_center", self.x_center),
            ("y_center", self.y_center),
            ("axis_range", self.axis_range),
        ] {
            if !value.is_finite() {
                return Err(MandelError::NonFinite { name, value });
            }
        }
        if self.axis_range <= 0.0 {
            return Err(MandelError::InvalidRange(self.axis_range));
        }
        Ok(())
    }
}
