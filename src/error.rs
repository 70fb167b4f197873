// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Failure conditions for the renderer.  The kernel itself cannot fail
//! on a well-formed grid; everything here is either a caller contract
//! violation caught up front, or something going wrong around the
//! computation (a worker dying, a file that won't write).

use failure::Fail;

/// Everything that can go wrong between parsing a configuration and
/// writing the image.
#[derive(Debug, Fail)]
pub enum MandelError {
    /// The pixel grid has no area.
    #[fail(display = "image must be at least 1x1 pixels, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// The iteration bound must be at least one.
    #[fail(display = "iteration bound must be at least 1, got {}", _0)]
    InvalidIterations(u32),

    /// A coordinate or range was NaN or infinite.
    #[fail(display = "{} must be a finite number, got {}", name, value)]
    NonFinite {
        /// Which parameter
        name: &'static str,
        /// What it was
        value: f64,
    },

    /// The half-range of the real axis must be strictly positive.
    #[fail(display = "axis range must be greater than zero, got {}", _0)]
    InvalidRange(f64),

    /// A worker thread panicked while computing its rows.
    #[fail(display = "an escape-time worker thread panicked")]
    WorkerPanicked,

    /// The image could not be encoded or written.
    #[fail(display = "could not write image to {}: {}", path, reason)]
    ImageWrite {
        /// Destination path
        path: String,
        /// Underlying cause, as reported by the encoder
        reason: String,
    },
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, MandelError>;
