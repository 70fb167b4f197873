#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring and adding `c`, starting from zero,
//! never runs off to infinity.  Once an orbit leaves the circle of
//! radius 2 it is guaranteed to diverge, so we count how many steps
//! each point takes to get there.  That count, the escape time, is the
//! number used to color the image; points that are still inside when
//! we give up are treated as members of the set.
//!
//! The pipeline is a straight line: `planes` lays a grid of samples
//! over the complex plane, `escape` computes the escape time of every
//! sample (on one thread or many), and `render` turns the counts into
//! an image.

pub mod config;
pub mod error;
pub mod escape;
pub mod planes;
pub mod render;

pub use config::RenderConfig;
pub use error::{MandelError, Result};
pub use escape::{escape_time, IterationField, Kernel};
pub use planes::{Extent, SampleGrid};
pub use render::Palette;

use tracing::info_span;

/// Validates `config`, lays out the sample grid, and runs `kernel`
/// over it.  Returns the grid alongside the field so the caller knows
/// which part of the plane the counts cover.
pub fn mandelbrot(config: &RenderConfig, kernel: Kernel) -> Result<(SampleGrid, IterationField)> {
    let span = info_span!("mandelbrot", width = config.width, height = config.height);
    let _entered = span.enter();

    config.validate()?;
    let grid = SampleGrid::centered(
        config.width,
        config.height,
        config.center(),
        config.axis_range,
    )?;
    let field = kernel.compute(&grid, config.max_iter)?;
    Ok((grid, field))
}
